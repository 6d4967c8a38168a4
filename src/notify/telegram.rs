use super::Notifier;
use crate::utils::error::{AppError, AppResult};
use crate::utils::format::truncate_chars;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bot API limit for a single message body
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Envelope every Bot API method answers with
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BotInfo {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

pub struct TelegramBot {
    client: Client,
    api_url: String,
    token: String,
    chat_id: i64,
}

impl TelegramBot {
    pub fn new(api_url: &str, token: String, chat_id: i64) -> AppResult<Self> {
        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("mbbs/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            chat_id,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Strip the token from reqwest errors, which embed the request URL
    fn network_error(&self, context: &str, err: reqwest::Error) -> AppError {
        let msg = err.without_url().to_string();
        AppError::Network(format!("{}: {}", context, msg))
    }

    async fn read_response<T>(&self, method: &str, response: reqwest::Response) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();
        let body: Option<ApiResponse<T>> = response.json().await.ok();

        match body {
            Some(ApiResponse { ok: true, result: Some(result), .. }) if status.is_success() => {
                Ok(result)
            }
            Some(ApiResponse { description, .. }) => Err(AppError::Network(format!(
                "Telegram {} failed: {} - {}",
                method,
                status,
                description.unwrap_or_else(|| "no description".to_string())
            ))),
            None => Err(AppError::Network(format!(
                "Telegram {} failed: {} - unreadable response",
                method, status
            ))),
        }
    }

    /// Check the token and return who we are
    pub async fn get_me(&self) -> AppResult<BotInfo> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| self.network_error("Failed to reach Telegram", e))?;

        self.read_response("getMe", response).await
    }
}

#[async_trait]
impl Notifier for TelegramBot {
    async fn send_message(&self, text: &str) -> AppResult<()> {
        let text = truncate_chars(text, MAX_MESSAGE_CHARS);
        debug!(chars = text.chars().count(), "sending telegram message");

        let request = SendMessageRequest {
            chat_id: self.chat_id,
            text: &text,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.network_error("Failed to send telegram message", e))?;

        self.read_response::<serde_json::Value>("sendMessage", response)
            .await
            .map(|_| ())
    }
}

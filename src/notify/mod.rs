pub mod telegram;

use crate::utils::error::AppResult;
use async_trait::async_trait;

/// Where the bridge reports mesh traffic and its own health
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> AppResult<()>;
}

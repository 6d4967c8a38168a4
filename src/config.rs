use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_BOT_CHATID";
pub const ENV_BLE_DEVICE: &str = "BLE_DEVICE";
pub const ENV_DATA_DIR: &str = "MBBS_DATA_DIR";

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub device: DeviceConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelegramConfig {
    #[serde(
        default,
        serialize_with = "crate::utils::format::serialize_option_string",
        deserialize_with = "crate::utils::format::deserialize_option_string"
    )]
    pub bot_token: Option<String>,
    #[serde(
        default,
        serialize_with = "crate::utils::format::serialize_option_chat_id",
        deserialize_with = "crate::utils::format::deserialize_option_chat_id"
    )]
    pub chat_id: Option<i64>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    #[serde(
        default,
        serialize_with = "crate::utils::format::serialize_option_string",
        deserialize_with = "crate::utils::format::deserialize_option_string"
    )]
    pub ble_name: Option<String>,
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_true")]
    pub archive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    pub idle_check_secs: u64,
    pub idle_limit_secs: u64,
    pub retry_delay_secs: u64,
}

fn default_api_url() -> String {
    TELEGRAM_API_URL.to_string()
}

fn default_scan_timeout() -> u64 {
    5
}

fn default_state_file() -> String {
    "storage.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            idle_check_secs: 10,
            idle_limit_secs: 300,
            retry_delay_secs: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mbbs");

        Self {
            telegram: TelegramConfig {
                bot_token: None,
                chat_id: None,
                api_url: default_api_url(),
            },
            device: DeviceConfig {
                ble_name: None,
                scan_timeout_secs: default_scan_timeout(),
            },
            storage: StorageConfig {
                data_dir,
                state_file: default_state_file(),
                archive: true,
            },
            service: ServiceConfig::default(),
        }
    }
}

/// Everything `start` needs, resolved and checked
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub bot_token: String,
    pub chat_id: i64,
    pub ble_name: String,
}

impl Config {
    /// Load from `config_path`, creating it with defaults when missing, then apply env overrides
    pub fn load_custom(config_path: &Path) -> AppResult<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| AppError::Io(format!("{}: {}", config_path.display(), e)))?;
            Self::from_toml(&content)?
        } else {
            let default_config = Config::default();
            default_config.save_to(config_path)?;
            default_config
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Replace file values with those supplied by `lookup` (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_BOT_TOKEN).filter(|v| !v.is_empty()) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(raw) = lookup(ENV_CHAT_ID).filter(|v| !v.is_empty()) {
            let chat_id = raw.trim().parse::<i64>().map_err(|e| {
                AppError::Config(format!("{} is not a valid chat id ({}): {}", ENV_CHAT_ID, raw, e))
            })?;
            self.telegram.chat_id = Some(chat_id).filter(|id| *id != 0);
        }
        if let Some(device) = lookup(ENV_BLE_DEVICE).filter(|v| !v.is_empty()) {
            self.device.ble_name = Some(device);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.telegram.api_url.trim().is_empty() {
            return Err(AppError::Config("Telegram API URL cannot be empty".to_string()));
        }
        if self.device.scan_timeout_secs == 0 {
            return Err(AppError::Config("BLE scan timeout must be greater than zero".to_string()));
        }
        if self.storage.state_file.trim().is_empty() {
            return Err(AppError::Config("State file name cannot be empty".to_string()));
        }

        let service = &self.service;
        if service.idle_check_secs == 0 || service.retry_delay_secs == 0 {
            return Err(AppError::Config(
                "Idle check interval and retry delay must be greater than zero".to_string(),
            ));
        }
        if service.idle_limit_secs < service.idle_check_secs {
            return Err(AppError::Config(format!(
                "Idle limit ({}s) must not be shorter than the idle check interval ({}s)",
                service.idle_limit_secs, service.idle_check_secs
            )));
        }

        Ok(())
    }

    /// Resolve the values `start` cannot run without
    pub fn bridge_settings(&self) -> AppResult<BridgeSettings> {
        let mut missing = Vec::new();
        if self.telegram.bot_token.is_none() {
            missing.push(format!("telegram.bot_token (or {})", ENV_BOT_TOKEN));
        }
        if self.telegram.chat_id.is_none() {
            missing.push(format!("telegram.chat_id (or {})", ENV_CHAT_ID));
        }
        if self.device.ble_name.is_none() {
            missing.push(format!("device.ble_name (or {})", ENV_BLE_DEVICE));
        }
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        Ok(BridgeSettings {
            bot_token: self.telegram.bot_token.clone().unwrap_or_default(),
            chat_id: self.telegram.chat_id.unwrap_or_default(),
            ble_name: self.device.ble_name.clone().unwrap_or_default(),
        })
    }

    pub fn state_file_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.state_file)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.device.scan_timeout_secs)
    }

    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Io(e.to_string()))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::System(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content).map_err(|e| AppError::Io(e.to_string()))?;

        Ok(())
    }

    pub fn config_file_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mbbs")
            .join("config.toml")
    }
}

/// Set a dotted `table.key` in a TOML document, keeping comments and layout.
///
/// The new value takes the type of the value it replaces. The edited
/// document must still be a valid config.
pub fn set_value(content: &str, key: &str, value: &str) -> AppResult<String> {
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

    let (table, field) = key
        .split_once('.')
        .filter(|(t, f)| !t.is_empty() && !f.is_empty() && !f.contains('.'))
        .ok_or_else(|| {
            AppError::Config(format!("Key must look like 'section.key', got '{}'", key))
        })?;

    let section = doc
        .get_mut(table)
        .and_then(|t| t.as_table_like_mut())
        .ok_or_else(|| AppError::Config(format!("Unknown config section '{}'", table)))?;
    let existing = section
        .get(field)
        .ok_or_else(|| AppError::Config(format!("Unknown config key '{}'", key)))?;

    let item = if existing.as_integer().is_some() {
        let n = value.trim().parse::<i64>().map_err(|_| {
            AppError::Config(format!("{} expects an integer, got '{}'", key, value))
        })?;
        toml_edit::value(n)
    } else if existing.as_bool().is_some() {
        let b = value.trim().parse::<bool>().map_err(|_| {
            AppError::Config(format!("{} expects true or false, got '{}'", key, value))
        })?;
        toml_edit::value(b)
    } else if existing.as_str().is_some() {
        toml_edit::value(value)
    } else {
        return Err(AppError::Config(format!(
            "{} cannot be set from the command line",
            key
        )));
    };
    section.insert(field, item);

    let edited = doc.to_string();
    let config = Config::from_toml(&edited)?;
    config.validate()?;
    Ok(edited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_toml() -> String {
        r#"
# bridge settings
[telegram]
bot_token = ""
chat_id = 0
api_url = "https://api.telegram.org"

[device]
ble_name = "Meshtastic_1234"
scan_timeout_secs = 5

[storage]
data_dir = "/var/lib/mbbs"
state_file = "storage.json"
archive = true

[service]
idle_check_secs = 10
idle_limit_secs = 300
retry_delay_secs = 5
"#
        .to_string()
    }

    #[test]
    fn test_empty_values_parse_as_unset() {
        let config = Config::from_toml(&sample_toml()).unwrap();
        assert!(config.telegram.bot_token.is_none());
        assert!(config.telegram.chat_id.is_none());
        assert_eq!(config.device.ble_name.as_deref(), Some("Meshtastic_1234"));
        assert_eq!(config.state_file_path(), PathBuf::from("/var/lib/mbbs/storage.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_service_section_uses_defaults() {
        let service = concat!(
            "[service]\n",
            "idle_check_secs = 10\n",
            "idle_limit_secs = 300\n",
            "retry_delay_secs = 5\n",
        );
        let content = sample_toml().replace(service, "");
        let config = Config::from_toml(&content).unwrap();
        assert_eq!(config.service, ServiceConfig::default());
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let mut config = Config::from_toml(&sample_toml()).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BOT_TOKEN, "123:abc"),
            (ENV_CHAT_ID, "-100200300"),
            (ENV_BLE_DEVICE, "RAK_4631"),
        ]);
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        let settings = config.bridge_settings().unwrap();
        assert_eq!(settings.bot_token, "123:abc");
        assert_eq!(settings.chat_id, -100200300);
        assert_eq!(settings.ble_name, "RAK_4631");
    }

    #[test]
    fn test_invalid_chat_id_is_config_error() {
        let mut config = Config::default();
        let result =
            config.apply_overrides(|k| (k == ENV_CHAT_ID).then(|| "not-a-number".to_string()));
        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains(ENV_CHAT_ID)));
    }

    #[test]
    fn test_bridge_settings_lists_every_missing_value() {
        let config = Config::default();
        let err = config.bridge_settings().unwrap_err();
        let AppError::Config(msg) = err else {
            panic!("expected config error");
        };
        assert!(msg.contains(ENV_BOT_TOKEN));
        assert!(msg.contains(ENV_CHAT_ID));
        assert!(msg.contains(ENV_BLE_DEVICE));
    }

    #[test]
    fn test_validate_rejects_idle_limit_below_check_interval() {
        let mut config = Config::default();
        config.service.idle_limit_secs = 5;
        config.service.idle_check_secs = 10;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_custom_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_custom(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.telegram.api_url, TELEGRAM_API_URL);

        let reloaded = Config::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded.service, ServiceConfig::default());
    }

    #[test]
    fn test_set_value_keeps_comments_and_types() {
        let edited = set_value(&sample_toml(), "telegram.chat_id", "-42").unwrap();
        assert!(edited.contains("# bridge settings"));

        let edited = set_value(&edited, "storage.archive", "false").unwrap();
        let config = Config::from_toml(&edited).unwrap();
        assert_eq!(config.telegram.chat_id, Some(-42));
        assert!(!config.storage.archive);

        let edited = set_value(&edited, "device.ble_name", "T-Beam").unwrap();
        let config = Config::from_toml(&edited).unwrap();
        assert_eq!(config.device.ble_name.as_deref(), Some("T-Beam"));
        assert!(edited.contains("# bridge settings"));
    }

    #[test]
    fn test_set_value_keeps_string_fields_as_strings() {
        let edited = set_value(&sample_toml(), "device.ble_name", "1234").unwrap();
        let edited = set_value(&edited, "telegram.bot_token", "true").unwrap();
        let edited = set_value(&edited, "storage.state_file", "42").unwrap();

        let config = Config::from_toml(&edited).unwrap();
        assert_eq!(config.device.ble_name.as_deref(), Some("1234"));
        assert_eq!(config.telegram.bot_token.as_deref(), Some("true"));
        assert_eq!(config.storage.state_file, "42");
    }

    #[test]
    fn test_set_value_rejects_unknown_and_invalid() {
        assert!(set_value(&sample_toml(), "telegram.nope", "1").is_err());
        assert!(set_value(&sample_toml(), "radio.ble_name", "x").is_err());
        assert!(set_value(&sample_toml(), "chat_id", "1").is_err());
        assert!(set_value(&sample_toml(), "telegram.chat_id", "abc").is_err());
        assert!(set_value(&sample_toml(), "storage.archive", "1").is_err());
        // would break validation
        assert!(set_value(&sample_toml(), "service.idle_check_secs", "0").is_err());
    }
}

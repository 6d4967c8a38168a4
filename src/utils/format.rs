use chrono::{DateTime, Local, NaiveDate};
use serde::{self, Deserialize};

const STAT_FORMAT: &str = "%m-%d %H:%M:%S";

/// Serialize Option<String> as empty string when None
pub fn serialize_option_string<S>(option: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match option {
        Some(value) => serializer.serialize_str(value),
        None => serializer.serialize_str(""),
    }
}

/// Deserialize empty string as None
pub fn deserialize_option_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() { Ok(None) } else { Ok(Some(s)) }
}

/// Serialize Option<i64> as 0 when None
pub fn serialize_option_chat_id<S>(option: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(option.unwrap_or(0))
}

/// Deserialize 0 as None
pub fn deserialize_option_chat_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let id = i64::deserialize(deserializer)?;
    if id == 0 { Ok(None) } else { Ok(Some(id)) }
}

/// Format a unix timestamp in local time for the stats table
pub fn format_unix_local(ts: u64) -> String {
    match DateTime::from_timestamp(ts as i64, 0) {
        Some(dt) => dt.with_timezone(&Local).format(STAT_FORMAT).to_string(),
        None => "--".to_string(),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Node numbers are shown the way Meshtastic clients print node ids
pub fn format_node_id(num: u32) -> String {
    format!("!{:08x}", num)
}

/// Truncate to `max_chars` characters, marking the cut with an ellipsis
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

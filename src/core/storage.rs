//! Node directory and traffic counters persisted between runs

use crate::utils::error::{AppError, AppResult};
use meshtastic::protobufs::User;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::BufReader;
use std::path::Path;

/// Destination address Meshtastic uses for channel-wide messages
pub const BROADCAST_ADDR: u32 = 0xffff_ffff;

/// How often a `<node>:<port>` pair was seen, and when last
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatEntry {
    pub count: u32,
    pub last_seen: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Storage {
    #[serde(default)]
    pub users: HashMap<u32, User>,
    #[serde(default)]
    pub stats: BTreeMap<String, StatEntry>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file yields an empty storage
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to open state file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AppError::Storage(format!("Failed to parse state file {}: {}", path.display(), e))
        })
    }

    /// Write through a sibling temp file so a crash never leaves half a state file
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_vec(self)
            .map_err(|e| AppError::Storage(format!("Failed to serialize state: {}", e)))?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn remember_user(&mut self, num: u32, user: User) {
        self.users.insert(num, user);
    }

    pub fn long_name_of(&self, num: u32) -> String {
        match self.users.get(&num) {
            Some(user) if !user.long_name.is_empty() => user.long_name.clone(),
            Some(user) if !user.short_name.is_empty() => user.short_name.clone(),
            _ => num.to_string(),
        }
    }

    pub fn display_name_of(&self, num: u32) -> String {
        if num == BROADCAST_ADDR {
            "BROADCAST".to_string()
        } else {
            self.long_name_of(num)
        }
    }

    pub fn insert_stat(&mut self, from: u32, info: &str, now: u64) {
        let key = format!("{}:{}", self.long_name_of(from), info);
        self.stats
            .entry(key)
            .and_modify(|entry| {
                entry.count = entry.count.saturating_add(1);
                entry.last_seen = now;
            })
            .or_insert(StatEntry { count: 1, last_seen: now });
    }
}

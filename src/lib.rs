//! mbbs - bridge a Meshtastic radio to a Telegram chat
//!
//! The radio is reached over Bluetooth LE. Every decoded packet is archived,
//! node names are remembered between runs, and text messages heard on the
//! mesh are forwarded to a Telegram chat.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod notify;
pub mod utils;

// Re-export core types and traits for easier use
pub use crate::core::{
    archive::PacketArchive,
    bridge::Bridge,
    packet::{MeshPayload, ReceivedPacket},
    storage::{StatEntry, Storage},
};
pub use notify::{Notifier, telegram::TelegramBot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

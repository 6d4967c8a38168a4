//! Core bridge logic
//!
//! Packet classification, persisted node state, the packet archive and
//! the session loop that ties them to a [`crate::notify::Notifier`].

pub mod archive;
pub mod bridge;
pub mod packet;
pub mod storage;

pub mod configure;
pub mod discover;
pub mod dump;
pub mod start;
pub mod stats;

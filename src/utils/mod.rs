pub mod error;
pub mod format;
pub mod interactive;
pub mod logging;
pub mod output;
pub mod pagination;

pub use output::{print_success, print_warning};

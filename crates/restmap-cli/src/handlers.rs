//! Command handlers for CLI subcommands

mod call;
mod config;
mod preview;
mod utils;

pub use call::handle_call;
pub use config::handle_config;
pub use preview::handle_preview;

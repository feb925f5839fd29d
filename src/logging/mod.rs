//! Logging setup for the plant classifier tools
//!
//! This module provides:
//! - Custom log formatting with bracketed output
//! - Console logging plus an optional timestamped log file

mod formatter;
mod setup;

// Re-export the public API
pub use formatter::BracketedFormatter;
pub use setup::setup_logging;

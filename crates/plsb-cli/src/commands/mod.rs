//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config resolution, opening the data source)
//! - `months` - Month listing, monthly metrics and source status
//! - `serve` - Web server command
//! - `welcome` - Welcome page

pub mod core;
pub mod months;
pub mod serve;
pub mod welcome;

// Re-export command functions for main.rs
pub use core::*;
pub use months::*;
pub use serve::*;
pub use welcome::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific area.

pub mod api;
pub mod pages;

// Re-export all handlers for use in router
pub use api::*;
pub use pages::*;

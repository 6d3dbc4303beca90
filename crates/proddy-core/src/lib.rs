//! Proddy Core - Shared functionality for the Proddy assistant
//!
//! Standard locations, the user-editable configuration file, and small
//! formatting helpers used when rendering replies.

pub mod config;
pub mod format;
pub mod paths;

pub use config::Config;
pub use paths::Paths;

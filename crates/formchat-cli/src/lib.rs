//! # formchat-cli
//!
//! Host-side pieces of the `formchat` binary: TOML configuration, the
//! file-backed conversation store and the error type tying them together.

pub mod config;
pub mod error;
pub mod storage;

pub use config::AppConfig;
pub use error::{CliError, Result};
pub use storage::FileStore;

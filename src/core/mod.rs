//! Core utilities, configuration and common types.

pub mod config;
pub mod error;
pub mod types;

pub use config::PassportConfig;
pub use error::{Error, ErrorKind, Result};
pub use types::*;

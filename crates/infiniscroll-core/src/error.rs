//! Component error types
//!
//! None of these are fatal to the component itself. They surface API misuse
//! (unknown attributes) and configuration loading failures to the host.

use thiserror::Error;

/// Error type for the detection component
#[derive(Debug, Error)]
pub enum Error {
    /// Attribute name is not part of the configuration surface
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Configuration text could not be parsed
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for Gestura

use thiserror::Error;

/// Main error type for Gestura
#[derive(Error, Debug)]
pub enum GesturaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Landmark source error: {0}")]
    Source(#[from] SourceError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Landmark frame acquisition errors.
///
/// Any of these skips the current cycle; none of them is fatal.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Landmark receiver error: {0}")]
    Receiver(String),

    #[error("Landmark packet parse error: {0}")]
    Parse(String),

    #[error("Landmark source closed")]
    Closed,
}

/// Control message output errors
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to bind OSC socket: {0}")]
    Bind(String),

    #[error("Invalid OSC target address: {0}")]
    Target(String),

    #[error("OSC encode error: {0}")]
    Encode(String),

    #[error("OSC send error: {0}")]
    Send(String),
}

//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Messenger error: {0}")]
    Messenger(#[from] MessengerError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the network controller client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error {status} on {path}: {message}")]
    Api {
        status: u16,
        path: String,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ControllerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ControllerError::Parse(e.to_string())
        } else {
            ControllerError::Network(e.to_string())
        }
    }
}

/// Errors raised by the messaging platform client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessengerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for MessengerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            MessengerError::Parse(e.to_string())
        } else {
            MessengerError::Network(e.to_string())
        }
    }
}

/// Push-notification transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Connection closed")]
    Closed,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

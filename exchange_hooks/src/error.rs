use std::{error, fmt};

/// Whatever a user callback fails with. Passed back to the caller untouched.
pub type CallbackError = Box<dyn error::Error + Send + Sync>;

pub type CallbackResult = Result<(), CallbackError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownCallbackKey(String),
    UnknownSameSiteMode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownCallbackKey(key) => {
                write!(f, "Unknown websocket callback key `{}`", key)
            }
            ConfigError::UnknownSameSiteMode(mode) => {
                write!(f, "Unknown SameSite mode `{}`", mode)
            }
        }
    }
}

impl error::Error for ConfigError {}

/// A failure on a websocket channel, reported through `on_error`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelError {
    Transport(String),
    Protocol(String),
    Closed,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Transport(message) => write!(f, "Transport error: {}", message),
            ChannelError::Protocol(message) => write!(f, "Protocol error: {}", message),
            ChannelError::Closed => write!(f, "Channel is closed"),
        }
    }
}

impl error::Error for ChannelError {}

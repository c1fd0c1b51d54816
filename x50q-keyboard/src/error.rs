//! Keyboard interface error types

use thiserror::Error;
use x50q_transport::{DiscoveryError, ExchangeError, ProtocolError, TransportError};

/// Errors from keyboard operations
#[derive(Error, Debug)]
pub enum KeyboardError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Keyboard not found or not shaped as expected
    #[error("Device not found: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Device sent something we do not understand
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// More data than the command can carry
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<ExchangeError> for KeyboardError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::Transport(e) => KeyboardError::Transport(e),
            ExchangeError::Protocol(e) => KeyboardError::Protocol(e),
            ExchangeError::PayloadTooLarge { len, max } => {
                KeyboardError::PayloadTooLarge { len, max }
            }
        }
    }
}

//! Error handling for the Pi Lights crate.

use crate::gpio::PinMode;

/// A specialized `Result` type for Pi Lights operations.
pub type Result<T> = std::result::Result<T, LightError>;

/// The main error type for Pi Lights.
#[derive(Debug, thiserror::Error)]
pub enum LightError {
    /// The GPIO binding rejected an operation
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// A pin was read or written before being configured for that direction
    #[error("GPIO pin {pin} is not configured as {mode}")]
    PinNotConfigured { pin: u8, mode: PinMode },

    /// Pin number outside the usable BCM range
    #[error("GPIO pin {0} is not available on this board")]
    InvalidPin(u8),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),
}

impl LightError {
    /// Create a new GPIO error
    pub fn gpio_error(msg: impl Into<String>) -> Self {
        Self::Gpio(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }
}

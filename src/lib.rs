//! # Pi Lights - HTTP control for a Raspberry Pi light
//!
//! A small crate that puts a GPIO-wired light fixture on the network. One
//! output pin switches the light's power relay, one input pin reads an
//! ambient light sensor, and both are exposed over a JSON HTTP API.
//!
//! ## Endpoints
//!
//! - `GET /` - greeting text
//! - `GET /light/intensity` - `{"Value": 0 | 1}`, `1` when the sensor sees light
//! - `GET /light/power` - `{"On": bool}`, the last commanded state
//! - `POST /light/power` - body `{"On": bool}`, switches the relay
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pi_lights::{gpio::MockGpio, start_web_server, LightController, PinConfig, WebConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gpio = Arc::new(MockGpio::new());
//!     let light = Arc::new(LightController::initialize(gpio, PinConfig::default()).await?);
//!
//!     start_web_server(WebConfig::default(), light).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gpio;
pub mod light;
pub mod web;

// Re-export public API
pub use error::{LightError, Result};
pub use gpio::{open_gpio, Gpio, Level, MockGpio, PinMode};
pub use light::{Intensity, LightController, PinConfig};

#[cfg(feature = "gpio")]
pub use gpio::RaspberryPiGpio;

pub use web::{create_app, start_web_server, AppState, WebConfig};

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 10000;

/// BCM pin driving the power relay (wiringPi pin 7)
pub const DEFAULT_POWER_PIN: u8 = 4;

/// BCM pin reading the light sensor (wiringPi pin 1)
pub const DEFAULT_LIGHT_PIN: u8 = 18;

/// Text served at `/`
pub const GREETING: &str = "Welcome to Pi Lights!";

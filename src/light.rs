//! The light fixture: one power relay output and one intensity sensor input.

use crate::error::{LightError, Result};
use crate::gpio::{is_pin_available, Gpio, Level, PinMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Which header pins the fixture is wired to (BCM numbering).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinConfig {
    /// Output pin driving the power relay
    pub power_pin: u8,
    /// Input pin connected to the light sensor
    pub light_pin: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            power_pin: crate::DEFAULT_POWER_PIN,
            light_pin: crate::DEFAULT_LIGHT_PIN,
        }
    }
}

impl PinConfig {
    pub fn new(power_pin: u8, light_pin: u8) -> Self {
        Self {
            power_pin,
            light_pin,
        }
    }

    /// Both pins must be on the header and distinct.
    pub fn validate(&self) -> Result<()> {
        for pin in [self.power_pin, self.light_pin] {
            if !is_pin_available(pin) {
                return Err(LightError::InvalidPin(pin));
            }
        }
        if self.power_pin == self.light_pin {
            return Err(LightError::config_error(format!(
                "power and light sensor cannot share pin {}",
                self.power_pin
            )));
        }
        Ok(())
    }
}

/// Ambient light reading, `1` when bright and `0` when dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intensity(pub u8);

impl Intensity {
    /// The sensor pulls its output low in light, so low reads as bright.
    pub fn from_level(level: Level) -> Self {
        match level {
            Level::Low => Intensity(1),
            Level::High => Intensity(0),
        }
    }
}

/// Owns the GPIO binding and the commanded power state.
pub struct LightController {
    gpio: Arc<dyn Gpio>,
    pins: PinConfig,
    power: Mutex<bool>,
}

impl LightController {
    /// Create a controller with the power state off. Hardware is not
    /// touched until [`LightController::set_power`] or a read.
    pub fn new(gpio: Arc<dyn Gpio>, pins: PinConfig) -> Result<Self> {
        pins.validate()?;
        Ok(Self {
            gpio,
            pins,
            power: Mutex::new(false),
        })
    }

    /// Create a controller and force the relay off, so the pin and the
    /// stored state agree from the first request on.
    pub async fn initialize(gpio: Arc<dyn Gpio>, pins: PinConfig) -> Result<Self> {
        let light = Self::new(gpio, pins)?;
        light.set_power(false).await?;
        Ok(light)
    }

    pub fn pins(&self) -> PinConfig {
        self.pins
    }

    /// Sample the light sensor.
    pub fn intensity(&self) -> Result<Intensity> {
        self.gpio.set_mode(self.pins.light_pin, PinMode::Input)?;
        let level = self.gpio.read(self.pins.light_pin)?;
        let intensity = Intensity::from_level(level);
        info!("Intensity: {}", intensity.0);
        Ok(intensity)
    }

    /// Last commanded power state.
    pub async fn power(&self) -> bool {
        let on = *self.power.lock().await;
        info!("Power: {}", on);
        on
    }

    /// Drive the relay and record the new state.
    ///
    /// The stored state only changes once the pin write succeeded.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        info!("Setting Power: {}", on);
        let mut power = self.power.lock().await;

        self.gpio.set_mode(self.pins.power_pin, PinMode::Output)?;
        self.gpio.write(self.pins.power_pin, Level::from(on))?;

        *power = on;
        Ok(())
    }
}

impl std::fmt::Debug for LightController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightController")
            .field("gpio", &self.gpio.name())
            .field("pins", &self.pins)
            .finish_non_exhaustive()
    }
}

//! GPIO (General Purpose Input/Output) access for the light fixture.
//!
//! The rest of the crate only talks to the [`Gpio`] trait. On a Raspberry Pi
//! built with the `gpio` feature it is backed by `rppal`; everywhere else, and
//! in tests, [`MockGpio`] keeps an in-memory pin bank.

use crate::error::{LightError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Highest BCM pin exposed on the 40-pin header.
pub const MAX_BCM_PIN: u8 = 27;

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => f.write_str("low"),
            Level::High => f.write_str("high"),
        }
    }
}

/// Direction a pin is configured for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Input => f.write_str("input"),
            PinMode::Output => f.write_str("output"),
        }
    }
}

/// Minimal hardware surface the light needs.
///
/// Implementations use interior mutability so a single instance can be
/// shared between request handlers.
pub trait Gpio: Send + Sync {
    /// Configure the direction of a pin, claiming it on first use.
    fn set_mode(&self, pin: u8, mode: PinMode) -> Result<()>;

    /// Read the logic level of an input pin.
    fn read(&self, pin: u8) -> Result<Level>;

    /// Drive an output pin to the given level.
    fn write(&self, pin: u8, level: Level) -> Result<()>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;
}

/// Check that a pin number is on the header.
pub fn is_pin_available(pin: u8) -> bool {
    pin <= MAX_BCM_PIN
}

fn lock_pins<T>(pins: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    pins.lock()
        .map_err(|_| LightError::gpio_error("pin table lock poisoned"))
}

#[cfg(feature = "gpio")]
mod raspberry_pi {
    use super::*;
    use rppal::gpio::{self as hw, IoPin};
    use std::collections::hash_map::Entry;

    impl From<PinMode> for hw::Mode {
        fn from(mode: PinMode) -> Self {
            match mode {
                PinMode::Input => hw::Mode::Input,
                PinMode::Output => hw::Mode::Output,
            }
        }
    }

    impl From<hw::Level> for Level {
        fn from(level: hw::Level) -> Self {
            match level {
                hw::Level::Low => Level::Low,
                hw::Level::High => Level::High,
            }
        }
    }

    impl From<Level> for hw::Level {
        fn from(level: Level) -> Self {
            match level {
                Level::Low => hw::Level::Low,
                Level::High => hw::Level::High,
            }
        }
    }

    struct ClaimedPin {
        pin: IoPin,
        mode: PinMode,
    }

    /// Raspberry Pi GPIO provider using rppal.
    pub struct RaspberryPiGpio {
        gpio: hw::Gpio,
        pins: Mutex<HashMap<u8, ClaimedPin>>,
    }

    impl RaspberryPiGpio {
        /// Initialise the GPIO peripheral. Call once per process.
        pub fn new() -> Result<Self> {
            let gpio = hw::Gpio::new().map_err(|e| {
                LightError::gpio_error(format!("Failed to initialize GPIO: {}", e))
            })?;

            Ok(Self {
                gpio,
                pins: Mutex::new(HashMap::new()),
            })
        }

        fn claimed<'a>(
            pins: &'a mut HashMap<u8, ClaimedPin>,
            pin: u8,
            mode: PinMode,
        ) -> Result<&'a mut IoPin> {
            match pins.get_mut(&pin) {
                Some(claimed) if claimed.mode == mode => Ok(&mut claimed.pin),
                _ => Err(LightError::PinNotConfigured { pin, mode }),
            }
        }
    }

    impl Gpio for RaspberryPiGpio {
        fn set_mode(&self, pin: u8, mode: PinMode) -> Result<()> {
            if !is_pin_available(pin) {
                return Err(LightError::InvalidPin(pin));
            }

            let mut pins = lock_pins(&self.pins)?;
            match pins.entry(pin) {
                Entry::Occupied(mut entry) => {
                    let claimed = entry.get_mut();
                    if claimed.mode != mode {
                        claimed.pin.set_mode(mode.into());
                        claimed.mode = mode;
                    }
                }
                Entry::Vacant(entry) => {
                    let mut io = self
                        .gpio
                        .get(pin)
                        .map_err(|e| {
                            LightError::gpio_error(format!("Failed to access pin {}: {}", pin, e))
                        })?
                        .into_io(mode.into());
                    // Keep the relay where we left it when the process exits.
                    io.set_reset_on_drop(false);
                    entry.insert(ClaimedPin { pin: io, mode });
                }
            }
            Ok(())
        }

        fn read(&self, pin: u8) -> Result<Level> {
            let mut pins = lock_pins(&self.pins)?;
            let io = Self::claimed(&mut pins, pin, PinMode::Input)?;
            Ok(io.read().into())
        }

        fn write(&self, pin: u8, level: Level) -> Result<()> {
            let mut pins = lock_pins(&self.pins)?;
            let io = Self::claimed(&mut pins, pin, PinMode::Output)?;
            io.write(level.into());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "rppal"
        }
    }
}

#[cfg(feature = "gpio")]
pub use raspberry_pi::RaspberryPiGpio;

#[derive(Debug, Clone, Copy)]
struct MockPin {
    mode: PinMode,
    level: Level,
}

/// In-memory GPIO bank for hosts without GPIO and for tests.
///
/// Input levels come from
/// [`MockGpio::set_input_level`]; unset pins read low.
#[derive(Debug, Default)]
pub struct MockGpio {
    pins: Mutex<HashMap<u8, MockPin>>,
    external: Mutex<HashMap<u8, Level>>,
    faulty: AtomicBool,
}

impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the external circuit driving `pin` to `level`.
    pub fn set_input_level(&self, pin: u8, level: Level) -> Result<()> {
        lock_pins(&self.external)?.insert(pin, level);
        Ok(())
    }

    /// Make every subsequent operation fail, as a disconnected bus would.
    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.store(faulty, Ordering::SeqCst);
    }

    /// Current mode of a pin, `None` if never configured.
    pub fn mode(&self, pin: u8) -> Result<Option<PinMode>> {
        Ok(lock_pins(&self.pins)?.get(&pin).map(|p| p.mode))
    }

    /// Last level written to an output pin.
    pub fn output_level(&self, pin: u8) -> Result<Option<Level>> {
        let pins = lock_pins(&self.pins)?;
        Ok(pins
            .get(&pin)
            .filter(|p| p.mode == PinMode::Output)
            .map(|p| p.level))
    }

    fn check_fault(&self) -> Result<()> {
        if self.faulty.load(Ordering::SeqCst) {
            return Err(LightError::gpio_error("mock GPIO bus fault"));
        }
        Ok(())
    }
}

impl Gpio for MockGpio {
    fn set_mode(&self, pin: u8, mode: PinMode) -> Result<()> {
        self.check_fault()?;
        if !is_pin_available(pin) {
            return Err(LightError::InvalidPin(pin));
        }

        let mut pins = lock_pins(&self.pins)?;
        let entry = pins.entry(pin).or_insert(MockPin {
            mode,
            level: Level::Low,
        });
        entry.mode = mode;
        debug!("mock GPIO pin {} set to {}", pin, mode);
        Ok(())
    }

    fn read(&self, pin: u8) -> Result<Level> {
        self.check_fault()?;
        let pins = lock_pins(&self.pins)?;
        match pins.get(&pin) {
            Some(p) if p.mode == PinMode::Input => {}
            _ => {
                return Err(LightError::PinNotConfigured {
                    pin,
                    mode: PinMode::Input,
                })
            }
        }
        drop(pins);

        let external = lock_pins(&self.external)?;
        Ok(external.get(&pin).copied().unwrap_or(Level::Low))
    }

    fn write(&self, pin: u8, level: Level) -> Result<()> {
        self.check_fault()?;
        let mut pins = lock_pins(&self.pins)?;
        match pins.get_mut(&pin) {
            Some(p) if p.mode == PinMode::Output => {
                p.level = level;
                debug!("mock GPIO pin {} driven {}", pin, level);
                Ok(())
            }
            _ => Err(LightError::PinNotConfigured {
                pin,
                mode: PinMode::Output,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Open the GPIO binding for this process.
///
/// Hardware is used only when the crate was built with the `gpio` feature
/// and `use_hardware` is set; otherwise the mock bank is returned.
pub fn open_gpio(use_hardware: bool) -> Result<Arc<dyn Gpio>> {
    if use_hardware {
        #[cfg(feature = "gpio")]
        return Ok(Arc::new(RaspberryPiGpio::new()?));

        #[cfg(not(feature = "gpio"))]
        tracing::warn!("GPIO support not compiled in, falling back to mock pins");
    }

    Ok(Arc::new(MockGpio::new()))
}

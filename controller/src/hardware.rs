use std::collections::HashMap;
use std::time::Duration;

use log::{info, warn};
use rppal::gpio::{Gpio, OutputPin};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PWM_PERIOD_MS: u64 = 20;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("cannot connect to GPIO: {0}")]
    Connect(String),

    #[error("GPIO {pin}: {reason}")]
    Pulse { pin: u8, reason: String },
}

/// Pulse-width output for a set of servo pins.
///
/// Backends connect in their constructor and disconnect in `release`, which
/// they also call on drop.
pub trait ServoBus {
    /// Drives `pin` with `pulse_us` microsecond pulses.
    fn set_pulse(&mut self, pin: u8, pulse_us: u32) -> Result<(), HardwareError>;

    /// Stops every pin and closes the connection. Safe to call twice.
    fn release(&mut self);
}

impl<B: ServoBus + ?Sized> ServoBus for Box<B> {
    fn set_pulse(&mut self, pin: u8, pulse_us: u32) -> Result<(), HardwareError> {
        (**self).set_pulse(pin, pulse_us)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Software PWM through the GPIO character device.
    #[default]
    Gpio,
    /// The pigpio library (needs the `pigpio` feature).
    Pigpio,
}

pub fn open_bus(pins: &[u8], backend: Backend) -> Result<Box<dyn ServoBus>, HardwareError> {
    match backend {
        Backend::Gpio => Ok(Box::new(GpioBus::connect(pins)?)),
        #[cfg(feature = "pigpio")]
        Backend::Pigpio => Ok(Box::new(pigpio::PigpioBus::connect(pins)?)),
        #[cfg(not(feature = "pigpio"))]
        Backend::Pigpio => Err(HardwareError::Connect(String::from(
            "built without pigpio support",
        ))),
    }
}

/// Connects and disconnects again without claiming any pin.
pub fn check_connection(backend: Backend) -> Result<(), HardwareError> {
    match backend {
        Backend::Gpio => {
            Gpio::new().map_err(|e| HardwareError::Connect(e.to_string()))?;
            Ok(())
        }
        #[cfg(feature = "pigpio")]
        Backend::Pigpio => pigpio::check_connection(),
        #[cfg(not(feature = "pigpio"))]
        Backend::Pigpio => Err(HardwareError::Connect(String::from(
            "built without pigpio support",
        ))),
    }
}

/// A bus with no hardware behind it, for reading stored positions only.
pub struct DetachedBus;

impl ServoBus for DetachedBus {
    fn set_pulse(&mut self, pin: u8, _pulse_us: u32) -> Result<(), HardwareError> {
        Err(HardwareError::Pulse { pin, reason: String::from("not connected") })
    }

    fn release(&mut self) {}
}

pub struct GpioBus {
    pins: HashMap<u8, OutputPin>,
}

impl GpioBus {
    pub fn connect(pin_numbers: &[u8]) -> Result<Self, HardwareError> {
        let gpio = Gpio::new().map_err(|e| HardwareError::Connect(e.to_string()))?;
        let mut pins = HashMap::new();

        for &pin_number in pin_numbers {
            let pin = gpio
                .get(pin_number)
                .map_err(|e| HardwareError::Connect(format!("GPIO {}: {}", pin_number, e)))?
                .into_output();
            pins.insert(pin_number, pin);
        }

        info!("GPIO connected, servo pins {:?}", pin_numbers);
        Ok(Self { pins })
    }
}

impl ServoBus for GpioBus {
    fn set_pulse(&mut self, pin: u8, pulse_us: u32) -> Result<(), HardwareError> {
        let output = self.pins.get_mut(&pin).ok_or_else(|| HardwareError::Pulse {
            pin,
            reason: String::from("pin is not connected"),
        })?;

        output
            .set_pwm(
                Duration::from_millis(PWM_PERIOD_MS),
                Duration::from_micros(pulse_us.into()),
            )
            .map_err(|e| HardwareError::Pulse { pin, reason: e.to_string() })
    }

    fn release(&mut self) {
        if self.pins.is_empty() {
            return;
        }
        for (pin, output) in self.pins.iter_mut() {
            if let Err(e) = output.clear_pwm() {
                warn!("GPIO {}: could not stop PWM: {}", pin, e);
            }
        }
        // dropped pins are reset to their previous mode
        self.pins.clear();
        info!("GPIO released");
    }
}

impl Drop for GpioBus {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(feature = "pigpio")]
mod pigpio {
    use log::{info, warn};
    use rust_pigpio::pwm::servo;
    use rust_pigpio::{initialize, set_mode, terminate, OUTPUT};

    use super::{HardwareError, ServoBus};

    pub fn check_connection() -> Result<(), HardwareError> {
        initialize().map_err(HardwareError::Connect)?;
        terminate();
        Ok(())
    }

    pub struct PigpioBus {
        pins: Vec<u8>,
        connected: bool,
    }

    impl PigpioBus {
        pub fn connect(pins: &[u8]) -> Result<Self, HardwareError> {
            initialize().map_err(HardwareError::Connect)?;

            // from here on `Drop` terminates the library on failure
            let bus = PigpioBus { pins: pins.to_vec(), connected: true };
            for &pin in pins {
                set_mode(pin as u32, OUTPUT)
                    .map_err(|e| HardwareError::Connect(format!("GPIO {}: {}", pin, e)))?;
            }

            info!("pigpio connected, servo pins {:?}", pins);
            Ok(bus)
        }
    }

    impl ServoBus for PigpioBus {
        fn set_pulse(&mut self, pin: u8, pulse_us: u32) -> Result<(), HardwareError> {
            if !self.connected || !self.pins.contains(&pin) {
                return Err(HardwareError::Pulse { pin, reason: String::from("pin is not connected") });
            }
            servo(pin as u32, pulse_us).map_err(|reason| HardwareError::Pulse { pin, reason })
        }

        fn release(&mut self) {
            if !self.connected {
                return;
            }
            for &pin in &self.pins {
                // a zero pulse width switches the servo output off
                if let Err(e) = servo(pin as u32, 0) {
                    warn!("GPIO {}: could not stop servo: {}", pin, e);
                }
            }
            terminate();
            self.connected = false;
            info!("pigpio connection closed");
        }
    }

    impl Drop for PigpioBus {
        fn drop(&mut self) {
            self.release();
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::{HardwareError, ServoBus};

    /// Records every pulse and fails on the pins it is told to.
    #[derive(Debug, Default)]
    pub struct RecordingBus {
        pub calls: Vec<(u8, u32)>,
        pub failing_pins: Vec<u8>,
        pub released: usize,
    }

    impl RecordingBus {
        pub fn failing_on(pin: u8) -> Self {
            RecordingBus { failing_pins: vec![pin], ..Default::default() }
        }
    }

    impl ServoBus for RecordingBus {
        fn set_pulse(&mut self, pin: u8, pulse_us: u32) -> Result<(), HardwareError> {
            if self.failing_pins.contains(&pin) {
                return Err(HardwareError::Pulse { pin, reason: String::from("daemon unreachable") });
            }
            self.calls.push((pin, pulse_us));
            Ok(())
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }
}

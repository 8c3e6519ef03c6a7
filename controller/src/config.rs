use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use servocmd::{CHANNEL_COUNT, DEFAULT_PORT, PulseConfig, PulseRangeError, SERVO_MAX_ANGLE};
use thiserror::Error;

use crate::hardware::Backend;

pub const DEFAULT_CONFIG_PATH: &str = "servo.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GPIO {0} is assigned to more than one servo")]
    DuplicatePin(u8),

    #[error("initial angle {0} is outside the servo range")]
    InitialAngle(u16),

    #[error(transparent)]
    Pulse(#[from] PulseRangeError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub bind_address: String,
    pub port: u16,
    /// GPIO pin of servo 1 to 4.
    pub pins: [u8; CHANNEL_COUNT],
    pub initial_angle: u16,
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
    /// Drive every servo to `initial_angle` once the server is up.
    pub home_on_start: bool,
    pub backend: Backend,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            bind_address: String::from("0.0.0.0"),
            port: DEFAULT_PORT,
            pins: [12, 13, 18, 19],
            initial_angle: 90,
            min_pulse_us: PulseConfig::STANDARD.min_pulse_us(),
            max_pulse_us: PulseConfig::STANDARD.max_pulse_us(),
            home_on_start: true,
            backend: Backend::default(),
        }
    }
}

impl ControllerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let loaded: ControllerConfig = serde_json::from_str(&content)?;
        Ok(loaded)
    }

    /// Defaults when there is no file at `path`.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded {}", path.display());
                Ok(config)
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("No {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, pin) in self.pins.iter().enumerate() {
            if self.pins[..i].contains(pin) {
                return Err(ConfigError::DuplicatePin(*pin));
            }
        }
        if self.initial_angle > SERVO_MAX_ANGLE {
            return Err(ConfigError::InitialAngle(self.initial_angle));
        }
        self.pulse()?;
        Ok(())
    }

    pub fn pulse(&self) -> Result<PulseConfig, PulseRangeError> {
        PulseConfig::with_pulse_range(self.min_pulse_us, self.max_pulse_us)
    }
}

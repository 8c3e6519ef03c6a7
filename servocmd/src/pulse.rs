use thiserror::Error;

use crate::{SERVO_MAX_ANGLE, SERVO_MIN_ANGLE};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pulse range {min_pulse_us}-{max_pulse_us}us is empty or inverted")]
pub struct PulseRangeError {
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
}

/// Linear angle to pulse-width mapping of a hobby servo.
///
/// Only built through `STANDARD` or `with_pulse_range`, so both spans are
/// always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseConfig {
    min_pulse_us: u32,
    max_pulse_us: u32,
    min_angle: u16,
    max_angle: u16,
}

impl PulseConfig {
    pub const STANDARD: PulseConfig = PulseConfig {
        min_pulse_us: 500,
        max_pulse_us: 2500,
        min_angle: SERVO_MIN_ANGLE,
        max_angle: SERVO_MAX_ANGLE,
    };

    /// Standard angle range with different pulse endpoints.
    pub fn with_pulse_range(min_pulse_us: u32, max_pulse_us: u32) -> Result<Self, PulseRangeError> {
        if min_pulse_us >= max_pulse_us {
            return Err(PulseRangeError { min_pulse_us, max_pulse_us });
        }
        Ok(PulseConfig {
            min_pulse_us,
            max_pulse_us,
            ..Self::STANDARD
        })
    }

    pub fn min_pulse_us(&self) -> u32 {
        self.min_pulse_us
    }

    pub fn max_pulse_us(&self) -> u32 {
        self.max_pulse_us
    }

    /// Pulse width in microseconds for `angle`, clamped to the angle range.
    ///
    /// Integer interpolation, so both endpoints and the midpoint are exact.
    pub fn pulse_for(&self, angle: u16) -> u32 {
        let angle = angle.clamp(self.min_angle, self.max_angle);
        let span_us = self.max_pulse_us - self.min_pulse_us;
        let span_deg = (self.max_angle - self.min_angle) as u32;
        self.min_pulse_us + (angle - self.min_angle) as u32 * span_us / span_deg
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_midpoint_are_exact() {
        let pulse = PulseConfig::default();
        assert_eq!(pulse.pulse_for(0), 500);
        assert_eq!(pulse.pulse_for(90), 1500);
        assert_eq!(pulse.pulse_for(180), 2500);
    }

    #[test]
    fn mapping_is_monotonic() {
        let pulse = PulseConfig::default();
        let widths: Vec<u32> = (0..=180).map(|a| pulse.pulse_for(a)).collect();
        assert!(widths.windows(2).all(|w| w[0] <= w[1]));
        assert!(widths.iter().all(|&w| (500..=2500).contains(&w)));
    }

    #[test]
    fn custom_range_keeps_endpoints() {
        let pulse = PulseConfig::with_pulse_range(1000, 2000).unwrap();
        assert_eq!(pulse.pulse_for(0), 1000);
        assert_eq!(pulse.pulse_for(90), 1500);
        assert_eq!(pulse.pulse_for(180), 2000);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(PulseConfig::with_pulse_range(2000, 1000).is_err());
        assert!(PulseConfig::with_pulse_range(1500, 1500).is_err());
    }

    #[test]
    fn narrowest_range_stays_within_bounds() {
        let pulse = PulseConfig::with_pulse_range(1499, 1500).unwrap();
        assert_eq!((pulse.min_pulse_us(), pulse.max_pulse_us()), (1499, 1500));
        assert_eq!(pulse.pulse_for(0), 1499);
        assert_eq!(pulse.pulse_for(180), 1500);
        assert!((0..=180).all(|a| (1499..=1500).contains(&pulse.pulse_for(a))));
    }

    #[test]
    fn angles_past_the_range_are_clamped() {
        assert_eq!(PulseConfig::default().pulse_for(250), 2500);
    }
}

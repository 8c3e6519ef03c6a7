use std::fmt;

use log::{debug, warn};
use servocmd::{CHANNEL_COUNT, Command, Directive, PulseConfig, SERVO_MAX_ANGLE, SERVO_MIN_ANGLE};

use crate::hardware::ServoBus;

/// Servo number as printed to the operator, 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel(u8);

impl Channel {
    pub fn from_index(index: usize) -> Self {
        Channel(index as u8 + 1)
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoState {
    pub current_angle: u16,
    pub pin: u8,
}

/// What happened to one channel when a command was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Moved(u16),
    Kept(u16),
    Failed(String),
}

/// Owns the servo positions and is the only writer to the bus.
pub struct ServoManager<B: ServoBus> {
    bus: B,
    pulse: PulseConfig,
    servos: [ServoState; CHANNEL_COUNT],
}

impl<B: ServoBus> ServoManager<B> {
    /// Every channel starts at `initial_angle`, clamped to the servo range.
    /// Nothing is sent to the bus until a command (or `home`) asks for it.
    pub fn new(bus: B, pins: [u8; CHANNEL_COUNT], pulse: PulseConfig, initial_angle: u16) -> Self {
        let current_angle = initial_angle.clamp(SERVO_MIN_ANGLE, SERVO_MAX_ANGLE);
        let servos = pins.map(|pin| ServoState { current_angle, pin });
        ServoManager { bus, pulse, servos }
    }

    /// Applies each directive to its channel independently: a failing channel
    /// keeps its stored angle and does not stop the others.
    pub fn apply(&mut self, command: &Command) -> [ChannelOutcome; CHANNEL_COUNT] {
        let mut outcomes: [ChannelOutcome; CHANNEL_COUNT] =
            std::array::from_fn(|i| ChannelOutcome::Kept(self.servos[i].current_angle));

        for (index, directive) in command.iter().enumerate() {
            if let Directive::SetAngle(angle) = *directive {
                outcomes[index] = self.move_to(index, angle);
            }
        }
        outcomes
    }

    /// Drives every servo to the angle already stored for it.
    pub fn home(&mut self) -> [ChannelOutcome; CHANNEL_COUNT] {
        std::array::from_fn(|index| {
            let angle = self.servos[index].current_angle;
            self.move_to(index, angle)
        })
    }

    fn move_to(&mut self, index: usize, angle: u16) -> ChannelOutcome {
        let servo = &mut self.servos[index];
        let pulse_us = self.pulse.pulse_for(angle);
        debug!("servo {} (GPIO {}) -> {}us", Channel::from_index(index), servo.pin, pulse_us);

        match self.bus.set_pulse(servo.pin, pulse_us) {
            Ok(()) => {
                servo.current_angle = angle;
                ChannelOutcome::Moved(angle)
            }
            Err(e) => {
                warn!("servo {} not moved: {}", Channel::from_index(index), e);
                ChannelOutcome::Failed(e.to_string())
            }
        }
    }

    /// Last commanded angle of every channel. Touches neither state nor bus.
    pub fn status(&self) -> [u16; CHANNEL_COUNT] {
        self.servos.map(|servo| servo.current_angle)
    }

    pub fn pins(&self) -> [u8; CHANNEL_COUNT] {
        self.servos.map(|servo| servo.pin)
    }

    #[cfg(test)]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn release(&mut self) {
        self.bus.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::fake::RecordingBus;
    use servocmd::parse;

    const PINS: [u8; 4] = [12, 13, 18, 19];

    fn manager(bus: RecordingBus) -> ServoManager<RecordingBus> {
        ServoManager::new(bus, PINS, PulseConfig::default(), 90)
    }

    #[test]
    fn status_before_any_command_is_default() {
        let manager = manager(RecordingBus::default());
        assert_eq!(manager.status(), [90, 90, 90, 90]);
        assert!(manager.bus().calls.is_empty());
    }

    #[test]
    fn same_angle_everywhere_moves_every_servo() {
        let mut manager = manager(RecordingBus::default());
        for v in [0, 1, 45, 90, 179, 180] {
            let outcomes = manager.apply(&parse(&format!("{v},{v},{v},{v}")).unwrap());
            let expected: [ChannelOutcome; 4] = std::array::from_fn(|_| ChannelOutcome::Moved(v));
            assert_eq!(outcomes, expected);
            assert_eq!(manager.status(), [v; 4]);
        }
    }

    #[test]
    fn mixed_command_moves_and_keeps() {
        let mut manager = manager(RecordingBus::default());
        let outcomes = manager.apply(&parse("90,45, ,180").unwrap());
        assert_eq!(
            outcomes,
            [
                ChannelOutcome::Moved(90),
                ChannelOutcome::Moved(45),
                ChannelOutcome::Kept(90),
                ChannelOutcome::Moved(180),
            ]
        );
        assert_eq!(manager.bus().calls, vec![(12, 1500), (13, 1000), (19, 2500)]);
        assert_eq!(manager.status(), [90, 45, 90, 180]);
    }

    #[test]
    fn blank_command_keeps_prior_angles_without_hardware_calls() {
        let mut manager = manager(RecordingBus::default());
        manager.apply(&parse("10,20,30,40").unwrap());
        let calls_before = manager.bus().calls.len();

        let outcomes = manager.apply(&parse(" , , , ").unwrap());
        assert_eq!(
            outcomes,
            [
                ChannelOutcome::Kept(10),
                ChannelOutcome::Kept(20),
                ChannelOutcome::Kept(30),
                ChannelOutcome::Kept(40),
            ]
        );
        assert_eq!(manager.bus().calls.len(), calls_before);
        assert_eq!(manager.status(), [10, 20, 30, 40]);
    }

    #[test]
    fn hardware_failure_is_confined_to_its_channel() {
        let mut manager = manager(RecordingBus::failing_on(13));
        let outcomes = manager.apply(&parse("10,20,30,40").unwrap());

        assert_eq!(outcomes[0], ChannelOutcome::Moved(10));
        assert!(matches!(&outcomes[1], ChannelOutcome::Failed(reason) if reason.contains("GPIO 13")));
        assert_eq!(outcomes[2], ChannelOutcome::Moved(30));
        assert_eq!(outcomes[3], ChannelOutcome::Moved(40));
        assert_eq!(manager.status(), [10, 90, 30, 40]);
    }

    #[test]
    fn later_failure_leaves_earlier_state_alone() {
        let mut manager = manager(RecordingBus::default());
        manager.apply(&parse("10,20,30,40").unwrap());

        manager.bus.failing_pins = PINS.to_vec();
        let outcomes = manager.apply(&parse("100,100,100,100").unwrap());
        assert!(outcomes.iter().all(|o| matches!(o, ChannelOutcome::Failed(_))));
        assert_eq!(manager.status(), [10, 20, 30, 40]);
    }

    #[test]
    fn home_drives_every_pin_to_its_stored_angle() {
        let mut manager = manager(RecordingBus::default());
        let outcomes = manager.home();
        let expected: [ChannelOutcome; 4] = std::array::from_fn(|_| ChannelOutcome::Moved(90));
        assert_eq!(outcomes, expected);
        assert_eq!(
            manager.bus().calls,
            vec![(12, 1500), (13, 1500), (18, 1500), (19, 1500)]
        );
    }

    #[test]
    fn initial_angle_is_clamped() {
        let manager = ServoManager::new(RecordingBus::default(), PINS, PulseConfig::default(), 400);
        assert_eq!(manager.status(), [180; 4]);
    }

    #[test]
    fn release_reaches_the_bus() {
        let mut manager = manager(RecordingBus::default());
        manager.release();
        assert_eq!(manager.bus().released, 1);
    }
}

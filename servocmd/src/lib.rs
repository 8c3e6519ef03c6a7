//! Wire format shared by the servo controller and the remote.
//!
//! A command is one line of text, `angle1,angle2,angle3,angle4`, where an
//! empty (or blank) field keeps that servo where it is.

mod command;
mod pulse;

pub use command::{Command, Directive, ParseError, format_command, parse};
pub use pulse::{PulseConfig, PulseRangeError};

/// Number of servo channels addressed by one command.
pub const CHANNEL_COUNT: usize = 4;

pub const SERVO_MIN_ANGLE: u16 = 0;
pub const SERVO_MAX_ANGLE: u16 = 180;

/// UDP port the controller listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 5005;

use std::fmt;
use std::num::IntErrorKind;
use std::ops::Index;

use thiserror::Error;

use crate::{CHANNEL_COUNT, SERVO_MAX_ANGLE, SERVO_MIN_ANGLE};

/// What one field of a command asks of its servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    SetAngle(u16),
    KeepCurrent,
}

/// Four directives, position `i` addressing servo `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    directives: [Directive; CHANNEL_COUNT],
}

impl Command {
    pub fn new(directives: [Directive; CHANNEL_COUNT]) -> Self {
        Command { directives }
    }

    pub fn directives(&self) -> &[Directive; CHANNEL_COUNT] {
        &self.directives
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter()
    }
}

impl Index<usize> for Command {
    type Output = Directive;

    fn index(&self, index: usize) -> &Directive {
        &self.directives[index]
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_command(self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {} comma-separated values, got {found}", CHANNEL_COUNT)]
    WrongFieldCount { found: usize },

    #[error("field {field_index} ('{field}') is not a whole number")]
    NotANumber { field_index: usize, field: String },

    #[error("field {field_index}: angle {value} is out of range ({}-{})", SERVO_MIN_ANGLE, SERVO_MAX_ANGLE)]
    OutOfRange { field_index: usize, value: i64 },
}

impl ParseError {
    /// Index of the offending field, when the error is about a single field.
    pub fn field_index(&self) -> Option<usize> {
        match self {
            ParseError::WrongFieldCount { .. } => None,
            ParseError::NotANumber { field_index, .. } => Some(*field_index),
            ParseError::OutOfRange { field_index, .. } => Some(*field_index),
        }
    }
}

/// Parses one command line. Any bad field rejects the whole line.
pub fn parse(raw: &str) -> Result<Command, ParseError> {
    let fields: Vec<&str> = raw.split(',').collect();
    if fields.len() != CHANNEL_COUNT {
        return Err(ParseError::WrongFieldCount { found: fields.len() });
    }

    let mut directives = [Directive::KeepCurrent; CHANNEL_COUNT];
    for (field_index, field) in fields.iter().enumerate() {
        directives[field_index] = parse_field(field_index, field)?;
    }

    Ok(Command { directives })
}

fn parse_field(field_index: usize, field: &str) -> Result<Directive, ParseError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(Directive::KeepCurrent);
    }

    let not_a_number = || ParseError::NotANumber {
        field_index,
        field: field.to_string(),
    };

    // `str::parse` would also take a leading '+'
    let digits = field.strip_prefix('-').unwrap_or(field);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_a_number());
    }

    let value = match field.parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => return Err(not_a_number()),
        },
    };

    if value < SERVO_MIN_ANGLE as i64 || value > SERVO_MAX_ANGLE as i64 {
        return Err(ParseError::OutOfRange { field_index, value });
    }

    Ok(Directive::SetAngle(value as u16))
}

/// Renders a command as wire text, a kept channel as a single space.
pub fn format_command(command: &Command) -> String {
    command
        .iter()
        .map(|directive| match directive {
            Directive::SetAngle(angle) => angle.to_string(),
            Directive::KeepCurrent => String::from(" "),
        })
        .collect::<Vec<_>>()
        .join(",")
}

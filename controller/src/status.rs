use std::fmt::Display;
use std::net::SocketAddr;

use chrono::Local;
use serde::Serialize;
use servocmd::CHANNEL_COUNT;

use crate::hardware::ServoBus;
use crate::servo::{Channel, ChannelOutcome, ServoManager};

pub fn message_header(from: SocketAddr, message: &str) -> String {
    format!(
        "[{}] From {}:{} - Message: '{}'",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        from.ip(),
        from.port(),
        message
    )
}

pub fn outcome_lines(
    pins: &[u8; CHANNEL_COUNT],
    outcomes: &[ChannelOutcome; CHANNEL_COUNT],
) -> Vec<String> {
    outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| {
            let servo = Channel::from_index(index);
            let pin = pins[index];
            match outcome {
                ChannelOutcome::Moved(angle) => {
                    format!("✓ Servo {} (GPIO {}) moved to {}°", servo, pin, angle)
                }
                ChannelOutcome::Kept(angle) => {
                    format!("• Servo {} (GPIO {}) kept at {}°", servo, pin, angle)
                }
                ChannelOutcome::Failed(reason) => {
                    format!("✗ Failed to move servo {} (GPIO {}): {}", servo, pin, reason)
                }
            }
        })
        .collect()
}

pub fn rejection_line(reason: &impl Display) -> String {
    format!("✗ Invalid command: {}", reason)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServoReport {
    pub servo: u8,
    pub gpio: u8,
    pub angle: u16,
}

pub fn status_report(
    pins: &[u8; CHANNEL_COUNT],
    angles: &[u16; CHANNEL_COUNT],
) -> Vec<ServoReport> {
    (0..CHANNEL_COUNT)
        .map(|index| ServoReport {
            servo: Channel::from_index(index).number(),
            gpio: pins[index],
            angle: angles[index],
        })
        .collect()
}

/// Current positions, read from the manager alone.
pub fn query<B: ServoBus>(manager: &ServoManager<B>) -> Vec<ServoReport> {
    status_report(&manager.pins(), &manager.status())
}

pub fn status_lines(report: &[ServoReport]) -> Vec<String> {
    report
        .iter()
        .map(|r| format!("Servo {} (GPIO {}): {}°", r.servo, r.gpio, r.angle))
        .collect()
}

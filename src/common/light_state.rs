use crate::common::commands::{self, CommandBytes};
use crate::error::Error;
use serde_derive::{Deserialize, Serialize};

/// How a lighting device moves to a new level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    Instant,
    Ramp,
}

/// The state of a lighting device.
///
/// `level` is quantised to the nearest 1/255 on the wire; a level that
/// quantises to zero is encoded as an explicit off command.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub level: f64,
    pub change: Change,
}

pub fn level_to_byte(level: f64) -> u8 {
    (level * 255.0).round() as u8
}

pub fn byte_to_level(byte: u8) -> f64 {
    f64::from(byte) / 255.0
}

impl LightState {
    pub fn off() -> LightState {
        LightState {
            level: 0.0,
            change: Change::Instant,
        }
    }

    /// Translates the state into the command pair that produces it.
    ///
    /// Fails with `InvalidArgument` when the level falls outside [0, 1].
    pub fn command_bytes(&self) -> Result<CommandBytes, Error> {
        if !(0.0..=1.0).contains(&self.level) {
            return Err(Error::InvalidArgument(format!(
                "light level {} out of range [0, 1]",
                self.level
            )));
        }
        let byte = level_to_byte(self.level);
        Ok(match (byte, self.change) {
            (0, Change::Instant) => commands::light_off(),
            (0, Change::Ramp) => commands::light_off_fast(),
            (level, Change::Instant) => commands::light_on_fast(level),
            (level, Change::Ramp) => commands::light_on(level),
        })
    }

    /// The inverse of `command_bytes`. Returns `None` for command pairs
    /// that do not describe a light state.
    pub fn from_command_bytes(cmd: CommandBytes) -> Option<LightState> {
        match cmd.cmd1() {
            0x13 => Some(LightState {
                level: 0.0,
                change: Change::Instant,
            }),
            0x14 => Some(LightState {
                level: 0.0,
                change: Change::Ramp,
            }),
            0x12 => Some(LightState {
                level: byte_to_level(cmd.cmd2()),
                change: Change::Instant,
            }),
            0x11 => Some(LightState {
                level: byte_to_level(cmd.cmd2()),
                change: Change::Ramp,
            }),
            _ => None,
        }
    }
}

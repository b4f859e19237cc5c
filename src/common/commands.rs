use std::fmt;

/// The 2-byte command pair carried in every standard or extended message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandBytes(pub u8, pub u8);

pub const BEEP: CommandBytes = CommandBytes(0x30, 0x00);
pub const STATUS_REQUEST: CommandBytes = CommandBytes(0x19, 0x00);
pub const GET_DEVICE_INFO: CommandBytes = CommandBytes(0x2e, 0x00);
pub const SET_DEVICE_INFO: CommandBytes = CommandBytes(0x2e, 0x00);

pub const fn light_on(level: u8) -> CommandBytes {
    CommandBytes(0x11, level)
}

pub const fn light_on_fast(level: u8) -> CommandBytes {
    CommandBytes(0x12, level)
}

pub const fn light_off() -> CommandBytes {
    CommandBytes(0x13, 0x00)
}

pub const fn light_off_fast() -> CommandBytes {
    CommandBytes(0x14, 0x00)
}

impl CommandBytes {
    pub const fn cmd1(&self) -> u8 {
        self.0
    }

    pub const fn cmd2(&self) -> u8 {
        self.1
    }
}

impl fmt::Display for CommandBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}", self.0, self.1)
    }
}

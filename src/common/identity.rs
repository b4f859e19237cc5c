use crate::error::Error;
use core::str::FromStr;
use std::fmt;

/// A 3-byte address naming an Insteon device on the powerline.
///
/// Textual form is three dot-separated hex pairs, e.g. `1a.2b.3c`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Id([u8; 3]);

impl Id {
    pub const fn new(bytes: [u8; 3]) -> Id {
        Id(bytes)
    }

    pub const fn bytes(&self) -> [u8; 3] {
        self.0
    }
}

impl From<[u8; 3]> for Id {
    fn from(bytes: [u8; 3]) -> Id {
        Id(bytes)
    }
}

impl std::cmp::PartialOrd for Id {
    fn partial_cmp(&self, other: &Id) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering follows the big-endian numeric value of the address.
impl std::cmp::Ord for Id {
    fn cmp(&self, other: &Id) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}.{:02x}.{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id, Error> {
        let invalid = || Error::InvalidArgument(format!("invalid device id `{}`", s));
        let mut bytes = [0u8; 3];
        let mut parts = s.split('.');
        for b in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *b = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Id(bytes))
    }
}

impl serde::Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Id, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

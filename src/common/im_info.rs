use crate::common::identity::Id;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Identity and firmware information of the modem itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IMInfo {
    pub id: Id,
    pub category: u8,
    pub subcategory: u8,
    pub firmware_version: u8,
}

impl fmt::Display for IMInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (category {:02x}.{:02x}, firmware {:02x})",
            self.id, self.category, self.subcategory, self.firmware_version
        )
    }
}

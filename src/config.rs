use crate::common::identity::Id;
use crate::error::DynResult;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// A named device, optionally fronting a set of slave devices that follow
/// the primary on state and info updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationDevice {
    pub name: String,
    pub id: Id,
    #[serde(default)]
    pub slave_device_ids: Vec<Id>,
}

/// Device aliases for the control surfaces. Loaded once at start and
/// read-only thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub devices: Vec<ConfigurationDevice>,
}

impl Configuration {
    pub fn lookup_device(&self, name: &str) -> Option<&ConfigurationDevice> {
        self.devices.iter().find(|device| device.name == name)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> DynResult<Configuration> {
        let contents = std::fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }
}

#[cfg(test)]
mod test {
    use super::Configuration;
    use crate::common::identity::Id;

    #[test]
    fn parse_and_lookup() {
        let config: Configuration = serde_json::from_str(
            r#"{
                "devices": [
                    {"name": "kitchen", "id": "11.22.33"},
                    {
                        "name": "hall",
                        "id": "aa.bb.cc",
                        "slave_device_ids": ["aa.bb.cd", "aa.bb.ce"]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert!(config.lookup_device("garage").is_none());
        let kitchen = config.lookup_device("kitchen").unwrap();
        assert_eq!(kitchen.id, Id::new([0x11, 0x22, 0x33]));
        assert!(kitchen.slave_device_ids.is_empty());
        let hall = config.lookup_device("hall").unwrap();
        assert_eq!(hall.slave_device_ids.len(), 2);
    }
}

use crate::common::light_state::{byte_to_level, level_to_byte};
use crate::common::user_data::UserData;
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

// Offsets of the device-info fields inside the extended reply's user data.
const X10_HOUSE_CODE_OFFSET: usize = 2;
const X10_UNIT_OFFSET: usize = 3;
const RAMP_RATE_OFFSET: usize = 4;
const ON_LEVEL_OFFSET: usize = 5;
const LED_BRIGHTNESS_OFFSET: usize = 6;
const SIGNAL_TO_NOISE_OFFSET: usize = 7;
const OPTIONS_OFFSET: usize = 8;

/// Ramp durations indexed by the on-wire ramp-rate byte, slowest first.
const RAMP_RATES_MS: [u64; 32] = [
    540_000, 480_000, 420_000, 360_000, 300_000, 270_000, 240_000, 210_000, 180_000, 150_000,
    120_000, 90_000, 60_000, 47_000, 43_000, 38_500, 34_000, 32_000, 30_000, 28_000, 26_000,
    23_500, 21_500, 19_000, 8_500, 6_500, 4_500, 2_000, 500, 300, 200, 100,
];

pub fn byte_to_ramp_rate(byte: u8) -> Duration {
    let i = usize::from(byte).min(RAMP_RATES_MS.len() - 1);
    Duration::from_millis(RAMP_RATES_MS[i])
}

/// Picks the table entry closest to the requested duration.
pub fn ramp_rate_to_byte(ramp_rate: Duration) -> u8 {
    let ms = ramp_rate.as_millis() as u64;
    let mut best = 0usize;
    let mut best_diff = u64::MAX;
    for (i, entry) in RAMP_RATES_MS.iter().enumerate() {
        let diff = entry.abs_diff(ms);
        if diff < best_diff {
            best = i;
            best_diff = diff;
        }
    }
    best as u8
}

fn serialize_ramp_rate<S>(ramp_rate: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(ramp_rate.as_secs_f64())
}

fn deserialize_ramp_rate<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = <f64 as serde::Deserialize>::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(serde::de::Error::custom("ramp rate must be non-negative"));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Configuration block of a lighting device, as carried by the extended
/// device-info exchange. `ramp_rate` is expressed in seconds in JSON.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub x10_house_code: u8,
    pub x10_unit: u8,
    #[serde(
        serialize_with = "serialize_ramp_rate",
        deserialize_with = "deserialize_ramp_rate"
    )]
    pub ramp_rate: Duration,
    pub on_level: f64,
    pub led_brightness: f64,
    pub signal_to_noise_threshold: u8,
    pub options: u8,
}

impl DeviceInfo {
    pub fn from_user_data(user_data: UserData) -> DeviceInfo {
        DeviceInfo {
            x10_house_code: user_data[X10_HOUSE_CODE_OFFSET],
            x10_unit: user_data[X10_UNIT_OFFSET],
            ramp_rate: byte_to_ramp_rate(user_data[RAMP_RATE_OFFSET]),
            on_level: byte_to_level(user_data[ON_LEVEL_OFFSET]),
            led_brightness: byte_to_level(user_data[LED_BRIGHTNESS_OFFSET]),
            signal_to_noise_threshold: user_data[SIGNAL_TO_NOISE_OFFSET],
            options: user_data[OPTIONS_OFFSET],
        }
    }

    pub fn to_user_data(&self) -> UserData {
        let mut user_data = UserData::default();
        user_data[X10_HOUSE_CODE_OFFSET] = self.x10_house_code;
        user_data[X10_UNIT_OFFSET] = self.x10_unit;
        user_data[RAMP_RATE_OFFSET] = ramp_rate_to_byte(self.ramp_rate);
        user_data[ON_LEVEL_OFFSET] = level_to_byte(self.on_level);
        user_data[LED_BRIGHTNESS_OFFSET] = level_to_byte(self.led_brightness);
        user_data[SIGNAL_TO_NOISE_OFFSET] = self.signal_to_noise_threshold;
        user_data[OPTIONS_OFFSET] = self.options;
        user_data
    }
}

#[cfg(test)]
mod test {
    use super::{byte_to_ramp_rate, ramp_rate_to_byte, DeviceInfo};
    use crate::common::light_state::byte_to_level;
    use std::time::Duration;

    #[test]
    fn ramp_rate_table_endpoints() {
        assert_eq!(byte_to_ramp_rate(0x00), Duration::from_secs(540));
        assert_eq!(byte_to_ramp_rate(0x1f), Duration::from_millis(100));
        assert_eq!(ramp_rate_to_byte(Duration::from_secs(540)), 0x00);
        assert_eq!(ramp_rate_to_byte(Duration::from_millis(100)), 0x1f);
    }

    #[test]
    fn ramp_rate_roundtrips_every_step() {
        for byte in 0..=0x1fu8 {
            assert_eq!(ramp_rate_to_byte(byte_to_ramp_rate(byte)), byte);
        }
    }

    #[test]
    fn ramp_rate_picks_nearest_entry() {
        assert_eq!(ramp_rate_to_byte(Duration::from_secs(500)), 0x01);
        assert_eq!(ramp_rate_to_byte(Duration::from_millis(150)), 0x1e);
        assert_eq!(ramp_rate_to_byte(Duration::from_secs(3600)), 0x00);
        assert_eq!(ramp_rate_to_byte(Duration::ZERO), 0x1f);
    }

    #[test]
    fn out_of_table_bytes_clamp() {
        assert_eq!(byte_to_ramp_rate(0xff), byte_to_ramp_rate(0x1f));
    }

    #[test]
    fn user_data_roundtrip() {
        let info = DeviceInfo {
            x10_house_code: 0x0a,
            x10_unit: 0x03,
            ramp_rate: Duration::from_secs(30),
            on_level: byte_to_level(0xc0),
            led_brightness: byte_to_level(0x40),
            signal_to_noise_threshold: 0x20,
            options: 0x01,
        };
        assert_eq!(DeviceInfo::from_user_data(info.to_user_data()), info);
    }

    #[test]
    fn json_ramp_rate_in_seconds() {
        let info = DeviceInfo {
            x10_house_code: 0,
            x10_unit: 0,
            ramp_rate: Duration::from_millis(500),
            on_level: 1.0,
            led_brightness: 0.0,
            signal_to_noise_threshold: 0,
            options: 0,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["ramp_rate"], serde_json::json!(0.5));
        let back: DeviceInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }
}

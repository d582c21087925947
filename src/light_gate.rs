//! Ambient light gating
//!
//! Each trigger source may be restricted to daylight or darkness. The gate
//! compares a light sensor sample against the configured threshold scaled
//! by [`LIGHT_THRESHOLD_MULTIPLIER`].

/// Factor applied to the configured light threshold
pub const LIGHT_THRESHOLD_MULTIPLIER: u32 = 32;

/// Light condition in which a source is allowed to operate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DayNight {
    /// Operate while the light level is at or below the threshold
    Night = 0,
    /// Operate while the light level is at or above the threshold
    Day = 1,
}

impl DayNight {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Night,
            1 => Self::Day,
            _ => return None,
        })
    }
}

/// Day/night gate of a trigger source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightGate {
    pub day_or_night: DayNight,
    /// Threshold before scaling by [`LIGHT_THRESHOLD_MULTIPLIER`]
    pub threshold: u8,
}

impl LightGate {
    pub const fn new(day_or_night: DayNight, threshold: u8) -> Self {
        Self {
            day_or_night,
            threshold,
        }
    }

    /// Gate that is open in daylight of any level
    pub const fn always_day() -> Self {
        Self::new(DayNight::Day, 0)
    }

    /// Threshold as compared against sensor samples
    pub const fn scaled_threshold(self) -> u32 {
        self.threshold as u32 * LIGHT_THRESHOLD_MULTIPLIER
    }

    /// Returns if operation is allowed at the sampled light level
    pub const fn allows(self, intensity: u32) -> bool {
        light_check(intensity, self.day_or_night, self.threshold)
    }
}

/// Compare a light sample against a day/night threshold
pub const fn light_check(intensity: u32, day_or_night: DayNight, threshold: u8) -> bool {
    let threshold = threshold as u32 * LIGHT_THRESHOLD_MULTIPLIER;
    match day_or_night {
        DayNight::Day => intensity >= threshold,
        DayNight::Night => intensity <= threshold,
    }
}

//! Timer tick conversion
//!
//! Patterns are scheduled in ticks of the hardware timer that drives the
//! output generator. Configuration is expressed in [`Duration`]s and
//! converted once, when a core is created or updated.

use embassy_time::Duration;

/// Low frequency clock used by the output generator and the ms timer.
pub const LFCLK_HZ: u32 = 32_768;

/// Tick rate of a hardware timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate {
    hz: u32,
}

impl TickRate {
    /// The 32768 Hz low frequency clock
    pub const LFCLK: Self = Self::new(LFCLK_HZ);

    /// Create a tick rate from a frequency in Hz
    pub const fn new(hz: u32) -> Self {
        Self { hz }
    }

    /// Frequency of the timer in Hz
    pub const fn hz(self) -> u32 {
        self.hz
    }

    /// Convert milliseconds to ticks, rounding to the nearest tick.
    ///
    /// Saturates at `u32::MAX`.
    pub const fn ticks_from_millis(self, ms: u64) -> u32 {
        let ticks = ms.saturating_mul(self.hz as u64).saturating_add(500) / 1000;
        if ticks > u32::MAX as u64 {
            u32::MAX
        } else {
            ticks as u32
        }
    }

    /// Convert a duration to ticks
    pub fn ticks(self, duration: Duration) -> u32 {
        self.ticks_from_millis(duration.as_millis())
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::LFCLK
    }
}

/// Fixed pulse widths of the camera trigger patterns
#[derive(Debug, Clone, Copy)]
pub struct TriggerTimings {
    /// Shutter press for single shot, multishot and focus
    pub trigger_pulse: Duration,
    /// Closing pulse at the end of a bulb exposure
    pub bulb_pulse: Duration,
    /// Start/stop press for video recording
    pub video_control_pulse: Duration,
    /// Delay after a photo before the residual hold
    pub photo_settle: Duration,
}

impl Default for TriggerTimings {
    fn default() -> Self {
        Self {
            trigger_pulse: Duration::from_millis(250),
            bulb_pulse: Duration::from_millis(250),
            video_control_pulse: Duration::from_millis(250),
            photo_settle: Duration::from_millis(10),
        }
    }
}

impl TriggerTimings {
    /// Resolve the timings to ticks of `rate`
    pub fn to_ticks(&self, rate: TickRate) -> PatternTicks {
        PatternTicks {
            trigger_pulse: rate.ticks(self.trigger_pulse),
            bulb_pulse: rate.ticks(self.bulb_pulse),
            video_control_pulse: rate.ticks(self.video_control_pulse),
            photo_settle: rate.ticks(self.photo_settle),
        }
    }
}

/// [`TriggerTimings`] resolved to timer ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternTicks {
    pub trigger_pulse: u32,
    pub bulb_pulse: u32,
    pub video_control_pulse: u32,
    pub photo_settle: u32,
}

//! Trigger configuration
//!
//! Camera actions arrive from the configuration store packed into a single
//! 32-bit word. They are decoded into [`CameraAction`] here, once, and the
//! rest of the crate never sees the packed form.

use embassy_time::Duration;

use crate::light_gate::LightGate;
use crate::pattern::NUM_PINS;

const MODE_ID_SINGLE_SHOT: u8 = 0;
const MODE_ID_MULTISHOT: u8 = 1;
const MODE_ID_BULB: u8 = 2;
const MODE_ID_VIDEO: u8 = 3;
const MODE_ID_FOCUS: u8 = 4;

const MODE_MASK: u32 = 0x0000_00FF;
const PARAM1_MASK: u32 = 0x00FF_FF00;
const PARAM1_SHIFT: u32 = 8;
const PARAM2_SHIFT: u32 = 24;

const PARAM_UNIT_MS: u64 = 100;

/// Unit of every camera action parameter
pub const PARAM_UNIT: Duration = Duration::from_millis(PARAM_UNIT_MS);

/// Largest number of shots a multishot burst can hold
pub const MAX_BURST_COUNT: u8 = 16;

/// Factor applied to the configured PIR threshold
pub const PIR_THRESHOLD_MULTIPLIER: u32 = 8;

/// Sampling interval of the PIR sense driver
pub const PIR_SENSE_INTERVAL: Duration = Duration::from_millis(50);

/// Error returned when a configuration can not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The output generator was set up with the wrong number of pins
    PinCount { expected: usize, actual: usize },
    /// Packed action word carries an unknown mode
    UnknownMode(u8),
    /// Multishot burst count outside `1..=MAX_BURST_COUNT`
    BurstCount(u8),
    /// Timer interval of zero
    ZeroTimerInterval,
}

/// Which side of a node fired a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// PIR or optical motion detection
    Motion,
    /// Periodic timer
    Timer,
}

/// Sources of the PIR variant that may trigger the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerMode {
    PirOnly = 0,
    TimerOnly = 1,
    PirAndTimer = 2,
}

impl TriggerMode {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::PirOnly,
            1 => Self::TimerOnly,
            2 => Self::PirAndTimer,
            _ => return None,
        })
    }

    /// Returns if PIR sensing is part of this mode
    pub const fn uses_pir(self) -> bool {
        !matches!(self, Self::TimerOnly)
    }

    /// Returns if the periodic timer is part of this mode
    pub const fn uses_timer(self) -> bool {
        !matches!(self, Self::PirOnly)
    }
}

/// Operational mode byte of a packed action word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationalMode {
    SingleShot = MODE_ID_SINGLE_SHOT,
    MultiShot = MODE_ID_MULTISHOT,
    Bulb = MODE_ID_BULB,
    Video = MODE_ID_VIDEO,
    Focus = MODE_ID_FOCUS,
}

impl OperationalMode {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            MODE_ID_SINGLE_SHOT => Self::SingleShot,
            MODE_ID_MULTISHOT => Self::MultiShot,
            MODE_ID_BULB => Self::Bulb,
            MODE_ID_VIDEO => Self::Video,
            MODE_ID_FOCUS => Self::Focus,
            _ => return None,
        })
    }
}

/// What the camera does when a source fires.
///
/// Durations are counted in [`PARAM_UNIT`]s (100 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAction {
    /// One shutter press
    SingleShot,
    /// `count` shutter presses, one every `gap`
    MultiShot { gap: u16, count: u8 },
    /// Long exposure of `exposure`, 24 bits wide
    Bulb { exposure: u32 },
    /// Video recording of `duration`
    Video { duration: u16 },
    /// Focus (half press) only
    Focus,
}

impl CameraAction {
    /// Decode a packed action word
    pub const fn from_packed(word: u32) -> Result<Self, ConfigError> {
        let mode = (word & MODE_MASK) as u8;
        let param1 = ((word & PARAM1_MASK) >> PARAM1_SHIFT) as u16;
        let param2 = (word >> PARAM2_SHIFT) as u8;

        let Some(mode) = OperationalMode::from_raw(mode) else {
            return Err(ConfigError::UnknownMode(mode));
        };
        Ok(match mode {
            OperationalMode::SingleShot => Self::SingleShot,
            OperationalMode::MultiShot => Self::MultiShot {
                gap: param1,
                count: param2,
            },
            // Bulb exposure spans both parameters
            OperationalMode::Bulb => Self::Bulb {
                exposure: word >> PARAM1_SHIFT,
            },
            OperationalMode::Video => Self::Video { duration: param1 },
            OperationalMode::Focus => Self::Focus,
        })
    }

    /// Encode back into the packed word used by the configuration store
    pub const fn to_packed(self) -> u32 {
        let mode = self.mode() as u32;
        match self {
            Self::SingleShot | Self::Focus => mode,
            Self::MultiShot { gap, count } => {
                mode | ((gap as u32) << PARAM1_SHIFT) | ((count as u32) << PARAM2_SHIFT)
            }
            Self::Bulb { exposure } => mode | ((exposure & 0x00FF_FFFF) << PARAM1_SHIFT),
            Self::Video { duration } => mode | ((duration as u32) << PARAM1_SHIFT),
        }
    }

    pub const fn mode(self) -> OperationalMode {
        match self {
            Self::SingleShot => OperationalMode::SingleShot,
            Self::MultiShot { .. } => OperationalMode::MultiShot,
            Self::Bulb { .. } => OperationalMode::Bulb,
            Self::Video { .. } => OperationalMode::Video,
            Self::Focus => OperationalMode::Focus,
        }
    }

    /// Check parameters the pattern builders would otherwise have to clamp
    pub const fn validate(self) -> Result<(), ConfigError> {
        match self {
            Self::MultiShot { count, .. } if count == 0 || count > MAX_BURST_COUNT => {
                Err(ConfigError::BurstCount(count))
            }
            _ => Ok(()),
        }
    }
}

/// Convert a count of [`PARAM_UNIT`]s to a duration
pub const fn param_duration(units: u32) -> Duration {
    Duration::from_millis(units as u64 * PARAM_UNIT_MS)
}

/// Settings of a single trigger source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceConfig {
    /// Action performed when the source fires
    pub action: CameraAction,
    /// Time from one trigger to the earliest next one
    pub inter_trigger: Duration,
    /// Ambient light condition in which the source is active
    pub light_gate: LightGate,
}

/// PIR sense driver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PirSenseConfig {
    /// Threshold before scaling by [`PIR_THRESHOLD_MULTIPLIER`]
    pub threshold: u8,
    /// Gain of the PIR signal amplifier
    pub amplification: u8,
}

impl PirSenseConfig {
    /// Threshold as compared against the sampled PIR signal
    pub const fn scaled_threshold(self) -> u32 {
        self.threshold as u32 * PIR_THRESHOLD_MULTIPLIER
    }
}

/// Configuration of the PIR/timer camera trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
    pub mode: TriggerMode,
    pub pir: SourceConfig,
    pub pir_sense: PirSenseConfig,
    pub timer: SourceConfig,
    /// Period of the timer source
    pub timer_interval: Duration,
}

impl TriggerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode.uses_pir() {
            self.pir.action.validate()?;
        }
        if self.mode.uses_timer() {
            self.timer.action.validate()?;
            if self.timer_interval.as_millis() == 0 {
                return Err(ConfigError::ZeroTimerInterval);
            }
        }
        Ok(())
    }
}

/// Sources of the optical variant that may trigger the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DetectMode {
    MotionOnly = 0,
    TimerOnly = 1,
    Both = 2,
}

impl DetectMode {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::MotionOnly,
            1 => Self::TimerOnly,
            2 => Self::Both,
            _ => return None,
        })
    }

    pub const fn uses_motion(self) -> bool {
        !matches!(self, Self::TimerOnly)
    }

    pub const fn uses_timer(self) -> bool {
        !matches!(self, Self::MotionOnly)
    }
}

/// Configuration of the optical (TSSP) motion detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    pub mode: DetectMode,
    pub motion: SourceConfig,
    /// Window in which a sync pulse is expected before motion is reported
    pub detect_window: Duration,
    pub timer: SourceConfig,
    /// Period of the timer source
    pub timer_interval: Duration,
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode.uses_motion() {
            self.motion.action.validate()?;
        }
        if self.mode.uses_timer() {
            self.timer.action.validate()?;
            if self.timer_interval.as_millis() == 0 {
                return Err(ConfigError::ZeroTimerInterval);
            }
        }
        Ok(())
    }
}

/// Check the number of output pins handed to the generator
pub const fn validate_pin_count(actual: usize) -> Result<(), ConfigError> {
    if actual == NUM_PINS {
        Ok(())
    } else {
        Err(ConfigError::PinCount {
            expected: NUM_PINS,
            actual,
        })
    }
}

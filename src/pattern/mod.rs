//! Output pattern programs
//!
//! A program is a fixed-capacity list of transitions executed by the output
//! generator. Each transition holds a set of pin levels for a number of timer
//! ticks; when the last one elapses the generator drives the end levels and
//! reports the program's [`ProgramTag`] back to the orchestrator. The tag's
//! generation lets the orchestrator drop completions of programs it has
//! already replaced.
//!
//! Camera lines are active low: a released line is high, and
//! [`PinLevels::ALL_ON`] (every line high) is the safe level.

mod bulb;
mod focus;
mod multi_shot;
mod single_shot;
mod video;

use heapless::Vec;

pub use bulb::{BULB_TRANSITIONS, bulb};
pub use focus::focus;
pub use multi_shot::multi_shot;
pub use single_shot::{SINGLE_SHOT_TRANSITIONS, photo_press, photo_settle, single_shot};
pub use video::{VIDEO_TIMED_TRANSITIONS, video_extension, video_hold, video_start, video_timed};

use crate::config::{CameraAction, param_duration};
use crate::ticks::{PatternTicks, TickRate};

/// Maximum number of transitions in a program
pub const MAX_TRANSITIONS: usize = 32;

/// Maximum number of pins a [`PinLevels`] can describe
pub const MAX_PINS: usize = 8;

/// Number of pins driven by the camera trigger
pub const NUM_PINS: usize = 2;

/// Half press line
pub const FOCUS_PIN: usize = 0;

/// Full press line
pub const TRIGGER_PIN: usize = 1;

const STATE_IDLE: u32 = 0;
const STATE_PHOTO: u32 = 1;
const STATE_VIDEO_START: u32 = 2;
const STATE_VIDEO_EXT: u32 = 3;
const STATE_VIDEO_END: u32 = 4;
const STATE_VIDEO_TIMER: u32 = 5;

/// Logical phase a program represents.
///
/// Carried by the program and handed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TriggerState {
    Idle = STATE_IDLE,
    Photo = STATE_PHOTO,
    VideoStart = STATE_VIDEO_START,
    VideoExt = STATE_VIDEO_EXT,
    VideoEnd = STATE_VIDEO_END,
    VideoTimer = STATE_VIDEO_TIMER,
}

impl TriggerState {
    /// Decode the tag reported by a generator completion interrupt
    pub const fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            STATE_IDLE => Self::Idle,
            STATE_PHOTO => Self::Photo,
            STATE_VIDEO_START => Self::VideoStart,
            STATE_VIDEO_EXT => Self::VideoExt,
            STATE_VIDEO_END => Self::VideoEnd,
            STATE_VIDEO_TIMER => Self::VideoTimer,
            _ => return None,
        })
    }
}

/// Completion report of a program: its phase and the generation it was
/// started with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramTag {
    pub state: TriggerState,
    pub generation: u32,
}

/// Levels of up to [`MAX_PINS`] output pins, one bit per pin
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PinLevels(u8);

impl PinLevels {
    /// Every camera line released
    pub const ALL_ON: Self = Self((1 << NUM_PINS) - 1);
    /// Focus and trigger pressed
    pub const PRESS_ALL: Self = Self(0);
    /// Only the focus line pressed
    pub const PRESS_FOCUS: Self = Self::ALL_ON.with(FOCUS_PIN, false);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Level of `pin`; pins past [`MAX_PINS`] read low
    pub const fn level(self, pin: usize) -> bool {
        pin < MAX_PINS && self.0 & (1 << pin) != 0
    }

    /// Copy with `pin` set to `level`
    pub const fn with(self, pin: usize, level: bool) -> Self {
        if pin >= MAX_PINS {
            return self;
        }
        if level {
            Self(self.0 | (1 << pin))
        } else {
            Self(self.0 & !(1 << pin))
        }
    }
}

impl core::fmt::Debug for PinLevels {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PinLevels({:0width$b})", self.0, width = NUM_PINS)
    }
}

/// Pin levels held for a number of ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub duration: u32,
    pub levels: PinLevels,
}

/// Program executed by the output generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternProgram {
    state: TriggerState,
    generation: u32,
    transitions: Vec<Transition, MAX_TRANSITIONS>,
    end_levels: PinLevels,
}

impl PatternProgram {
    /// Create an empty program ending on [`PinLevels::ALL_ON`]
    pub const fn new(state: TriggerState) -> Self {
        Self {
            state,
            generation: 0,
            transitions: Vec::new(),
            end_levels: PinLevels::ALL_ON,
        }
    }

    /// Append a transition
    ///
    /// Returns the transition if the program is full
    pub fn push(&mut self, duration: u32, levels: PinLevels) -> Result<(), Transition> {
        self.transitions.push(Transition { duration, levels })
    }

    /// Builder form of [`push`](Self::push); transitions past
    /// [`MAX_TRANSITIONS`] are dropped.
    #[must_use]
    pub fn then(mut self, duration: u32, levels: PinLevels) -> Self {
        let _ = self.push(duration, levels);
        self
    }

    pub const fn state(&self) -> TriggerState {
        self.state
    }

    /// Copy stamped with the generation of the orchestrator starting it
    #[must_use]
    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Tag the generator reports once the program completed
    pub const fn tag(&self) -> ProgramTag {
        ProgramTag {
            state: self.state,
            generation: self.generation,
        }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Levels driven once the last transition elapsed
    pub const fn end_levels(&self) -> PinLevels {
        self.end_levels
    }

    /// Sum of all transition durations
    pub fn total_ticks(&self) -> u64 {
        self.transitions.iter().map(|t| u64::from(t.duration)).sum()
    }

    /// Levels driven `elapsed` ticks after the program started
    pub fn levels_at(&self, elapsed: u64) -> PinLevels {
        let mut start = 0;
        for transition in &self.transitions {
            let end = start + u64::from(transition.duration);
            if elapsed < end {
                return transition.levels;
            }
            start = end;
        }
        self.end_levels
    }
}

/// Convert a parameter count (100 ms units) to ticks
pub fn param_ticks(rate: TickRate, units: u32) -> u32 {
    rate.ticks(param_duration(units))
}

/// Build the program of `action` repeating every `interval` ticks.
///
/// Video uses the fixed start/hold/stop shape; the extendable shape is
/// built by the orchestrator while PIR sensing is active.
pub fn build(
    action: CameraAction,
    rate: TickRate,
    ticks: &PatternTicks,
    interval: u32,
) -> PatternProgram {
    match action {
        CameraAction::SingleShot => single_shot(ticks, interval),
        CameraAction::MultiShot { gap, count } => {
            multi_shot(ticks, param_ticks(rate, gap.into()), count, interval)
        }
        CameraAction::Bulb { exposure } => bulb(ticks, param_ticks(rate, exposure), interval),
        CameraAction::Video { duration } => video_timed(
            ticks,
            param_ticks(rate, duration.into()),
            interval,
            TriggerState::VideoTimer,
        ),
        CameraAction::Focus => focus(ticks, interval),
    }
}

//! Single shot
//!
//! Presses focus and trigger together for one pulse, then releases both
//! until the inter-trigger interval elapsed.

use super::{PatternProgram, PinLevels, TriggerState};
use crate::ticks::PatternTicks;

/// Number of transitions of a single shot program
pub const SINGLE_SHOT_TRANSITIONS: usize = 2;

/// Shutter pulse followed by the remaining inter-trigger hold
pub fn single_shot(ticks: &PatternTicks, interval: u32) -> PatternProgram {
    PatternProgram::new(TriggerState::Idle)
        .then(ticks.trigger_pulse, PinLevels::PRESS_ALL)
        .then(interval.saturating_sub(ticks.trigger_pulse), PinLevels::ALL_ON)
}

/// Shutter pulse alone; the hold follows from [`photo_settle`] once the
/// [`TriggerState::Photo`] completion came back.
pub fn photo_press(ticks: &PatternTicks) -> PatternProgram {
    PatternProgram::new(TriggerState::Photo).then(ticks.trigger_pulse, PinLevels::PRESS_ALL)
}

/// Settle delay plus whatever is left of the inter-trigger interval
pub fn photo_settle(ticks: &PatternTicks, remaining: u32) -> PatternProgram {
    PatternProgram::new(TriggerState::Idle)
        .then(ticks.photo_settle, PinLevels::ALL_ON)
        .then(remaining, PinLevels::ALL_ON)
}

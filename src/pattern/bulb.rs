//! Bulb exposure
//!
//! The focus line is held for the whole exposure and doubles as the
//! continuous "shutter open" signal; the trigger line closes the exposure
//! with one pulse at its end.

use super::{PatternProgram, PinLevels, TriggerState};
use crate::ticks::PatternTicks;

/// Number of transitions of a bulb program
pub const BULB_TRANSITIONS: usize = 3;

pub fn bulb(ticks: &PatternTicks, exposure: u32, interval: u32) -> PatternProgram {
    let open = exposure.saturating_sub(ticks.bulb_pulse);
    let closing = ticks.bulb_pulse;
    let rest = interval.saturating_sub(open.saturating_add(closing));

    PatternProgram::new(TriggerState::Idle)
        .then(open, PinLevels::PRESS_FOCUS)
        .then(closing, PinLevels::PRESS_ALL)
        .then(rest, PinLevels::ALL_ON)
}

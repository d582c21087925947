use super::{PatternProgram, PinLevels, TriggerState};
use crate::ticks::PatternTicks;

/// Half press pulse, then release until the next interval.
///
/// Same shape as a single shot, but the trigger line is never pressed.
pub fn focus(ticks: &PatternTicks, interval: u32) -> PatternProgram {
    PatternProgram::new(TriggerState::Idle)
        .then(ticks.trigger_pulse, PinLevels::PRESS_FOCUS)
        .then(interval.saturating_sub(ticks.trigger_pulse), PinLevels::ALL_ON)
}

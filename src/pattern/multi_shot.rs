//! Multishot burst
//!
//! `count` shutter pulses spaced `gap` apart. The final release absorbs the
//! rest of the inter-trigger interval, so the program always spans exactly
//! `interval` ticks when the burst fits in it.

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{MAX_TRANSITIONS, PatternProgram, PinLevels, TriggerState};
use crate::ticks::PatternTicks;

const MAX_SHOTS: u8 = (MAX_TRANSITIONS / 2) as u8;

pub fn multi_shot(ticks: &PatternTicks, gap: u32, count: u8, interval: u32) -> PatternProgram {
    let count = count.clamp(1, MAX_SHOTS);
    let pulse = ticks.trigger_pulse;
    let release = gap.saturating_sub(pulse);

    let mut program = PatternProgram::new(TriggerState::Idle);
    let mut elapsed: u32 = 0;
    for shot in 1..=count {
        let _ = program.push(pulse, PinLevels::PRESS_ALL);
        elapsed = elapsed.saturating_add(pulse);

        let hold = if shot == count {
            interval.saturating_sub(elapsed)
        } else {
            release
        };
        let _ = program.push(hold, PinLevels::ALL_ON);
        elapsed = elapsed.saturating_add(hold);
    }

    #[cfg(feature = "esp32-log")]
    println!(
        "[multi_shot] {} shots, gap {} ticks, interval {} ticks",
        count,
        gap,
        interval
    );

    program
}

//! Video recording
//!
//! Recording is toggled by a control pulse on the focus line. With PIR
//! sensing active the recording is split into phases so that motion near
//! the end can extend it:
//!
//! - [`video_start`]: start pulse, then record with PIR disabled
//! - [`video_hold`]: record the last `remaining` ticks with PIR armed, then
//!   the stop pulse
//! - [`video_extension`]: extra recording after motion during the hold
//!
//! Without PIR sensing [`video_timed`] covers the whole recording.

use super::{PatternProgram, PinLevels, TriggerState};
use crate::ticks::PatternTicks;

/// Number of transitions of a timed video program
pub const VIDEO_TIMED_TRANSITIONS: usize = 4;

/// Start pulse and the part of the recording not open to extension
pub fn video_start(ticks: &PatternTicks, video: u32, extension: u32) -> PatternProgram {
    PatternProgram::new(TriggerState::VideoStart)
        .then(ticks.video_control_pulse, PinLevels::PRESS_FOCUS)
        .then(video.saturating_sub(extension), PinLevels::ALL_ON)
}

/// Remaining recording followed by the stop pulse
pub fn video_hold(ticks: &PatternTicks, remaining: u32) -> PatternProgram {
    PatternProgram::new(TriggerState::VideoEnd)
        .then(remaining, PinLevels::ALL_ON)
        .then(ticks.video_control_pulse, PinLevels::PRESS_FOCUS)
}

pub fn video_extension(extension: u32) -> PatternProgram {
    PatternProgram::new(TriggerState::VideoExt).then(extension, PinLevels::ALL_ON)
}

/// Start pulse, recording, stop pulse and the rest of `interval`
pub fn video_timed(
    ticks: &PatternTicks,
    video: u32,
    interval: u32,
    state: TriggerState,
) -> PatternProgram {
    let pulse = ticks.video_control_pulse;
    let busy = pulse.saturating_mul(2).saturating_add(video);

    PatternProgram::new(state)
        .then(pulse, PinLevels::PRESS_FOCUS)
        .then(video, PinLevels::ALL_ON)
        .then(pulse, PinLevels::PRESS_FOCUS)
        .then(interval.saturating_sub(busy), PinLevels::ALL_ON)
}

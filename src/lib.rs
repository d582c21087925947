#![no_std]

pub mod cam_trigger;
pub mod cam_unit;
pub mod command;
pub mod config;
pub mod detector;
pub mod event_queue;
pub mod light_gate;
pub mod pattern;
pub mod runner;
pub mod ticks;

pub use cam_trigger::{CamTrigger, CamTriggerSetup, MIN_TICK_INTERVAL};
pub use cam_unit::{CamUnit, CamUnitDone};
pub use command::{CommandList, PirSenseSettings, TriggerCommand, TriggerCommands};
pub use config::{
    CameraAction, ConfigError, DetectMode, DetectorConfig, OperationalMode, PirSenseConfig,
    SourceConfig, TriggerConfig, TriggerMode, TriggerSource,
};
pub use detector::{
    DetectorCommand, DetectorCommands, DetectorEvent, DetectorHardware, DetectorRunner,
    MotionDetector, MotionState,
};
pub use event_queue::{Consumer, EventQueue, Producer, QueueFull};
pub use light_gate::{DayNight, LightGate, light_check};
pub use pattern::{PatternProgram, PinLevels, ProgramTag, Transition, TriggerState};
pub use runner::{TriggerEvent, TriggerHardware, TriggerRunner};
pub use ticks::{PatternTicks, TickRate, TriggerTimings};

pub use embassy_time::Duration;

/// Output pattern generator
///
/// Drives the camera lines through a [`PatternProgram`] using a single
/// hardware timer compare channel. When the last transition elapses the
/// generator reports [`PatternProgram::tag`] from its interrupt. The PIR
/// interrupt samples the ticks the running program has elapsed.
pub trait PatternOutput {
    /// Start `program`, replacing whatever program is running
    fn start(&mut self, program: &PatternProgram);

    /// Halt the running program and drive `levels`
    fn stop(&mut self, levels: PinLevels);
}

/// PIR sense driver
pub trait PirSensor {
    /// Start sampling; crossings of the threshold raise an interrupt
    fn start(&mut self, settings: &PirSenseSettings);

    fn stop(&mut self);

    /// Set the gain of the PIR signal amplifier
    fn set_amplification(&mut self, gain: u8);
}

/// Whether an [`IntervalTimer`] fires once or repeatedly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Single,
    Repeated,
}

/// Millisecond timer channel
pub trait IntervalTimer {
    /// Start or restart the timer
    fn start(&mut self, period: Duration, mode: TimerMode);

    fn stop(&mut self);
}

/// Ambient light sensor
pub trait LightSensor {
    /// Blocking read of the scaled light intensity
    fn read(&mut self) -> u32;
}

/// Optical (TSSP) pulse detector
///
/// In window mode the detector reports a miss when no sync pulse arrived
/// within the window; in pulse mode it reports every pulse.
pub trait OpticalDetector {
    /// Set the window length used by [`start_window_detect`](Self::start_window_detect)
    fn set_window(&mut self, window: Duration);

    fn start_window_detect(&mut self);

    fn start_pulse_detect(&mut self);

    fn stop(&mut self);
}

/// Speed of the system tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSpeed {
    Fast,
    Slow,
}

/// System tick source feeding the `add_tick` entry points
pub trait DeviceTick {
    fn set_speed(&mut self, speed: TickSpeed);

    /// Deliver a tick right away instead of waiting for the period
    fn process(&mut self);
}

/// Indicator LED signalling received sync pulses during feedback
pub trait FeedbackIndicator {
    fn set(&mut self, on: bool);
}

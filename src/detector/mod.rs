//! Optical (TSSP) motion detector
//!
//! A paired transmitter sends sync pulses; the receiver watches for them in
//! windows. A window without a pulse means the beam was broken and the
//! camera is triggered. Motion detection moves through four states:
//!
//! - `Feedback`: right after start, received pulses light the feedback LED
//!   so the pair can be aligned. Ends after [`FEEDBACK_TIMEOUT`].
//! - `Idle`: windowed detection, gated by ambient light on every tick.
//! - `WaitForTimeout`: motion was seen; the detector listens for pulses and
//!   the tick runs fast. Without a pulse for [`CAMERA_TIMEOUT`] it resyncs.
//! - `Sync`: duty-cycled pulse listening until the pair finds each other.

mod runner;

use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

pub use runner::{DetectorHardware, DetectorRunner};

use crate::TickSpeed;
use crate::command::CommandList;
use crate::config::{ConfigError, DetectorConfig, SourceConfig, TriggerSource};
use crate::pattern::ProgramTag;
use crate::ticks::TickRate;

/// Fast device tick period while motion is being followed
pub const SENSE_FAST_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Slow device tick period
pub const SENSE_SLOW_TICK_INTERVAL: Duration = Duration::from_millis(300_000);

/// Time without a sync pulse after motion before resynchronising
pub const CAMERA_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Length of the alignment feedback phase
pub const FEEDBACK_TIMEOUT: Duration = Duration::from_millis(600_000);

/// Pulse listening slot of the sync duty cycle
pub const SYNC_LISTEN: Duration = Duration::from_millis(200);

/// Rest slot of the sync duty cycle
pub const SYNC_REST: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Feedback,
    WaitForTimeout,
    Sync,
    Idle,
}

/// Slot of the sync duty cycle that the sync timer is counting down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncPhase {
    Listen,
    Rest,
}

/// Events raised from interrupt context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorEvent {
    /// A detect window expired without a sync pulse
    WindowMissed,
    /// A sync pulse was received
    PulseDetected,
    /// Trigger timer elapsed
    TimerElapsed,
    /// Sync duty cycle timer elapsed
    SyncTimerElapsed,
    /// Output generator finished a program
    PatternDone(ProgramTag),
}

/// Side effects of the motion detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorCommand {
    SetWindow(Duration),
    WindowDetect,
    PulseDetect,
    StopDetect,
    TickSpeed(TickSpeed),
    /// Deliver a device tick right away
    ProcessTick,
    /// Start the repeating trigger timer
    StartTriggerTimer(Duration),
    StopTriggerTimer,
    /// Start the single-shot sync timer
    StartSyncTimer(Duration),
    StopSyncTimer,
    ConfigureCamera(TriggerSource, SourceConfig),
    TriggerCamera(TriggerSource),
    StopCamera,
    Feedback(bool),
}

/// Maximum number of commands a detector entry point emits
pub const DETECTOR_COMMANDS: usize = 8;

/// Commands emitted by [`MotionDetector`]
pub type DetectorCommands = CommandList<DetectorCommand, DETECTOR_COMMANDS>;

impl CommandList<DetectorCommand, DETECTOR_COMMANDS> {
    fn add(&mut self, command: DetectorCommand) {
        let _ = self.push(command);
    }
}

/// Motion detection side of the optical sensor node
#[derive(Debug, Clone)]
pub struct MotionDetector {
    config: DetectorConfig,
    started: bool,
    state: MotionState,
    sync_phase: SyncPhase,
    sync_timer_running: bool,
    trigger_timer_running: bool,
    camera_busy: bool,

    detect_time_pass: u32,
    wait_window_time_passed: u32,
    feedback_timeout: u32,
    camera_timeout: u32,
}

impl MotionDetector {
    /// `rate` is the tick rate of the intervals passed to
    /// [`add_tick`](Self::add_tick).
    pub fn new(config: &DetectorConfig, rate: TickRate) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: *config,
            started: false,
            state: MotionState::Idle,
            sync_phase: SyncPhase::Rest,
            sync_timer_running: false,
            trigger_timer_running: false,
            camera_busy: false,
            detect_time_pass: 0,
            wait_window_time_passed: 0,
            feedback_timeout: rate.ticks(FEEDBACK_TIMEOUT),
            camera_timeout: rate.ticks(CAMERA_TIMEOUT),
        })
    }

    /// Configure the camera unit and arm the configured sources
    pub fn start(&mut self) -> DetectorCommands {
        #[cfg(feature = "esp32-log")]
        println!("[MotionDetector.start] mode {:?}", self.config.mode);

        self.started = true;
        self.state = MotionState::Feedback;
        self.detect_time_pass = 0;
        self.wait_window_time_passed = 0;
        self.camera_busy = false;
        self.sync_timer_running = false;

        let mut commands = DetectorCommands::new();
        commands.add(DetectorCommand::TickSpeed(TickSpeed::Slow));

        if self.config.mode.uses_timer() {
            commands.add(DetectorCommand::ConfigureCamera(
                TriggerSource::Timer,
                self.config.timer,
            ));
            commands.add(DetectorCommand::StartTriggerTimer(self.config.timer_interval));
            self.trigger_timer_running = true;
        }

        if self.config.mode.uses_motion() {
            commands.add(DetectorCommand::ConfigureCamera(
                TriggerSource::Motion,
                self.config.motion,
            ));
            commands.add(DetectorCommand::SetWindow(self.config.detect_window));
            commands.add(DetectorCommand::WindowDetect);
        }
        commands
    }

    pub fn stop(&mut self) -> DetectorCommands {
        #[cfg(feature = "esp32-log")]
        println!("[MotionDetector.stop]");

        self.started = false;
        self.camera_busy = false;
        self.sync_timer_running = false;
        self.trigger_timer_running = false;

        let mut commands = DetectorCommands::new();
        commands.add(DetectorCommand::StopDetect);
        commands.add(DetectorCommand::StopCamera);
        commands.add(DetectorCommand::StopTriggerTimer);
        commands.add(DetectorCommand::StopSyncTimer);
        commands
    }

    /// Replace the configuration; takes effect on the next start
    pub fn update(&mut self, config: &DetectorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = *config;
        Ok(())
    }

    /// Periodic light gating and timeout accounting.
    ///
    /// `interval` is the number of ticks since the previous call and
    /// `light` the current light sensor sample.
    pub fn add_tick(&mut self, interval: u32, light: u32) -> DetectorCommands {
        let mut commands = DetectorCommands::new();
        if !self.started {
            return commands;
        }

        if self.config.mode.uses_motion() {
            self.motion_tick(interval, light, &mut commands);
        }

        if self.config.mode.uses_timer() {
            let allowed = self.config.timer.light_gate.allows(light);
            if allowed && !self.trigger_timer_running {
                commands.add(DetectorCommand::StartTriggerTimer(self.config.timer_interval));
                self.trigger_timer_running = true;
            } else if !allowed && self.trigger_timer_running {
                commands.add(DetectorCommand::StopTriggerTimer);
                self.trigger_timer_running = false;
            }
        }
        commands
    }

    fn motion_tick(&mut self, interval: u32, light: u32, commands: &mut DetectorCommands) {
        let allowed = self.config.motion.light_gate.allows(light);
        match self.state {
            MotionState::Feedback => {
                self.detect_time_pass = self.detect_time_pass.saturating_add(interval);
                if self.detect_time_pass >= self.feedback_timeout {
                    #[cfg(feature = "esp32-log")]
                    println!("[MotionDetector.add_tick] feedback over");
                    commands.add(DetectorCommand::Feedback(false));
                    self.state = MotionState::Idle;
                    self.detect_time_pass = 0;
                }
            }
            MotionState::WaitForTimeout => {
                self.wait_window_time_passed =
                    self.wait_window_time_passed.saturating_add(interval);
                if self.wait_window_time_passed >= self.camera_timeout {
                    #[cfg(feature = "esp32-log")]
                    println!("[MotionDetector.add_tick] lost sync");
                    commands.add(DetectorCommand::TickSpeed(TickSpeed::Slow));
                    commands.add(DetectorCommand::StopDetect);
                    commands.add(DetectorCommand::PulseDetect);
                    self.wait_window_time_passed = 0;
                    self.state = MotionState::Sync;
                }
            }
            MotionState::Idle => {
                if allowed {
                    commands.add(DetectorCommand::WindowDetect);
                } else {
                    commands.add(DetectorCommand::StopDetect);
                }
            }
            MotionState::Sync => {
                if allowed && !self.sync_timer_running {
                    commands.add(DetectorCommand::StartSyncTimer(SYNC_REST));
                    self.sync_phase = SyncPhase::Rest;
                    self.sync_timer_running = true;
                } else if !allowed && self.sync_timer_running {
                    commands.add(DetectorCommand::StopSyncTimer);
                    self.sync_timer_running = false;
                }
            }
        }
    }

    /// A detect window expired without a sync pulse: motion
    pub fn on_window_missed(&mut self) -> DetectorCommands {
        let mut commands = DetectorCommands::new();
        if !self.started {
            return commands;
        }

        #[cfg(feature = "esp32-log")]
        println!("[MotionDetector.on_window_missed] state {:?}", self.state);

        commands.add(DetectorCommand::Feedback(false));
        commands.add(DetectorCommand::StopDetect);
        if self.state != MotionState::Feedback {
            commands.add(DetectorCommand::TickSpeed(TickSpeed::Fast));
            self.state = MotionState::WaitForTimeout;
        }
        commands.add(DetectorCommand::PulseDetect);
        commands.add(DetectorCommand::TriggerCamera(TriggerSource::Motion));
        self.camera_busy = true;
        commands
    }

    pub fn on_pulse(&mut self) -> DetectorCommands {
        let mut commands = DetectorCommands::new();
        if !self.started {
            return commands;
        }

        match self.state {
            MotionState::Sync => {
                self.detect_time_pass = 0;
                commands.add(DetectorCommand::StopSyncTimer);
                self.sync_timer_running = false;
                commands.add(DetectorCommand::WindowDetect);
                self.state = MotionState::Idle;
            }
            MotionState::Feedback => {
                self.wait_window_time_passed = 0;
                commands.add(DetectorCommand::Feedback(true));
            }
            MotionState::WaitForTimeout | MotionState::Idle => {
                commands.add(DetectorCommand::ProcessTick);
                self.wait_window_time_passed = 0;
                self.state = MotionState::Idle;
            }
        }
        commands
    }

    /// Trigger timer elapsed; skipped while the camera is busy
    pub fn on_timer(&mut self) -> DetectorCommands {
        let mut commands = DetectorCommands::new();
        if !self.started || self.camera_busy {
            return commands;
        }
        commands.add(DetectorCommand::TriggerCamera(TriggerSource::Timer));
        self.camera_busy = true;
        commands
    }

    /// Sync duty cycle: alternate between listening and resting
    pub fn on_sync_timer(&mut self) -> DetectorCommands {
        let mut commands = DetectorCommands::new();
        if !self.started || !self.sync_timer_running {
            return commands;
        }
        match self.sync_phase {
            SyncPhase::Rest => {
                commands.add(DetectorCommand::PulseDetect);
                commands.add(DetectorCommand::StartSyncTimer(SYNC_LISTEN));
                self.sync_phase = SyncPhase::Listen;
            }
            SyncPhase::Listen => {
                commands.add(DetectorCommand::StopDetect);
                commands.add(DetectorCommand::StartSyncTimer(SYNC_REST));
                self.sync_phase = SyncPhase::Rest;
            }
        }
        commands
    }

    /// The camera unit finished the trigger from `source`
    pub fn on_camera_done(&mut self, source: TriggerSource) -> DetectorCommands {
        let mut commands = DetectorCommands::new();
        self.camera_busy = false;
        if !self.started {
            return commands;
        }

        #[cfg(feature = "esp32-log")]
        println!("[MotionDetector.on_camera_done] {:?}, state {:?}", source, self.state);

        if source == TriggerSource::Motion {
            if self.state != MotionState::Feedback {
                commands.add(DetectorCommand::ProcessTick);
            }
            if self.state != MotionState::Sync {
                commands.add(DetectorCommand::WindowDetect);
            }
        }
        commands
    }

    pub const fn state(&self) -> MotionState {
        self.state
    }

    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub const fn is_started(&self) -> bool {
        self.started
    }

    pub const fn is_camera_busy(&self) -> bool {
        self.camera_busy
    }
}

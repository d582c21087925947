#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{DetectorCommand, DetectorCommands, DetectorEvent, MotionDetector};
use crate::cam_unit::CamUnit;
use crate::config::{ConfigError, DetectorConfig, TriggerSource};
use crate::event_queue::Consumer;
use crate::pattern::PinLevels;
use crate::{
    DeviceTick, FeedbackIndicator, IntervalTimer, LightSensor, OpticalDetector, PatternOutput,
    TimerMode,
};

/// Collaborators driven by the [`DetectorRunner`]
pub struct DetectorHardware<D, T, O, K, L, F> {
    pub detector: D,
    /// Repeating timer of the timer source
    pub trigger_timer: T,
    /// Single-shot timer of the sync duty cycle
    pub sync_timer: T,
    pub output: O,
    pub tick: K,
    pub light: L,
    pub feedback: F,
}

/// Executes [`MotionDetector`] commands, with a [`CamUnit`] as the camera
pub struct DetectorRunner<'a, D, T, O, K, L, F, const QUEUE: usize>
where
    D: OpticalDetector,
    T: IntervalTimer,
    O: PatternOutput,
    K: DeviceTick,
    L: LightSensor,
    F: FeedbackIndicator,
{
    core: MotionDetector,
    camera: CamUnit,
    hardware: DetectorHardware<D, T, O, K, L, F>,
    events: Consumer<'a, DetectorEvent, QUEUE>,
}

impl<'a, D, T, O, K, L, F, const QUEUE: usize> DetectorRunner<'a, D, T, O, K, L, F, QUEUE>
where
    D: OpticalDetector,
    T: IntervalTimer,
    O: PatternOutput,
    K: DeviceTick,
    L: LightSensor,
    F: FeedbackIndicator,
{
    pub fn new(
        core: MotionDetector,
        camera: CamUnit,
        mut hardware: DetectorHardware<D, T, O, K, L, F>,
        events: Consumer<'a, DetectorEvent, QUEUE>,
    ) -> Self {
        hardware.output.stop(PinLevels::ALL_ON);
        Self {
            core,
            camera,
            hardware,
            events,
        }
    }

    pub fn start(&mut self) {
        let commands = self.core.start();
        self.execute(&commands);
    }

    /// Stop everything and discard events raised before the stop
    pub fn stop(&mut self) {
        let commands = self.core.stop();
        self.execute(&commands);
        self.events.clear();
    }

    pub fn update(&mut self, config: &DetectorConfig) -> Result<(), ConfigError> {
        self.core.update(config)
    }

    pub fn add_tick(&mut self, interval: u32) {
        let light = self.hardware.light.read();
        let commands = self.core.add_tick(interval, light);
        self.execute(&commands);
    }

    /// Drain queued events (non-blocking)
    ///
    /// Returns the number of events handled
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.pop() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Handle a single event
    pub fn handle(&mut self, event: DetectorEvent) {
        let commands = match event {
            DetectorEvent::WindowMissed => self.core.on_window_missed(),
            DetectorEvent::PulseDetected => self.core.on_pulse(),
            DetectorEvent::TimerElapsed => self.core.on_timer(),
            DetectorEvent::SyncTimerElapsed => self.core.on_sync_timer(),
            DetectorEvent::PatternDone(tag) => {
                let done = self.camera.on_pattern_done(tag);
                if let Some(program) = done.next {
                    self.hardware.output.start(&program);
                }
                match done.finished {
                    Some(source) => self.core.on_camera_done(source),
                    None => DetectorCommands::new(),
                }
            }
        };
        self.execute(&commands);
    }

    fn execute(&mut self, commands: &DetectorCommands) {
        for command in commands {
            #[cfg(feature = "esp32-log")]
            println!("[DetectorRunner.execute] {:?}", command);

            match *command {
                DetectorCommand::SetWindow(window) => self.hardware.detector.set_window(window),
                DetectorCommand::WindowDetect => self.hardware.detector.start_window_detect(),
                DetectorCommand::PulseDetect => self.hardware.detector.start_pulse_detect(),
                DetectorCommand::StopDetect => self.hardware.detector.stop(),
                DetectorCommand::TickSpeed(speed) => self.hardware.tick.set_speed(speed),
                DetectorCommand::ProcessTick => self.hardware.tick.process(),
                DetectorCommand::StartTriggerTimer(period) => {
                    self.hardware.trigger_timer.start(period, TimerMode::Repeated);
                }
                DetectorCommand::StopTriggerTimer => self.hardware.trigger_timer.stop(),
                DetectorCommand::StartSyncTimer(period) => {
                    self.hardware.sync_timer.start(period, TimerMode::Single);
                }
                DetectorCommand::StopSyncTimer => self.hardware.sync_timer.stop(),
                DetectorCommand::ConfigureCamera(source, config) => {
                    self.camera.configure(source, &config);
                }
                DetectorCommand::TriggerCamera(source) => self.trigger_camera(source),
                DetectorCommand::StopCamera => {
                    self.camera.stop();
                    self.hardware.output.stop(PinLevels::ALL_ON);
                }
                DetectorCommand::Feedback(on) => self.hardware.feedback.set(on),
            }
        }
    }

    fn trigger_camera(&mut self, source: TriggerSource) {
        self.hardware.output.stop(PinLevels::ALL_ON);
        if let Some(program) = self.camera.trigger(source) {
            self.hardware.output.start(&program);
            return;
        }
        // Nothing configured for the source; complete right away
        let commands = self.core.on_camera_done(source);
        self.execute(&commands);
    }

    pub fn core(&self) -> &MotionDetector {
        &self.core
    }

    pub fn camera(&self) -> &CamUnit {
        &self.camera
    }

    pub fn hardware(&self) -> &DetectorHardware<D, T, O, K, L, F> {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut DetectorHardware<D, T, O, K, L, F> {
        &mut self.hardware
    }
}

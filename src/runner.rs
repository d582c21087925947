//! Main loop side of the PIR camera trigger.
//!
//! Interrupt handlers push [`TriggerEvent`]s onto an
//! [`EventQueue`](crate::EventQueue); the runner drains them into the
//! [`CamTrigger`] core and executes the resulting commands on the hardware.
//!
//! # Usage
//!
//! ```ignore
//! static EVENTS: EventQueue<TriggerEvent, 8> = EventQueue::new();
//!
//! // PIR interrupt
//! let elapsed = generator.ticks_elapsed();
//! let _ = EVENTS.push(TriggerEvent::PirMotion { sample, elapsed });
//!
//! // Generator interrupt, tag of the program that just finished
//! let _ = EVENTS.push(TriggerEvent::PatternDone(tag));
//!
//! let mut runner = TriggerRunner::new(core, hardware, EVENTS.consumer());
//! loop {
//!     runner.process_pending();
//!     if let Some(interval) = wait_for_tick() {
//!         runner.add_tick(interval);
//!     }
//! }
//! ```

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::cam_trigger::CamTrigger;
use crate::command::{TriggerCommand, TriggerCommands};
use crate::config::{ConfigError, TriggerConfig};
use crate::event_queue::Consumer;
use crate::pattern::ProgramTag;
use crate::{IntervalTimer, LightSensor, PatternOutput, PirSensor, TimerMode};

/// Events raised from interrupt context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// PIR signal crossed the threshold
    PirMotion {
        sample: u32,
        /// Ticks the running program had elapsed when the interrupt fired
        elapsed: u32,
    },
    /// Trigger timer elapsed
    TimerElapsed,
    /// Output generator finished a program
    PatternDone(ProgramTag),
}

/// Collaborators driven by the [`TriggerRunner`]
pub struct TriggerHardware<O, P, T, L> {
    pub output: O,
    pub pir: P,
    pub timer: T,
    pub light: L,
}

/// Executes [`CamTrigger`] commands on the hardware
pub struct TriggerRunner<'a, O, P, T, L, const QUEUE: usize>
where
    O: PatternOutput,
    P: PirSensor,
    T: IntervalTimer,
    L: LightSensor,
{
    core: CamTrigger,
    hardware: TriggerHardware<O, P, T, L>,
    events: Consumer<'a, TriggerEvent, QUEUE>,
}

impl<'a, O, P, T, L, const QUEUE: usize> TriggerRunner<'a, O, P, T, L, QUEUE>
where
    O: PatternOutput,
    P: PirSensor,
    T: IntervalTimer,
    L: LightSensor,
{
    /// Create the runner and apply the core's init commands
    pub fn new(
        core: CamTrigger,
        hardware: TriggerHardware<O, P, T, L>,
        events: Consumer<'a, TriggerEvent, QUEUE>,
    ) -> Self {
        let mut runner = Self {
            core,
            hardware,
            events,
        };
        let commands = runner.core.init();
        runner.execute(&commands);
        runner
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

    pub fn update(&mut self, config: &TriggerConfig) -> Result<(), ConfigError> {
        let commands = self.core.update(config)?;
        self.execute(&commands);
        Ok(())
    }

    /// Feed a device tick; the light sensor is only read for ticks the core
    /// acts on.
    pub fn add_tick(&mut self, interval: u32) {
        if !CamTrigger::accepts_tick(interval) {
            return;
        }
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
    pub fn handle(&mut self, event: TriggerEvent) {
        #[cfg(feature = "esp32-log")]
        println!("[TriggerRunner.handle] {:?}", event);

        let commands = match event {
            TriggerEvent::PirMotion { elapsed, .. } => self.core.on_pir(elapsed),
            TriggerEvent::TimerElapsed => self.core.on_timer(),
            TriggerEvent::PatternDone(tag) => self.core.on_pattern_done(tag),
        };
        self.execute(&commands);
    }

    fn execute(&mut self, commands: &TriggerCommands) {
        for command in commands {
            #[cfg(feature = "esp32-log")]
            println!("[TriggerRunner.execute] {:?}", command);

            match command {
                TriggerCommand::EnablePir(settings) => self.hardware.pir.start(settings),
                TriggerCommand::DisablePir => self.hardware.pir.stop(),
                TriggerCommand::StartTimer(period) => {
                    self.hardware.timer.start(*period, TimerMode::Repeated);
                }
                TriggerCommand::StopTimer => self.hardware.timer.stop(),
                TriggerCommand::StartPattern(program) => self.hardware.output.start(program),
                TriggerCommand::StopPattern(levels) => self.hardware.output.stop(*levels),
                TriggerCommand::SetAmplification(gain) => {
                    self.hardware.pir.set_amplification(*gain);
                }
            }
        }
    }

    pub fn core(&self) -> &CamTrigger {
        &self.core
    }

    pub fn hardware(&self) -> &TriggerHardware<O, P, T, L> {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut TriggerHardware<O, P, T, L> {
        &mut self.hardware
    }
}

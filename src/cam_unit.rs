//! Camera unit of the optical sensor node
//!
//! Holds one camera setup per [`TriggerSource`] and turns a trigger into a
//! program for the output generator. Single shots run in two steps: the
//! shutter pulse tagged [`TriggerState::Photo`], then the settle delay and
//! the rest of the inter-trigger interval.
//!
//! Programs are stamped with a generation bumped on every trigger, step and
//! stop, so a completion queued by a replaced program is ignored.

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::cam_trigger::CamTriggerSetup;
use crate::config::{CameraAction, ConfigError, SourceConfig, TriggerSource, validate_pin_count};
use crate::pattern::{self, PatternProgram, ProgramTag, TriggerState};
use crate::ticks::{PatternTicks, TickRate};

/// Outcome of a program completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CamUnitDone {
    /// Program to start next
    pub next: Option<PatternProgram>,
    /// Source whose trigger has fully completed
    pub finished: Option<TriggerSource>,
}

#[derive(Debug, Clone)]
pub struct CamUnit {
    rate: TickRate,
    ticks: PatternTicks,
    motion: Option<SourceConfig>,
    timer: Option<SourceConfig>,
    active: Option<TriggerSource>,
    time_remaining: u32,
    generation: u32,
}

impl CamUnit {
    pub fn new(setup: &CamTriggerSetup) -> Result<Self, ConfigError> {
        validate_pin_count(setup.pin_count)?;
        Ok(Self {
            rate: setup.rate,
            ticks: setup.timings.to_ticks(setup.rate),
            motion: None,
            timer: None,
            active: None,
            time_remaining: 0,
            generation: 0,
        })
    }

    /// Set the action performed when `source` triggers
    pub fn configure(&mut self, source: TriggerSource, config: &SourceConfig) {
        match source {
            TriggerSource::Motion => self.motion = Some(*config),
            TriggerSource::Timer => self.timer = Some(*config),
        }
    }

    /// Build the first program for a trigger from `source`, replacing any
    /// trigger in flight.
    ///
    /// Returns `None` if the source has not been configured.
    pub fn trigger(&mut self, source: TriggerSource) -> Option<PatternProgram> {
        self.stop();
        let config = match source {
            TriggerSource::Motion => self.motion,
            TriggerSource::Timer => self.timer,
        }?;
        let interval = self.rate.ticks(config.inter_trigger);

        #[cfg(feature = "esp32-log")]
        println!("[CamUnit.trigger] {:?}: {:?}", source, config.action);

        self.active = Some(source);
        let program = match config.action {
            CameraAction::SingleShot => {
                let busy = self.ticks.trigger_pulse.saturating_add(self.ticks.photo_settle);
                self.time_remaining = interval.saturating_sub(busy);
                pattern::photo_press(&self.ticks)
            }
            action => pattern::build(action, self.rate, &self.ticks, interval),
        };
        Some(program.with_generation(self.generation))
    }

    /// The output generator finished the program tagged `tag`
    pub fn on_pattern_done(&mut self, tag: ProgramTag) -> CamUnitDone {
        if tag.generation != self.generation {
            #[cfg(feature = "esp32-log")]
            println!(
                "[CamUnit.on_pattern_done] stale {:?}, generation {}",
                tag, self.generation
            );
            return CamUnitDone::default();
        }
        if tag.state == TriggerState::Photo && self.active.is_some() {
            let remaining = core::mem::take(&mut self.time_remaining);
            self.generation = self.generation.wrapping_add(1);
            let settle = pattern::photo_settle(&self.ticks, remaining);
            return CamUnitDone {
                next: Some(settle.with_generation(self.generation)),
                finished: None,
            };
        }
        CamUnitDone {
            next: None,
            finished: self.active.take(),
        }
    }

    /// Drop the in-flight trigger; its pending completions go stale
    pub fn stop(&mut self) {
        self.active = None;
        self.time_remaining = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns if a trigger is in flight
    pub const fn is_on(&self) -> bool {
        self.active.is_some()
    }
}

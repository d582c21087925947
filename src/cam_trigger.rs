//! PIR/timer camera trigger orchestrator
//!
//! Fuses PIR motion interrupts, the periodic trigger timer and the device
//! tick into camera trigger programs. Every entry point is a pure
//! transition: it updates the orchestrator state and returns the
//! [`TriggerCommands`] the caller has to execute, in order.
//!
//! Async events (PIR, timer, program completion) are ignored while the
//! orchestrator is stopped, so events queued before a [`CamTrigger::stop`]
//! can not re-arm sensing. Every started or stopped program bumps a
//! generation; completions carrying an older generation belong to a
//! replaced program and are dropped.

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::command::{PirSenseSettings, TriggerCommand, TriggerCommands};
use crate::config::{
    CameraAction, ConfigError, PIR_SENSE_INTERVAL, SourceConfig, TriggerConfig, TriggerMode,
    TriggerSource, validate_pin_count,
};
use crate::pattern::{self, PatternProgram, ProgramTag, TriggerState, param_ticks};
use crate::ticks::{PatternTicks, TickRate, TriggerTimings};

/// Ticks at or below this interval are dropped by [`CamTrigger::add_tick`].
///
/// Filters sub-interval noise from the tick source; state switching depends
/// on it.
pub const MIN_TICK_INTERVAL: u32 = 51;

/// Hardware setup of the camera trigger
#[derive(Debug, Clone, Copy)]
pub struct CamTriggerSetup {
    /// Number of output pins wired to the generator
    pub pin_count: usize,
    /// Tick rate of the output generator
    pub rate: TickRate,
    pub timings: TriggerTimings,
}

impl Default for CamTriggerSetup {
    fn default() -> Self {
        Self {
            pin_count: pattern::NUM_PINS,
            rate: TickRate::LFCLK,
            timings: TriggerTimings::default(),
        }
    }
}

/// Camera trigger orchestrator for the PIR sensor node
#[derive(Debug, Clone)]
pub struct CamTrigger {
    config: TriggerConfig,
    rate: TickRate,
    ticks: PatternTicks,

    started: bool,
    /// A PIR-triggered program is in flight; timer triggers wait for it
    pir_operation: bool,
    video_on: bool,
    /// Residual hold carried into the next program
    time_remaining: u32,
    video_extension: u32,
    /// Generation of the program currently owning the output
    generation: u32,
}

impl CamTrigger {
    /// Validate and copy the configuration
    ///
    /// The orchestrator starts stopped; run [`init`](Self::init) commands
    /// before anything else.
    pub fn new(config: &TriggerConfig, setup: &CamTriggerSetup) -> Result<Self, ConfigError> {
        validate_pin_count(setup.pin_count)?;
        config.validate()?;

        Ok(Self {
            config: *config,
            rate: setup.rate,
            ticks: setup.timings.to_ticks(setup.rate),
            started: false,
            pir_operation: false,
            video_on: false,
            time_remaining: 0,
            video_extension: 0,
            generation: 0,
        })
    }

    /// Configure the sensing drivers and park the outputs
    pub fn init(&self) -> TriggerCommands {
        #[cfg(feature = "esp32-log")]
        println!("[CamTrigger.init] mode {:?}", self.config.mode);

        let mut commands = TriggerCommands::new();
        if self.config.mode.uses_pir() {
            let _ = commands.push(TriggerCommand::SetAmplification(
                self.config.pir_sense.amplification,
            ));
        }
        commands.push_stop_pattern();
        commands
    }

    /// Arm the configured sources. Does nothing if already started.
    pub fn start(&mut self) -> TriggerCommands {
        let mut commands = TriggerCommands::new();
        if self.started {
            return commands;
        }

        #[cfg(feature = "esp32-log")]
        println!("[CamTrigger.start] mode {:?}", self.config.mode);

        if self.config.mode.uses_timer() {
            let _ = commands.push(TriggerCommand::StartTimer(self.config.timer_interval));
        }
        if self.config.mode.uses_pir() {
            commands.push_enable_pir(self.pir_settings());
        }
        self.started = true;
        commands
    }

    /// Disarm every source and force the outputs to the safe levels
    pub fn stop(&mut self) -> TriggerCommands {
        #[cfg(feature = "esp32-log")]
        println!("[CamTrigger.stop]");

        self.started = false;
        self.pir_operation = false;
        self.video_on = false;
        self.time_remaining = 0;
        self.video_extension = 0;

        let mut commands = TriggerCommands::new();
        commands.push_disable_pir();
        let _ = commands.push(TriggerCommand::StopTimer);
        self.stop_pattern(&mut commands);
        commands
    }

    /// Replace the configuration without restarting sensing.
    ///
    /// PIR threshold and timer interval apply the next time the source is
    /// armed; the amplifier gain applies immediately.
    pub fn update(&mut self, config: &TriggerConfig) -> Result<TriggerCommands, ConfigError> {
        config.validate()?;
        self.config = *config;

        #[cfg(feature = "esp32-log")]
        println!("[CamTrigger.update] mode {:?}", self.config.mode);

        let mut commands = TriggerCommands::new();
        if self.config.mode.uses_pir() {
            let _ = commands.push(TriggerCommand::SetAmplification(
                self.config.pir_sense.amplification,
            ));
        }
        Ok(commands)
    }

    /// Returns if [`add_tick`](Self::add_tick) acts on a tick of `interval`
    pub const fn accepts_tick(interval: u32) -> bool {
        interval > MIN_TICK_INTERVAL
    }

    /// Periodic re-evaluation of the light gates.
    ///
    /// `light` is the current light sensor sample. Starts sensing while any
    /// active source's gate is open and stops it otherwise.
    pub fn add_tick(&mut self, interval: u32, light: u32) -> TriggerCommands {
        if !Self::accepts_tick(interval) {
            return TriggerCommands::new();
        }

        let allowed = match self.config.mode {
            TriggerMode::PirOnly => self.config.pir.light_gate.allows(light),
            TriggerMode::TimerOnly => self.config.timer.light_gate.allows(light),
            TriggerMode::PirAndTimer => {
                self.config.pir.light_gate.allows(light)
                    || self.config.timer.light_gate.allows(light)
            }
        };

        #[cfg(feature = "esp32-log")]
        println!(
            "[CamTrigger.add_tick] interval {}, light {}, allowed {}",
            interval, light, allowed
        );

        if allowed { self.start() } else { self.stop() }
    }

    /// PIR motion interrupt.
    ///
    /// `elapsed` is the number of ticks the current program had run when
    /// the interrupt fired, sampled in the interrupt handler.
    pub fn on_pir(&mut self, elapsed: u32) -> TriggerCommands {
        let mut commands = TriggerCommands::new();
        if !self.started {
            return commands;
        }

        #[cfg(feature = "esp32-log")]
        println!("[CamTrigger.on_pir] elapsed {}", elapsed);

        commands.push_disable_pir();
        self.stop_pattern(&mut commands);
        self.pir_operation = true;

        let program = if self.video_on && self.time_remaining > 0 {
            self.time_remaining = self.time_remaining.saturating_sub(elapsed);
            pattern::video_extension(self.video_extension)
        } else {
            self.dispatch(TriggerSource::Motion)
        };
        self.start_pattern(&mut commands, program);
        commands
    }

    /// Trigger timer elapsed
    pub fn on_timer(&mut self) -> TriggerCommands {
        let mut commands = TriggerCommands::new();
        if !self.started || self.pir_operation {
            return commands;
        }

        #[cfg(feature = "esp32-log")]
        println!("[CamTrigger.on_timer]");

        self.stop_pattern(&mut commands);
        let program = self.dispatch(TriggerSource::Timer);
        self.start_pattern(&mut commands, program);
        commands
    }

    /// The output generator finished the program tagged `tag`
    pub fn on_pattern_done(&mut self, tag: ProgramTag) -> TriggerCommands {
        let mut commands = TriggerCommands::new();
        if !self.started {
            return commands;
        }
        if tag.generation != self.generation {
            #[cfg(feature = "esp32-log")]
            println!(
                "[CamTrigger.on_pattern_done] stale {:?}, generation {}",
                tag, self.generation
            );
            return commands;
        }

        #[cfg(feature = "esp32-log")]
        println!("[CamTrigger.on_pattern_done] {:?}", tag.state);

        match tag.state {
            TriggerState::Idle | TriggerState::VideoTimer => self.rearm(&mut commands),
            TriggerState::Photo => {
                let remaining = core::mem::take(&mut self.time_remaining);
                let program = pattern::photo_settle(&self.ticks, remaining);
                self.start_pattern(&mut commands, program);
            }
            TriggerState::VideoStart => {
                self.video_on = true;
                commands.push_enable_pir(self.pir_settings());
                let program = pattern::video_hold(&self.ticks, self.time_remaining);
                self.start_pattern(&mut commands, program);
            }
            TriggerState::VideoExt => {
                let program = pattern::video_hold(&self.ticks, self.time_remaining);
                self.start_pattern(&mut commands, program);
                commands.push_enable_pir(self.pir_settings());
            }
            TriggerState::VideoEnd => {
                self.video_on = false;
                self.time_remaining = 0;
                self.rearm(&mut commands);
            }
        }
        commands
    }

    fn start_pattern(&mut self, commands: &mut TriggerCommands, program: PatternProgram) {
        self.generation = self.generation.wrapping_add(1);
        commands.push_start_pattern(program.with_generation(self.generation));
    }

    fn stop_pattern(&mut self, commands: &mut TriggerCommands) {
        self.generation = self.generation.wrapping_add(1);
        commands.push_stop_pattern();
    }

    /// Back to idle: PIR sensing re-armed and timer triggers allowed again
    fn rearm(&mut self, commands: &mut TriggerCommands) {
        if self.config.mode.uses_pir() {
            commands.push_enable_pir(self.pir_settings());
        }
        self.pir_operation = false;
    }

    /// Build the program configured for `source`
    fn dispatch(&mut self, source: TriggerSource) -> PatternProgram {
        let setup = self.source_config(source);
        let interval = self.rate.ticks(setup.inter_trigger);

        #[cfg(feature = "esp32-log")]
        println!(
            "[CamTrigger.dispatch] {:?}: {:?}, interval {} ticks",
            source, setup.action, interval
        );

        match setup.action {
            CameraAction::Video { duration } if source == TriggerSource::Motion => {
                let video = param_ticks(self.rate, duration.into());
                let extension = self.rate.ticks(self.config.pir.inter_trigger).min(video);
                self.video_extension = extension;
                self.time_remaining = extension;
                pattern::video_start(&self.ticks, video, extension)
            }
            // Press now, settle and hold the rest once the press completes
            CameraAction::SingleShot => {
                let busy = self.ticks.trigger_pulse.saturating_add(self.ticks.photo_settle);
                self.time_remaining = interval.saturating_sub(busy);
                pattern::photo_press(&self.ticks)
            }
            action => {
                self.time_remaining = 0;
                pattern::build(action, self.rate, &self.ticks, interval)
            }
        }
    }

    fn source_config(&self, source: TriggerSource) -> SourceConfig {
        match source {
            TriggerSource::Motion => self.config.pir,
            TriggerSource::Timer => self.config.timer,
        }
    }

    fn pir_settings(&self) -> PirSenseSettings {
        PirSenseSettings {
            interval: PIR_SENSE_INTERVAL,
            threshold: self.config.pir_sense.scaled_threshold(),
        }
    }

    pub const fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub const fn is_started(&self) -> bool {
        self.started
    }

    pub const fn is_video_on(&self) -> bool {
        self.video_on
    }

    /// Returns if a PIR-triggered program is in flight
    pub const fn is_pir_operation(&self) -> bool {
        self.pir_operation
    }

    pub const fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub const fn video_extension(&self) -> u32 {
        self.video_extension
    }

    /// Generation the next valid completion must carry
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

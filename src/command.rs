use embassy_time::Duration;
use heapless::Vec;

use crate::pattern::{PatternProgram, PinLevels};

/// Side effects requested by a core
///
/// N is the number of commands a single entry point may emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandList<C, const N: usize> {
    inner: Vec<C, N>,
}

impl<C, const N: usize> CommandList<C, N> {
    pub const fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Push a command onto the list
    ///
    /// Returns the command if the list is full
    pub fn push(&mut self, command: C) -> Result<(), C> {
        self.inner.push(command)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_slice(&self) -> &[C] {
        &self.inner
    }

    pub fn iter(&self) -> core::slice::Iter<'_, C> {
        self.inner.iter()
    }
}

impl<C, const N: usize> Default for CommandList<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, C, const N: usize> IntoIterator for &'a CommandList<C, N> {
    type Item = &'a C;
    type IntoIter = core::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// PIR sense driver settings as handed to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PirSenseSettings {
    /// Sampling interval
    pub interval: Duration,
    /// Scaled threshold the sampled signal is compared against
    pub threshold: u32,
}

/// Side effects of the PIR/timer camera trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerCommand {
    /// Arm PIR sensing
    EnablePir(PirSenseSettings),
    /// Disarm PIR sensing
    DisablePir,
    /// Start the repeating trigger timer
    StartTimer(Duration),
    StopTimer,
    /// Run a program on the output generator, replacing the current one
    StartPattern(PatternProgram),
    /// Halt the output generator and drive the given levels
    StopPattern(PinLevels),
    /// Set the PIR amplifier gain
    SetAmplification(u8),
}

/// Maximum number of commands a trigger entry point emits
pub const TRIGGER_COMMANDS: usize = 6;

/// Commands emitted by [`CamTrigger`](crate::CamTrigger)
pub type TriggerCommands = CommandList<TriggerCommand, TRIGGER_COMMANDS>;

impl CommandList<TriggerCommand, TRIGGER_COMMANDS> {
    pub(crate) fn push_enable_pir(&mut self, settings: PirSenseSettings) {
        let _ = self.push(TriggerCommand::EnablePir(settings));
    }

    pub(crate) fn push_disable_pir(&mut self) {
        let _ = self.push(TriggerCommand::DisablePir);
    }

    pub(crate) fn push_start_pattern(&mut self, program: PatternProgram) {
        let _ = self.push(TriggerCommand::StartPattern(program));
    }

    /// Stop the generator on the safe levels
    pub(crate) fn push_stop_pattern(&mut self) {
        let _ = self.push(TriggerCommand::StopPattern(PinLevels::ALL_ON));
    }

    /// Returns the program started by these commands, if any
    pub fn started_program(&self) -> Option<&PatternProgram> {
        self.iter().find_map(|command| match command {
            TriggerCommand::StartPattern(program) => Some(program),
            _ => None,
        })
    }
}

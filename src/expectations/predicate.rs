//! Closure-backed expectations for steps whose criterion is not a fixed
//! command or key sequence.

use crate::event::{EventKind, KeyPress, TourEvent};
use crate::expectation::Expectation;
use crate::memory::StepMemory;
use anyhow::Result;

/// Wraps `Fn(&str, &mut StepMemory) -> Result<bool>` over typed command lines.
pub struct CommandPredicate<F> {
    predicate: F,
}

impl<F> CommandPredicate<F>
where
    F: Fn(&str, &mut StepMemory) -> Result<bool> + Send + Sync + 'static,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> Expectation for CommandPredicate<F>
where
    F: Fn(&str, &mut StepMemory) -> Result<bool> + Send + Sync + 'static,
{
    fn kind(&self) -> EventKind {
        EventKind::Command
    }

    fn check(&self, event: &TourEvent, memory: &mut StepMemory) -> Result<bool> {
        match event {
            TourEvent::Command(line) => (self.predicate)(line, memory),
            TourEvent::Keypress(_) => Ok(false),
        }
    }
}

/// Wraps `Fn(&KeyPress, &mut StepMemory) -> Result<bool>` over key presses.
pub struct KeypressPredicate<F> {
    predicate: F,
}

impl<F> KeypressPredicate<F>
where
    F: Fn(&KeyPress, &mut StepMemory) -> Result<bool> + Send + Sync + 'static,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> Expectation for KeypressPredicate<F>
where
    F: Fn(&KeyPress, &mut StepMemory) -> Result<bool> + Send + Sync + 'static,
{
    fn kind(&self) -> EventKind {
        EventKind::Keypress
    }

    fn check(&self, event: &TourEvent, memory: &mut StepMemory) -> Result<bool> {
        match event {
            TourEvent::Keypress(key) => (self.predicate)(key, memory),
            TourEvent::Command(_) => Ok(false),
        }
    }
}

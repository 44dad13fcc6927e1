//! [`CommandIs`]: satisfied by one exact command line.
//!
//! Script syntax: `expect command "foo"`

use crate::event::{EventKind, TourEvent};
use crate::expectation::Expectation;
use crate::memory::StepMemory;
use anyhow::Result;

/// Satisfied when the typed command line equals `expected`.
///
/// Leading and trailing whitespace on the typed line is ignored.
pub struct CommandIs {
    pub expected: String,
}

impl CommandIs {
    pub const NAME: &'static str = "command";

    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl Expectation for CommandIs {
    fn kind(&self) -> EventKind {
        EventKind::Command
    }

    fn check(&self, event: &TourEvent, _memory: &mut StepMemory) -> Result<bool> {
        Ok(matches!(event, TourEvent::Command(line) if line.trim() == self.expected))
    }

    fn describe(&self) -> String {
        format!("command \"{}\"", self.expected)
    }
}

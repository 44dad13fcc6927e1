//! [`KeySequence`]: satisfied by a run of key presses in order.
//!
//! Script syntax: `expect keys left right` or `expect key enter`

use crate::event::{EventKind, KeyPress, TourEvent};
use crate::expectation::Expectation;
use crate::memory::StepMemory;
use anyhow::{Result, anyhow};

/// Satisfied once `keys` have been pressed consecutively.
///
/// Progress is kept in step memory. Any key that does not continue the
/// sequence resets progress to zero, including a repeat of the first key.
pub struct KeySequence {
    pub keys: Vec<KeyPress>,
}

impl KeySequence {
    pub const NAME: &'static str = "keys";

    pub fn new(keys: Vec<KeyPress>) -> Self {
        Self { keys }
    }

    /// Build a sequence from key names such as `["left", "right"]`.
    pub fn parse<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = names
            .into_iter()
            .map(|name| KeyPress::parse(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if keys.is_empty() {
            return Err(anyhow!("Key sequence needs at least one key"));
        }
        Ok(Self::new(keys))
    }
}

impl Expectation for KeySequence {
    fn kind(&self) -> EventKind {
        EventKind::Keypress
    }

    fn check(&self, event: &TourEvent, memory: &mut StepMemory) -> Result<bool> {
        let TourEvent::Keypress(pressed) = event else {
            return Ok(false);
        };
        let progress = memory.get_or_insert_with(|| 0usize);
        if self.keys.get(*progress) == Some(pressed) {
            *progress += 1;
        } else {
            *progress = 0;
        }
        Ok(*progress == self.keys.len())
    }

    fn is_satisfiable(&self) -> bool {
        !self.keys.is_empty()
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        format!("keys {}", names.join(" "))
    }
}

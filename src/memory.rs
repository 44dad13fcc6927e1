//! [`StepMemory`]: scratch state private to one step activation.

use std::any::Any;
use std::fmt;

/// A single typed scratch slot owned by the active step.
///
/// The runner clears it every time a step becomes active and keeps it across
/// failed attempts within that activation, so an expectation can track
/// progress through multi-event sequences such as "left, then right".
#[derive(Default)]
pub struct StepMemory {
    slot: Option<Box<dyn Any + Send>>,
}

impl StepMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Borrow the stored value if it is a `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.slot.as_ref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Borrow the stored `T`, initializing the slot first if it is empty or
    /// holds a value of another type.
    pub fn get_or_insert_with<T: Any + Send>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        if !matches!(&self.slot, Some(value) if value.is::<T>()) {
            self.slot = Some(Box::new(init()));
        }
        match self.slot.as_mut().and_then(|value| value.downcast_mut::<T>()) {
            Some(value) => value,
            None => unreachable!("slot was just filled with a value of the requested type"),
        }
    }

    pub fn set<T: Any + Send>(&mut self, value: T) {
        self.slot = Some(Box::new(value));
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

impl fmt::Debug for StepMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepMemory")
            .field("occupied", &self.slot.is_some())
            .finish()
    }
}

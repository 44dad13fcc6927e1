//! The [`Expectation`] trait: the success criterion of a tour step.

use crate::event::{EventKind, TourEvent};
use crate::memory::StepMemory;
use anyhow::Result;

/// Decides whether an incoming event satisfies the active step.
///
/// The runner only hands an expectation events of the [`kind`](Self::kind) it
/// asks for. [`check`](Self::check) is called once per event, possibly many
/// times with failing events, and receives the step's private
/// [`StepMemory`] for multi-event sequences.
///
/// Built-in implementations live in [`crate::expectations`]. A custom one:
///
/// ```
/// use shelltour::{EventKind, Expectation, StepMemory, TourEvent};
///
/// struct AnyCommandTwice;
///
/// impl Expectation for AnyCommandTwice {
///     fn kind(&self) -> EventKind {
///         EventKind::Command
///     }
///
///     fn check(&self, _event: &TourEvent, memory: &mut StepMemory) -> anyhow::Result<bool> {
///         let seen = memory.get_or_insert_with(|| 0u32);
///         *seen += 1;
///         Ok(*seen == 2)
///     }
/// }
/// ```
pub trait Expectation: Send + Sync + 'static {
    /// The event kind this expectation listens for.
    fn kind(&self) -> EventKind;

    /// Return `Ok(true)` once `event` satisfies the step.
    ///
    /// An `Err` aborts the tour: there is no safe default verdict.
    fn check(&self, event: &TourEvent, memory: &mut StepMemory) -> Result<bool>;

    /// `false` if no event could ever satisfy this expectation. Checked when
    /// the step is built.
    fn is_satisfiable(&self) -> bool {
        true
    }

    /// Short human-readable description used in logs.
    fn describe(&self) -> String {
        match self.kind() {
            EventKind::Command => "custom command expectation".to_string(),
            EventKind::Keypress => "custom keypress expectation".to_string(),
        }
    }
}

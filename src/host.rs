//! The [`HostAdapter`] trait: everything a running tour needs from its shell.

use crate::error::AdapterError;
use crate::event::{EventKind, TourEvent};
use async_trait::async_trait;
use std::time::Duration;

/// Boundary between a [`TourRunner`](crate::TourRunner) and the shell it runs in.
///
/// The runner holds at most one pending [`next_event`](Self::next_event) or
/// [`pause`](Self::pause) future at a time. Dropping that future is how a
/// listener is deregistered or a timer cancelled, so implementations must be
/// cancel-safe: an event not yet returned must not be lost.
#[async_trait(?Send)]
pub trait HostAdapter {
    /// Write text to the user-visible output.
    ///
    /// `color` is the tour's display hint, passed through untouched.
    fn emit(&mut self, text: &str, color: Option<&str>) -> Result<(), AdapterError>;

    /// Wait for the next event of `kind`.
    async fn next_event(&mut self, kind: EventKind) -> Result<TourEvent, AdapterError>;

    /// Wait for `duration` to elapse.
    async fn pause(&mut self, duration: Duration) -> Result<(), AdapterError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }
}

//! The [`TourRunner`] state machine, which walks a user through a [`Tour`].

use crate::error::{AdapterError, TourError};
use crate::event::TourEvent;
use crate::host::HostAdapter;
use crate::memory::StepMemory;
use crate::script::Tour;
use crate::step::Step;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Where a runner is in its tour. Step positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourState {
    NotStarted,
    Preparing,
    StepActive(usize),
    StepSatisfied(usize),
    Waiting(usize),
    Completed,
    Aborted,
}

impl TourState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TourState::Completed | TourState::Aborted)
    }
}

impl fmt::Display for TourState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourState::NotStarted => f.write_str("not started"),
            TourState::Preparing => f.write_str("preparing"),
            TourState::StepActive(i) => write!(f, "step {i} active"),
            TourState::StepSatisfied(i) => write!(f, "step {i} satisfied"),
            TourState::Waiting(i) => write!(f, "waiting after step {i}"),
            TourState::Completed => f.write_str("completed"),
            TourState::Aborted => f.write_str("aborted"),
        }
    }
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourOutcome {
    Completed,
    Aborted,
}

/// Cancels a running tour from anywhere, any number of times.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    token: CancellationToken,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of one suspension: either the awaited value or an abort.
enum Resumed<T> {
    Ready(T),
    Aborted,
}

/// Drives one run of a [`Tour`] against a [`HostAdapter`].
///
/// A runner is single-use: build a fresh one from the shared `Arc<Tour>` for
/// every run so step memory is never shared.
///
/// ```no_run
/// # use shelltour::{HostAdapter, TourRunner, TourScript};
/// # use std::sync::Arc;
/// # async fn demo(host: &mut impl HostAdapter) -> anyhow::Result<()> {
/// let mut script = TourScript::new();
/// script.step(1).begin("Run \"foo\".").expect_command("foo");
/// let tour = Arc::new(script.finalize()?);
///
/// let mut runner = TourRunner::new(tour);
/// let outcome = runner.run(host).await?;
/// # Ok(())
/// # }
/// ```
pub struct TourRunner {
    tour: Arc<Tour>,
    state: watch::Sender<TourState>,
    memory: StepMemory,
    cancel: CancellationToken,
}

impl TourRunner {
    pub fn new(tour: Arc<Tour>) -> Self {
        let (state, _) = watch::channel(TourState::NotStarted);
        Self {
            tour,
            state,
            memory: StepMemory::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn tour(&self) -> &Arc<Tour> {
        &self.tour
    }

    pub fn state(&self) -> TourState {
        *self.state.borrow()
    }

    /// Observe state transitions as they happen.
    pub fn subscribe(&self) -> watch::Receiver<TourState> {
        self.state.subscribe()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            token: self.cancel.clone(),
        }
    }

    /// Request cancellation. Idempotent; no effect once the tour has ended.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Run the tour to completion or abort.
    ///
    /// # Errors
    ///
    /// [`TourError::AlreadyStarted`] if this runner was run before. Any other
    /// error (adapter failure, failing expectation or prepare hook) leaves the
    /// runner in [`TourState::Aborted`].
    pub async fn run<H>(&mut self, host: &mut H) -> Result<TourOutcome, TourError>
    where
        H: HostAdapter + ?Sized,
    {
        let state = self.state();
        if state != TourState::NotStarted {
            return Err(TourError::AlreadyStarted(state));
        }

        info!(steps = self.tour.steps().len(), "tour started");
        let result = self.drive(host).await;
        match &result {
            Ok(outcome) => info!(?outcome, "tour finished"),
            Err(err) => {
                info!(error = %err, "tour failed");
                self.transition(TourState::Aborted);
            }
        }
        result
    }

    async fn drive<H>(&mut self, host: &mut H) -> Result<TourOutcome, TourError>
    where
        H: HostAdapter + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return Ok(self.aborted());
        }

        if let Some(prepare) = self.tour.prepare() {
            self.transition(TourState::Preparing);
            match self.suspend(prepare).await {
                Resumed::Ready(result) => result.map_err(TourError::Prepare)?,
                Resumed::Aborted => return Ok(self.aborted()),
            }
        }

        let tour = Arc::clone(&self.tour);
        for (offset, step) in tour.steps().iter().enumerate() {
            let position = offset + 1;
            if !self.activate(position, step, tour.color(), host).await? {
                return Ok(self.aborted());
            }

            self.transition(TourState::StepSatisfied(position));
            emit_if_present(host, step.end_text(), tour.color())?;

            self.transition(TourState::Waiting(position));
            let wait = tour.wait_after(offset);
            if !wait.is_zero() {
                match self.suspend(host.pause(wait)).await {
                    Resumed::Ready(Ok(())) => {}
                    Resumed::Ready(Err(_)) if self.cancel.is_cancelled() => {
                        return Ok(self.aborted());
                    }
                    Resumed::Ready(Err(err)) => return Err(err.into()),
                    Resumed::Aborted => return Ok(self.aborted()),
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Ok(self.aborted());
        }
        if let Some(text) = tour.closing_text() {
            host.emit(text, tour.color())?;
        }
        self.transition(TourState::Completed);
        Ok(TourOutcome::Completed)
    }

    /// Run one step activation until its expectation is satisfied.
    ///
    /// Returns `false` if the tour was aborted while listening.
    async fn activate<H>(
        &mut self,
        position: usize,
        step: &Step,
        color: Option<&str>,
        host: &mut H,
    ) -> Result<bool, TourError>
    where
        H: HostAdapter + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return Ok(false);
        }
        self.memory.clear();
        self.transition(TourState::StepActive(position));
        emit_if_present(host, step.begin_text(), color)?;

        let expectation = step.expectation();
        let kind = expectation.kind();
        loop {
            let event: TourEvent = match self.suspend(host.next_event(kind)).await {
                Resumed::Ready(Ok(event)) => event,
                // An adapter failure that races an abort request counts as the abort.
                Resumed::Ready(Err(_)) if self.cancel.is_cancelled() => return Ok(false),
                Resumed::Ready(Err(err)) => return Err(err.into()),
                Resumed::Aborted => return Ok(false),
            };
            if event.kind() != kind {
                continue;
            }

            let satisfied = expectation
                .check(&event, &mut self.memory)
                .map_err(|source| TourError::Expectation {
                    index: step.index(),
                    source,
                })?;
            if satisfied {
                debug!(step = step.index(), expectation = %expectation.describe(), "step satisfied");
                return Ok(true);
            }
            debug!(step = step.index(), ?event, "event rejected");
            emit_if_present(host, step.reject_text(), color)?;
        }
    }

    /// Await `pending` unless the tour is aborted first. On abort the pending
    /// future is dropped, which releases the listener or timer it holds.
    async fn suspend<F: std::future::Future>(&self, pending: F) -> Resumed<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Resumed::Aborted,
            output = pending => Resumed::Ready(output),
        }
    }

    fn aborted(&mut self) -> TourOutcome {
        self.transition(TourState::Aborted);
        TourOutcome::Aborted
    }

    fn transition(&mut self, next: TourState) {
        let previous = self.state.send_replace(next);
        debug!(from = %previous, to = %next, "tour transition");
    }
}

fn emit_if_present<H>(host: &mut H, text: &str, color: Option<&str>) -> Result<(), AdapterError>
where
    H: HostAdapter + ?Sized,
{
    if text.is_empty() {
        return Ok(());
    }
    host.emit(text, color)
}

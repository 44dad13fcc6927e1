//! [`TourScript`] builder and the frozen [`Tour`] it finalizes into.

use crate::error::ConfigurationError;
use crate::step::{Step, StepDefinition};
use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Future returned by a prepare hook.
pub type PrepareFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

type PrepareHook = Box<dyn Fn() -> PrepareFuture + Send + Sync>;

/// Mutable description of a tour, consumed by [`finalize`](Self::finalize).
///
/// ```
/// use shelltour::TourScript;
/// use std::time::Duration;
///
/// let mut script = TourScript::new();
/// script.set_color("cyan").set_default_wait(Duration::from_secs(1));
/// script.step(1).begin("Run \"foo\".").expect_command("foo");
/// script.step(2).begin("Now run \"bar\".").expect_command("bar");
/// script.set_final_text("Done!");
///
/// let tour = script.finalize().unwrap();
/// assert_eq!(tour.steps().len(), 2);
/// ```
#[derive(Default)]
pub struct TourScript {
    steps: Vec<StepDefinition>,
    color: Option<String>,
    prepare: Option<PrepareHook>,
    default_wait: Option<Duration>,
    final_text: String,
}

impl TourScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a step and return it for in-place configuration.
    ///
    /// Duplicate indices are not rejected here; [`finalize`](Self::finalize)
    /// reports them together with every other violation.
    pub fn step(&mut self, index: u32) -> &mut StepDefinition {
        self.steps.push(StepDefinition::new(index));
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    /// Append a prepared definition.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DuplicateIndex`] if a step with the same index was
    /// already declared.
    pub fn add_step(&mut self, definition: StepDefinition) -> Result<&mut Self, ConfigurationError> {
        let index = definition.index();
        if self.steps.iter().any(|step| step.index() == index) {
            return Err(ConfigurationError::DuplicateIndex { index });
        }
        self.steps.push(definition);
        Ok(self)
    }

    /// Display hint handed to the host with every emitted text.
    pub fn set_color(&mut self, token: impl Into<String>) -> &mut Self {
        self.color = Some(token.into());
        self
    }

    /// Async action awaited once before the first step begins.
    pub fn set_prepare_hook<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.prepare = Some(Box::new(move || Box::pin(hook()) as PrepareFuture));
        self
    }

    /// Pause between steps for steps that set no wait of their own.
    pub fn set_default_wait(&mut self, duration: Duration) -> &mut Self {
        self.default_wait = Some(duration);
        self
    }

    /// Text shown once the last step is satisfied.
    pub fn set_final_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.final_text = text.into();
        self
    }

    /// Validate every step, sort by index and freeze the script.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::Invalid`] listing every violation found: steps
    /// without an expectation, zero indices and duplicated indices.
    pub fn finalize(self) -> Result<Tour, ConfigurationError> {
        let mut violations = Vec::new();
        let mut steps = Vec::with_capacity(self.steps.len());
        for definition in self.steps {
            match definition.build() {
                Ok(step) => steps.push(step),
                Err(err) => violations.extend(err.violations()),
            }
        }

        // Stable: equal indices keep declaration order.
        steps.sort_by_key(Step::index);
        let mut duplicates: Vec<u32> = steps
            .windows(2)
            .filter(|pair| pair[0].index() == pair[1].index())
            .map(|pair| pair[0].index())
            .collect();
        duplicates.dedup();
        violations.extend(
            duplicates
                .into_iter()
                .map(|index| ConfigurationError::DuplicateIndex { index }),
        );

        if !violations.is_empty() {
            return Err(ConfigurationError::Invalid(violations));
        }

        if let Some(last) = steps.last()
            && !last.end_text().is_empty()
            && !self.final_text.is_empty()
        {
            debug!(
                step = last.index(),
                "last step has its own end text; final text will not be shown"
            );
        }

        Ok(Tour {
            steps,
            color: self.color,
            prepare: self.prepare,
            default_wait: self.default_wait,
            final_text: self.final_text,
        })
    }
}

impl fmt::Debug for TourScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourScript")
            .field("steps", &self.steps)
            .field("color", &self.color)
            .field("prepare", &self.prepare.is_some())
            .field("default_wait", &self.default_wait)
            .finish_non_exhaustive()
    }
}

/// A finalized, immutable tour. Share it behind an `Arc` and build one
/// [`TourRunner`](crate::TourRunner) per run.
pub struct Tour {
    steps: Vec<Step>,
    color: Option<String>,
    prepare: Option<PrepareHook>,
    default_wait: Option<Duration>,
    final_text: String,
}

impl Tour {
    /// Steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn default_wait(&self) -> Option<Duration> {
        self.default_wait
    }

    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    pub fn has_prepare_hook(&self) -> bool {
        self.prepare.is_some()
    }

    pub(crate) fn prepare(&self) -> Option<PrepareFuture> {
        self.prepare.as_ref().map(|hook| hook())
    }

    /// Pause after the step at zero-based `position`.
    ///
    /// The step's own wait wins; the script default only applies between
    /// steps, never after the last one.
    pub fn wait_after(&self, position: usize) -> Duration {
        let Some(step) = self.steps.get(position) else {
            return Duration::ZERO;
        };
        let is_last = position + 1 == self.steps.len();
        match (step.wait(), is_last) {
            (Some(wait), _) => wait,
            (None, false) => self.default_wait.unwrap_or(Duration::ZERO),
            (None, true) => Duration::ZERO,
        }
    }

    /// Text to show after the last step, unless that step already ends with
    /// its own text.
    pub fn closing_text(&self) -> Option<&str> {
        let covered = self
            .steps
            .last()
            .is_some_and(|step| !step.end_text().is_empty());
        (!covered && !self.final_text.is_empty()).then_some(self.final_text.as_str())
    }
}

impl fmt::Debug for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tour")
            .field("steps", &self.steps)
            .field("color", &self.color)
            .field("prepare", &self.prepare.is_some())
            .field("default_wait", &self.default_wait)
            .finish_non_exhaustive()
    }
}

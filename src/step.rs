//! [`StepDefinition`] builder and the validated [`Step`] it produces.

use crate::error::ConfigurationError;
use crate::event::KeyPress;
use crate::expectation::Expectation;
use crate::expectations::{CommandIs, CommandPredicate, KeySequence, KeypressPredicate};
use crate::memory::StepMemory;
use anyhow::Result;
use std::fmt;
use std::time::Duration;

/// Builder for one tour step.
///
/// Every setter returns the same definition so calls can be chained:
///
/// ```
/// use shelltour::StepDefinition;
/// use std::time::Duration;
///
/// let mut step = StepDefinition::new(1);
/// step.begin("To start, run \"foo\".")
///     .expect_command("foo")
///     .reject("Let's type \"foo\" instead.")
///     .wait(Duration::from_millis(500))
///     .end("Nice!");
/// let step = step.build().unwrap();
/// assert_eq!(step.index(), 1);
/// ```
pub struct StepDefinition {
    index: u32,
    begin_text: String,
    expectation: Option<Box<dyn Expectation>>,
    reject_text: String,
    wait: Option<Duration>,
    end_text: String,
}

impl StepDefinition {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            begin_text: String::new(),
            expectation: None,
            reject_text: String::new(),
            wait: None,
            end_text: String::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Text shown when the step becomes active.
    pub fn begin(&mut self, text: impl Into<String>) -> &mut Self {
        self.begin_text = text.into();
        self
    }

    /// The success criterion. Replaces any earlier expectation.
    pub fn expect(&mut self, expectation: impl Expectation) -> &mut Self {
        self.expectation = Some(Box::new(expectation));
        self
    }

    /// Expect the user to type exactly `command`.
    pub fn expect_command(&mut self, command: impl Into<String>) -> &mut Self {
        self.expect(CommandIs::new(command))
    }

    /// Expect the given keys to be pressed in order.
    pub fn expect_keys(&mut self, keys: Vec<KeyPress>) -> &mut Self {
        self.expect(KeySequence::new(keys))
    }

    pub fn expect_command_with<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&str, &mut StepMemory) -> Result<bool> + Send + Sync + 'static,
    {
        self.expect(CommandPredicate::new(predicate))
    }

    pub fn expect_keypress_with<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&KeyPress, &mut StepMemory) -> Result<bool> + Send + Sync + 'static,
    {
        self.expect(KeypressPredicate::new(predicate))
    }

    /// Text shown each time an event fails the expectation.
    pub fn reject(&mut self, text: impl Into<String>) -> &mut Self {
        self.reject_text = text.into();
        self
    }

    /// Pause after success, before the next step begins.
    pub fn wait(&mut self, duration: Duration) -> &mut Self {
        self.wait = Some(duration);
        self
    }

    /// Text shown immediately after success.
    pub fn end(&mut self, text: impl Into<String>) -> &mut Self {
        self.end_text = text.into();
        self
    }

    /// Validate and freeze the definition.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ZeroIndex`],
    /// [`ConfigurationError::MissingExpectation`] or
    /// [`ConfigurationError::Unsatisfiable`] when one rule is broken,
    /// [`ConfigurationError::Invalid`] listing all of them otherwise.
    pub fn build(self) -> Result<Step, ConfigurationError> {
        let mut violations = Vec::new();
        if self.index == 0 {
            violations.push(ConfigurationError::ZeroIndex);
        }
        let Some(expectation) = self.expectation else {
            violations.push(ConfigurationError::MissingExpectation { index: self.index });
            return Err(collect(violations));
        };
        if !expectation.is_satisfiable() {
            violations.push(ConfigurationError::Unsatisfiable { index: self.index });
        }
        if !violations.is_empty() {
            return Err(collect(violations));
        }

        Ok(Step {
            index: self.index,
            begin_text: self.begin_text,
            expectation,
            reject_text: self.reject_text,
            wait: self.wait,
            end_text: self.end_text,
        })
    }
}

fn collect(mut violations: Vec<ConfigurationError>) -> ConfigurationError {
    if violations.len() == 1 {
        violations.remove(0)
    } else {
        ConfigurationError::Invalid(violations)
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("index", &self.index)
            .field("expectation", &self.expectation.as_ref().map(|e| e.describe()))
            .finish_non_exhaustive()
    }
}

/// A validated, immutable tour step.
pub struct Step {
    index: u32,
    begin_text: String,
    expectation: Box<dyn Expectation>,
    reject_text: String,
    wait: Option<Duration>,
    end_text: String,
}

impl Step {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn begin_text(&self) -> &str {
        &self.begin_text
    }

    pub fn expectation(&self) -> &dyn Expectation {
        &*self.expectation
    }

    pub fn reject_text(&self) -> &str {
        &self.reject_text
    }

    /// The step's own post-success pause, if it set one.
    pub fn wait(&self) -> Option<Duration> {
        self.wait
    }

    pub fn end_text(&self) -> &str {
        &self.end_text
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("index", &self.index)
            .field("expectation", &self.expectation.describe())
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

//! Installs a tour into a [`Shell`] as a named command.

use crate::error::ConfigurationError;
use crate::runner::{TourOutcome, TourRunner};
use crate::script::{Tour, TourScript};
use crate::shell::{Shell, ShellCommand, ShellContext};
use crate::stdio::StdioHost;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

type TourFactory = Box<dyn FnOnce(&mut TourScript) -> Result<(), ConfigurationError>>;

const DEFAULT_DESCRIPTION: &str = "Takes you on a guided tour.";

/// Options accepted by [`register`].
///
/// `command` and `tour` are required.
///
/// ```
/// use shelltour::{PluginOptions, Shell, plugin};
///
/// let mut shell = Shell::new();
/// plugin::register(
///     &mut shell,
///     PluginOptions::new().command("tour").tour(|tour| {
///         tour.step(1).begin("Run \"help\".").expect_command("help");
///         Ok(())
///     }),
/// )
/// .unwrap();
/// assert!(shell.commands().contains("tour"));
/// ```
#[derive(Default)]
pub struct PluginOptions {
    command: Option<String>,
    tour: Option<TourFactory>,
    description: Option<String>,
}

impl PluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the shell command that starts the tour.
    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(name.into());
        self
    }

    /// Factory that declares the tour's steps and settings.
    pub fn tour<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&mut TourScript) -> Result<(), ConfigurationError> + 'static,
    {
        self.tour = Some(Box::new(factory));
        self
    }

    /// Help text shown next to the command.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Build the tour and register its command on `shell`.
///
/// # Errors
///
/// [`ConfigurationError::MissingOption`] if `command` is missing or blank or
/// `tour` is missing; any error returned by the factory or by
/// [`TourScript::finalize`]. Nothing is registered on error.
pub fn register(shell: &mut Shell, options: PluginOptions) -> Result<(), ConfigurationError> {
    let name = options
        .command
        .filter(|name| !name.trim().is_empty())
        .ok_or(ConfigurationError::MissingOption("command"))?;
    let factory = options.tour.ok_or(ConfigurationError::MissingOption("tour"))?;

    let mut script = TourScript::new();
    factory(&mut script)?;
    let tour = script.finalize()?;

    let description = options
        .description
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
    register_command(shell, name, description, tour);
    Ok(())
}

/// Register an already finalized tour under `name`.
pub fn register_command(
    shell: &mut Shell,
    name: impl Into<String>,
    description: impl Into<String>,
    tour: Tour,
) {
    let name = name.into();
    info!(command = %name, steps = tour.steps().len(), "registering tour");
    shell.register_command(
        name.clone(),
        description,
        TourCommand {
            name,
            tour: Arc::new(tour),
        },
    );
}

/// Shell command that runs a fresh [`TourRunner`] on every invocation.
pub struct TourCommand {
    name: String,
    tour: Arc<Tour>,
}

#[async_trait(?Send)]
impl ShellCommand for TourCommand {
    async fn execute(&self, _args: &str, ctx: &mut ShellContext<'_>) -> Result<()> {
        let mut runner = TourRunner::new(Arc::clone(&self.tour));
        let mut host = StdioHost::new(ctx)
            .skip_command(self.name.clone())
            .interrupt_with(runner.abort_handle());
        match runner.run(&mut host).await? {
            TourOutcome::Completed => info!(command = %self.name, "tour completed"),
            TourOutcome::Aborted => info!(command = %self.name, "tour aborted"),
        }
        Ok(())
    }
}

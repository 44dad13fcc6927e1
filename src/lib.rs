//! # Shelltour
//!
//! Guided, step-by-step tours for interactive command-line shells.
//!
//! A tour is an ordered list of steps. Each step shows some text, waits for
//! the user to do one thing (run a command, press a sequence of keys), tells
//! them when they got it wrong, and moves on once they got it right. Tours are
//! declared in code through [`TourScript`] or loaded from a small script
//! format with [`parse_str`] / [`parse_file`], and installed into a [`Shell`]
//! as a regular command with [`plugin::register`].
//!
//! ## Quick start
//!
//! ```no_run
//! use shelltour::{KeyPress, PluginOptions, Shell, plugin};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut shell = Shell::new();
//!     shell.set_delimiter("myapp~$").command("foo", "Prints bar.", |_args, ctx| {
//!         ctx.log("bar");
//!         Ok(())
//!     });
//!
//!     plugin::register(
//!         &mut shell,
//!         PluginOptions::new().command("tour").tour(|tour| {
//!             tour.set_color("cyan").set_default_wait(Duration::from_secs(1));
//!             tour.step(1)
//!                 .begin("To start, run \"foo\".")
//!                 .expect_command("foo")
//!                 .reject("Try \"foo\" instead.")
//!                 .end("Nice!");
//!             tour.step(2)
//!                 .begin("Now press left, then right.")
//!                 .expect_keys(vec![KeyPress::new("left"), KeyPress::new("right")]);
//!             tour.set_final_text("Very well done!");
//!             Ok(())
//!         }),
//!     )?;
//!
//!     shell.run().await
//! }
//! ```
//!
//! ## Driving a tour yourself
//!
//! [`TourRunner`] is independent of the bundled shell. Implement
//! [`HostAdapter`] to feed it events from any source and to show its texts
//! anywhere; observe progress through [`TourRunner::subscribe`] and cancel
//! it with an [`AbortHandle`].
//!
//! ## Script syntax
//!
//! | Line | Description |
//! |------|-------------|
//! | `tour color cyan` | Color token passed along with every emitted text |
//! | `tour wait 1s` | Default pause between steps (`ms` or `s`, floats allowed) |
//! | `tour end "text"` | Text shown once the last step is satisfied |
//! | `step 3` | Start declaring the step with index 3 |
//! | `begin "text"` | Shown when the step becomes active |
//! | `expect command "foo"` | Satisfied by the command line `foo` |
//! | `expect keys left right` | Satisfied by the keys pressed in order |
//! | `expect key Ctrl+C` | Satisfied by a single key press |
//! | `reject "text"` | Shown every time an event does not satisfy the step |
//! | `wait 500ms` | Pause after this step, overriding `tour wait` |
//! | `end "text"` | Shown when the step is satisfied |
//! | `# comment` | Full-line or inline comment |
//!
//! Steps run in ascending index order regardless of declaration order.
//!
//! ## Implementing a custom expectation
//!
//! ```
//! use anyhow::Result;
//! use shelltour::{EventKind, Expectation, StepMemory, TourEvent, TourScript};
//!
//! /// Satisfied by any command starting with `git`.
//! struct AnyGit;
//!
//! impl Expectation for AnyGit {
//!     fn kind(&self) -> EventKind {
//!         EventKind::Command
//!     }
//!
//!     fn check(&self, event: &TourEvent, _memory: &mut StepMemory) -> Result<bool> {
//!         Ok(matches!(event, TourEvent::Command(line) if line.trim().starts_with("git")))
//!     }
//! }
//!
//! let mut script = TourScript::new();
//! script.step(1).begin("Run any git command.").expect(AnyGit);
//! assert!(script.finalize().is_ok());
//! ```

pub mod error;
pub mod event;
pub mod expectation;
pub mod expectations;
pub mod host;
pub mod memory;
pub mod parser;
pub mod plugin;
pub mod runner;
pub mod script;
pub mod shell;
pub mod step;
pub mod stdio;

pub use error::{AdapterError, ConfigurationError, TourError};
pub use event::{EventKind, KeyPress, TourEvent};
pub use expectation::Expectation;
pub use expectations::{CommandIs, CommandPredicate, KeySequence, KeypressPredicate};
pub use host::HostAdapter;
pub use memory::StepMemory;
pub use parser::{parse_file, parse_str};
pub use plugin::PluginOptions;
pub use runner::{AbortHandle, TourOutcome, TourRunner, TourState};
pub use script::{PrepareFuture, Tour, TourScript};
pub use shell::{CommandTable, OutputHandler, Shell, ShellCommand, ShellContext};
pub use stdio::{Input, InputMode, StdioHost, StdioInput};
pub use step::{Step, StepDefinition};

//! A small interactive shell that hosts tours.
//!
//! [`Shell`] owns a table of named [`ShellCommand`]s, a prompt delimiter, the
//! [`StdioInput`] it reads from and an output handler it writes to. Commands
//! receive a [`ShellContext`] giving them access to all three, which is what
//! lets a running tour read input and dispatch other commands while it waits.

use crate::stdio::{Input, InputMode, StdioInput};
use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sink for everything the shell and its commands print.
pub type OutputHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// A command that can be registered on a [`Shell`].
#[async_trait(?Send)]
pub trait ShellCommand: 'static {
    /// Run the command. `args` is the rest of the line after the command name.
    async fn execute(&self, args: &str, ctx: &mut ShellContext<'_>) -> Result<()>;
}

/// What a command can reach while it executes.
pub struct ShellContext<'a> {
    pub(crate) commands: &'a CommandTable,
    pub(crate) input: &'a mut StdioInput,
    pub(crate) output: &'a OutputHandler,
    pub(crate) delimiter: &'a str,
}

impl ShellContext<'_> {
    /// Write `text` followed by a newline.
    pub fn log(&self, text: &str) {
        let mut line = text.to_string();
        line.push('\n');
        self.write(line.as_bytes());
    }

    /// Write raw bytes through the shell's output handler.
    pub fn write(&self, data: &[u8]) {
        (self.output)(data);
    }

    pub fn commands(&self) -> &CommandTable {
        self.commands
    }

    pub fn input(&mut self) -> &mut StdioInput {
        self.input
    }

    /// Print the prompt delimiter.
    pub fn prompt(&self) {
        self.write(format!("{} ", self.delimiter).as_bytes());
    }

    /// Execute one command line against the command table.
    ///
    /// Unknown commands and command failures are reported on the output and
    /// are not errors for the caller.
    pub async fn dispatch(&mut self, line: &str) {
        let (name, args) = split_command(line);
        let Some(entry) = self.commands.find(name) else {
            self.log(&format!("Unknown command: {name}"));
            return;
        };
        let command = Rc::clone(&entry.command);
        debug!(command = name, "dispatching");
        if let Err(err) = command.execute(args, self).await {
            warn!(command = name, error = %err, "command failed");
            self.log(&format!("Error: {err:#}"));
        }
    }
}

/// A registered command and its help text.
pub struct CommandEntry {
    pub name: String,
    pub description: String,
    pub(crate) command: Rc<dyn ShellCommand>,
}

/// Registered commands, in registration order.
#[derive(Default)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl CommandTable {
    pub fn find(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: CommandEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == entry.name) {
            warn!(command = %entry.name, "replacing previously registered command");
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }
}

/// Adapts a synchronous closure into a [`ShellCommand`].
struct ActionCommand<F> {
    action: F,
}

#[async_trait(?Send)]
impl<F> ShellCommand for ActionCommand<F>
where
    F: Fn(&str, &mut ShellContext<'_>) -> Result<()> + 'static,
{
    async fn execute(&self, args: &str, ctx: &mut ShellContext<'_>) -> Result<()> {
        (self.action)(args, ctx)
    }
}

/// Lists the registered commands.
struct HelpCommand;

#[async_trait(?Send)]
impl ShellCommand for HelpCommand {
    async fn execute(&self, _args: &str, ctx: &mut ShellContext<'_>) -> Result<()> {
        let width = ctx.commands().names().map(str::len).max().unwrap_or(0);
        ctx.log("");
        ctx.log("  Commands:");
        ctx.log("");
        for entry in ctx.commands().iter() {
            ctx.log(&format!("    {:width$}  {}", entry.name, entry.description));
        }
        ctx.log(&format!("    {:width$}  {}", "exit", "Exits the shell."));
        ctx.log("");
        Ok(())
    }
}

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

/// An interactive prompt loop.
///
/// ```no_run
/// use shelltour::Shell;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> anyhow::Result<()> {
///     let mut shell = Shell::new();
///     shell.set_delimiter("myapp~$").command("foo", "Prints bar.", |_args, ctx| {
///         ctx.log("bar");
///         Ok(())
///     });
///     shell.run().await
/// }
/// ```
pub struct Shell {
    delimiter: String,
    commands: CommandTable,
    input: StdioInput,
    output: OutputHandler,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// A shell reading from stdin and writing to stdout, with a `help` command.
    pub fn new() -> Self {
        let mut shell = Self {
            delimiter: "~$".to_string(),
            commands: CommandTable::default(),
            input: StdioInput::stdin(),
            output: Arc::new(|data: &[u8]| {
                let mut stdout = std::io::stdout();
                let _ = stdout.write_all(data);
                let _ = stdout.flush();
            }),
        };
        shell.register_command("help", "Provides help for the registered commands.", HelpCommand);
        shell
    }

    /// Replace the input source (e.g. [`StdioInput::from_reader`] in tests).
    pub fn with_input(mut self, input: StdioInput) -> Self {
        self.input = input;
        self
    }

    /// Redirect all output to `handler`.
    pub fn with_output_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.output = Arc::new(handler);
        self
    }

    pub fn set_delimiter(&mut self, delimiter: impl Into<String>) -> &mut Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Register `command` under `name`, replacing any command of the same name.
    pub fn register_command(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        command: impl ShellCommand,
    ) -> &mut Self {
        self.commands.insert(CommandEntry {
            name: name.into(),
            description: description.into(),
            command: Rc::new(command),
        });
        self
    }

    /// Register a synchronous closure as a command.
    pub fn command<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        action: F,
    ) -> &mut Self
    where
        F: Fn(&str, &mut ShellContext<'_>) -> Result<()> + 'static,
    {
        self.register_command(name, description, ActionCommand { action })
    }

    /// Execute a single command line, as if typed at the prompt.
    pub async fn exec(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let mut ctx = self.context();
        ctx.dispatch(line).await;
    }

    /// Show the prompt and execute lines until `exit`, `quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.context().prompt();
            let line = match self.input.read(InputMode::Line).await? {
                Input::Line(line) => line,
                Input::Eof | Input::Interrupt => break,
                // A key left over from a cancelled capture.
                Input::Key(_) => continue,
            };
            let line = line.trim();
            if EXIT_COMMANDS.contains(&line) {
                break;
            }
            self.exec(line).await;
        }
        Ok(())
    }

    pub(crate) fn context(&mut self) -> ShellContext<'_> {
        ShellContext {
            commands: &self.commands,
            input: &mut self.input,
            output: &self.output,
            delimiter: &self.delimiter,
        }
    }
}

/// Split a line into the command name and the remaining arguments.
pub(crate) fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim_start()),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn capture() -> (Arc<Mutex<Vec<u8>>>, impl Fn(&[u8]) + Send + Sync + 'static) {
        let captured = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = captured.clone();
        (captured, move |data: &[u8]| sink.lock().unwrap().extend_from_slice(data))
    }

    fn text(captured: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&captured.lock().unwrap()).into_owned()
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("foo"), ("foo", ""));
        assert_eq!(split_command("  foo   bar baz "), ("foo", "bar baz"));
    }

    #[test]
    fn test_help_is_registered() {
        let shell = Shell::new();
        assert!(shell.commands().contains("help"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut shell = Shell::new();
        shell.command("foo", "first", |_, _| Ok(()));
        shell.command("foo", "second", |_, _| Ok(()));
        assert_eq!(shell.commands().names().filter(|n| *n == "foo").count(), 1);
        assert_eq!(shell.commands().find("foo").unwrap().description, "second");
    }

    #[tokio::test]
    async fn test_run_dispatches_until_exit() {
        let (captured, sink) = capture();
        let mut shell = Shell::new()
            .with_input(StdioInput::from_reader(Cursor::new("foo\nnope\nhelp\nexit\nfoo\n")))
            .with_output_handler(sink);
        shell.set_delimiter("app$").command("foo", "Prints bar.", |_, ctx| {
            ctx.log("bar");
            Ok(())
        });

        shell.run().await.unwrap();

        let out = text(&captured);
        assert_eq!(out.matches("bar\n").count(), 1, "got: {out}");
        assert!(out.contains("Unknown command: nope"), "got: {out}");
        assert!(out.contains("Prints bar."), "got: {out}");
        assert!(out.starts_with("app$ "), "got: {out}");
    }

    #[tokio::test]
    async fn test_command_errors_are_reported() {
        let (captured, sink) = capture();
        let mut shell = Shell::new()
            .with_input(StdioInput::from_reader(Cursor::new("")))
            .with_output_handler(sink);
        shell.command("fail", "Always fails.", |_, _| Err(anyhow::anyhow!("kaput")));

        shell.exec("fail now").await;

        assert!(text(&captured).contains("Error: kaput"));
    }

    #[tokio::test]
    async fn test_run_stops_at_eof() {
        let (captured, sink) = capture();
        let mut shell = Shell::new()
            .with_input(StdioInput::from_reader(Cursor::new("help")))
            .with_output_handler(sink);
        shell.set_delimiter(">");

        shell.run().await.unwrap();

        let out = text(&captured);
        assert!(out.contains("Commands:"), "got: {out}");
        assert_eq!(out.matches("> ").count(), 2, "got: {out}");
    }
}

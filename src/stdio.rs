//! Stdio-backed input and the [`StdioHost`] tour adapter.
//!
//! All reads go through one background thread that performs exactly one
//! blocking read per request: a line in cooked mode, or a key press in raw
//! mode when stdin is a terminal. A request whose reader was cancelled is not
//! lost; its reply is handed to the next [`StdioInput::read`] call.

use crate::error::AdapterError;
use crate::event::{EventKind, KeyPress, TourEvent};
use crate::host::HostAdapter;
use crate::runner::AbortHandle;
use crate::shell::{ShellContext, split_command};
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Stylize, style};
use crossterm::terminal;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::mpsc;
use tracing::warn;

/// What the next read should capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Line,
    Key,
}

/// One unit of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Key(KeyPress),
    /// Ctrl+C during raw key capture.
    Interrupt,
    Eof,
}

enum Source {
    Terminal,
    Reader(Box<dyn BufRead + Send>),
}

struct ReaderThread {
    requests: std_mpsc::Sender<InputMode>,
    replies: mpsc::Receiver<io::Result<Input>>,
    outstanding: bool,
}

/// Lazily started reader over stdin or any [`BufRead`].
///
/// Without a terminal every read is line based; a line read in
/// [`InputMode::Key`] is returned as [`Input::Line`] and left for the caller
/// to interpret.
pub struct StdioInput {
    source: Option<Source>,
    thread: Option<ReaderThread>,
    terminal: bool,
}

impl StdioInput {
    /// Read from the process's stdin, with raw key capture if it is a terminal.
    pub fn stdin() -> Self {
        let stdin = io::stdin();
        let terminal = stdin.is_terminal();
        let source = if terminal {
            Source::Terminal
        } else {
            Source::Reader(Box::new(BufReader::new(stdin)))
        };
        Self {
            source: Some(source),
            thread: None,
            terminal,
        }
    }

    /// Read lines from `reader`; key reads also consume a line.
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            source: Some(Source::Reader(Box::new(reader))),
            thread: None,
            terminal: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Read the next input. Cancel-safe.
    pub async fn read(&mut self, mode: InputMode) -> io::Result<Input> {
        let thread = self.thread();
        if !thread.outstanding {
            thread
                .requests
                .send(mode)
                .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "input thread stopped"))?;
            thread.outstanding = true;
        }
        let reply = thread.replies.recv().await;
        thread.outstanding = false;
        reply.unwrap_or(Ok(Input::Eof))
    }

    fn thread(&mut self) -> &mut ReaderThread {
        let source = &mut self.source;
        self.thread.get_or_insert_with(|| {
            let (request_tx, request_rx) = std_mpsc::channel();
            let (reply_tx, reply_rx) = mpsc::channel(1);
            if let Some(source) = source.take() {
                thread::spawn(move || serve(source, request_rx, reply_tx));
            }
            ReaderThread {
                requests: request_tx,
                replies: reply_rx,
                outstanding: false,
            }
        })
    }
}

impl Drop for StdioInput {
    fn drop(&mut self) {
        if self.terminal && self.thread.is_some() {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Reader thread body: one blocking read per request.
fn serve(
    mut source: Source,
    requests: std_mpsc::Receiver<InputMode>,
    replies: mpsc::Sender<io::Result<Input>>,
) {
    let mut raw = false;
    for mode in requests {
        let result = match (&mut source, mode) {
            (Source::Terminal, InputMode::Key) => {
                if !raw {
                    raw = terminal::enable_raw_mode().is_ok();
                }
                read_key()
            }
            (Source::Terminal, InputMode::Line) => {
                if raw {
                    let _ = terminal::disable_raw_mode();
                    raw = false;
                }
                read_line(&mut io::stdin().lock())
            }
            (Source::Reader(reader), _) => read_line(reader),
        };
        if replies.blocking_send(result).is_err() {
            break; // Receiver dropped
        }
    }
    if raw {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_line<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<Input> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(Input::Eof);
    }
    Ok(Input::Line(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn read_key() -> io::Result<Input> {
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(Input::Interrupt);
        }
        return Ok(Input::Key(KeyPress::from(key)));
    }
}

/// [`HostAdapter`] over a shell's stdio.
///
/// Command lines typed while the tour listens are dispatched to the shell's
/// other commands before being handed to the tour, so their output appears
/// as usual.
pub struct StdioHost<'a, 'ctx> {
    ctx: &'a mut ShellContext<'ctx>,
    tour_command: Option<String>,
    interrupt: Option<AbortHandle>,
}

impl<'a, 'ctx> StdioHost<'a, 'ctx> {
    pub fn new(ctx: &'a mut ShellContext<'ctx>) -> Self {
        Self {
            ctx,
            tour_command: None,
            interrupt: None,
        }
    }

    /// Never dispatch `name` while touring (the command that started the tour).
    pub fn skip_command(mut self, name: impl Into<String>) -> Self {
        self.tour_command = Some(name.into());
        self
    }

    /// Abort through `handle` when the user presses Ctrl+C during key capture.
    pub fn interrupt_with(mut self, handle: AbortHandle) -> Self {
        self.interrupt = Some(handle);
        self
    }

    async fn dispatch(&mut self, line: &str) {
        let (name, _) = split_command(line);
        if self.tour_command.as_deref() == Some(name) || !self.ctx.commands().contains(name) {
            return;
        }
        self.ctx.dispatch(line).await;
    }
}

#[async_trait(?Send)]
impl HostAdapter for StdioHost<'_, '_> {
    fn emit(&mut self, text: &str, color: Option<&str>) -> Result<(), AdapterError> {
        let mut text = paint(text, color);
        text.push('\n');
        if self.ctx.input().is_terminal() {
            // Raw mode does not translate newlines.
            text = text.replace('\n', "\r\n");
        }
        self.ctx.write(text.as_bytes());
        Ok(())
    }

    async fn next_event(&mut self, kind: EventKind) -> Result<TourEvent, AdapterError> {
        loop {
            let mode = match kind {
                EventKind::Command => {
                    self.ctx.prompt();
                    InputMode::Line
                }
                EventKind::Keypress => InputMode::Key,
            };
            let input = self.ctx.input().read(mode).await?;
            match (kind, input) {
                (_, Input::Eof) => return Err(AdapterError::InputClosed),
                (_, Input::Interrupt) => {
                    if let Some(handle) = &self.interrupt {
                        handle.abort();
                    }
                    return Err(AdapterError::Interrupted);
                }
                (EventKind::Command, Input::Line(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.dispatch(line).await;
                    return Ok(TourEvent::command(line));
                }
                (EventKind::Keypress, Input::Line(line)) => match KeyPress::parse(&line) {
                    Ok(key) => return Ok(TourEvent::Keypress(key)),
                    Err(err) => {
                        warn!(line = %line, error = %err, "ignoring line while waiting for a key");
                        continue;
                    }
                },
                (EventKind::Keypress, Input::Key(key)) => return Ok(TourEvent::Keypress(key)),
                (EventKind::Command, Input::Key(_)) => continue,
            }
        }
    }
}

/// Apply the tour's color token, if it names a terminal color.
fn paint(text: &str, color: Option<&str>) -> String {
    let Some(token) = color else {
        return text.to_string();
    };
    match Color::try_from(token) {
        Ok(color) => style(text).with(color).to_string(),
        Err(_) => {
            warn!(color = token, "unknown color token, emitting plain text");
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::Shell;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    fn piped_shell(input: &str) -> (Shell, Arc<Mutex<Vec<u8>>>) {
        let captured = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = captured.clone();
        let shell = Shell::new()
            .with_input(StdioInput::from_reader(Cursor::new(input.to_string())))
            .with_output_handler(move |data: &[u8]| sink.lock().unwrap().extend_from_slice(data));
        (shell, captured)
    }

    fn text(captured: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&captured.lock().unwrap()).into_owned()
    }

    #[tokio::test]
    async fn test_reader_lines_then_eof() {
        let mut input = StdioInput::from_reader(Cursor::new("one\r\ntwo"));
        assert_eq!(input.read(InputMode::Line).await.unwrap(), Input::Line("one".into()));
        assert_eq!(input.read(InputMode::Key).await.unwrap(), Input::Line("two".into()));
        assert_eq!(input.read(InputMode::Line).await.unwrap(), Input::Eof);
        assert!(!input.is_terminal());
    }

    #[tokio::test]
    async fn test_command_events_are_dispatched() {
        let (mut shell, captured) = piped_shell("\nfoo\n");
        shell.command("foo", "Prints bar.", |_, ctx| {
            ctx.log("bar");
            Ok(())
        });
        let mut ctx = shell.context();
        let mut host = StdioHost::new(&mut ctx);

        let event = host.next_event(EventKind::Command).await.unwrap();

        assert_eq!(event, TourEvent::command("foo"));
        assert!(text(&captured).contains("bar\n"));
    }

    #[tokio::test]
    async fn test_tour_command_is_not_dispatched_again() {
        let (mut shell, captured) = piped_shell("tour\n");
        shell.command("tour", "Starts the tour.", |_, ctx| {
            ctx.log("nested tour");
            Ok(())
        });
        let mut ctx = shell.context();
        let mut host = StdioHost::new(&mut ctx).skip_command("tour");

        let event = host.next_event(EventKind::Command).await.unwrap();

        assert_eq!(event, TourEvent::command("tour"));
        assert!(!text(&captured).contains("nested tour"));
    }

    #[tokio::test]
    async fn test_key_lines_are_parsed_and_garbage_skipped() {
        let (mut shell, _captured) = piped_shell("not a key\nLeft\n");
        let mut ctx = shell.context();
        let mut host = StdioHost::new(&mut ctx);

        let event = host.next_event(EventKind::Keypress).await.unwrap();

        assert_eq!(event, TourEvent::key("left").unwrap());
    }

    #[tokio::test]
    async fn test_eof_is_input_closed() {
        let (mut shell, _captured) = piped_shell("");
        let mut ctx = shell.context();
        let mut host = StdioHost::new(&mut ctx);

        let err = host.next_event(EventKind::Keypress).await.unwrap_err();

        assert!(matches!(err, AdapterError::InputClosed));
    }

    #[test]
    fn test_emit_paints_known_colors() {
        let (mut shell, captured) = piped_shell("");
        let mut ctx = shell.context();
        let mut host = StdioHost::new(&mut ctx);

        host.emit("hello", Some("cyan")).unwrap();
        host.emit("plain", Some("not-a-color")).unwrap();
        host.emit("none", None).unwrap();

        let out = text(&captured);
        if std::env::var_os("NO_COLOR").is_none() {
            assert!(out.contains("\x1b["), "expected ANSI styling, got: {out:?}");
        }
        assert!(out.contains("hello"));
        assert!(out.contains("plain\n"));
        assert!(out.ends_with("none\n"));
    }
}

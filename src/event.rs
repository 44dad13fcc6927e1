use anyhow::{Result, anyhow};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;

/// The kinds of user input a step can wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A full command line typed at the shell prompt.
    Command,
    /// A single key press captured in raw mode.
    Keypress,
}

/// Input delivered to a running tour by the host adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TourEvent {
    Command(String),
    Keypress(KeyPress),
}

impl TourEvent {
    /// Create a command event from a typed line.
    pub fn command(line: impl Into<String>) -> Self {
        TourEvent::Command(line.into())
    }

    /// Create a keypress event from a key name such as `"left"` or `"ctrl+c"`.
    pub fn key(name: &str) -> Result<Self> {
        Ok(TourEvent::Keypress(KeyPress::parse(name)?))
    }

    pub fn kind(&self) -> EventKind {
        match self {
            TourEvent::Command(_) => EventKind::Command,
            TourEvent::Keypress(_) => EventKind::Keypress,
        }
    }
}

/// A key press, normalized to a lowercase key name plus modifiers.
///
/// Named keys use the names `left`, `right`, `up`, `down`, `enter`, `escape`,
/// `tab`, `backspace`, `delete`, `insert`, `home`, `end`, `pageup`,
/// `pagedown` and `f1`..`f24`. Printable keys use the character itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    /// Parse a key description such as `Enter`, `left`, `Ctrl+C` or `Alt+Shift+x`.
    ///
    /// Modifier prefixes are case-insensitive. Named keys are lowercased.
    /// Single characters carry shift in their case, the way a terminal
    /// reports them: `shift+a` becomes `A`, and with `ctrl`/`alt` the
    /// character is lowercased. `shift` stays set only for named keys.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(anyhow!("Empty key name"));
        }

        let mut press = KeyPress::new("");
        let mut rest = spec;
        // A lone "+" is the plus key, not a separator.
        while let Some((modifier, tail)) = rest.split_once('+').filter(|(_, t)| !t.is_empty()) {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => press.ctrl = true,
                "alt" | "meta" => press.alt = true,
                "shift" => press.shift = true,
                other => return Err(anyhow!("Unknown key modifier: {}", other)),
            }
            rest = tail;
        }

        press.key = normalize_key_name(rest)?;
        if press.key.chars().count() == 1 {
            if press.ctrl || press.alt {
                press.key = press.key.to_lowercase();
            } else if press.shift {
                press.key = press.key.to_uppercase();
            }
            press.shift = false;
        }
        Ok(press)
    }
}

fn normalize_key_name(name: &str) -> Result<String> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Ok(ch.to_string());
    }
    let lower = name.to_ascii_lowercase();
    let normalized = match lower.as_str() {
        "esc" => "escape",
        "return" => "enter",
        "space" => " ",
        "pgup" => "pageup",
        "pgdown" | "pgdn" => "pagedown",
        "del" => "delete",
        "ins" => "insert",
        "left" | "right" | "up" | "down" | "enter" | "escape" | "tab" | "backspace" | "delete"
        | "insert" | "home" | "end" | "pageup" | "pagedown" => lower.as_str(),
        f if is_function_key(f) => f,
        _ => return Err(anyhow!("Unknown key name: {}", name)),
    };
    Ok(normalized.to_string())
}

fn is_function_key(name: &str) -> bool {
    name.strip_prefix('f')
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| (1..=24).contains(&n))
}

impl From<KeyEvent> for KeyPress {
    fn from(event: KeyEvent) -> Self {
        let key = match event.code {
            KeyCode::Left => "left".to_string(),
            KeyCode::Right => "right".to_string(),
            KeyCode::Up => "up".to_string(),
            KeyCode::Down => "down".to_string(),
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "escape".to_string(),
            KeyCode::Tab | KeyCode::BackTab => "tab".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Delete => "delete".to_string(),
            KeyCode::Insert => "insert".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            KeyCode::PageUp => "pageup".to_string(),
            KeyCode::PageDown => "pagedown".to_string(),
            KeyCode::F(n) => format!("f{n}"),
            KeyCode::Char(c)
                if event
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                c.to_lowercase().to_string()
            }
            KeyCode::Char(c) => c.to_string(),
            other => format!("{other:?}").to_ascii_lowercase(),
        };
        Self {
            key,
            ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
            alt: event.modifiers.contains(KeyModifiers::ALT),
            // Printable characters already carry their case.
            shift: (event.modifiers.contains(KeyModifiers::SHIFT)
                && !matches!(event.code, KeyCode::Char(_)))
                || event.code == KeyCode::BackTab,
        }
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        f.write_str(&self.key)
    }
}

//! Parser for tour script files.
//!
//! The top-level entry points are [`parse_str`] and [`parse_file`]. Both
//! return an unfinalized [`TourScript`]; call [`TourScript::finalize`] (or
//! hand it to the plugin) to validate it.
//!
//! ```text
//! tour color cyan            # display hint for every emitted text
//! tour wait 1s               # default pause between steps
//! tour end "All done!"       # shown after the last step
//!
//! step 1
//!   begin "Run \"foo\"."
//!   expect command "foo"     # or: expect keys left right / expect key enter
//!   reject "Try \"foo\"."
//!   wait 500ms
//!   end "Nice!"
//! ```

use crate::event::KeyPress;
use crate::expectations::{CommandIs, KeySequence};
use crate::script::TourScript;
use crate::step::StepDefinition;
use anyhow::{Context as _, Result, anyhow, bail};
use std::path::Path;
use std::time::Duration;

/// Parse a tour script from a string slice.
///
/// Lines that are empty or start with `#` are ignored. Inline comments (` # …`)
/// are stripped while preserving `#` characters inside quoted strings.
///
/// # Errors
///
/// Returns an error naming the offending line if a directive is unknown,
/// malformed, used outside a step, or declares a step index twice.
///
/// # Example
///
/// ```
/// use shelltour::parse_str;
///
/// let script = parse_str("step 1\nbegin \"hi\"\nexpect command \"ls\"\n").unwrap();
/// assert_eq!(script.finalize().unwrap().steps().len(), 1);
/// ```
pub fn parse_str(content: &str) -> Result<TourScript> {
    let mut state = ParseState::default();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = strip_inline_comment(line);
        parse_line(&mut state, line)
            .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;
    }
    state.finish()
}

/// Parse a tour script from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if the script is malformed.
pub fn parse_file(path: impl AsRef<Path>) -> Result<TourScript> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tour script: {}", path.display()))?;
    parse_str(&content)
}

#[derive(Default)]
struct ParseState {
    script: TourScript,
    current: Option<StepDefinition>,
}

impl ParseState {
    fn step(&mut self) -> Result<&mut StepDefinition> {
        self.current
            .as_mut()
            .ok_or_else(|| anyhow!("Step directive used before any `step` line"))
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(definition) = self.current.take() {
            self.script.add_step(definition)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<TourScript> {
        self.flush().context("Failed to add the last step")?;
        Ok(self.script)
    }
}

type DirectiveFn = fn(&mut ParseState, &str) -> Result<()>;

/// Directives on `tour …` lines.
static TOUR_DIRECTIVES: &[(&str, DirectiveFn)] = &[
    ("color", tour_color),
    ("wait", tour_wait),
    ("end", tour_end),
];

/// Directives that configure the most recent `step`.
static STEP_DIRECTIVES: &[(&str, DirectiveFn)] = &[
    ("begin", step_begin),
    ("expect", step_expect),
    ("reject", step_reject),
    ("wait", step_wait),
    ("end", step_end),
];

fn parse_line(state: &mut ParseState, line: &str) -> Result<()> {
    let (name, args) = split_word(line);
    match name {
        "step" => {
            let index: u32 = args
                .trim()
                .parse()
                .with_context(|| format!("Invalid step index: {}", args.trim()))?;
            state.flush()?;
            state.current = Some(StepDefinition::new(index));
            Ok(())
        }
        "tour" => {
            let (directive, args) = split_word(args);
            dispatch(TOUR_DIRECTIVES, state, directive, args)
                .with_context(|| format!("in `tour {directive}`"))
        }
        _ => dispatch(STEP_DIRECTIVES, state, name, args),
    }
}

fn dispatch(table: &[(&str, DirectiveFn)], state: &mut ParseState, name: &str, args: &str) -> Result<()> {
    table
        .iter()
        .find(|(directive, _)| *directive == name)
        .map(|(_, parse)| parse(state, args))
        .unwrap_or_else(|| Err(anyhow!("Unknown directive: {}", name)))
}

fn tour_color(state: &mut ParseState, args: &str) -> Result<()> {
    let token = args.trim();
    if token.is_empty() {
        bail!("Expected a color name");
    }
    state.script.set_color(token);
    Ok(())
}

fn tour_wait(state: &mut ParseState, args: &str) -> Result<()> {
    state.script.set_default_wait(parse_duration(args)?);
    Ok(())
}

fn tour_end(state: &mut ParseState, args: &str) -> Result<()> {
    state.script.set_final_text(parse_quoted_string(args)?);
    Ok(())
}

fn step_begin(state: &mut ParseState, args: &str) -> Result<()> {
    let text = parse_quoted_string(args)?;
    state.step()?.begin(text);
    Ok(())
}

fn step_reject(state: &mut ParseState, args: &str) -> Result<()> {
    let text = parse_quoted_string(args)?;
    state.step()?.reject(text);
    Ok(())
}

fn step_end(state: &mut ParseState, args: &str) -> Result<()> {
    let text = parse_quoted_string(args)?;
    state.step()?.end(text);
    Ok(())
}

fn step_wait(state: &mut ParseState, args: &str) -> Result<()> {
    let duration = parse_duration(args)?;
    state.step()?.wait(duration);
    Ok(())
}

/// `expect command "foo"`, `expect keys left right`, `expect key enter`.
fn step_expect(state: &mut ParseState, args: &str) -> Result<()> {
    let (kind, rest) = split_word(args);
    match kind {
        CommandIs::NAME => {
            let command = parse_quoted_string(rest)?;
            state.step()?.expect(CommandIs::new(command));
        }
        KeySequence::NAME | "key" => {
            let keys = rest
                .split_whitespace()
                .map(KeyPress::parse)
                .collect::<Result<Vec<_>>>()?;
            if keys.is_empty() {
                bail!("Expected at least one key name");
            }
            if kind == "key" && keys.len() > 1 {
                bail!("`expect key` takes a single key; use `expect keys` for a sequence");
            }
            state.step()?.expect(KeySequence::new(keys));
        }
        other => bail!("Unknown expectation kind: {} (expected `command`, `key` or `keys`)", other),
    }
    Ok(())
}

fn split_word(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    line.split_once(char::is_whitespace).unwrap_or((line, ""))
}

/// Strip inline comments from a line, preserving `#` inside quoted strings.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return line[..i].trim(),
            _ => {}
        }
    }
    line
}

/// Parse a duration string: `1s`, `500ms`, `1.5s`.
pub(crate) fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.trim().parse().context("Invalid milliseconds value")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: f64 = secs.trim().parse().context("Invalid seconds value")?;
        Duration::try_from_secs_f64(secs).map_err(|e| anyhow!("Invalid seconds value: {}", e))
    } else {
        Err(anyhow!("Duration must end with 's' or 'ms', got: {}", s))
    }
}

/// Parse exactly one double-quoted string, processing `\n`, `\t`, `\"` and
/// `\\`. Anything after the closing quote is an error.
pub(crate) fn parse_quoted_string(s: &str) -> Result<String> {
    let s = s.trim();
    let body = s
        .strip_prefix('"')
        .ok_or_else(|| anyhow!("Expected string to start with '\"'"))?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => {
                let trailing = body[i + 1..].trim();
                if !trailing.is_empty() {
                    bail!("Unexpected text after closing quote: {}", trailing);
                }
                return Ok(out);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, other)) => bail!("Unknown escape sequence: \\{}", other),
                None => break,
            },
            other => out.push(other),
        }
    }
    Err(anyhow!("Expected string to end with '\"'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_secs_f64(1.5));
        assert!(parse_duration("5minutes").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_quoted_string() {
        assert_eq!(parse_quoted_string("\"hello\"").unwrap(), "hello");
        assert_eq!(parse_quoted_string("\"hello\\nworld\"").unwrap(), "hello\nworld");
        assert_eq!(parse_quoted_string(r#""say \"foo\"""#).unwrap(), "say \"foo\"");
        assert_eq!(parse_quoted_string(r#""back\\n""#).unwrap(), "back\\n");
        assert!(parse_quoted_string("\"unclosed").is_err());
        assert!(parse_quoted_string("no quotes").is_err());
        assert!(parse_quoted_string("\"a\" trailing").is_err());
    }

    #[test]
    fn test_strip_inline_comments() {
        assert_eq!(strip_inline_comment("wait 1s # comment"), "wait 1s");
        assert_eq!(strip_inline_comment("begin \"#hashtag\""), "begin \"#hashtag\"");
        assert_eq!(
            strip_inline_comment(r##"begin "say \"#1\"" # note"##),
            r##"begin "say \"#1\"""##
        );
    }

    #[test]
    fn test_parse_demo_script() {
        let script = parse_str(include_str!("../demos/silly.tour")).unwrap();
        let tour = script.finalize().unwrap();

        assert_eq!(tour.color(), Some("cyan"));
        assert_eq!(tour.default_wait(), Some(Duration::from_secs(1)));
        assert!(tour.final_text().contains("Very well done!"));

        let steps = tour.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].expectation().kind(), EventKind::Command);
        assert_eq!(steps[0].expectation().describe(), "command \"foo\"");
        assert_eq!(steps[0].wait(), Some(Duration::from_millis(500)));
        assert!(steps[0].reject_text().contains("\"foo\" instead"));
        assert_eq!(steps[1].expectation().describe(), "keys left right");
        assert_eq!(tour.wait_after(0), Duration::from_millis(500));
        assert_eq!(tour.closing_text(), Some(tour.final_text()));
    }

    #[test]
    fn test_step_directive_outside_step() {
        let err = parse_str("begin \"hello\"").unwrap_err();
        assert!(format!("{err:#}").contains("before any `step`"), "got: {err:#}");
    }

    #[test]
    fn test_unknown_directive_names_line() {
        let err = parse_str("step 1\nexpect command \"a\"\nfrobnicate\n").unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("line 3"), "got: {text}");
        assert!(text.contains("Unknown directive"), "got: {text}");
    }

    #[test]
    fn test_duplicate_step_index() {
        let err = parse_str("step 1\nexpect key enter\nstep 1\nexpect key enter\n").unwrap_err();
        assert!(format!("{err:#}").contains("declared more than once"), "got: {err:#}");
    }

    #[test]
    fn test_expect_variants() {
        let script = parse_str(
            "step 2\nexpect key Enter\nstep 1\nexpect keys ctrl+a ctrl+e\nstep 3\nexpect command \"ls -la\"\n",
        )
        .unwrap();
        let tour = script.finalize().unwrap();
        let described: Vec<String> = tour
            .steps()
            .iter()
            .map(|step| step.expectation().describe())
            .collect();
        assert_eq!(described, vec!["keys ctrl+a ctrl+e", "keys enter", "command \"ls -la\""]);
    }

    #[test]
    fn test_expect_errors() {
        assert!(parse_str("step 1\nexpect key left right").is_err());
        assert!(parse_str("step 1\nexpect keys").is_err());
        assert!(parse_str("step 1\nexpect mouse click").is_err());
        assert!(parse_str("step one").is_err());
    }

    #[test]
    fn test_step_without_expectation_fails_at_finalize() {
        let script = parse_str("step 1\nbegin \"hi\"\n").unwrap();
        assert!(script.finalize().is_err());
    }
}

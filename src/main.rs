use anyhow::{Context, Result};
use clap::Parser;
use shelltour::{PluginOptions, Shell, TourScript, parse_file, plugin};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "shelltour",
    about = "An interactive shell with a guided tour of its commands",
    version
)]
struct Args {
    /// Tour script to install (defaults to the built-in silly tour)
    #[arg(short, long)]
    tour: Option<PathBuf>,

    /// Name of the command that starts the tour
    #[arg(short, long, default_value = "tour")]
    command: String,

    /// Prompt delimiter
    #[arg(short, long, default_value = "myamazingapp~$")]
    delimiter: String,

    /// Command line to execute before the prompt opens, e.g. `tour`
    #[arg(trailing_var_arg = true)]
    exec: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut shell = Shell::new();
    shell
        .set_delimiter(args.delimiter.as_str())
        .command("foo", "Outputs \"bar\".", |_args, ctx| {
            ctx.log("bar");
            Ok(())
        });

    let options = PluginOptions::new().command(args.command.as_str());
    let options = match &args.tour {
        Some(path) => {
            let script = parse_file(path)
                .with_context(|| format!("Failed to load tour: {}", path.display()))?;
            options.tour(move |tour| {
                *tour = script;
                Ok(())
            })
        }
        None => options.tour(define_tour),
    };
    plugin::register(&mut shell, options).context("Failed to register the tour")?;

    if !args.exec.is_empty() {
        shell.exec(&args.exec.join(" ")).await;
    }
    shell.run().await
}

/// Logs go to stderr so they never interleave with the shell's own output.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn define_tour(tour: &mut TourScript) -> Result<(), shelltour::ConfigurationError> {
    tour.set_color("cyan").set_default_wait(Duration::from_secs(1));
    tour.set_prepare_hook(|| async {
        debug!("nothing to prepare for the silly tour");
        Ok(())
    });

    tour.step(1)
        .begin("\nWelcome to my amazing app!\n\nTo start, run \"foo\".\n")
        .expect_command("foo")
        .reject("Uh.. Let's type \"foo\" instead..")
        .wait(Duration::from_millis(500))
        .end("\nNice! Wasn't that command just amazing?\n");

    tour.step(2)
        .begin("\nNow press the left arrow key, and then the right one!\n")
        .expect_keys(vec![
            shelltour::KeyPress::new("left"),
            shelltour::KeyPress::new("right"),
        ]);

    tour.set_final_text("\nVery well done! You're such a master at my app!\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_tour_is_valid() {
        let mut script = TourScript::new();
        define_tour(&mut script).unwrap();
        let tour = script.finalize().unwrap();
        assert_eq!(tour.steps().len(), 2);
        assert!(tour.has_prepare_hook());
        assert_eq!(tour.color(), Some("cyan"));
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["shelltour", "tour"]);
        assert_eq!(args.command, "tour");
        assert_eq!(args.delimiter, "myamazingapp~$");
        assert!(args.tour.is_none());
        assert_eq!(args.exec, vec!["tour"]);
    }
}

use shelltour::{ConfigurationError, KeyPress, PluginOptions, Shell, StdioInput, plugin};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

fn piped_shell(input: &str) -> (Shell, Arc<Mutex<Vec<u8>>>) {
    let captured = Arc::new(Mutex::new(Vec::<u8>::new()));
    let sink = captured.clone();
    let mut shell = Shell::new()
        .with_input(StdioInput::from_reader(Cursor::new(input.to_string())))
        .with_output_handler(move |data: &[u8]| sink.lock().unwrap().extend_from_slice(data));
    shell.set_delimiter("myamazingapp~$").command("foo", "Outputs \"bar\".", |_, ctx| {
        ctx.log("bar");
        Ok(())
    });
    (shell, captured)
}

fn text(captured: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&captured.lock().unwrap()).into_owned()
}

fn silly_options() -> PluginOptions {
    PluginOptions::new().command("tour").tour(|tour| {
        tour.step(1)
            .begin("To start, run \"foo\".")
            .expect_command("foo")
            .reject("Uh.. Let's type \"foo\" instead..")
            .end("Nice!");
        tour.step(2)
            .begin("Now press left, then right.")
            .expect_keys(vec![KeyPress::new("left"), KeyPress::new("right")]);
        tour.set_final_text("Very well done!");
        Ok(())
    })
}

#[test]
fn test_shell_constructs() {
    let shell = Shell::new();
    assert!(shell.commands().contains("help"));
}

#[test]
fn test_plugin_registers_without_error() {
    let mut shell = Shell::new();
    assert!(plugin::register(&mut shell, silly_options()).is_ok());
}

#[test]
fn test_tour_command_exists() {
    let mut shell = Shell::new();
    plugin::register(&mut shell, silly_options()).unwrap();
    let entry = shell.commands().find("tour").expect("tour command registered");
    assert_eq!(entry.description, "Takes you on a guided tour.");
}

#[test]
fn test_missing_options_register_nothing() {
    let mut shell = Shell::new();
    let before = shell.commands().len();

    let err = plugin::register(&mut shell, PluginOptions::new().tour(|_| Ok(()))).unwrap_err();
    assert_eq!(err, ConfigurationError::MissingOption("command"));

    let err = plugin::register(&mut shell, PluginOptions::new().command("  ").tour(|_| Ok(())))
        .unwrap_err();
    assert_eq!(err, ConfigurationError::MissingOption("command"));

    let err = plugin::register(&mut shell, PluginOptions::new().command("tour")).unwrap_err();
    assert_eq!(err, ConfigurationError::MissingOption("tour"));

    assert_eq!(shell.commands().len(), before);
}

#[test]
fn test_invalid_tour_registers_nothing() {
    let mut shell = Shell::new();
    let options = PluginOptions::new().command("tour").tour(|tour| {
        tour.step(1).begin("No criterion.");
        tour.step(0).expect_command("zero");
        Ok(())
    });

    let err = plugin::register(&mut shell, options).unwrap_err();

    assert_eq!(
        err.violations(),
        vec![
            ConfigurationError::MissingExpectation { index: 1 },
            ConfigurationError::ZeroIndex,
        ]
    );
    assert!(!shell.commands().contains("tour"));
}

#[test]
fn test_factory_error_is_returned() {
    let mut shell = Shell::new();
    let options = PluginOptions::new()
        .command("tour")
        .tour(|_| Err(ConfigurationError::DuplicateIndex { index: 7 }));

    let err = plugin::register(&mut shell, options).unwrap_err();

    assert_eq!(err, ConfigurationError::DuplicateIndex { index: 7 });
    assert!(!shell.commands().contains("tour"));
}

#[tokio::test]
async fn test_tour_runs_end_to_end_over_piped_input() {
    let (mut shell, captured) = piped_shell("tour\nbar\nfoo\nbanana\nleft\nright\nexit\nfoo\n");
    plugin::register(
        &mut shell,
        silly_options().description("Shows you around."),
    )
    .unwrap();

    shell.run().await.unwrap();

    let out = text(&captured);
    let order = [
        "To start, run \"foo\".",
        "Uh.. Let's type \"foo\" instead..",
        "bar\n",
        "Nice!",
        "Now press left, then right.",
        "Very well done!",
    ];
    let mut from = 0;
    for expected in order {
        let at = out[from..]
            .find(expected)
            .unwrap_or_else(|| panic!("{expected:?} missing after byte {from} in: {out}"));
        from += at + expected.len();
    }
    // `exit` ends the shell; the trailing `foo` is never executed.
    assert_eq!(out.matches("bar\n").count(), 1, "got: {out}");
    assert!(!out.contains("Unknown command: bar"), "got: {out}");
}

#[tokio::test]
async fn test_tour_reports_closed_input() {
    let (mut shell, captured) = piped_shell("tour\n");
    plugin::register(&mut shell, silly_options()).unwrap();

    shell.run().await.unwrap();

    let out = text(&captured);
    assert!(out.contains("To start, run \"foo\"."), "got: {out}");
    assert!(out.contains("Error: input closed"), "got: {out}");
}

#[tokio::test]
async fn test_tour_started_by_exec() {
    let (mut shell, captured) = piped_shell("foo\nleft\nright\n");
    plugin::register(&mut shell, silly_options()).unwrap();

    shell.exec("tour").await;

    assert!(text(&captured).contains("Very well done!"));
}

use cyberquest_config::Pacing;
use rstest::{fixture, rstest};
use serde::Deserialize;

use super::*;
use crate::session::{RecordingSink, Session};
use crate::world::World;

#[derive(Debug, Deserialize)]
struct Target {
    host: Option<String>,
}

#[fixture]
fn registry() -> CommandRegistry {
    CommandRegistry::builder()
        .command("ping", |context| context.write_line("pong"))
        .command("boom", |_context| Err(CommandError::fault("exploded")))
        .command("crash", |context| {
            context.write_line("half")?;
            panic!("handler bug")
        })
        .command_with_args("connect", |context, arguments: Option<Target>| {
            match arguments.and_then(|target| target.host) {
                Some(host) => context.write_line(&format!("to {host}")),
                None => context.write_line("usage"),
            }
        })
        .build()
}

fn dispatch(registry: &CommandRegistry, line: &str) -> (DispatchOutcome, RecordingSink) {
    let world = World::default();
    let mut session = Session::for_world(&world);
    let mut sink = RecordingSink::default();
    let names = registry.names().to_vec();
    let outcome = {
        let mut context =
            CommandContext::new(&mut session, &mut sink, &world, &names, Pacing::Instant);
        dispatch_line(registry, &mut context, line).expect("sink accepts output")
    };
    (outcome, sink)
}

#[rstest]
#[case("connect", ("connect", None))]
#[case("  connect {host: \"a b\"}", ("connect", Some("{host: \"a b\"}")))]
#[case("help ", ("help", Some("")))]
#[case("", ("", None))]
fn tokenise_splits_on_the_first_space(#[case] line: &str, #[case] expected: (&str, Option<&str>)) {
    assert_eq!(tokenise(line), expected);
}

#[rstest]
fn unknown_commands_are_reported(registry: CommandRegistry) {
    let (outcome, sink) = dispatch(&registry, "reboot now");

    assert_eq!(outcome, DispatchOutcome::NotFound);
    assert_eq!(sink.output(), "Command reboot not found!\r\n");
}

#[rstest]
fn commands_without_arguments_ignore_trailing_text(registry: CommandRegistry) {
    let (outcome, sink) = dispatch(&registry, "ping {this is ignored");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(sink.output(), "pong\r\n");
}

#[rstest]
#[case("connect")]
#[case("connect    ")]
fn argument_commands_without_text_receive_none(registry: CommandRegistry, #[case] line: &str) {
    let (outcome, sink) = dispatch(&registry, line);

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(sink.output(), "usage\r\n");
}

#[rstest]
fn valid_arguments_reach_the_handler(registry: CommandRegistry) {
    let (outcome, sink) = dispatch(&registry, "connect {host: 'mainframe'}");

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(sink.output(), "to mainframe\r\n");
}

#[rstest]
#[case("connect abc", "Expected opening {", 8)]
#[case("connect {host: \"x\"", "Expected matching }", 18)]
#[case("connect {host: x}", "Invalid character in value: 'x'", 15)]
#[case("connect {host \"x\"}", "Expected ':' after property name", 14)]
#[case("connect {host: \"x}", "Unterminated string", 15)]
fn syntax_errors_print_a_caret_diagnostic(
    registry: CommandRegistry,
    #[case] line: &str,
    #[case] message: &str,
    #[case] offset: usize,
) {
    let (outcome, sink) = dispatch(&registry, line);

    assert_eq!(outcome, DispatchOutcome::SyntaxError);
    assert_eq!(
        sink.output_lines(),
        [
            message.to_owned(),
            line.to_owned(),
            format!("{}^", " ".repeat(offset)),
            String::new(),
        ]
    );
}

#[rstest]
fn binding_failures_show_a_generic_error(registry: CommandRegistry) {
    let (outcome, sink) = dispatch(&registry, "connect {host: 42}");

    assert_eq!(outcome, DispatchOutcome::BindingFailed);
    assert_eq!(sink.output(), "Error executing command connect\r\n");
}

#[rstest]
fn handler_faults_show_a_generic_error(registry: CommandRegistry) {
    let (outcome, sink) = dispatch(&registry, "boom");

    assert_eq!(outcome, DispatchOutcome::HandlerFault);
    assert_eq!(sink.output(), "Error executing command boom\r\n");
}

#[rstest]
fn panicking_handlers_show_a_generic_error(registry: CommandRegistry) {
    let (outcome, sink) = dispatch(&registry, "crash");

    assert_eq!(outcome, DispatchOutcome::HandlerFault);
    assert_eq!(sink.output(), "half\r\nError executing command crash\r\n");
}

#[test]
fn panic_messages_are_kept_for_the_log() {
    let owned: Box<dyn Any + Send> = Box::new(String::from("index out of range"));
    let borrowed: Box<dyn Any + Send> = Box::new("bad state");
    let opaque: Box<dyn Any + Send> = Box::new(7_u8);

    assert_eq!(panic_message(owned.as_ref()), "handler panicked: index out of range");
    assert_eq!(panic_message(borrowed.as_ref()), "handler panicked: bad state");
    assert_eq!(panic_message(opaque.as_ref()), "handler panicked: no message");
}

#[rstest]
fn blank_lines_do_nothing(registry: CommandRegistry) {
    let (outcome, sink) = dispatch(&registry, "   ");

    assert_eq!(outcome, DispatchOutcome::Empty);
    assert!(sink.messages().is_empty());
}

#[rstest]
fn delivery_failures_end_the_dispatch(registry: CommandRegistry) {
    let world = World::default();
    let mut session = Session::for_world(&world);
    let mut sink = RecordingSink::failing_after(0);
    let names = registry.names().to_vec();
    let mut context = CommandContext::new(&mut session, &mut sink, &world, &names, Pacing::Instant);

    let result = dispatch_line(&registry, &mut context, "ping");

    assert!(matches!(result, Err(SinkError::Closed)));
}

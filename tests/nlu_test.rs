//! Rule-based NLU and dispatcher behavior through the text-driven tester

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use voxkit::testing::CommandTester;
use voxkit::{
    CommandContext, CommandDescriptor, CommandResult, NluEngine, ParamDescriptor, ParamType,
    RuleBasedNluEngine,
};

fn ok_handler() -> Arc<dyn voxkit::CommandHandler> {
    Arc::new(|_: &CommandContext| CommandResult::Success)
}

#[test]
fn bool_parameter_extraction_round_trip() {
    let tester = CommandTester::new();
    tester.registry().register(
        CommandDescriptor::new("set_grid")
            .with_triggers(["set grid", "grid"])
            .with_parameter(ParamDescriptor::new("enabled", ParamType::Bool).required()),
        Arc::new(|ctx: &CommandContext| {
            match ctx.param("enabled").map(|v| v.as_bool()) {
                Some(Ok(_)) => CommandResult::Success,
                _ => CommandResult::Failure,
            }
        }),
    );

    let on = tester.process_text("set grid on");
    assert!(on.recognized);
    assert_eq!(on.params.get("enabled").unwrap(), "true");
    assert_eq!(on.execution_result, Some(CommandResult::Success));

    let off = tester.process_text("set grid off");
    assert_eq!(off.params.get("enabled").unwrap(), "false");
}

#[test]
fn enum_parameter_must_match_declared_values() {
    let tester = CommandTester::new();
    tester.registry().register(
        CommandDescriptor::new("set_units")
            .with_triggers(["set units to", "units"])
            .with_parameter(
                ParamDescriptor::new("units", ParamType::Enum)
                    .required()
                    .with_enum_values(["metric", "imperial"]),
            ),
        ok_handler(),
    );

    let metric = tester.process_text("set units to metric");
    assert_eq!(metric.params.get("units").unwrap(), "metric");
    assert_eq!(metric.execution_result, Some(CommandResult::Success));

    // Intent matches but no declared value appears: required param missing
    let unknown = tester.process_text("set units to nautical");
    assert!(unknown.recognized);
    assert_eq!(unknown.execution_result, Some(CommandResult::InvalidParams));
}

#[test]
fn double_parameter_with_range() {
    let tester = CommandTester::new();
    tester.registry().register(
        CommandDescriptor::new("set_opacity")
            .with_triggers(["set opacity to", "opacity"])
            .with_parameter(
                ParamDescriptor::new("opacity", ParamType::Double)
                    .required()
                    .with_range(0.0, 1.0),
            ),
        ok_handler(),
    );

    let ok = tester.process_text("set opacity to 0.75");
    assert_eq!(ok.params.get("opacity").unwrap(), "0.75");
    assert_eq!(ok.execution_result, Some(CommandResult::Success));

    let high = tester.process_text("set opacity to 1.5");
    assert_eq!(high.execution_result, Some(CommandResult::InvalidParams));
}

#[test]
fn two_numeric_parameters_resolved_by_keyword_proximity() {
    let tester = CommandTester::new();
    tester.registry().register(
        CommandDescriptor::new("move_view")
            .with_triggers(["move view"])
            .with_parameter(ParamDescriptor::new("x", ParamType::Integer).required())
            .with_parameter(ParamDescriptor::new("y", ParamType::Integer).required()),
        ok_handler(),
    );

    let result = tester.process_text("move view x 40 y 70");
    assert!(result.recognized);
    assert_eq!(result.params.get("x").unwrap(), "40");
    assert_eq!(result.params.get("y").unwrap(), "70");
}

#[test]
fn string_parameter_from_preposition() {
    let tester = CommandTester::new();
    tester.registry().register(
        CommandDescriptor::new("fly_to")
            .with_triggers(["fly"])
            .with_parameter(ParamDescriptor::new("destination", ParamType::String).required()),
        ok_handler(),
    );

    let result = tester.process_text("fly to the northern ridge");
    assert!(result.recognized);
    assert_eq!(result.params.get("destination").unwrap(), "the northern ridge");
}

#[test]
fn handler_sees_conversion_failure_and_chooses_result() {
    let tester = CommandTester::new();
    let failures = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&failures);

    // Schema says string, handler wants an int: the accessor failure is the
    // handler's to interpret
    tester.registry().register(
        CommandDescriptor::new("rename")
            .with_triggers(["rename to"])
            .with_parameter(ParamDescriptor::new("title", ParamType::String).required()),
        Arc::new(move |ctx: &CommandContext| {
            if ctx.param("title").unwrap().as_int().is_err() {
                counted.fetch_add(1, Ordering::SeqCst);
                return CommandResult::InvalidParams;
            }
            CommandResult::Success
        }),
    );

    let result = tester.process_text("rename to sunset pass");
    assert_eq!(result.execution_result, Some(CommandResult::InvalidParams));
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[test]
fn substring_trigger_scores_at_least_the_boost() {
    let engine = RuleBasedNluEngine::new();
    let schemas = [CommandDescriptor::new("zoom_to").with_triggers(["zoom to"])];

    let result = engine
        .process("could you zoom to the harbor please", &schemas)
        .unwrap();
    assert!(result.confidence >= 0.8);
}

#[test]
fn best_trigger_wins_across_schemas() {
    let tester = CommandTester::new();
    tester
        .registry()
        .register_simple("show_help", ["show help"], ok_handler());
    tester
        .registry()
        .register_simple("show_layers", ["show layers"], ok_handler());

    let result = tester.process_text("show layers");
    assert_eq!(result.command_name, "show_layers");
}

#[test]
fn unregistering_removes_command_from_matching() {
    let tester = CommandTester::new();
    tester
        .registry()
        .register_simple("show_help", ["show help"], ok_handler());

    assert!(tester.process_text("show help").recognized);
    assert!(tester.registry().unregister("show_help"));
    assert!(!tester.process_text("show help").recognized);
}

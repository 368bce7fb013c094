//! End-to-end scenarios mixing the three languages

use super::helpers::{load_engine, record_events, run_program, test_config};
use crate::interpreter::errors::LoadError;
use crate::interpreter::events::{Channel, Event};
use crate::interpreter::executor::{Engine, RunOutcome};
use crate::interpreter::loader;
use crate::interpreter::types::Value;
use maplit::btreemap;

const LESSON: &str = r#"
T:Welcome to the shapes lesson
10 LET SIDES = 3
REPEAT SIDES [FD 10 LT 120]
U:PERIM=10 * SIDES
Y:PERIM > 20
T:Perimeter is *PERIM*
FOR I = 1 TO 2
PR REPCOUNT
NEXT I
PRINT "done"
"#;

#[test]
fn test_mixed_language_lesson() {
    let run = run_program(LESSON);

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 0 });
    assert_eq!(
        run.outputs(),
        vec!["Welcome to the shapes lesson", "Perimeter is 30", "3", "3", "done"]
    );
    assert_eq!(run.engine.turtle().segments().len(), 3);
    assert_eq!(
        run.engine.variables().snapshot(),
        btreemap! {
            "I".to_string() => Value::Integer(3),
            "PERIM".to_string() => Value::Integer(30),
            "REPCOUNT".to_string() => Value::Integer(3),
            "SIDES".to_string() => Value::Integer(3),
        }
    );
}

#[test]
fn test_runs_are_deterministic_with_fixed_seed() {
    let source = "FOR I = 1 TO 5\nX = RND(1)\nPRINT INT(X * 100)\nNEXT I\nREPEAT 3 [FD RND(1) * 10 RT 45]";

    let first = run_program(source);
    let second = run_program(source);

    assert_eq!(*first.events.lock(), *second.events.lock());
    assert_eq!(first.engine.snapshot(), second.engine.snapshot());
}

#[test]
fn test_events_bracket_the_run() {
    let run = run_program("X = 1\nPRINT X");

    let events = run.events.lock();
    assert_eq!(events.first(), Some(&Event::ProgramStarted));
    assert_eq!(
        events.last(),
        Some(&Event::ProgramFinished { success: true })
    );
    assert_eq!(
        events[1],
        Event::VariableChanged {
            name: "X".to_string(),
            value: Value::Integer(1),
        }
    );
    drop(events);
    assert_eq!(run.count(Channel::LineExecuted), 2);
}

#[test]
fn test_failing_and_panicking_subscribers_do_not_stop_the_program() {
    let (mut engine, events) = load_engine("PRINT 1\nPRINT 2", test_config());
    engine.subscribe(Channel::Output, |_| anyhow::bail!("subscriber failed"));
    engine.subscribe(Channel::Output, |_| panic!("subscriber panicked"));

    assert_eq!(engine.run(), RunOutcome::Completed { errors: 0 });
    assert_eq!(super::helpers::outputs(&events.lock()), vec!["1", "2"]);
}

#[test]
fn test_unsubscribe() {
    let mut engine = Engine::new(test_config());
    engine.load("PRINT 1").unwrap();
    let first = record_events(&mut engine);
    let counter = std::sync::Arc::new(parking_lot::Mutex::new(0));
    let id = {
        let counter = std::sync::Arc::clone(&counter);
        engine.subscribe(Channel::Output, move |_| {
            *counter.lock() += 1;
            Ok(())
        })
    };
    assert!(engine.unsubscribe(id));
    assert!(!engine.unsubscribe(id));

    engine.run();
    assert_eq!(*counter.lock(), 0);
    assert!(!first.lock().is_empty());
}

#[test]
fn test_duplicate_label_rejects_program() {
    let mut engine = Engine::new(test_config());
    let err = engine.load("L:start\nT:x\nL:START").unwrap_err();

    assert_eq!(
        err,
        LoadError::DuplicateLabel {
            name: "START".to_string(),
            first: 1,
            second: 3,
        }
    );
}

#[test]
fn test_labels_resolve_back_to_their_lines() {
    let program = loader::load("L:one\nT:a\n  L:Two\nJ:one\nL:three").unwrap();

    let mut count = 0;
    for (name, index) in program.labels() {
        count += 1;
        assert_eq!(program.label(name), Some(index));
        let text = &program.line(index).unwrap().text;
        assert_eq!(loader::label_name(text).as_deref(), Some(name));
    }
    assert_eq!(count, 3);
}

#[test]
fn test_interpolation_is_idempotent() {
    let run = run_program("U:A=\"x\"\nU:B=2\nU:C=3.5");
    let vars = run.engine.variables();

    for text in ["*A* and *B*", "*C**A*", "**", "*missing* *B", "plain"] {
        let once = vars.interpolate(text);
        assert_eq!(vars.interpolate(&once), once, "text: {}", text);
    }
}

#[test]
fn test_reset_clears_state_but_keeps_program() {
    let (mut engine, _events) = load_engine("X = 1\nFD 10", test_config());
    engine.run();
    assert_eq!(engine.variables().len(), 1);

    engine.reset();

    assert!(engine.variables().is_empty());
    assert!(engine.turtle().segments().is_empty());
    assert_eq!(engine.cursor().index, 0);
    assert_eq!(engine.program().len(), 2);
    assert_eq!(engine.run(), RunOutcome::Completed { errors: 0 });
}

#[test]
fn test_host_can_seed_variables() {
    let (mut engine, events) = load_engine("PRINT NAME$ + \"!\"", test_config());
    engine.set_variable("name$", Value::Text("Ada".to_string()));

    engine.run();

    assert_eq!(super::helpers::outputs(&events.lock()), vec!["Ada!"]);
}

#[test]
fn test_snapshot_serializes() {
    let run = run_program("X = 2\nFD 5");

    let json = serde_json::to_value(run.engine.snapshot()).unwrap();
    assert_eq!(json["variables"]["X"], serde_json::json!({"t": "Integer", "v": 2}));
    assert_eq!(json["cursor"]["running"], serde_json::json!(false));
    assert_eq!(json["turtle"]["segments"].as_array().map(Vec::len), Some(1));
}

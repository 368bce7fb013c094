//! Tests for PILOT commands

use super::helpers::{run_program, run_with, run_with_input, test_config};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::executor::{Engine, RunOutcome};
use crate::interpreter::host::RuntimeRequest;
use crate::interpreter::types::Value;

/* ===================== Type & Accept ===================== */

#[test]
fn test_type_interpolates_variables() {
    let run = run_program(
        r#"
U:NAME="Ada"
T:Hello *NAME*!
T:Cost is *PRICE* today
"#,
    );

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 0 });
    assert_eq!(run.outputs(), vec!["Hello Ada!", "Cost is *PRICE* today"]);
}

#[test]
fn test_accept_reads_into_named_variable() {
    let run = run_with_input("A:NAME\nT:Hi *NAME*", &["Bob"]);

    assert_eq!(run.outputs(), vec!["Hi Bob"]);
    assert_eq!(
        run.engine.variable("name"),
        Some(&Value::Text("Bob".to_string()))
    );
}

#[test]
fn test_accept_without_name_uses_answer() {
    let run = run_with_input("A:\nT:*ANSWER*", &["42"]);

    assert_eq!(run.engine.variable("ANSWER"), Some(&Value::Integer(42)));
    assert_eq!(run.outputs(), vec!["42"]);
}

#[test]
fn test_compute_assigns_expression() {
    let run = run_program("C:TOTAL = 2 * 21\nT:*TOTAL*");

    assert_eq!(run.engine.variable("TOTAL"), Some(&Value::Integer(42)));
    assert_eq!(run.outputs(), vec!["42"]);
}

/* ===================== Match Sentinel ===================== */

#[test]
fn test_type_after_test_is_conditional_once() {
    let run = run_program(
        r#"
U:X=5
Y:X > 3
T:big
N:X > 10
T:huge
T:always
"#,
    );

    assert_eq!(run.outputs(), vec!["big", "always"]);
}

#[test]
fn test_match_result_expires_after_one_command() {
    let run = run_program(
        r#"
Y:1 = 2
U:X=1
T:printed because the result expired
"#,
    );

    assert_eq!(run.outputs(), vec!["printed because the result expired"]);
}

#[test]
fn test_conditioned_type_uses_last_result() {
    let run = run_program(
        r#"
Y:2 > 1
U:X=1
TY:yes
TN:no
MT:matched
"#,
    );

    assert_eq!(run.outputs(), vec!["yes", "matched"]);
}

/* ===================== Jumps & Subroutines ===================== */

#[test]
fn test_jump_skips_to_label() {
    let run = run_program(
        r#"
J:skip
T:never
L:skip
T:after
"#,
    );

    assert_eq!(run.outputs(), vec!["after"]);
}

#[test]
fn test_conditional_jumps() {
    let run = run_program(
        r#"
U:SCORE=80
Y:SCORE >= 50
JY:pass
T:fail
E:
L:pass
N:SCORE >= 90
JN:plain
T:honours
L:plain
T:passed
"#,
    );

    assert_eq!(run.outputs(), vec!["passed"]);
}

#[test]
fn test_subroutine_call_and_return() {
    let run = run_program(
        r#"
R:greet
T:back
E:
L:greet
T:hello
C:
"#,
    );

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 0 });
    assert_eq!(run.outputs(), vec!["hello", "back"]);
}

#[test]
fn test_end_inside_subroutine_returns() {
    let run = run_program(
        r#"
R:sub
T:main done
E:
L:sub
T:in sub
E:
T:unreachable
"#,
    );

    assert_eq!(run.outputs(), vec!["in sub", "main done"]);
}

/* ===================== Runtime Commands ===================== */

#[test]
fn test_runtime_command_stores_result() {
    let mut engine = Engine::new(test_config());
    engine.load("R: MATH ADD 2 3\nT:sum=*RESULT*").unwrap();
    engine.register_runtime(
        "math",
        Box::new(|request: &RuntimeRequest| -> Result<Value, RuntimeError> {
            let sum = request
                .args
                .iter()
                .map(|a| a.parse::<i64>().unwrap_or(0))
                .sum();
            Ok(Value::Integer(sum))
        }),
    );
    let events = super::helpers::record_events(&mut engine);

    let outcome = engine.run();

    assert_eq!(outcome, RunOutcome::Completed { errors: 0 });
    assert_eq!(engine.variable("RESULT"), Some(&Value::Integer(5)));
    assert_eq!(super::helpers::outputs(&events.lock()), vec!["sum=5"]);
}

#[test]
fn test_runtime_command_for_unknown_subsystem_is_recoverable() {
    let run = run_with("R: SOUND BEEP 440\nT:still here", test_config(), &[]);

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 1 });
    assert_eq!(run.outputs(), vec!["still here"]);
    let errors = run.line_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.contains("SOUND"));
    assert!(!errors[0].2);
}

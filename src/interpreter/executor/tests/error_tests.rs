//! Tests for error reporting and recovery

use super::helpers::{run_program, run_with, test_config};
use crate::config::EngineConfig;
use crate::interpreter::errors::{ControlFlowError, DispatchError, EvalError, ExecError};
use crate::interpreter::events::{Channel, Event, Output};
use crate::interpreter::executor::RunOutcome;
use crate::interpreter::types::Value;

/* ===================== Recoverable ===================== */

#[test]
fn test_unknown_command_is_reported_and_skipped() {
    let run = run_program("FOO BAR\nPRINT \"after\"");

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 1 });
    assert_eq!(run.outputs(), vec!["after"]);
    assert_eq!(
        run.line_errors(),
        vec![(0, "unknown command `FOO BAR`".to_string(), false)]
    );
}

#[test]
fn test_division_by_zero_is_recoverable() {
    let run = run_program("X = 1 / 0\nPRINT \"ok\"");

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 1 });
    assert_eq!(run.engine.variable("X"), None);
    assert_eq!(run.line_errors()[0].1, "division by zero");
}

#[test]
fn test_missing_input_is_recoverable() {
    let run = run_program("INPUT X\nA:NAME\nPRINT \"done\"");

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 2 });
    assert_eq!(run.outputs(), vec!["done"]);
    let messages: Vec<String> = run.line_errors().into_iter().map(|e| e.1).collect();
    assert_eq!(
        messages,
        vec![
            "no input available for `X`".to_string(),
            "no input available for `NAME`".to_string(),
        ]
    );
}

#[test]
fn test_error_reports_source_line() {
    let run = run_program("\n\nREM header\nPRINT NOPE");

    let events = run.events.lock();
    let error = events.iter().find_map(|e| match e {
        Event::Output(Output::LineError {
            index, source_line, ..
        }) => Some((*index, *source_line)),
        _ => None,
    });
    assert_eq!(error, Some((0, 4)));
}

/* ===================== Fatal ===================== */

#[test]
fn test_undefined_label_is_fatal() {
    let run = run_program("J:nowhere\nT:unreachable");

    assert_eq!(
        run.outcome,
        RunOutcome::Halted {
            error: ExecError::ControlFlow(ControlFlowError::UndefinedLabel {
                label: "nowhere".to_string(),
            })
        }
    );
    assert!(run.outputs().is_empty());
    assert_eq!(run.line_errors()[0].2, true);
}

#[test]
fn test_return_without_gosub_is_fatal() {
    let run = run_program("RETURN");

    assert_eq!(
        run.outcome,
        RunOutcome::Halted {
            error: ExecError::ControlFlow(ControlFlowError::StackUnderflow {
                command: "RETURN",
                expected: "GOSUB",
            })
        }
    );
    assert_eq!(run.line_errors()[0].1, "RETURN without matching GOSUB");
}

#[test]
fn test_runaway_program_halts_at_ceiling() {
    let config = EngineConfig {
        max_iterations: 50,
        ..test_config()
    };
    let run = run_with("10 GOTO 10", config, &[]);

    assert_eq!(
        run.outcome,
        RunOutcome::Halted {
            error: ExecError::RunawayProgram { limit: 50 }
        }
    );
    assert_eq!(run.count(Channel::LineExecuted), 50);
    assert_eq!(run.engine.cursor().iteration_count, 50);
}

#[test]
fn test_nested_commands_count_toward_ceiling() {
    let config = EngineConfig {
        max_iterations: 20,
        ..test_config()
    };
    let run = run_with("REPEAT 100 [FD 1]", config, &[]);

    assert_eq!(
        run.outcome,
        RunOutcome::Halted {
            error: ExecError::RunawayProgram { limit: 20 }
        }
    );
    // the REPEAT line itself plus 19 nested FD commands
    assert_eq!(run.engine.turtle().segments().len(), 19);
}

#[test]
fn test_empty_repeat_body_counts_toward_ceiling() {
    let config = EngineConfig {
        max_iterations: 50,
        ..test_config()
    };
    let run = run_with("REPEAT 100000000000 []", config, &[]);

    assert_eq!(
        run.outcome,
        RunOutcome::Halted {
            error: ExecError::RunawayProgram { limit: 50 }
        }
    );
    // the REPEAT line plus 49 passes
    assert_eq!(run.engine.variable("REPCOUNT"), Some(&Value::Integer(49)));
}

#[test]
fn test_complexity_limit() {
    let config = EngineConfig {
        eval: crate::interpreter::expressions::EvalLimits {
            max_tokens: 1000,
            max_depth: 3,
        },
        ..test_config()
    };
    let run = run_with("X = ((((1))))\nPRINT \"ok\"", config, &[]);

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 1 });
    assert!(run.line_errors()[0].1.starts_with("expression too complex"));
}

#[test]
fn test_error_kinds() {
    let run = run_program("FOO");
    assert!(matches!(
        run.outcome,
        RunOutcome::Completed { errors: 1 }
    ));

    let err: ExecError = DispatchError::UnknownCommand {
        command: "FOO".to_string(),
    }
    .into();
    assert!(!err.is_fatal());
    assert!(!ExecError::from(EvalError::DivideByZero).is_fatal());
}

#[test]
fn test_finished_event_reports_failure() {
    let run = run_program("RETURN");

    let events = run.events.lock();
    assert_eq!(events.first(), Some(&Event::ProgramStarted));
    assert_eq!(
        events.last(),
        Some(&Event::ProgramFinished { success: false })
    );
}

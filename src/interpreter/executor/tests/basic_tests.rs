//! Tests for BASIC statements

use super::helpers::{run_program, run_with_input};
use crate::interpreter::errors::{ControlFlowError, ExecError};
use crate::interpreter::executor::RunOutcome;
use crate::interpreter::types::Value;

/* ===================== Assignment & PRINT ===================== */

#[test]
fn test_let_and_implicit_assignment() {
    let run = run_program(
        r#"
10 LET A = 2
20 B = A * 10
30 C$ = "hi *A*"
"#,
    );

    assert_eq!(run.engine.variable("A"), Some(&Value::Integer(2)));
    assert_eq!(run.engine.variable("B"), Some(&Value::Integer(20)));
    assert_eq!(
        run.engine.variable("C$"),
        Some(&Value::Text("hi 2".to_string()))
    );
}

#[test]
fn test_set_with_interpolated_expression() {
    let run = run_program("SET X=5\nSET Y=*X*+2\nPRINT *Y*");

    assert_eq!(run.outputs(), vec!["7"]);
    assert_eq!(run.engine.variable("X"), Some(&Value::Integer(5)));
    assert_eq!(run.engine.variable("Y"), Some(&Value::Integer(7)));
}

#[test]
fn test_print_separators() {
    let run = run_program(
        r#"
PRINT "A"; "B", 1 + 2
PRINT
PRINT "x = "; MAX(1, 9)
"#,
    );

    assert_eq!(run.outputs(), vec!["AB 3", "", "x = 9"]);
}

#[test]
fn test_input_with_prompt() {
    let run = run_with_input("INPUT \"Age\"; AGE\nPRINT AGE + 1", &["41"]);

    assert_eq!(run.engine.variable("AGE"), Some(&Value::Integer(41)));
    assert_eq!(run.outputs(), vec!["42"]);
}

/* ===================== Jumps ===================== */

#[test]
fn test_goto_line_number() {
    let run = run_program(
        r#"
10 GOTO 40
20 PRINT "skipped"
40 PRINT "landed"
"#,
    );

    assert_eq!(run.outputs(), vec!["landed"]);
}

#[test]
fn test_computed_goto() {
    let run = run_program(
        r#"
10 T = 30
20 GOTO T
25 PRINT "skipped"
30 PRINT "landed"
"#,
    );

    assert_eq!(run.outputs(), vec!["landed"]);
}

#[test]
fn test_gosub_and_return() {
    let run = run_program(
        r#"
10 GOSUB 100
20 PRINT "back"
30 END
100 PRINT "sub"
110 RETURN
"#,
    );

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 0 });
    assert_eq!(run.outputs(), vec!["sub", "back"]);
}

#[test]
fn test_end_stops_program() {
    let run = run_program("PRINT 1\nEND\nPRINT 2");

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 0 });
    assert_eq!(run.outputs(), vec!["1"]);
}

/* ===================== IF ===================== */

#[test]
fn test_if_then_else() {
    let run = run_program(
        r#"
10 X = 5
20 IF X > 3 THEN PRINT "big" ELSE PRINT "small"
30 IF X > 10 THEN PRINT "huge" ELSE PRINT "not huge"
40 IF X = 5 THEN PRINT "five"
50 IF X = 6 THEN PRINT "six"
"#,
    );

    assert_eq!(run.outputs(), vec!["big", "not huge", "five"]);
}

#[test]
fn test_if_then_line_number_jumps() {
    let run = run_program(
        r#"
10 X = 1
20 IF X THEN 40
30 PRINT "skipped"
40 PRINT "done"
"#,
    );

    assert_eq!(run.outputs(), vec!["done"]);
}

#[test]
fn test_if_condition_error_is_recoverable() {
    let run = run_program("IF NOPE > 1 THEN PRINT \"x\"\nPRINT \"after\"");

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 1 });
    assert_eq!(run.outputs(), vec!["after"]);
}

/* ===================== FOR / NEXT ===================== */

#[test]
fn test_for_next_counts_and_leaves_variable_past_limit() {
    let run = run_program(
        r#"
10 FOR I = 1 TO 3
20 PRINT I
30 NEXT I
"#,
    );

    assert_eq!(run.outputs(), vec!["1", "2", "3"]);
    assert_eq!(run.engine.variable("I"), Some(&Value::Integer(4)));
}

#[test]
fn test_for_with_negative_step() {
    let run = run_program("FOR I = 10 TO 1 STEP -3\nPRINT I\nNEXT");

    assert_eq!(run.outputs(), vec!["10", "7", "4", "1"]);
    assert_eq!(run.engine.variable("I"), Some(&Value::Integer(-2)));
}

#[test]
fn test_for_with_zero_step_runs_once() {
    let run = run_program("FOR I = 1 TO 3 STEP 0\nPRINT I\nNEXT I\nPRINT \"after\"");

    assert_eq!(run.outcome, RunOutcome::Completed { errors: 0 });
    assert_eq!(run.outputs(), vec!["1", "after"]);
    assert_eq!(run.engine.variable("I"), Some(&Value::Integer(1)));
}

#[test]
fn test_nested_for_loops() {
    let run = run_program(
        r#"
FOR I = 1 TO 2
FOR J = 1 TO 2
PRINT I; J
NEXT J
NEXT I
"#,
    );

    assert_eq!(run.outputs(), vec!["11", "12", "21", "22"]);
}

#[test]
fn test_next_without_for_is_fatal() {
    let run = run_program("NEXT I\nPRINT \"unreachable\"");

    assert_eq!(
        run.outcome,
        RunOutcome::Halted {
            error: ExecError::ControlFlow(ControlFlowError::StackUnderflow {
                command: "NEXT",
                expected: "FOR",
            })
        }
    );
    assert!(run.outputs().is_empty());
}

#[test]
fn test_for_with_bad_limit_is_fatal() {
    let run = run_program("FOR I = 1 TO \"x\"\nPRINT I\nNEXT I");

    assert!(matches!(
        run.outcome,
        RunOutcome::Halted {
            error: ExecError::Eval { fatal: true, .. }
        }
    ));
}

/* ===================== DATA & misc ===================== */

#[test]
fn test_read_restore() {
    let run = run_program(
        r#"
10 DATA 1, 2, "three"
20 READ A, B
30 RESTORE
40 READ C
50 READ D, E, F
"#,
    );

    assert_eq!(run.engine.variable("A"), Some(&Value::Integer(1)));
    assert_eq!(run.engine.variable("B"), Some(&Value::Integer(2)));
    assert_eq!(run.engine.variable("C"), Some(&Value::Integer(1)));
    assert_eq!(run.engine.variable("D"), Some(&Value::Integer(2)));
    assert_eq!(
        run.engine.variable("E"),
        Some(&Value::Text("three".to_string()))
    );
    assert_eq!(run.engine.variable("F"), None);

    let errors = run.line_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, "READ past the end of DATA");
    assert!(!errors[0].2);
}

#[test]
fn test_swap() {
    let run = run_program("A = 1\nB = \"two\"\nSWAP A, B");

    assert_eq!(run.engine.variable("A"), Some(&Value::Text("two".to_string())));
    assert_eq!(run.engine.variable("B"), Some(&Value::Integer(1)));
}

#[test]
fn test_randomize_restarts_sequence() {
    let run = run_program(
        r#"
RANDOMIZE 7
A = RND(1)
RANDOMIZE 7
B = RND(1)
"#,
    );

    let a = run.engine.variable("A").cloned();
    assert!(a.is_some());
    assert_eq!(a.as_ref(), run.engine.variable("B"));
}

#[test]
fn test_color_and_cls_affect_turtle() {
    let run = run_program("COLOR 2\nFD 10\nCLS");

    assert_eq!(run.engine.turtle().color(), "red");
    assert!(run.engine.turtle().segments().is_empty());
}

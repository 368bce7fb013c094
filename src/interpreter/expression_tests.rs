//! Expression evaluator tests

use crate::interpreter::errors::EvalError;
use crate::interpreter::events::EventBus;
use crate::interpreter::expressions::{evaluate, EvalLimits, Evaluator};
use crate::interpreter::types::Value;
use crate::interpreter::variables::VariableStore;

/* ===================== Helpers ===================== */

fn vars(pairs: &[(&str, Value)]) -> VariableStore {
    let mut bus = EventBus::new();
    let mut store = VariableStore::new();
    for (name, value) in pairs {
        store.set(name, value.clone(), &mut bus);
    }
    store
}

fn eval(expr: &str) -> Value {
    evaluate(expr, &VariableStore::new()).expect("evaluation failed")
}

fn eval_err(expr: &str) -> EvalError {
    evaluate(expr, &VariableStore::new()).expect_err("evaluation should fail")
}

/* ===================== Arithmetic ===================== */

#[test]
fn test_precedence_and_grouping() {
    assert_eq!(eval("2 + 3 * 4"), Value::Integer(14));
    assert_eq!(eval("(2 + 3) * 4"), Value::Integer(20));
    assert_eq!(eval("10 - 4 - 3"), Value::Integer(3));
    assert_eq!(eval("2 ^ 3 ^ 2"), Value::Integer(512));
    assert_eq!(eval("-2 ^ 2"), Value::Integer(-4));
    assert_eq!(eval("7 MOD 3"), Value::Integer(1));
    assert_eq!(eval("7 % 3"), Value::Integer(1));
}

#[test]
fn test_division_always_yields_float() {
    assert_eq!(eval("6 / 3"), Value::Float(2.0));
    assert_eq!(eval("6 / 3").to_string(), "2");
    assert_eq!(eval("1 / 4"), Value::Float(0.25));
}

#[test]
fn test_integer_overflow_promotes_to_float() {
    assert_eq!(
        eval("9223372036854775807 + 1"),
        Value::Float(9223372036854775808.0)
    );
    assert!(matches!(eval("2 ^ 70"), Value::Float(_)));
}

#[test]
fn test_mixed_numeric_kinds() {
    assert_eq!(eval("1 + 0.5"), Value::Float(1.5));
    assert_eq!(eval("2.5 * 2"), Value::Float(5.0));
}

#[test]
fn test_divide_by_zero() {
    assert_eq!(eval_err("1 / 0"), EvalError::DivideByZero);
    assert_eq!(eval_err("5 MOD 0"), EvalError::DivideByZero);
}

/* ===================== Text ===================== */

#[test]
fn test_text_concatenation_and_mismatch() {
    assert_eq!(eval(r#""ab" + "cd""#), Value::Text("abcd".into()));
    assert!(matches!(eval_err(r#""ab" + 1"#), EvalError::TypeMismatch { .. }));
    assert!(matches!(eval_err(r#"-"ab""#), EvalError::TypeMismatch { .. }));
}

#[test]
fn test_comparisons_coerce_numeric_text() {
    assert_eq!(eval(r#""10" = 10"#), Value::Integer(1));
    assert_eq!(eval(r#""apple" < "banana""#), Value::Integer(1));
    assert!(matches!(eval_err(r#""apple" < 3"#), EvalError::TypeMismatch { .. }));
}

/* ===================== Logic ===================== */

#[test]
fn test_comparison_and_logic_operators() {
    assert_eq!(eval("3 > 2 AND 1 < 2"), Value::Integer(1));
    assert_eq!(eval("3 <> 3 OR 0"), Value::Integer(0));
    assert_eq!(eval("NOT 0"), Value::Integer(1));
    assert_eq!(eval("NOT 1 = 2"), Value::Integer(1));
    assert_eq!(eval("2 >= 2"), Value::Integer(1));
    assert_eq!(eval("2 == 2"), Value::Integer(1));
    assert_eq!(eval("2 != 2"), Value::Integer(0));
}

/* ===================== Variables ===================== */

#[test]
fn test_variables_and_interpolation_tokens() {
    let store = vars(&[("X", Value::Integer(5)), ("Y", Value::Integer(2))]);
    assert_eq!(evaluate("x * y * 2", &store), Ok(Value::Integer(20)));
    assert_eq!(evaluate("*X* + 2", &store), Ok(Value::Integer(7)));
    assert_eq!(evaluate("X*Y", &store), Ok(Value::Integer(10)));
    assert_eq!(evaluate("(*Y*)*3", &store), Ok(Value::Integer(6)));
}

#[test]
fn test_unknown_variable_is_reported() {
    assert_eq!(
        eval_err("missing + 1"),
        EvalError::UnknownSymbol {
            name: "MISSING".into()
        }
    );
    assert_eq!(
        eval_err("*NOPE* + 1"),
        EvalError::UnknownSymbol {
            name: "NOPE".into()
        }
    );
}

#[test]
fn test_longest_identifier_wins_over_function_prefix() {
    // EXP is a function name, EXPONENT is a variable
    let store = vars(&[("EXPONENT", Value::Integer(3)), ("EXP", Value::Integer(9))]);
    assert_eq!(evaluate("EXPONENT + 1", &store), Ok(Value::Integer(4)));
    assert_eq!(evaluate("EXP + 1", &store), Ok(Value::Integer(10)));
    assert_eq!(evaluate("EXP(0)", &store), Ok(Value::Float(1.0)));
}

#[test]
fn test_longest_match_with_single_letter_variable() {
    let store = vars(&[("X", Value::Integer(1)), ("EXP", Value::Integer(2))]);
    assert_eq!(evaluate("EXP", &store), Ok(Value::Integer(2)));
    assert_eq!(evaluate("EXP + X", &store), Ok(Value::Integer(3)));
}

/* ===================== Functions ===================== */

#[test]
fn test_math_functions() {
    assert_eq!(eval("ABS(-4)"), Value::Integer(4));
    assert_eq!(eval("SQR(16)"), Value::Float(4.0));
    assert_eq!(eval("INT(3.7)"), Value::Integer(3));
    assert_eq!(eval("INT(-3.5)"), Value::Integer(-4));
    assert_eq!(eval("CEIL(3.2)"), Value::Integer(4));
    assert_eq!(eval("ROUND(2.5)"), Value::Integer(3));
    assert_eq!(eval("ROUND(3.14159, 2)"), Value::Float(3.14));
    assert_eq!(eval("SGN(-9)"), Value::Integer(-1));
    assert_eq!(eval("MAX(1, 7, 3)"), Value::Integer(7));
    assert_eq!(eval("MIN(4, 2.5)"), Value::Float(2.5));
    assert_eq!(eval("POW(2, 10)"), Value::Integer(1024));
    assert_eq!(eval("SIN(0)"), Value::Float(0.0));
    assert_eq!(eval("LOG(1)"), Value::Float(0.0));
}

#[test]
fn test_round_rejects_out_of_range_digits() {
    assert_eq!(eval("ROUND(2.5, 0)"), Value::Float(3.0));
    assert!(matches!(eval_err("ROUND(1.5, 4294967298)"), EvalError::TypeMismatch { .. }));
    assert!(matches!(eval_err("ROUND(1.5, 400)"), EvalError::TypeMismatch { .. }));
}

#[test]
fn test_string_functions() {
    assert_eq!(eval(r#"LEN("hello")"#), Value::Integer(5));
    assert_eq!(eval(r#"LEFT$("hello", 2)"#), Value::Text("he".into()));
    assert_eq!(eval(r#"RIGHT$("hello", 3)"#), Value::Text("llo".into()));
    assert_eq!(eval(r#"MID$("hello", 2, 3)"#), Value::Text("ell".into()));
    assert_eq!(eval(r#"UPPER("abc")"#), Value::Text("ABC".into()));
    assert_eq!(eval(r#"LCASE$("ABC")"#), Value::Text("abc".into()));
    assert_eq!(eval("STR$(42)"), Value::Text("42".into()));
    assert_eq!(eval(r#"VAL("12") + 1"#), Value::Integer(13));
    assert_eq!(eval("CHR$(65)"), Value::Text("A".into()));
    assert_eq!(eval(r#"ASC("A")"#), Value::Integer(65));
}

#[test]
fn test_unlisted_function_is_rejected() {
    assert_eq!(
        eval_err("SYSTEM(1)"),
        EvalError::UnknownSymbol {
            name: "SYSTEM".into()
        }
    );
}

#[test]
fn test_random_numbers_are_reproducible_with_a_seed() {
    let store = VariableStore::new();
    let mut a = Evaluator::new(EvalLimits::default(), Some(7));
    let mut b = Evaluator::new(EvalLimits::default(), Some(7));
    let first = a.evaluate("RND()", &store).unwrap();
    assert_eq!(first, b.evaluate("RND(1)", &store).unwrap());
    match first {
        Value::Float(f) => assert!((0.0..1.0).contains(&f)),
        other => panic!("expected float, got {:?}", other),
    }
}

/* ===================== Syntax & Limits ===================== */

#[test]
fn test_syntax_errors() {
    for expr in ["", "1 +", "(1 + 2", "1 + 2)", "1 2", "* 3", "\"open", "1 # 2", "ABS(1,)"] {
        assert!(
            matches!(evaluate(expr, &VariableStore::new()), Err(EvalError::Syntax { .. })),
            "expected syntax error for {:?}",
            expr
        );
    }
}

#[test]
fn test_token_budget() {
    let store = VariableStore::new();
    let mut evaluator = Evaluator::new(
        EvalLimits {
            max_tokens: 5,
            max_depth: 64,
        },
        Some(1),
    );
    assert_eq!(evaluator.evaluate("1 + 2 + 3", &store), Ok(Value::Integer(6)));
    assert!(matches!(
        evaluator.evaluate("1 + 2 + 3 + 4", &store),
        Err(EvalError::ComplexityExceeded { .. })
    ));
}

#[test]
fn test_depth_budget() {
    let store = VariableStore::new();
    let mut evaluator = Evaluator::new(
        EvalLimits {
            max_tokens: 1000,
            max_depth: 3,
        },
        Some(1),
    );
    assert_eq!(evaluator.evaluate("(((1)))", &store), Ok(Value::Integer(1)));
    assert!(matches!(
        evaluator.evaluate("((((1))))", &store),
        Err(EvalError::ComplexityExceeded { .. })
    ));
}

#[test]
fn test_evaluation_is_deterministic() {
    let store = vars(&[("A", Value::Float(1.5)), ("B", Value::Text("x".into()))]);
    let expr = "A * 4 + LEN(B + \"yz\")";
    assert_eq!(evaluate(expr, &store), evaluate(expr, &store));
    assert_eq!(evaluate(expr, &store), Ok(Value::Float(9.0)));
}

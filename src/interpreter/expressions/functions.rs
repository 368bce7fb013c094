//! Built-in function table
//!
//! Only the names listed in [`FUNCTIONS`] may be called from an expression.

use super::operators::{apply_binary, compare};
use super::tokenizer::Op;
use crate::interpreter::errors::EvalError;
use crate::interpreter::types::Value;
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::Ordering;

const MAX_ROUND_DIGITS: i32 = 308;

/// Callable names
pub const FUNCTIONS: &[&str] = &[
    "SIN", "COS", "TAN", "ATN", "ATAN", "SQR", "SQRT", "ABS", "INT", "FLOOR", "CEIL", "ROUND",
    "EXP", "LOG", "LOG10", "SGN", "MIN", "MAX", "POW", "RND", "RAND", "LEN", "LEFT$", "LEFT",
    "RIGHT$", "RIGHT", "MID$", "MID", "UPPER", "UCASE$", "LOWER", "LCASE$", "STR$", "VAL",
    "CHR$", "ASC",
];

/// Named constants, used when no variable shadows the name
pub fn constant(name: &str) -> Option<Value> {
    match name {
        "PI" => Some(Value::Float(std::f64::consts::PI)),
        _ => None,
    }
}

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

/* ===================== Dispatch ===================== */

pub fn call(name: &str, args: Vec<Value>, rng: &mut StdRng) -> Result<Value, EvalError> {
    match name {
        "SIN" => unary_float(name, &args, f64::sin),
        "COS" => unary_float(name, &args, f64::cos),
        "TAN" => unary_float(name, &args, f64::tan),
        "ATN" | "ATAN" => unary_float(name, &args, f64::atan),
        "SQR" | "SQRT" => {
            arity(name, &args, 1, 1)?;
            let x = number(name, &args[0])?;
            if x < 0.0 {
                return Err(EvalError::mismatch(format!("{} of negative number {}", name, x)));
            }
            Ok(Value::Float(x.sqrt()))
        }
        "ABS" => {
            arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Integer(i) => Ok(i
                    .checked_abs()
                    .map(Value::Integer)
                    .unwrap_or(Value::Float((*i as f64).abs()))),
                other => Ok(Value::Float(number(name, other)?.abs())),
            }
        }
        "INT" | "FLOOR" => rounding(name, &args, f64::floor),
        "CEIL" => rounding(name, &args, f64::ceil),
        "ROUND" => {
            arity(name, &args, 1, 2)?;
            let x = number(name, &args[0])?;
            match args.get(1) {
                None => Ok(whole(x.round())),
                Some(digits) => {
                    let digits = round_digits(name, digits)?;
                    let scale = 10f64.powi(digits);
                    Ok(Value::Float((x * scale).round() / scale))
                }
            }
        }
        "EXP" => unary_float(name, &args, f64::exp),
        "LOG" | "LOG10" => {
            arity(name, &args, 1, 1)?;
            let x = number(name, &args[0])?;
            if x <= 0.0 {
                return Err(EvalError::mismatch(format!("{} of non-positive number {}", name, x)));
            }
            Ok(Value::Float(if name == "LOG" { x.ln() } else { x.log10() }))
        }
        "SGN" => {
            arity(name, &args, 1, 1)?;
            let x = number(name, &args[0])?;
            Ok(Value::Integer(if x > 0.0 {
                1
            } else if x < 0.0 {
                -1
            } else {
                0
            }))
        }
        "MIN" => extreme(name, args, Ordering::Less),
        "MAX" => extreme(name, args, Ordering::Greater),
        "POW" => {
            arity(name, &args, 2, 2)?;
            let mut args = args.into_iter();
            match (args.next(), args.next()) {
                (Some(base), Some(exp)) => apply_binary(Op::Pow, base, exp),
                _ => Err(EvalError::mismatch("POW expects 2 arguments")),
            }
        }
        "RND" | "RAND" => {
            arity(name, &args, 0, 1)?;
            Ok(Value::Float(rng.gen::<f64>()))
        }
        "LEN" => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Integer(args[0].to_string().chars().count() as i64))
        }
        "LEFT$" | "LEFT" => {
            arity(name, &args, 2, 2)?;
            let n = count(name, &args[1])?;
            Ok(Value::Text(args[0].to_string().chars().take(n).collect()))
        }
        "RIGHT$" | "RIGHT" => {
            arity(name, &args, 2, 2)?;
            let s: Vec<char> = args[0].to_string().chars().collect();
            let n = count(name, &args[1])?.min(s.len());
            Ok(Value::Text(s[s.len() - n..].iter().collect()))
        }
        "MID$" | "MID" => {
            arity(name, &args, 2, 3)?;
            let s = args[0].to_string();
            let start = count(name, &args[1])?.max(1) - 1;
            let len = match args.get(2) {
                Some(len) => count(name, len)?,
                None => usize::MAX,
            };
            Ok(Value::Text(s.chars().skip(start).take(len).collect()))
        }
        "UPPER" | "UCASE$" => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Text(args[0].to_string().to_uppercase()))
        }
        "LOWER" | "LCASE$" => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Text(args[0].to_string().to_lowercase()))
        }
        "STR$" => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Text(args[0].to_string()))
        }
        "VAL" => {
            arity(name, &args, 1, 1)?;
            Ok(args[0].to_number().unwrap_or(Value::Integer(0)))
        }
        "CHR$" => {
            arity(name, &args, 1, 1)?;
            let code = integer(name, &args[0])?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(|c| Value::Text(c.to_string()))
                .ok_or_else(|| EvalError::mismatch(format!("CHR$ code {} is not a character", code)))
        }
        "ASC" => {
            arity(name, &args, 1, 1)?;
            args[0]
                .to_string()
                .chars()
                .next()
                .map(|c| Value::Integer(c as i64))
                .ok_or_else(|| EvalError::mismatch("ASC of empty text"))
        }
        _ => Err(EvalError::UnknownSymbol {
            name: name.to_string(),
        }),
    }
}

/* ===================== Argument Helpers ===================== */

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(EvalError::mismatch(format!(
            "{} expects {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn number(name: &str, v: &Value) -> Result<f64, EvalError> {
    v.to_f64()
        .ok_or_else(|| EvalError::mismatch(format!("{} needs a number, got `{}`", name, v)))
}

fn integer(name: &str, v: &Value) -> Result<i64, EvalError> {
    v.to_i64()
        .ok_or_else(|| EvalError::mismatch(format!("{} needs an integer, got `{}`", name, v)))
}

/// Decimal places for `ROUND`, within the range an `f64` can scale by
fn round_digits(name: &str, v: &Value) -> Result<i32, EvalError> {
    let digits = integer(name, v)?;
    i32::try_from(digits)
        .ok()
        .filter(|d| (-MAX_ROUND_DIGITS..=MAX_ROUND_DIGITS).contains(d))
        .ok_or_else(|| {
            EvalError::mismatch(format!(
                "{} digits must be between -{max} and {max}, got {}",
                name,
                digits,
                max = MAX_ROUND_DIGITS
            ))
        })
}

fn count(name: &str, v: &Value) -> Result<usize, EvalError> {
    Ok(integer(name, v)?.max(0) as usize)
}

/// Whole-number float as an integer when it fits
fn whole(x: f64) -> Value {
    if x.is_finite() && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
        Value::Integer(x as i64)
    } else {
        Value::Float(x)
    }
}

fn unary_float(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    arity(name, args, 1, 1)?;
    Ok(Value::Float(f(number(name, &args[0])?)))
}

fn rounding(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    arity(name, args, 1, 1)?;
    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        other => Ok(whole(f(number(name, other)?))),
    }
}

fn extreme(name: &str, args: Vec<Value>, keep: Ordering) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::mismatch(format!("{} expects at least 1 argument", name)));
    }
    let mut best: Option<Value> = None;
    for arg in args {
        number(name, &arg)?;
        best = match best {
            Some(current) if compare(&arg, &current)? != keep => Some(current),
            _ => Some(arg),
        };
    }
    best.ok_or_else(|| EvalError::mismatch(format!("{} expects at least 1 argument", name)))
}

//! Operator semantics

use super::tokenizer::Op;
use crate::interpreter::errors::EvalError;
use crate::interpreter::types::Value;
use std::cmp::Ordering;

/* ===================== Unary ===================== */

pub fn apply_unary(op: Op, v: Value) -> Result<Value, EvalError> {
    match op {
        Op::Not => Ok(Value::from_bool(!v.is_truthy())),
        Op::Neg => match v {
            Value::Integer(i) => Ok(i
                .checked_neg()
                .map(Value::Integer)
                .unwrap_or(Value::Float(-(i as f64)))),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Text(_) => strict_numeric(&v, op),
        },
        Op::Pos => strict_numeric(&v, op),
        _ => Err(EvalError::syntax(format!("`{}` is not a unary operator", op.symbol()))),
    }
}

/* ===================== Binary ===================== */

pub fn apply_binary(op: Op, l: Value, r: Value) -> Result<Value, EvalError> {
    match op {
        Op::Add => add(l, r),
        Op::Sub => arithmetic(op, &l, &r, i64::checked_sub, |a, b| a - b),
        Op::Mul => arithmetic(op, &l, &r, i64::checked_mul, |a, b| a * b),
        Op::Div => {
            let (a, b) = (as_f64(&l, op)?, as_f64(&r, op)?);
            if b == 0.0 {
                return Err(EvalError::DivideByZero);
            }
            Ok(Value::Float(a / b))
        }
        Op::Mod => match (strict_numeric(&l, op)?, strict_numeric(&r, op)?) {
            (_, Value::Integer(0)) => Err(EvalError::DivideByZero),
            (Value::Integer(a), Value::Integer(b)) => Ok(a
                .checked_rem(b)
                .map(Value::Integer)
                .unwrap_or(Value::Integer(0))),
            (a, b) => {
                let (a, b) = (as_f64(&a, op)?, as_f64(&b, op)?);
                if b == 0.0 {
                    return Err(EvalError::DivideByZero);
                }
                Ok(Value::Float(a % b))
            }
        },
        Op::Pow => power(&l, &r),
        Op::Eq => Ok(Value::from_bool(compare(&l, &r)? == Ordering::Equal)),
        Op::Ne => Ok(Value::from_bool(compare(&l, &r)? != Ordering::Equal)),
        Op::Lt => Ok(Value::from_bool(compare(&l, &r)? == Ordering::Less)),
        Op::Gt => Ok(Value::from_bool(compare(&l, &r)? == Ordering::Greater)),
        Op::Le => Ok(Value::from_bool(compare(&l, &r)? != Ordering::Greater)),
        Op::Ge => Ok(Value::from_bool(compare(&l, &r)? != Ordering::Less)),
        Op::And => Ok(Value::from_bool(l.is_truthy() && r.is_truthy())),
        Op::Or => Ok(Value::from_bool(l.is_truthy() || r.is_truthy())),
        Op::Neg | Op::Pos | Op::Not => Err(EvalError::syntax(format!(
            "`{}` is not a binary operator",
            op.symbol()
        ))),
    }
}

fn add(l: Value, r: Value) -> Result<Value, EvalError> {
    match (l, r) {
        (Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
        (l, r) => arithmetic(Op::Add, &l, &r, i64::checked_add, |a, b| a + b),
    }
}

fn arithmetic(
    op: Op,
    l: &Value,
    r: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (strict_numeric(l, op)?, strict_numeric(r, op)?) {
        (Value::Integer(a), Value::Integer(b)) => Ok(int_op(a, b)
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float(float_op(a as f64, b as f64)))),
        (a, b) => Ok(Value::Float(float_op(as_f64(&a, op)?, as_f64(&b, op)?))),
    }
}

fn power(l: &Value, r: &Value) -> Result<Value, EvalError> {
    let op = Op::Pow;
    if let (Value::Integer(base), Value::Integer(exp)) = (strict_numeric(l, op)?, strict_numeric(r, op)?) {
        if let Ok(exp) = u32::try_from(exp) {
            if let Some(v) = base.checked_pow(exp) {
                return Ok(Value::Integer(v));
            }
        }
    }
    Ok(Value::Float(as_f64(l, op)?.powf(as_f64(r, op)?)))
}

/* ===================== Comparison ===================== */

/// Order two values
///
/// Text compares with text lexicographically. When text meets a number, the
/// text is coerced to a number or the comparison fails.
pub fn compare(l: &Value, r: &Value) -> Result<Ordering, EvalError> {
    match (l, r) {
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
        _ => {
            let a = l.to_f64().ok_or_else(|| cannot_compare(l, r))?;
            let b = r.to_f64().ok_or_else(|| cannot_compare(l, r))?;
            a.partial_cmp(&b).ok_or_else(|| cannot_compare(l, r))
        }
    }
}

fn cannot_compare(l: &Value, r: &Value) -> EvalError {
    EvalError::mismatch(format!(
        "cannot compare {} `{}` with {} `{}`",
        l.kind_name(),
        l,
        r.kind_name(),
        r
    ))
}

/* ===================== Coercion ===================== */

/// Numbers only; arithmetic never coerces text
fn strict_numeric(v: &Value, op: Op) -> Result<Value, EvalError> {
    match v {
        Value::Text(s) => Err(EvalError::mismatch(format!(
            "`{}` cannot be applied to text `{}`",
            op.symbol(),
            s
        ))),
        other => Ok(other.clone()),
    }
}

fn as_f64(v: &Value, op: Op) -> Result<f64, EvalError> {
    match v {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Text(s) => Err(EvalError::mismatch(format!(
            "`{}` cannot be applied to text `{}`",
            op.symbol(),
            s
        ))),
    }
}

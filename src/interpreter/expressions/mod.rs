//! Expression evaluation
//!
//! Pipeline: tokenize → budget check → shunting-yard to postfix → stack
//! evaluation against the variable store. Only allow-listed functions may be
//! called; anything else is an `UnknownSymbol`.

pub mod functions;
pub mod operators;
pub mod postfix;
pub mod tokenizer;

use crate::interpreter::errors::EvalError;
use crate::interpreter::types::Value;
use crate::interpreter::variables::VariableStore;
use postfix::Rpn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/* ===================== Limits ===================== */

/// Complexity budget applied to every expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalLimits {
    /// Maximum number of tokens
    pub max_tokens: usize,
    /// Maximum parenthesis / call nesting
    pub max_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits {
            max_tokens: 1000,
            max_depth: 64,
        }
    }
}

/* ===================== Evaluator ===================== */

/// Expression evaluator with its own random source
#[derive(Debug, Clone)]
pub struct Evaluator {
    limits: EvalLimits,
    rng: StdRng,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(EvalLimits::default(), None)
    }
}

impl Evaluator {
    /// A fixed `seed` makes `RND` reproducible
    pub fn new(limits: EvalLimits, seed: Option<u64>) -> Self {
        Evaluator {
            limits,
            rng: make_rng(seed),
        }
    }

    pub fn limits(&self) -> &EvalLimits {
        &self.limits
    }

    /// Restart the random sequence (BASIC `RANDOMIZE`)
    pub fn reseed(&mut self, seed: Option<u64>) {
        self.rng = make_rng(seed);
    }

    pub fn evaluate(&mut self, expr: &str, vars: &VariableStore) -> Result<Value, EvalError> {
        evaluate_with(expr, vars, &self.limits, &mut self.rng)
    }
}

/// Evaluate with explicit limits and random source
pub fn evaluate_with(
    expr: &str,
    vars: &VariableStore,
    limits: &EvalLimits,
    rng: &mut StdRng,
) -> Result<Value, EvalError> {
    let tokens = tokenizer::tokenize(expr, vars, limits)?;
    let program = postfix::to_postfix(tokens, limits)?;
    let result = run(program, vars, rng);
    trace!(expr, ?result, "Evaluated expression");
    result
}

fn run(program: Vec<Rpn>, vars: &VariableStore, rng: &mut StdRng) -> Result<Value, EvalError> {
    let mut stack: Vec<Value> = Vec::new();
    for instr in program {
        match instr {
            Rpn::Push(v) => stack.push(v),
            Rpn::Load(name) => match vars.get(&name).cloned().or_else(|| functions::constant(&name)) {
                Some(value) => stack.push(value),
                None => return Err(EvalError::UnknownSymbol { name }),
            },
            Rpn::Apply(op) if op.is_unary() => {
                let v = pop(&mut stack)?;
                stack.push(operators::apply_unary(op, v)?);
            }
            Rpn::Apply(op) => {
                let r = pop(&mut stack)?;
                let l = pop(&mut stack)?;
                stack.push(operators::apply_binary(op, l, r)?);
            }
            Rpn::Call { name, argc } => {
                if !functions::is_function(&name) {
                    return Err(EvalError::UnknownSymbol { name });
                }
                if stack.len() < argc {
                    return Err(EvalError::syntax(format!("missing arguments for {}", name)));
                }
                let args = stack.split_off(stack.len() - argc);
                stack.push(functions::call(&name, args, rng)?);
            }
        }
    }
    match (stack.pop(), stack.is_empty()) {
        (Some(v), true) => Ok(v),
        _ => Err(EvalError::syntax("malformed expression")),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, EvalError> {
    stack
        .pop()
        .ok_or_else(|| EvalError::syntax("operator is missing an operand"))
}

/// Evaluate with default limits
pub fn evaluate(expr: &str, vars: &VariableStore) -> Result<Value, EvalError> {
    Evaluator::default().evaluate(expr, vars)
}

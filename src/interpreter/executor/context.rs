//! Execution context handed to the command families
//!
//! One context is built per top-level command. Nested commands (IF branches,
//! REPEAT bodies, procedure bodies) reuse it and are charged against the same
//! iteration budget.

use super::engine::Machine;
use super::{basic, logo, pilot};
use crate::config::EngineConfig;
use crate::interpreter::dispatch::{self, Family};
use crate::interpreter::errors::{ControlFlowError, DispatchError, EvalError, ExecError};
use crate::interpreter::events::{Event, EventBus};
use crate::interpreter::host::Host;
use crate::interpreter::types::{Directive, Program, Value};
use tracing::debug;

pub(crate) struct ExecContext<'a> {
    pub program: &'a Program,
    pub machine: &'a mut Machine,
    pub bus: &'a mut EventBus,
    pub host: &'a mut Host,
    pub config: &'a EngineConfig,
    pub iterations: &'a mut u64,
    /// Index of the top-level line being executed
    pub index: usize,
    /// Current Logo procedure nesting
    pub call_depth: usize,
}

/* ===================== Dispatch ===================== */

/// Classify a command and hand it to its family executor
pub(crate) fn execute(ctx: &mut ExecContext<'_>, command: &str) -> Result<Directive, ExecError> {
    let command = command.trim();
    let family = dispatch::classify(command);
    debug!(index = ctx.index, ?family, command, "Dispatching command");

    match family {
        Family::Pilot => pilot::execute(ctx, command),
        Family::Basic => basic::execute(ctx, command),
        Family::Logo => logo::execute(ctx, command),
        Family::Unknown => {
            let name = command.split_whitespace().next().unwrap_or("");
            if ctx.program.procedure(name).is_some() {
                logo::execute(ctx, command)
            } else {
                Err(DispatchError::UnknownCommand {
                    command: command.to_string(),
                }
                .into())
            }
        }
    }
}

/// Execute a command nested inside another one
pub(crate) fn execute_nested(
    ctx: &mut ExecContext<'_>,
    command: &str,
) -> Result<Directive, ExecError> {
    ctx.charge()?;
    execute(ctx, command)
}

/* ===================== Helpers ===================== */

impl ExecContext<'_> {
    /// Count one executed command against the ceiling
    pub fn charge(&mut self) -> Result<(), ExecError> {
        let limit = self.config.max_iterations;
        if *self.iterations >= limit {
            return Err(ExecError::RunawayProgram { limit });
        }
        *self.iterations += 1;
        Ok(())
    }

    pub fn eval(&mut self, expr: &str) -> Result<Value, EvalError> {
        self.machine.evaluator.evaluate(expr, &self.machine.vars)
    }

    pub fn condition(&mut self, expr: &str) -> Result<bool, EvalError> {
        Ok(self.eval(expr)?.is_truthy())
    }

    /// Numeric argument of a control command; failures are fatal
    pub fn required_number(&mut self, expr: &str) -> Result<f64, ExecError> {
        let value = self.eval(expr).map_err(ExecError::fatal)?;
        value.to_f64().ok_or_else(|| {
            ExecError::fatal(EvalError::mismatch(format!(
                "expected a number, got `{}`",
                value
            )))
        })
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        self.machine.vars.set(name, value, self.bus);
    }

    pub fn print(&mut self, text: impl Into<String>) {
        self.bus.emit(Event::text(text));
    }

    pub fn interpolate(&self, text: &str) -> String {
        self.machine.vars.interpolate(text)
    }

    /// Resolve a label or line number to a line index
    pub fn target(&self, label: &str) -> Result<usize, ExecError> {
        self.program.resolve_target(label).ok_or_else(|| {
            ControlFlowError::UndefinedLabel {
                label: label.trim().to_string(),
            }
            .into()
        })
    }

    /// Jump into a subroutine, remembering where to come back
    pub fn call_subroutine(&mut self, target: usize) -> Directive {
        self.machine.stacks.returns.push(self.index + 1);
        Directive::Jump(target)
    }

    pub fn return_from_subroutine(
        &mut self,
        command: &'static str,
        expected: &'static str,
    ) -> Result<Directive, ExecError> {
        match self.machine.stacks.returns.pop() {
            Some(target) => Ok(Directive::Jump(target)),
            None => Err(ControlFlowError::StackUnderflow { command, expected }.into()),
        }
    }
}

/// Value of a quoted literal (`"text"` or `'text'`), if `expr` is exactly one
pub(crate) fn quoted_literal(expr: &str) -> Option<&str> {
    let expr = expr.trim();
    let quote = expr.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = expr.strip_prefix(quote)?.strip_suffix(quote)?;
    (!inner.contains(quote)).then_some(inner)
}

/// Split `name = expr` at the first `=`
pub(crate) fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let (name, expr) = text.split_once('=')?;
    let name = name.trim();
    let valid = !name.is_empty()
        && name.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && name
            .trim_end_matches('$')
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| (name, expr.trim()))
}

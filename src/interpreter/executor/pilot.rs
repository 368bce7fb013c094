//! PILOT commands
//!
//! `T:` type, `A:` accept, `Y:`/`N:` test, `J:` jump, `M:` match-jump,
//! `R:` subroutine or runtime command, `C:` return or compute, `U:` use,
//! `L:` label, `E:` end, plus the conditioned forms `TY: TN: JY: JN: MT:`.

use super::context::{quoted_literal, split_assignment, ExecContext};
use crate::interpreter::dispatch;
use crate::interpreter::errors::{ControlFlowError, DispatchError, ExecError};
use crate::interpreter::host::{RuntimeRequest, RUNTIME_RESULT_VAR};
use crate::interpreter::types::{Directive, Value};
use tracing::debug;

/// Variable used by `A:` when no name is given
const DEFAULT_ANSWER_VAR: &str = "ANSWER";

pub(crate) fn execute(ctx: &mut ExecContext<'_>, command: &str) -> Result<Directive, ExecError> {
    let Some((code, rest)) = dispatch::pilot_code(command) else {
        return Err(unknown(command));
    };
    let rest = rest.trim();

    match code.as_str() {
        "T" => {
            if ctx.machine.stacks.match_flag.take() == Some(false) {
                return Ok(Directive::Continue);
            }
            type_text(ctx, rest);
            Ok(Directive::Continue)
        }
        "TY" | "MT" => {
            if ctx.machine.stacks.match_flag.last_result() {
                type_text(ctx, rest);
            }
            Ok(Directive::Continue)
        }
        "TN" => {
            if !ctx.machine.stacks.match_flag.last_result() {
                type_text(ctx, rest);
            }
            Ok(Directive::Continue)
        }
        "Y" | "N" => test(ctx, rest),
        "J" => {
            if ctx.machine.stacks.match_flag.take() == Some(false) {
                return Ok(Directive::Continue);
            }
            jump(ctx, rest)
        }
        "JY" => conditional_jump(ctx, rest, true),
        "JN" => conditional_jump(ctx, rest, false),
        "M" => conditional_jump(ctx, rest, true),
        "L" => Ok(Directive::Continue),
        "U" => assign(ctx, rest),
        "C" if rest.contains('=') => assign(ctx, rest),
        "C" => ctx.return_from_subroutine("C:", "R:"),
        "A" => accept(ctx, rest),
        "R" => call(ctx, rest),
        "E" => {
            if ctx.machine.stacks.returns.is_empty() {
                Ok(Directive::Halt)
            } else {
                ctx.return_from_subroutine("E:", "R:")
            }
        }
        _ => Err(unknown(command)),
    }
}

fn unknown(command: &str) -> ExecError {
    DispatchError::UnknownCommand {
        command: command.to_string(),
    }
    .into()
}

fn type_text(ctx: &mut ExecContext<'_>, text: &str) {
    let text = ctx.interpolate(text);
    ctx.print(text);
}

/// `Y:`/`N:` store the truth of the condition; an error stores false
fn test(ctx: &mut ExecContext<'_>, condition: &str) -> Result<Directive, ExecError> {
    let result = ctx.condition(condition);
    let truth = *result.as_ref().unwrap_or(&false);
    ctx.machine.stacks.match_flag.arm(truth);
    result?;
    Ok(Directive::Continue)
}

fn label_of(rest: &str) -> &str {
    rest.trim().trim_start_matches('*')
}

fn jump(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let label = label_of(rest);
    if label.is_empty() {
        return Err(ExecError::bad_argument("jump needs a label"));
    }
    Ok(Directive::Jump(ctx.target(label)?))
}

fn conditional_jump(
    ctx: &mut ExecContext<'_>,
    rest: &str,
    when: bool,
) -> Result<Directive, ExecError> {
    if ctx.machine.stacks.match_flag.last_result() == when {
        jump(ctx, rest)
    } else {
        Ok(Directive::Continue)
    }
}

/// `U:name=expr`; a quoted right-hand side is interpolated text
fn assign(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let (name, expr) = split_assignment(rest)
        .ok_or_else(|| ExecError::bad_argument(format!("expected `name=value`, got `{}`", rest)))?;
    let value = match quoted_literal(expr) {
        Some(text) => Value::Text(ctx.interpolate(text)),
        None => ctx.eval(expr)?,
    };
    ctx.set_var(name, value);
    Ok(Directive::Continue)
}

fn accept(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let var = if rest.is_empty() {
        DEFAULT_ANSWER_VAR
    } else {
        rest.trim_start_matches('#').trim_start_matches('$')
    };
    let line = ctx
        .host
        .read_line("? ")
        .ok_or_else(|| ExecError::NoInput {
            var: var.to_ascii_uppercase(),
        })?;
    ctx.set_var(var, Value::parse_input(&line));
    Ok(Directive::Continue)
}

/// `R:label` is a subroutine call; `R: SUBSYSTEM VERB ARGS` goes to the host
fn call(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let label = label_of(rest);
    if label.is_empty() {
        return Err(ExecError::bad_argument("R: needs a label or a runtime command"));
    }
    if let Some(target) = ctx.program.resolve_target(label) {
        return Ok(ctx.call_subroutine(target));
    }
    if rest.split_whitespace().count() < 2 {
        return Err(ControlFlowError::UndefinedLabel {
            label: label.to_string(),
        }
        .into());
    }

    let text = ctx.interpolate(rest);
    let request = RuntimeRequest::parse(&text)
        .ok_or_else(|| ExecError::bad_argument("R: needs a label or a runtime command"))?;
    debug!(subsystem = %request.subsystem, verb = %request.verb, "Runtime command");
    let result = ctx.host.call(&request)?;
    ctx.set_var(RUNTIME_RESULT_VAR, result);
    Ok(Directive::Continue)
}

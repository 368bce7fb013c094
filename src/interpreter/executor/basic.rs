//! BASIC statements

use super::context::{execute_nested, quoted_literal, split_assignment, ExecContext};
use super::logo;
use crate::interpreter::dispatch::{self, BASIC_KEYWORDS};
use crate::interpreter::errors::{ControlFlowError, EvalError, ExecError};
use crate::interpreter::expressions::operators::apply_binary;
use crate::interpreter::expressions::tokenizer::Op;
use crate::interpreter::types::{Directive, ForFrame, Value};
use crate::interpreter::variables::normalize_name;

pub(crate) fn execute(ctx: &mut ExecContext<'_>, command: &str) -> Result<Directive, ExecError> {
    let word = dispatch::leading_word(command);
    let keyword = word.to_ascii_uppercase();
    if !BASIC_KEYWORDS.contains(&keyword.as_str()) {
        return assign(ctx, command);
    }
    let rest = command[word.len()..].trim();

    match keyword.as_str() {
        "LET" | "SET" => assign(ctx, rest),
        "PRINT" => print(ctx, rest),
        "INPUT" => input(ctx, rest),
        "GOTO" => Ok(Directive::Jump(jump_target(ctx, rest)?)),
        "GOSUB" => {
            let target = jump_target(ctx, rest)?;
            Ok(ctx.call_subroutine(target))
        }
        "RETURN" => ctx.return_from_subroutine("RETURN", "GOSUB"),
        "IF" => if_then(ctx, rest),
        "FOR" => for_loop(ctx, rest),
        "NEXT" => next(ctx, rest),
        "END" | "STOP" => Ok(Directive::Halt),
        "REM" | "DATA" => Ok(Directive::Continue),
        "READ" => read(ctx, rest),
        "RESTORE" => {
            ctx.machine.data_pointer = 0;
            Ok(Directive::Continue)
        }
        "RANDOMIZE" => randomize(ctx, rest),
        "SWAP" => swap(ctx, rest),
        "COLOR" => color(ctx, rest),
        "CLS" => {
            ctx.machine.turtle.clear();
            Ok(Directive::Continue)
        }
        _ => assign(ctx, command),
    }
}

/* ===================== Assignment & I/O ===================== */

fn assign(ctx: &mut ExecContext<'_>, text: &str) -> Result<Directive, ExecError> {
    let (name, expr) = split_assignment(text)
        .ok_or_else(|| ExecError::bad_argument(format!("expected `name = value`, got `{}`", text)))?;
    let value = match quoted_literal(expr) {
        Some(literal) => Value::Text(ctx.interpolate(literal)),
        None => ctx.eval(expr)?,
    };
    ctx.set_var(name, value);
    Ok(Directive::Continue)
}

/// `PRINT a; b, c`: `;` joins directly, `,` joins with a space
fn print(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let mut line = String::new();
    let mut pending_sep: Option<char> = None;
    for (item, sep) in split_top_level(rest, &[';', ',']) {
        let item = item.trim();
        if item.is_empty() {
            pending_sep = sep.or(pending_sep);
            continue;
        }
        if pending_sep == Some(',') {
            line.push(' ');
        }
        let text = match quoted_literal(item) {
            Some(literal) => ctx.interpolate(literal),
            None => ctx.eval(item)?.to_string(),
        };
        line.push_str(&text);
        pending_sep = sep;
    }
    ctx.print(line);
    Ok(Directive::Continue)
}

/// `INPUT ["prompt";] var`
fn input(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let parts = split_top_level(rest, &[';', ',']);
    let (prompt, var) = match parts.as_slice() {
        [(prompt, Some(_)), (var, _)] => {
            let prompt = prompt.trim();
            let prompt = quoted_literal(prompt).unwrap_or(prompt).to_string();
            (prompt, var.trim())
        }
        [(var, _)] => ("? ".to_string(), var.trim()),
        _ => return Err(ExecError::bad_argument("INPUT needs one variable")),
    };
    if var.is_empty() {
        return Err(ExecError::bad_argument("INPUT needs a variable"));
    }
    let prompt = ctx.interpolate(&prompt);
    let line = ctx.host.read_line(&prompt).ok_or_else(|| ExecError::NoInput {
        var: normalize_name(var),
    })?;
    ctx.set_var(var, Value::parse_input(&line));
    Ok(Directive::Continue)
}

/* ===================== Jumps ===================== */

/// Line number, label, or a computed line number
fn jump_target(ctx: &mut ExecContext<'_>, text: &str) -> Result<usize, ExecError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExecError::bad_argument("missing jump target"));
    }
    if let Some(index) = ctx.program.resolve_target(text) {
        return Ok(index);
    }
    let is_number = text.chars().all(|c| c.is_ascii_digit());
    let is_name = text.chars().all(|c| c.is_alphanumeric() || c == '_');
    if is_number || (is_name && !ctx.machine.vars.contains(text)) {
        return Err(undefined(text));
    }

    let value = ctx.eval(text).map_err(ExecError::fatal)?;
    value
        .to_i64()
        .and_then(|n| u32::try_from(n).ok())
        .and_then(|n| ctx.program.line_number(n))
        .ok_or_else(|| undefined(&value.to_string()))
}

fn undefined(label: &str) -> ExecError {
    ControlFlowError::UndefinedLabel {
        label: label.to_string(),
    }
    .into()
}

/* ===================== IF ===================== */

/// `IF cond THEN a [ELSE b]`, or the Logo-style `IF cond [commands]`
fn if_then(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    if let Some(then_at) = find_keyword(rest, "THEN") {
        let condition = &rest[..then_at];
        let branches = &rest[then_at + "THEN".len()..];
        let (then_part, else_part) = match find_keyword(branches, "ELSE") {
            Some(at) => (&branches[..at], Some(&branches[at + "ELSE".len()..])),
            None => (branches, None),
        };
        let branch = if ctx.condition(condition)? {
            Some(then_part)
        } else {
            else_part
        };
        return match branch.map(str::trim).filter(|b| !b.is_empty()) {
            None => Ok(Directive::Continue),
            Some(line) if line.chars().all(|c| c.is_ascii_digit()) => {
                Ok(Directive::Jump(ctx.target(line)?))
            }
            Some(command) => execute_nested(ctx, command),
        };
    }

    if let Some(open) = rest.find('[') {
        let condition = logo::expand_refs(ctx, &rest[..open])?;
        let body = logo::block_body(&rest[open..])
            .ok_or_else(|| ExecError::bad_argument("unbalanced `[` in IF"))?;
        if ctx.condition(&condition)? {
            return logo::run_block(ctx, body);
        }
        return Ok(Directive::Continue);
    }

    Err(ExecError::bad_argument("IF needs THEN"))
}

/* ===================== FOR / NEXT ===================== */

/// `FOR v = start TO limit [STEP s]`; every failure here is fatal
fn for_loop(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let malformed = || ExecError::fatal(EvalError::syntax("expected `FOR var = start TO limit [STEP step]`"));
    let (var, range) = split_assignment(rest).ok_or_else(malformed)?;
    let to_at = find_keyword(range, "TO").ok_or_else(malformed)?;
    let start_expr = &range[..to_at];
    let after_to = &range[to_at + "TO".len()..];
    let (limit_expr, step_expr) = match find_keyword(after_to, "STEP") {
        Some(at) => (&after_to[..at], Some(&after_to[at + "STEP".len()..])),
        None => (after_to, None),
    };

    let start = required_value(ctx, start_expr)?;
    let limit = required_value(ctx, limit_expr)?;
    let step = match step_expr {
        Some(expr) => required_value(ctx, expr)?,
        None => Value::Integer(1),
    };

    let var = normalize_name(var);
    let loops = &mut ctx.machine.stacks.loops;
    if let Some(existing) = loops.iter().rposition(|f| f.var == var) {
        loops.truncate(existing);
    }
    loops.push(ForFrame {
        var: var.clone(),
        limit,
        step,
        body_index: ctx.index + 1,
    });
    ctx.set_var(&var, start);
    Ok(Directive::Continue)
}

fn required_value(ctx: &mut ExecContext<'_>, expr: &str) -> Result<Value, ExecError> {
    let value = ctx.eval(expr).map_err(ExecError::fatal)?;
    if !value.is_numeric() {
        return Err(ExecError::fatal(EvalError::mismatch(format!(
            "FOR needs numbers, got `{}`",
            value
        ))));
    }
    Ok(value)
}

/// `NEXT [v]`: step the loop variable and jump back while in range
fn next(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let loops = &ctx.machine.stacks.loops;
    let position = if rest.is_empty() {
        loops.len().checked_sub(1)
    } else {
        let var = normalize_name(rest);
        loops.iter().rposition(|f| f.var == var)
    };
    let Some(position) = position else {
        return Err(ControlFlowError::StackUnderflow {
            command: "NEXT",
            expected: "FOR",
        }
        .into());
    };
    ctx.machine.stacks.loops.truncate(position + 1);
    let frame = ctx.machine.stacks.loops[position].clone();

    let current = ctx.machine.vars.get(&frame.var).cloned().ok_or_else(|| {
        ExecError::fatal(EvalError::UnknownSymbol {
            name: frame.var.clone(),
        })
    })?;
    let value = apply_binary(Op::Add, current, frame.step.clone()).map_err(ExecError::fatal)?;
    ctx.set_var(&frame.var, value.clone());

    let (n, limit, step) = match (value.to_f64(), frame.limit.to_f64(), frame.step.to_f64()) {
        (Some(n), Some(limit), Some(step)) => (n, limit, step),
        _ => {
            return Err(ExecError::fatal(EvalError::mismatch(
                "loop variable is no longer a number",
            )))
        }
    };
    // a zero step counts as descending, so the loop ends after one pass
    let again = if step > 0.0 { n <= limit } else { n >= limit };
    if again {
        Ok(Directive::Jump(frame.body_index))
    } else {
        ctx.machine.stacks.loops.pop();
        Ok(Directive::Continue)
    }
}

/* ===================== DATA & misc ===================== */

fn read(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let names: Vec<&str> = rest.split(',').map(str::trim).filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        return Err(ExecError::bad_argument("READ needs a variable"));
    }
    for name in names {
        let value = ctx
            .program
            .data()
            .get(ctx.machine.data_pointer)
            .cloned()
            .ok_or(ExecError::OutOfData)?;
        ctx.machine.data_pointer += 1;
        ctx.set_var(name, value);
    }
    Ok(Directive::Continue)
}

fn randomize(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let seed = if rest.is_empty() {
        None
    } else {
        let value = ctx.eval(rest)?;
        let seed = value
            .to_i64()
            .ok_or_else(|| ExecError::bad_argument(format!("RANDOMIZE needs a number, got `{}`", value)))?;
        Some(seed as u64)
    };
    ctx.machine.evaluator.reseed(seed);
    Ok(Directive::Continue)
}

fn swap(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    let Some((a, b)) = rest.split_once(',').map(|(a, b)| (a.trim(), b.trim())) else {
        return Err(ExecError::bad_argument("SWAP needs two variables"));
    };
    let lookup = |name: &str| {
        ctx.machine.vars.get(name).cloned().ok_or_else(|| EvalError::UnknownSymbol {
            name: normalize_name(name),
        })
    };
    let (va, vb) = (lookup(a)?, lookup(b)?);
    ctx.set_var(a, vb);
    ctx.set_var(b, va);
    Ok(Directive::Continue)
}

fn color(ctx: &mut ExecContext<'_>, rest: &str) -> Result<Directive, ExecError> {
    match ctx.eval(rest)? {
        Value::Text(name) => ctx.machine.turtle.set_color(name),
        number => {
            let index = number
                .to_i64()
                .ok_or_else(|| ExecError::bad_argument("COLOR needs a palette index"))?;
            ctx.machine.turtle.set_color_index(index);
        }
    }
    Ok(Directive::Continue)
}

/* ===================== Text Scanning ===================== */

/// Byte offset of `keyword` as a whole word outside quotes (case-insensitive)
pub(crate) fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' => quote = Some(c),
            None => {
                let starts_word = prev.map_or(true, |p| !is_word(p));
                let matches = text
                    .get(i..i + keyword.len())
                    .map_or(false, |s| s.eq_ignore_ascii_case(keyword));
                let ends_word = text[i..]
                    .get(keyword.len()..)
                    .and_then(|s| s.chars().next())
                    .map_or(true, |n| !is_word(n));
                if starts_word && matches && ends_word {
                    return Some(i);
                }
            }
        }
        prev = Some(c);
    }
    None
}

/// Split on separators that are outside quotes and parentheses
///
/// Each piece carries the separator that ended it (`None` for the last).
fn split_top_level<'t>(text: &'t str, separators: &[char]) -> Vec<(&'t str, Option<char>)> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth -= 1,
            c if !quoted && depth == 0 && separators.contains(&c) => {
                pieces.push((&text[start..i], Some(c)));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if start < text.len() || pieces.is_empty() {
        pieces.push((&text[start..], None));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_keyword_respects_words_and_quotes() {
        assert_eq!(find_keyword("X > 1 THEN PRINT 1", "THEN"), Some(6));
        assert_eq!(find_keyword("X > 1 then PRINT 1", "THEN"), Some(6));
        assert_eq!(find_keyword("ATHENA = 1", "THEN"), None);
        assert_eq!(find_keyword(r#"A$ = "THEN" THEN 10"#, "THEN"), Some(12));
        assert_eq!(find_keyword("I = 1 TO 10 STEP 2", "TO"), Some(6));
        assert_eq!(find_keyword("TOTAL = 1 TO 3", "TO"), Some(10));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level(r#""a;b"; X, MAX(1, 2)"#, &[';', ',']),
            vec![
                (r#""a;b""#, Some(';')),
                (" X", Some(',')),
                (" MAX(1, 2)", None),
            ]
        );
        assert_eq!(split_top_level("", &[';']), vec![("", None)]);
        assert_eq!(split_top_level("X;", &[';']), vec![("X", Some(';'))]);
    }
}

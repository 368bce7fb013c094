//! Logo commands
//!
//! A Logo line is a sequence of words. `[ ... ]` groups a block into a single
//! word and `;` separates commands. Each verb consumes as many argument words
//! as its arity; an argument keeps absorbing words while it ends in (or is
//! followed by) an operator, so `FD :size * 2` takes `:size * 2`.

use super::context::{execute_nested, quoted_literal, ExecContext};
use crate::interpreter::errors::{ControlFlowError, DispatchError, EvalError, ExecError};
use crate::interpreter::types::{Directive, Value};
use tracing::debug;

/// Variable holding the 1-based iteration of the innermost `REPEAT`
const REPCOUNT_VAR: &str = "REPCOUNT";

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Expr(String),
    Block(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Word {
    Atom(String),
    /// Contents of `[ ... ]` without the brackets
    Block(String),
    Break,
}

pub(crate) fn execute(ctx: &mut ExecContext<'_>, command: &str) -> Result<Directive, ExecError> {
    let words = split_words(command)?;
    run_words(ctx, &words, false)
}

/// Run the commands of a `[ ... ]` block body
pub(crate) fn run_block(ctx: &mut ExecContext<'_>, body: &str) -> Result<Directive, ExecError> {
    let words = split_words(body)?;
    run_words(ctx, &words, true)
}

/// Run a sequence of commands, stopping at the first non-`Continue` directive
///
/// When `charge_first` is false the first command has already been charged by
/// the caller (it is the top-level line itself).
fn run_words(
    ctx: &mut ExecContext<'_>,
    words: &[Word],
    charge_first: bool,
) -> Result<Directive, ExecError> {
    let mut pos = 0;
    let mut charge = charge_first;
    while pos < words.len() {
        let verb = match &words[pos] {
            Word::Break => {
                pos += 1;
                continue;
            }
            Word::Block(_) => return Err(ExecError::bad_argument("unexpected `[` block")),
            Word::Atom(verb) => verb.clone(),
        };
        if charge {
            ctx.charge()?;
        }
        charge = true;
        pos += 1;

        match command(ctx, &verb, words, &mut pos)? {
            Directive::Continue => {}
            other => return Ok(other),
        }
    }
    Ok(Directive::Continue)
}

fn command(
    ctx: &mut ExecContext<'_>,
    verb: &str,
    words: &[Word],
    pos: &mut usize,
) -> Result<Directive, ExecError> {
    let upper = verb.to_ascii_uppercase();

    match upper.as_str() {
        "FD" | "FORWARD" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.forward(n);
        }
        "BK" | "BACK" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.back(n);
        }
        "LT" | "LEFT" | "TURN" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.left(n);
        }
        "RT" | "RIGHT" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.right(n);
        }
        "SETX" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.set_x(n);
        }
        "SETY" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.set_y(n);
        }
        "SETH" | "SETHEADING" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.set_heading(n);
        }
        "SETXY" => {
            let x = number_arg(ctx, verb, words, pos)?;
            let y = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.set_position(x, y);
        }
        "SETPOS" => {
            let (x, y) = match words.get(*pos) {
                Some(Word::Block(inner)) => {
                    *pos += 1;
                    let inner = split_words(inner)?;
                    let mut at = 0;
                    let x = number_arg(ctx, verb, &inner, &mut at)?;
                    let y = number_arg(ctx, verb, &inner, &mut at)?;
                    (x, y)
                }
                _ => (number_arg(ctx, verb, words, pos)?, number_arg(ctx, verb, words, pos)?),
            };
            ctx.machine.turtle.set_position(x, y);
        }
        "PU" | "PENUP" => ctx.machine.turtle.pen_up(),
        "PD" | "PENDOWN" => ctx.machine.turtle.pen_down(),
        "HOME" => ctx.machine.turtle.home(),
        "CS" | "CLEARSCREEN" => ctx.machine.turtle.clear(),
        "CLEAN" => ctx.machine.turtle.clean(),
        "HT" | "HIDETURTLE" => ctx.machine.turtle.set_visible(false),
        "ST" | "SHOWTURTLE" => ctx.machine.turtle.set_visible(true),
        "PC" | "PENCOLOR" | "SETCOLOR" | "SETPENCOLOR" => pen_color(ctx, verb, words, pos)?,
        "PENSIZE" | "SETPENSIZE" | "PENWIDTH" => {
            let n = number_arg(ctx, verb, words, pos)?;
            ctx.machine.turtle.set_width(n);
        }
        "PR" | "PRINT" => {
            let text = match take_arg(verb, words, pos)? {
                Arg::Block(inner) => ctx.interpolate(&inner),
                Arg::Expr(word) => match literal_word(&word) {
                    Some(literal) => literal.to_string(),
                    None => resolve(ctx, &word)?.to_string(),
                },
            };
            ctx.print(text);
        }
        "MAKE" => make(ctx, verb, words, pos)?,
        "REPEAT" => return repeat(ctx, verb, words, pos),
        "IF" => return conditional(ctx, verb, words, pos),
        "STOP" => return Ok(Directive::Exit),
        "TO" => return Ok(skip_definition(ctx, words.get(*pos))),
        _ => return call_procedure(ctx, verb, words, pos),
    }
    Ok(Directive::Continue)
}

/* ===================== Arguments ===================== */

fn take_arg(verb: &str, words: &[Word], pos: &mut usize) -> Result<Arg, ExecError> {
    match words.get(*pos) {
        Some(Word::Block(inner)) => {
            *pos += 1;
            Ok(Arg::Block(inner.clone()))
        }
        Some(Word::Atom(_)) => Ok(Arg::Expr(take_expression(words, pos))),
        _ => Err(missing(verb)),
    }
}

fn take_expr(verb: &str, words: &[Word], pos: &mut usize) -> Result<String, ExecError> {
    match take_arg(verb, words, pos)? {
        Arg::Expr(expr) => Ok(expr),
        Arg::Block(_) => Err(ExecError::bad_argument(format!(
            "{} does not take a [ ... ] block",
            verb.to_ascii_uppercase()
        ))),
    }
}

/// Atom words forming one argument expression
fn take_expression(words: &[Word], pos: &mut usize) -> String {
    let mut expr = String::new();
    while let Some(Word::Atom(word)) = words.get(*pos) {
        let continues = expr.is_empty()
            || ends_with_operator(&expr)
            || starts_with_operator(word)
            || paren_balance(&expr) > 0;
        if !continues {
            break;
        }
        if !expr.is_empty() {
            expr.push(' ');
        }
        expr.push_str(word);
        *pos += 1;
    }
    expr
}

const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '^', '<', '>', '=', '%'];

fn ends_with_operator(expr: &str) -> bool {
    expr.ends_with(OPERATOR_CHARS)
}

fn starts_with_operator(word: &str) -> bool {
    // `-5` is a new argument, `- 5` continues the previous one
    match word.chars().next() {
        Some('-') => word.len() == 1,
        Some(c) => OPERATOR_CHARS.contains(&c) && c != '-',
        None => false,
    }
}

fn paren_balance(expr: &str) -> i32 {
    expr.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

fn into_fatal(err: ExecError) -> ExecError {
    match err {
        ExecError::Eval { source, .. } => ExecError::fatal(source),
        other => other,
    }
}

fn missing(verb: &str) -> ExecError {
    ExecError::bad_argument(format!("{} needs more inputs", verb.to_ascii_uppercase()))
}

fn number_arg(
    ctx: &mut ExecContext<'_>,
    verb: &str,
    words: &[Word],
    pos: &mut usize,
) -> Result<f64, ExecError> {
    let word = take_expr(verb, words, pos)?;
    let value = resolve(ctx, &word)?;
    value.to_f64().ok_or_else(|| {
        EvalError::mismatch(format!("{} needs a number, got `{}`", verb, value)).into()
    })
}

/// Evaluate an argument after expanding its `:name` references
fn resolve(ctx: &mut ExecContext<'_>, word: &str) -> Result<Value, ExecError> {
    let expr = expand_refs(ctx, word)?;
    Ok(ctx.eval(&expr)?)
}

/// Replace each `:name` with the variable's value
///
/// Numbers are inserted as-is and text is quoted so the result is still an
/// expression.
pub(crate) fn expand_refs(ctx: &ExecContext<'_>, text: &str) -> Result<String, ExecError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let starts_name = c == ':'
            && text[i + 1..]
                .chars()
                .next()
                .map_or(false, |n| n.is_alphabetic() || n == '_');
        if !starts_name {
            out.push(c);
            continue;
        }
        let name_len = identifier_len(&text[i + 1..]);
        let name = &text[i + 1..i + 1 + name_len];
        let value = ctx.machine.vars.get(name).ok_or_else(|| EvalError::UnknownSymbol {
            name: name.to_ascii_uppercase(),
        })?;
        match value {
            Value::Text(s) => out.push_str(&quote_text(s)?),
            other => out.push_str(&other.to_string()),
        }
        while chars.peek().map_or(false, |(j, _)| *j < i + 1 + name_len) {
            chars.next();
        }
    }
    Ok(out)
}

/// Text of a literal word: `"abc"`, `'abc'` or the bare Logo form `"abc`
fn literal_word(word: &str) -> Option<&str> {
    if let Some(text) = quoted_literal(word) {
        return Some(text);
    }
    word.strip_prefix('"').filter(|rest| !rest.contains('"'))
}

/// Quote text so it reads back as one string literal
fn quote_text(text: &str) -> Result<String, ExecError> {
    if !text.contains('"') {
        Ok(format!("\"{}\"", text))
    } else if !text.contains('\'') {
        Ok(format!("'{}'", text))
    } else {
        Err(ExecError::bad_argument(format!(
            "text `{}` contains both quote characters",
            text
        )))
    }
}

fn identifier_len(text: &str) -> usize {
    text.char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(text.len(), |(i, _)| i)
}

/* ===================== Commands ===================== */

/// A number picks from the palette; anything else is a color name
fn pen_color(
    ctx: &mut ExecContext<'_>,
    verb: &str,
    words: &[Word],
    pos: &mut usize,
) -> Result<(), ExecError> {
    let word = take_expr(verb, words, pos)?;
    let value = if word.starts_with(':') {
        resolve(ctx, &word)?
    } else if let Some(name) = literal_word(&word) {
        Value::Text(name.to_string())
    } else {
        Value::parse_number(&word).unwrap_or(Value::Text(word))
    };
    match value {
        Value::Text(name) => ctx.machine.turtle.set_color(name.to_ascii_lowercase()),
        number => {
            let index = number
                .to_i64()
                .ok_or_else(|| ExecError::bad_argument("palette index must be a whole number"))?;
            ctx.machine.turtle.set_color_index(index);
        }
    }
    Ok(())
}

/// `MAKE "name value`
fn make(
    ctx: &mut ExecContext<'_>,
    verb: &str,
    words: &[Word],
    pos: &mut usize,
) -> Result<(), ExecError> {
    let name = match words.get(*pos) {
        Some(Word::Atom(word)) => {
            *pos += 1;
            word.trim_start_matches(['"', ':']).to_string()
        }
        _ => return Err(missing(verb)),
    };
    if name.is_empty() {
        return Err(ExecError::bad_argument("MAKE needs a variable name"));
    }
    let value = match take_arg(verb, words, pos)? {
        Arg::Block(inner) => Value::Text(inner.trim().to_string()),
        Arg::Expr(word) => match literal_word(&word) {
            Some(literal) => Value::Text(literal.to_string()),
            None => resolve(ctx, &word)?,
        },
    };
    ctx.set_var(&name, value);
    Ok(())
}

/// `REPEAT n [commands]`; the count is fatal when it cannot be evaluated
fn repeat(
    ctx: &mut ExecContext<'_>,
    verb: &str,
    words: &[Word],
    pos: &mut usize,
) -> Result<Directive, ExecError> {
    let count_word = match words.get(*pos) {
        Some(Word::Atom(_)) => take_expression(words, pos),
        _ => return Err(missing(verb)),
    };
    let body = match words.get(*pos) {
        Some(Word::Block(inner)) => {
            *pos += 1;
            split_words(inner)?
        }
        _ => return Err(ExecError::bad_argument("REPEAT needs a [ ... ] block")),
    };
    let count_expr = expand_refs(ctx, &count_word).map_err(into_fatal)?;
    let count = ctx.required_number(&count_expr)?.max(0.0).trunc() as u64;
    // a pass over an empty body still costs one command
    let empty = body.iter().all(|word| *word == Word::Break);

    for iteration in 1..=count {
        if empty {
            ctx.charge()?;
        }
        ctx.set_var(REPCOUNT_VAR, Value::Integer(iteration as i64));
        match run_words(ctx, &body, true)? {
            Directive::Continue => {}
            other => return Ok(other),
        }
    }
    Ok(Directive::Continue)
}

/// `IF cond [commands]`
fn conditional(
    ctx: &mut ExecContext<'_>,
    verb: &str,
    words: &[Word],
    pos: &mut usize,
) -> Result<Directive, ExecError> {
    let condition = take_expr(verb, words, pos)?;
    let body = match words.get(*pos) {
        Some(Word::Block(inner)) => {
            *pos += 1;
            inner.clone()
        }
        _ => return Err(ExecError::bad_argument("IF needs a [ ... ] block")),
    };
    if resolve(ctx, &condition)?.is_truthy() {
        run_block(ctx, &body)
    } else {
        Ok(Directive::Continue)
    }
}

/// `TO` reached during execution: skip over the definition body
fn skip_definition(ctx: &ExecContext<'_>, name: Option<&Word>) -> Directive {
    let procedure = match name {
        Some(Word::Atom(name)) => ctx.program.procedure(name),
        _ => None,
    };
    match procedure {
        Some(procedure) => Directive::Jump(procedure.end + 1),
        None => Directive::Continue,
    }
}

/// Call a user procedure; its parameters are substituted into the body text
fn call_procedure(
    ctx: &mut ExecContext<'_>,
    verb: &str,
    words: &[Word],
    pos: &mut usize,
) -> Result<Directive, ExecError> {
    let program = ctx.program;
    let Some(procedure) = program.procedure(verb) else {
        return Err(DispatchError::UnknownCommand {
            command: verb.to_string(),
        }
        .into());
    };

    let mut args = Vec::with_capacity(procedure.params.len());
    for _ in &procedure.params {
        let word = take_expr(verb, words, pos)?;
        let value = match literal_word(&word) {
            Some(text) => Value::Text(text.to_string()),
            None => resolve(ctx, &word).map_err(into_fatal)?,
        };
        args.push(value);
    }

    let limit = ctx.config.max_call_depth;
    if ctx.call_depth + 1 > limit {
        return Err(ControlFlowError::RecursionLimit {
            name: procedure.name.clone(),
            limit,
        }
        .into());
    }
    debug!(procedure = %procedure.name, depth = ctx.call_depth + 1, "Calling procedure");

    let body = procedure
        .body
        .iter()
        .map(|line| substitute_params(line, &procedure.params, &args))
        .collect::<Result<Vec<_>, _>>()?;

    ctx.call_depth += 1;
    let result = run_body(ctx, &body);
    ctx.call_depth -= 1;
    result
}

fn run_body(ctx: &mut ExecContext<'_>, body: &[String]) -> Result<Directive, ExecError> {
    for line in body {
        if line.trim().eq_ignore_ascii_case("STOP") {
            ctx.charge()?;
            break;
        }
        match execute_nested(ctx, line)? {
            Directive::Continue => {}
            Directive::Exit => break,
            other => return Ok(other),
        }
    }
    Ok(Directive::Continue)
}

/// Replace `:PARAM` tokens (whole names, case-insensitive) with argument values
///
/// Text arguments are inserted quoted.
fn substitute_params(line: &str, params: &[String], args: &[Value]) -> Result<String, ExecError> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(colon) = rest.find(':') {
        out.push_str(&rest[..colon]);
        let after = &rest[colon + 1..];
        let len = identifier_len(after);
        let name = after[..len].to_ascii_uppercase();
        match params.iter().position(|p| *p == name) {
            Some(i) if len > 0 => match &args[i] {
                Value::Text(text) => out.push_str(&quote_text(text)?),
                other => out.push_str(&other.to_string()),
            },
            _ => {
                out.push(':');
                out.push_str(&after[..len]);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    Ok(out)
}

/* ===================== Word Splitting ===================== */

fn split_words(text: &str) -> Result<Vec<Word>, ExecError> {
    let mut words = Vec::new();
    let mut atom = String::new();
    let mut chars = text.char_indices();

    fn flush(atom: &mut String, words: &mut Vec<Word>) {
        if !atom.is_empty() {
            words.push(Word::Atom(std::mem::take(atom)));
        }
    }

    while let Some((i, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => flush(&mut atom, &mut words),
            ';' => {
                flush(&mut atom, &mut words);
                words.push(Word::Break);
            }
            '[' => {
                flush(&mut atom, &mut words);
                let inner = block_body(&text[i..])
                    .ok_or_else(|| ExecError::bad_argument("unbalanced `[`"))?;
                words.push(Word::Block(inner.to_string()));
                // skip past the closing bracket
                let consumed = inner.len() + 1;
                for _ in text[i + 1..i + 1 + consumed].chars() {
                    chars.next();
                }
            }
            ']' => return Err(ExecError::bad_argument("unbalanced `]`")),
            '"' | '\'' if atom.is_empty() => match quoted_span(&text[i..]) {
                Some(len) => {
                    words.push(Word::Atom(text[i..i + len].to_string()));
                    for _ in text[i + 1..i + len].chars() {
                        chars.next();
                    }
                }
                None => atom.push(c),
            },
            c => atom.push(c),
        }
    }
    flush(&mut atom, &mut words);
    Ok(words)
}

/// Length of a quoted word closed at a word boundary, such as `"two words"`
fn quoted_span(text: &str) -> Option<usize> {
    let quote = text.chars().next()?;
    let end = text[1..].find(quote)? + 1 + quote.len_utf8();
    let boundary = text[end..]
        .chars()
        .next()
        .map_or(true, |c| c.is_whitespace() || c == ';' || c == ']');
    boundary.then_some(end)
}

/// Contents of the bracket block that `text` starts with
pub(crate) fn block_body(text: &str) -> Option<&str> {
    let text = text.trim_start();
    if !text.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

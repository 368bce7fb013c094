//! Command classification
//!
//! Decides which language family a command belongs to, in priority order:
//! 1. a colon-prefixed PILOT code (`T:`, `JY:` ...)
//! 2. a BASIC keyword, or an implicit BASIC assignment (`X = 1`)
//! 3. a Logo verb
//!
//! Anything else is `Unknown`; the engine still tries it as a Logo procedure call.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Family {
    Pilot,
    Basic,
    Logo,
    Unknown,
}

/// PILOT codes with more than one letter
const PILOT_CONDITIONED: &[&str] = &["TY", "TN", "JY", "JN", "MT"];

pub const BASIC_KEYWORDS: &[&str] = &[
    "LET", "SET", "PRINT", "INPUT", "GOTO", "GOSUB", "RETURN", "IF", "FOR", "NEXT", "END", "STOP",
    "REM", "DATA", "READ", "RESTORE", "RANDOMIZE", "SWAP", "COLOR", "CLS",
];

pub const LOGO_VERBS: &[&str] = &[
    "FORWARD", "FD", "BACK", "BK", "LEFT", "LT", "RIGHT", "RT", "TURN", "PENUP", "PU", "PENDOWN",
    "PD", "HOME", "CLEARSCREEN", "CS", "CLEAN", "SETXY", "SETPOS", "SETX", "SETY", "SETHEADING",
    "SETH", "PENCOLOR", "PC", "SETCOLOR", "SETPENCOLOR", "PENSIZE", "SETPENSIZE", "PENWIDTH",
    "HIDETURTLE", "HT", "SHOWTURTLE", "ST", "PR", "MAKE", "REPEAT", "TO",
];

/// Classify a trimmed command
pub fn classify(command: &str) -> Family {
    if pilot_code(command).is_some() {
        return Family::Pilot;
    }
    let word = leading_word(command).to_ascii_uppercase();
    if BASIC_KEYWORDS.contains(&word.as_str()) || is_implicit_assignment(command) {
        return Family::Basic;
    }
    let verb = command
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    if LOGO_VERBS.contains(&verb.as_str()) {
        return Family::Logo;
    }
    Family::Unknown
}

/// Split a PILOT command into its upper-cased code and the text after the colon
pub fn pilot_code(command: &str) -> Option<(String, &str)> {
    let colon = command.find(':')?;
    let code = &command[..colon];
    let valid = match code.len() {
        1 => code.chars().all(|c| c.is_ascii_alphabetic()),
        2 => PILOT_CONDITIONED.iter().any(|c| c.eq_ignore_ascii_case(code)),
        _ => false,
    };
    valid.then(|| (code.to_ascii_uppercase(), &command[colon + 1..]))
}

/// Leading identifier (letters, digits, `_`, optional trailing `$`)
pub fn leading_word(command: &str) -> &str {
    let end = command
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(command.len(), |(i, _)| i);
    if command[end..].starts_with('$') {
        &command[..end + 1]
    } else {
        &command[..end]
    }
}

/// `NAME = expr` where NAME is a plain identifier
fn is_implicit_assignment(command: &str) -> bool {
    let word = leading_word(command);
    if word.is_empty() || !word.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        return false;
    }
    let rest = command[word.len()..].trim_start();
    rest.starts_with('=') && !rest.starts_with("==")
}

//! Loaded program representation

use super::values::Value;
use serde::Serialize;
use std::collections::HashMap;

/* ===================== Lines ===================== */

/// One executable program line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    /// 1-based line number in the source text
    pub source_line: usize,

    /// Leading BASIC line number, if the line carried one
    pub number: Option<u32>,

    /// Command text with the line number stripped and whitespace trimmed
    pub text: String,
}

/* ===================== Procedures ===================== */

/// A Logo procedure declared with `TO name :param ... END`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    /// Upper-cased procedure name
    pub name: String,

    /// Upper-cased parameter names, without the leading colon
    pub params: Vec<String>,

    /// Body lines between `TO` and `END`
    pub body: Vec<String>,

    /// Index of the `TO` line
    pub start: usize,

    /// Index of the closing `END` line (or the last line when END is missing)
    pub end: usize,
}

/* ===================== Program ===================== */

/// Immutable result of loading program text
///
/// Produced by [`crate::interpreter::loader::load`]; the engine only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub(crate) lines: Vec<Line>,
    pub(crate) labels: HashMap<String, usize>,
    pub(crate) line_numbers: HashMap<u32, usize>,
    pub(crate) procedures: HashMap<String, Procedure>,
    pub(crate) data: Vec<Value>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Index of the `L:` line declaring `name` (case-insensitive)
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(&name.trim().to_ascii_uppercase()).copied()
    }

    /// Declared labels and their line indices
    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(name, index)| (name.as_str(), *index))
    }

    /// Index of the line carrying BASIC line number `number`
    pub fn line_number(&self, number: u32) -> Option<usize> {
        self.line_numbers.get(&number).copied()
    }

    /// Resolve a jump target: a BASIC line number or a label name
    pub fn resolve_target(&self, target: &str) -> Option<usize> {
        let target = target.trim();
        match target.parse::<u32>() {
            Ok(number) => self.line_number(number),
            Err(_) => self.label(target),
        }
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(&name.trim().to_ascii_uppercase())
    }

    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    /// Values collected from every `DATA` statement, in program order
    pub fn data(&self) -> &[Value] {
        &self.data
    }
}

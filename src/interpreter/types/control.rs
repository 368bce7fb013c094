//! Control flow state shared by the three command families

use super::values::Value;
use serde::Serialize;

/* ===================== Directives ===================== */

/// What the engine does after a command completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Advance to the next line
    Continue,
    /// Transfer control to a line index
    Jump(usize),
    /// End the program successfully
    Halt,
    /// Leave the innermost procedure (Logo `STOP`); ends the program at top level
    Exit,
}

/* ===================== Loop Frames ===================== */

/// An active BASIC `FOR` loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForFrame {
    /// Upper-cased loop variable
    pub var: String,
    pub limit: Value,
    pub step: Value,
    /// Index of the first line of the loop body
    pub body_index: usize,
}

/* ===================== Match Sentinel ===================== */

/// Outcome of the most recent PILOT `Y:`/`N:` test
///
/// A result may be consumed once, and only by the command immediately after
/// the test. The engine calls [`MatchFlag::settle`] after every command, which
/// expires a result that was not picked up in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchFlag {
    last_result: bool,
    consumed: bool,
    pending: bool,
}

impl Default for MatchFlag {
    fn default() -> Self {
        MatchFlag {
            last_result: false,
            consumed: true,
            pending: false,
        }
    }
}

impl MatchFlag {
    /// Record a fresh test result
    pub fn arm(&mut self, result: bool) {
        self.last_result = result;
        self.consumed = false;
        self.pending = true;
    }

    /// Consume the result, if it is still available
    pub fn take(&mut self) -> Option<bool> {
        if self.consumed {
            return None;
        }
        self.consumed = true;
        Some(self.last_result)
    }

    /// Most recent result, without consuming it
    pub fn last_result(&self) -> bool {
        self.last_result
    }

    pub fn is_available(&self) -> bool {
        !self.consumed
    }

    /// Called once after every executed command
    pub fn settle(&mut self) {
        if self.pending {
            self.pending = false;
        } else {
            self.consumed = true;
        }
    }

    pub fn clear(&mut self) {
        *self = MatchFlag::default();
    }
}

/* ===================== Control Stacks ===================== */

/// Subroutine and loop bookkeeping for one program run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControlStacks {
    /// Return addresses pushed by `GOSUB` and `R:`
    pub returns: Vec<usize>,
    /// Active `FOR` loops, innermost last
    pub loops: Vec<ForFrame>,
    pub match_flag: MatchFlag,
}

impl ControlStacks {
    pub fn clear(&mut self) {
        self.returns.clear();
        self.loops.clear();
        self.match_flag.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_is_consumed_once() {
        let mut flag = MatchFlag::default();
        flag.arm(true);
        flag.settle(); // the Y: command itself
        assert_eq!(flag.take(), Some(true));
        assert_eq!(flag.take(), None);
    }

    #[test]
    fn test_result_expires_after_one_intervening_command() {
        let mut flag = MatchFlag::default();
        flag.arm(false);
        flag.settle(); // Y:
        flag.settle(); // unrelated command
        assert_eq!(flag.take(), None);
        assert!(!flag.last_result());
    }

    #[test]
    fn test_cleared_flag_has_nothing_to_consume() {
        let mut flag = MatchFlag::default();
        assert_eq!(flag.take(), None);
        flag.arm(true);
        flag.clear();
        assert!(!flag.is_available());
        assert_eq!(flag.take(), None);
    }
}

//! Error taxonomy
//!
//! Load errors reject a program before it runs. Everything else is raised while
//! a command executes and is classified as recoverable (reported, execution
//! continues on the next line) or fatal (reported, the program halts).

use thiserror::Error;

/* ===================== Load ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("duplicate label `{name}` on lines {first} and {second}")]
    DuplicateLabel {
        name: String,
        first: usize,
        second: usize,
    },
}

/* ===================== Dispatch ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown command `{command}`")]
    UnknownCommand { command: String },
}

/* ===================== Expressions ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown symbol `{name}`")]
    UnknownSymbol { name: String },

    #[error("expression too complex: {reason}")]
    ComplexityExceeded { reason: String },

    #[error("division by zero")]
    DivideByZero,

    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("syntax error: {message}")]
    Syntax { message: String },
}

impl EvalError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        EvalError::TypeMismatch {
            message: message.into(),
        }
    }
}

/* ===================== Control Flow ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlFlowError {
    #[error("undefined label `{label}`")]
    UndefinedLabel { label: String },

    #[error("{command} without matching {expected}")]
    StackUnderflow {
        command: &'static str,
        expected: &'static str,
    },

    #[error("procedure `{name}` exceeded the call depth limit of {limit}")]
    RecursionLimit { name: String, limit: usize },
}

/* ===================== Host Runtime ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("no runtime registered for subsystem `{0}`")]
    UnknownSubsystem(String),

    #[error("{subsystem} {verb}: {message}")]
    Failed {
        subsystem: String,
        verb: String,
        message: String,
    },
}

/* ===================== Execution ===================== */

/// Error raised by a single command
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Expression failure; `fatal` is set when it occurred inside a control
    /// command whose loop or jump cannot proceed without the value
    #[error("{source}")]
    Eval { source: EvalError, fatal: bool },

    #[error(transparent)]
    ControlFlow(#[from] ControlFlowError),

    #[error("program exceeded the limit of {limit} executed commands")]
    RunawayProgram { limit: u64 },

    #[error("no input available for `{var}`")]
    NoInput { var: String },

    #[error("READ past the end of DATA")]
    OutOfData,

    #[error("runtime command failed: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("{0}")]
    BadArgument(String),
}

impl From<EvalError> for ExecError {
    fn from(source: EvalError) -> Self {
        ExecError::Eval {
            source,
            fatal: false,
        }
    }
}

impl ExecError {
    /// Fatal errors stop the program
    pub fn is_fatal(&self) -> bool {
        match self {
            ExecError::Eval { fatal, .. } => *fatal,
            ExecError::ControlFlow(_) | ExecError::RunawayProgram { .. } => true,
            ExecError::Dispatch(_)
            | ExecError::NoInput { .. }
            | ExecError::OutOfData
            | ExecError::Runtime(_)
            | ExecError::BadArgument(_) => false,
        }
    }

    /// Promote an expression error raised inside a control command
    pub(crate) fn fatal(source: EvalError) -> Self {
        ExecError::Eval {
            source,
            fatal: true,
        }
    }

    pub(crate) fn bad_argument(message: impl Into<String>) -> Self {
        ExecError::BadArgument(message.into())
    }
}

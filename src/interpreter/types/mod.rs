//! Type definitions shared across the interpreter
//!
//! - Runtime values (Value)
//! - The loaded program (Program, Line, Procedure)
//! - Control flow state (Directive, ForFrame, MatchFlag, ControlStacks)

pub mod control;
pub mod program;
pub mod values;

pub use control::{ControlStacks, Directive, ForFrame, MatchFlag};
pub use program::{Line, Procedure, Program};
pub use values::Value;

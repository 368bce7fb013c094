//! Time Warp interpreter
//!
//! One engine runs PILOT, BASIC and Logo commands from the same program
//! text. Each line is classified by [`dispatch`] and executed against shared
//! state: variables, the turtle, and the subroutine/loop stacks.

pub mod debug;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod executor;
pub mod expressions;
pub mod host;
pub mod loader;
pub mod turtle;
pub mod types;
pub mod variables;

#[cfg(test)]
mod expression_tests;

pub use debug::{DebugHandle, SuspendMode};
pub use errors::{ControlFlowError, DispatchError, EvalError, ExecError, LoadError, RuntimeError};
pub use events::{Channel, Event, Output, SubscriptionId};
pub use executor::{Cursor, Engine, EngineSnapshot, RunOutcome};
pub use host::{InputProvider, QueuedInput, RuntimeChannel, RuntimeRequest};
pub use turtle::{Point, Segment, TurtleState};
pub use types::{Program, Value};

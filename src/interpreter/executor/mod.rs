//! # Executor
//!
//! Runs a loaded [`Program`](crate::interpreter::types::Program) line by line.
//!
//! ## Layout
//!
//! - `engine`: the [`Engine`] and its host-facing API
//! - `exec_loop`: the driver (pausing, ceilings, error reporting)
//! - `context`: per-command state and dispatch to a language family
//! - `pilot` / `basic` / `logo`: the command families
//!
//! Every top-level line produces a [`Directive`](crate::interpreter::types::Directive)
//! telling the loop where to go next.

mod basic;
mod context;
pub mod engine;
mod exec_loop;
mod logo;
mod pilot;

#[cfg(test)]
mod tests;

pub use engine::{Cursor, Engine, EngineSnapshot, Machine, RunOutcome};

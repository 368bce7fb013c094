pub mod cli;
pub mod config;
pub mod interpreter;

// Re-export main types
pub use config::EngineConfig;
pub use interpreter::{Engine, Event, RunOutcome, Value};

//! Engine configuration
//!
//! Layers, lowest priority first:
//! 1. built-in defaults
//! 2. a TOML file (explicit path, or `timewarp.toml` in the working directory if present)
//! 3. `TIMEWARP_*` environment variables, nested keys separated by `__`
//!    (e.g. `TIMEWARP_MAX_ITERATIONS=500`, `TIMEWARP_EVAL__MAX_DEPTH=16`)

use crate::interpreter::debug::SuspendMode;
use crate::interpreter::expressions::EvalLimits;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_FILE: &str = "timewarp";
const ENV_PREFIX: &str = "TIMEWARP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executed-command ceiling for one run
    pub max_iterations: u64,

    /// Maximum nesting of Logo procedure calls
    pub max_call_depth: usize,

    /// Expression complexity budget
    pub eval: EvalLimits,

    /// How the engine suspends at breakpoints
    pub suspend_mode: SuspendMode,

    /// Fixed seed for `RND`; entropy when absent
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_iterations: 10_000,
            max_call_depth: 64,
            eval: EvalLimits::default(),
            suspend_mode: SuspendMode::Block,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(environment())
            .build()
            .context("Failed to read engine configuration")?;
        settings
            .try_deserialize()
            .context("Invalid engine configuration")
    }

    /// Parse a TOML document layered over the defaults
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("Failed to parse engine configuration")?
            .try_deserialize()
            .context("Invalid engine configuration")
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

//! Engine state and host-facing API
//!
//! The engine owns everything needed to run (and pause/resume) a program:
//! - `program`: immutable result of loading the source
//! - `machine`: mutable interpreter state (variables, turtle, control stacks)
//! - `cursor`: where execution is and how many commands have run
//! - `bus` / `host` / `debug`: the outside world

use super::exec_loop;
use crate::config::EngineConfig;
use crate::interpreter::debug::{DebugHandle, SuspendMode};
use crate::interpreter::errors::{ExecError, LoadError};
use crate::interpreter::events::{Channel, Event, EventBus, SubscriptionId};
use crate::interpreter::expressions::Evaluator;
use crate::interpreter::host::{Host, InputProvider, RuntimeChannel};
use crate::interpreter::loader;
use crate::interpreter::turtle::{TurtleSnapshot, TurtleState};
use crate::interpreter::types::{ControlStacks, Program, Value};
use crate::interpreter::variables::VariableStore;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/* ===================== Machine State ===================== */

/// Interpreter state mutated by commands
#[derive(Debug)]
pub struct Machine {
    pub vars: VariableStore,
    pub evaluator: Evaluator,
    pub turtle: TurtleState,
    pub stacks: ControlStacks,
    /// Next `DATA` item for `READ`
    pub data_pointer: usize,
}

impl Machine {
    fn new(config: &EngineConfig) -> Self {
        Machine {
            vars: VariableStore::new(),
            evaluator: Evaluator::new(config.eval, config.rng_seed),
            turtle: TurtleState::new(),
            stacks: ControlStacks::default(),
            data_pointer: 0,
        }
    }
}

/// Execution position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Cursor {
    /// Index of the next line to execute
    pub index: usize,
    pub running: bool,
    /// Commands executed in the current run
    pub iteration_count: u64,
}

/// Why a run call returned
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Ran off the end or hit `END`; `errors` counts recoverable failures
    Completed { errors: usize },
    /// A fatal error ended the program
    Halted { error: ExecError },
    /// The host stopped the program
    Stopped,
    /// Suspended before the line at this index (`Yield` mode only)
    Paused(usize),
    /// Nothing to do
    Idle,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

/// Serializable view of the engine for hosts and `--dump-state`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub variables: BTreeMap<String, Value>,
    pub turtle: TurtleSnapshot,
    pub cursor: Cursor,
}

/* ===================== Engine ===================== */

#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) program: Program,
    pub(super) machine: Machine,
    pub(super) bus: EventBus,
    pub(super) host: Host,
    pub(super) debug: DebugHandle,
    pub(super) cursor: Cursor,
    /// Recoverable errors reported in the current run
    pub(super) errors: usize,
    /// Line whose pause has already been taken; it runs without pausing again
    pub(super) resume_at: Option<usize>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let machine = Machine::new(&config);
        Engine {
            config,
            program: Program::default(),
            machine,
            bus: EventBus::new(),
            host: Host::default(),
            debug: DebugHandle::new(),
            cursor: Cursor::default(),
            errors: 0,
            resume_at: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /* ----- loading ----- */

    /// Load program text, replacing the current program and resetting state
    pub fn load(&mut self, text: &str) -> Result<(), LoadError> {
        let program = loader::load(text)?;
        self.load_program(program);
        Ok(())
    }

    pub fn load_program(&mut self, program: Program) {
        info!(lines = program.len(), "Program loaded");
        self.program = program;
        self.reset();
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Clear variables, turtle, stacks and the cursor; the program is kept
    pub fn reset(&mut self) {
        self.machine.vars.clear();
        self.machine.turtle.reset();
        self.machine.stacks.clear();
        self.machine.data_pointer = 0;
        self.machine.evaluator.reseed(self.config.rng_seed);
        self.cursor = Cursor::default();
        self.errors = 0;
        self.resume_at = None;
        self.debug.reset_run();
        debug!("Engine reset");
    }

    /* ----- running ----- */

    /// Run from the first line until the program ends or pauses
    pub fn run(&mut self) -> RunOutcome {
        self.start();
        exec_loop::run_loop(self, self.config.suspend_mode)
    }

    /// Continue a program paused in `Yield` mode
    pub fn resume(&mut self) -> RunOutcome {
        if !self.cursor.running {
            return RunOutcome::Idle;
        }
        if let Some(index) = self.debug.is_paused() {
            self.debug.end_pause();
            self.resume_at = Some(index);
        }
        exec_loop::run_loop(self, SuspendMode::Yield)
    }

    /// Execute exactly one line and pause before the next
    ///
    /// Starts the program when it is not running.
    pub fn step(&mut self) -> RunOutcome {
        if !self.cursor.running {
            self.start();
        }
        let index = self.debug.is_paused().unwrap_or(self.cursor.index);
        self.debug.end_pause();
        self.resume_at = Some(index);
        self.debug.request_break_next();
        exec_loop::run_loop(self, SuspendMode::Yield)
    }

    /// Request a stop; a program paused in `Yield` mode finishes immediately
    pub fn stop(&mut self) -> RunOutcome {
        self.debug.stop();
        if self.cursor.running && self.debug.is_paused().is_some() {
            self.debug.take_stop();
            return exec_loop::finish_stopped(self);
        }
        RunOutcome::Idle
    }

    pub fn is_running(&self) -> bool {
        self.cursor.running
    }

    fn start(&mut self) {
        self.machine.stacks.clear();
        self.machine.data_pointer = 0;
        self.errors = 0;
        self.resume_at = None;
        self.debug.reset_run();
        self.cursor = Cursor {
            index: 0,
            running: true,
            iteration_count: 0,
        };
        info!(lines = self.program.len(), "Program started");
        self.bus.emit(Event::ProgramStarted);
    }

    /* ----- debugging ----- */

    /// Handle for controlling breakpoints and pauses, possibly from another thread
    pub fn debug_handle(&self) -> DebugHandle {
        self.debug.clone()
    }

    /// Returns whether a breakpoint is now set on `index`
    pub fn toggle_breakpoint(&self, index: usize) -> bool {
        self.debug.toggle_breakpoint(index)
    }

    pub fn set_step_mode(&self, on: bool) {
        self.debug.set_step_mode(on);
    }

    /// Index of the line the engine is paused before
    pub fn is_paused(&self) -> Option<usize> {
        self.debug.is_paused()
    }

    /* ----- host integration ----- */

    pub fn subscribe<F>(&mut self, channel: Channel, callback: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> anyhow::Result<()> + Send + 'static,
    {
        self.bus.subscribe(channel, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn set_input(&mut self, provider: Box<dyn InputProvider>) {
        self.host.set_input(provider);
    }

    /// Route `R: <name> ...` commands to `channel`
    pub fn register_runtime(&mut self, name: &str, channel: Box<dyn RuntimeChannel>) {
        self.host.register(name, channel);
    }

    /* ----- state ----- */

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.machine.vars.set(name, value, &mut self.bus);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.machine.vars.get(name)
    }

    pub fn variables(&self) -> &VariableStore {
        &self.machine.vars
    }

    pub fn turtle(&self) -> &TurtleState {
        &self.machine.turtle
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            variables: self.machine.vars.snapshot(),
            turtle: self.machine.turtle.snapshot(),
            cursor: self.cursor,
        }
    }
}

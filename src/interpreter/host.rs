//! Host integration points
//!
//! The engine never touches a terminal, a sound card or a file system
//! directly. Input comes from an [`InputProvider`]; PILOT `R:` runtime
//! commands are forwarded to a [`RuntimeChannel`] registered per subsystem.

use super::errors::RuntimeError;
use super::types::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Variable that receives the result of a runtime command
pub const RUNTIME_RESULT_VAR: &str = "RESULT";

/* ===================== Input ===================== */

/// Supplies answers to PILOT `A:` and BASIC `INPUT`
pub trait InputProvider: Send {
    /// Next line of input, or `None` when no more input is available
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Input provider backed by a fixed queue of lines
#[derive(Debug, Clone, Default)]
pub struct QueuedInput {
    lines: VecDeque<String>,
}

impl QueuedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueuedInput {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }
}

impl InputProvider for QueuedInput {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.lines.pop_front()
    }
}

/* ===================== Runtime Commands ===================== */

/// A PILOT `R: SUBSYSTEM VERB ARGS...` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRequest {
    /// Upper-cased subsystem name
    pub subsystem: String,
    /// Upper-cased verb
    pub verb: String,
    pub args: Vec<String>,
}

impl RuntimeRequest {
    /// Parse `SUBSYSTEM VERB ARGS...`; quoted arguments may contain spaces
    pub fn parse(text: &str) -> Option<RuntimeRequest> {
        let mut words = split_quoted(text).into_iter();
        let subsystem = words.next()?.to_ascii_uppercase();
        let verb = words.next().unwrap_or_default().to_ascii_uppercase();
        Some(RuntimeRequest {
            subsystem,
            verb,
            args: words.collect(),
        })
    }
}

fn split_quoted(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Handles runtime commands for one subsystem
pub trait RuntimeChannel: Send {
    fn call(&mut self, request: &RuntimeRequest) -> Result<Value, RuntimeError>;
}

impl<F> RuntimeChannel for F
where
    F: FnMut(&RuntimeRequest) -> Result<Value, RuntimeError> + Send,
{
    fn call(&mut self, request: &RuntimeRequest) -> Result<Value, RuntimeError> {
        self(request)
    }
}

/* ===================== Host ===================== */

/// Input provider plus registered runtime channels
#[derive(Default)]
pub struct Host {
    input: Option<Box<dyn InputProvider>>,
    runtimes: HashMap<String, Box<dyn RuntimeChannel>>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subsystems: Vec<&String> = self.runtimes.keys().collect();
        subsystems.sort();
        f.debug_struct("Host")
            .field("input", &self.input.is_some())
            .field("subsystems", &subsystems)
            .finish()
    }
}

impl Host {
    pub fn set_input(&mut self, provider: Box<dyn InputProvider>) {
        self.input = Some(provider);
    }

    pub fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.input.as_mut()?.read_line(prompt)
    }

    pub fn register(&mut self, subsystem: &str, channel: Box<dyn RuntimeChannel>) {
        self.runtimes.insert(subsystem.to_ascii_uppercase(), channel);
    }

    pub fn has_subsystem(&self, subsystem: &str) -> bool {
        self.runtimes.contains_key(&subsystem.to_ascii_uppercase())
    }

    pub fn call(&mut self, request: &RuntimeRequest) -> Result<Value, RuntimeError> {
        match self.runtimes.get_mut(&request.subsystem) {
            Some(channel) => channel.call(request),
            None => Err(RuntimeError::UnknownSubsystem(request.subsystem.clone())),
        }
    }
}

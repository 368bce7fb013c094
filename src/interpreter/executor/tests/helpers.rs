//! Test helpers for executor tests
//!
//! Common utilities for loading programs, recording events and running them

use crate::config::EngineConfig;
use crate::interpreter::events::{Channel, Event, Output};
use crate::interpreter::executor::{Engine, RunOutcome};
use crate::interpreter::host::QueuedInput;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared log of every event the engine publishes, in order
pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Engine, recorded events and outcome of a finished run
pub struct Run {
    pub engine: Engine,
    pub events: EventLog,
    pub outcome: RunOutcome,
}

impl Run {
    pub fn outputs(&self) -> Vec<String> {
        outputs(&self.events.lock())
    }

    pub fn line_errors(&self) -> Vec<(usize, String, bool)> {
        line_errors(&self.events.lock())
    }

    pub fn count(&self, channel: Channel) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.channel() == channel)
            .count()
    }
}

/// Deterministic configuration used by most tests
pub fn test_config() -> EngineConfig {
    EngineConfig {
        rng_seed: Some(42),
        ..EngineConfig::default()
    }
}

/// Load `source` into a fresh engine that records all events
///
/// Panics if the program does not load.
pub fn load_engine(source: &str, config: EngineConfig) -> (Engine, EventLog) {
    let mut engine = Engine::new(config);
    engine.load(source).expect("Program failed to load");
    let events = record_events(&mut engine);
    (engine, events)
}

/// Subscribe to every channel, appending events to one shared log
pub fn record_events(engine: &mut Engine) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    for channel in Channel::ALL {
        let log = Arc::clone(&log);
        engine.subscribe(channel, move |event| {
            log.lock().push(event.clone());
            Ok(())
        });
    }
    log
}

pub fn run_program(source: &str) -> Run {
    run_with(source, test_config(), &[])
}

pub fn run_with_input(source: &str, inputs: &[&str]) -> Run {
    run_with(source, test_config(), inputs)
}

pub fn run_with(source: &str, config: EngineConfig, inputs: &[&str]) -> Run {
    let (mut engine, events) = load_engine(source, config);
    if !inputs.is_empty() {
        engine.set_input(Box::new(QueuedInput::new(inputs.iter().copied())));
    }
    let outcome = engine.run();
    Run {
        engine,
        events,
        outcome,
    }
}

/// Printed text, in order
pub fn outputs(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Output(Output::Text { text }) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// `(index, message, fatal)` of every reported error
pub fn line_errors(events: &[Event]) -> Vec<(usize, String, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Output(Output::LineError {
                index,
                message,
                fatal,
                ..
            }) => Some((*index, message.clone(), *fatal)),
            _ => None,
        })
        .collect()
}

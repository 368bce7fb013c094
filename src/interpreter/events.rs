//! Event bus
//!
//! The engine publishes everything a host may want to observe on named
//! channels. Subscribers are plain callbacks; a failing or panicking
//! subscriber is logged and never interrupts the program.

use super::types::Value;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::fmt;
use tracing::warn;

/* ===================== Channels & Events ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Output,
    VariableChanged,
    LineExecuted,
    ProgramStarted,
    ProgramFinished,
    BreakpointHit,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Output,
        Channel::VariableChanged,
        Channel::LineExecuted,
        Channel::ProgramStarted,
        Channel::ProgramFinished,
        Channel::BreakpointHit,
    ];
}

/// Payload of the `Output` channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    /// Text printed by the program
    Text { text: String },
    /// A command failed
    LineError {
        index: usize,
        source_line: usize,
        message: String,
        fatal: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Output(Output),
    VariableChanged { name: String, value: Value },
    LineExecuted { index: usize },
    ProgramStarted,
    ProgramFinished { success: bool },
    BreakpointHit { index: usize },
}

impl Event {
    pub fn channel(&self) -> Channel {
        match self {
            Event::Output(_) => Channel::Output,
            Event::VariableChanged { .. } => Channel::VariableChanged,
            Event::LineExecuted { .. } => Channel::LineExecuted,
            Event::ProgramStarted => Channel::ProgramStarted,
            Event::ProgramFinished { .. } => Channel::ProgramFinished,
            Event::BreakpointHit { .. } => Channel::BreakpointHit,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Event::Output(Output::Text { text: text.into() })
    }
}

/* ===================== Bus ===================== */

pub type Callback = Box<dyn FnMut(&Event) -> anyhow::Result<()> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    channel: Channel,
    callback: Callback,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one channel
    ///
    /// Callbacks run synchronously on the thread driving the engine, in
    /// subscription order.
    pub fn subscribe<F>(&mut self, channel: Channel, callback: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> anyhow::Result<()> + Send + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber {
            id,
            channel,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription; returns false if the id was unknown
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.channel == channel)
            .count()
    }

    /// Deliver an event to every subscriber of its channel
    pub fn emit(&mut self, event: Event) {
        let channel = event.channel();
        for sub in self.subscribers.iter_mut().filter(|s| s.channel == channel) {
            let callback = &mut sub.callback;
            match panic::catch_unwind(AssertUnwindSafe(|| callback(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(?channel, subscription = sub.id.0, error = %e, "Event subscriber failed");
                }
                Err(_) => {
                    warn!(?channel, subscription = sub.id.0, "Event subscriber panicked");
                }
            }
        }
    }
}

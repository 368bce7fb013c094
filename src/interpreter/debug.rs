//! Debug controller
//!
//! Breakpoints, step mode and pause/resume signalling. A [`DebugHandle`] is
//! cheap to clone and may be moved to another thread; the engine consults it
//! before every command.
//!
//! Two suspension styles are supported:
//! - `Block`: the thread driving the engine parks until the handle resumes,
//!   steps or stops it
//! - `Yield`: the run call returns `RunOutcome::Paused` and the host calls
//!   `Engine::resume` / `Engine::step` later

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspendMode {
    #[default]
    Block,
    Yield,
}

/// Host request delivered to a paused engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Resume,
    Step,
    Stop,
}

/// Why the engine paused before a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    Breakpoint,
    Step,
}

#[derive(Debug, Default)]
struct DebugState {
    breakpoints: BTreeSet<usize>,
    step_mode: bool,
    /// Pause before the next command regardless of step mode
    break_next: bool,
    paused_at: Option<usize>,
    signal: Option<Signal>,
    stop_requested: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DebugHandle {
    shared: Arc<(Mutex<DebugState>, Condvar)>,
}

impl DebugHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /* ===================== Host API ===================== */

    /// Toggle a breakpoint; returns true when the breakpoint is now set
    pub fn toggle_breakpoint(&self, index: usize) -> bool {
        let mut state = self.shared.0.lock();
        if state.breakpoints.remove(&index) {
            false
        } else {
            state.breakpoints.insert(index);
            true
        }
    }

    pub fn breakpoints(&self) -> Vec<usize> {
        self.shared.0.lock().breakpoints.iter().copied().collect()
    }

    pub fn clear_breakpoints(&self) {
        self.shared.0.lock().breakpoints.clear();
    }

    pub fn set_step_mode(&self, on: bool) {
        self.shared.0.lock().step_mode = on;
    }

    pub fn step_mode(&self) -> bool {
        self.shared.0.lock().step_mode
    }

    /// Execute one command, then pause again
    ///
    /// While the engine runs freely this pauses it before its next command.
    pub fn step(&self) {
        let (lock, cvar) = &*self.shared;
        let mut state = lock.lock();
        if state.paused_at.is_some() {
            state.signal = Some(Signal::Step);
            cvar.notify_all();
        } else {
            state.break_next = true;
        }
    }

    /// Continue a paused engine
    pub fn resume(&self) {
        let (lock, cvar) = &*self.shared;
        let mut state = lock.lock();
        if state.paused_at.is_some() {
            state.signal = Some(Signal::Resume);
            cvar.notify_all();
        }
    }

    /// Halt the program before its next command
    pub fn stop(&self) {
        let (lock, cvar) = &*self.shared;
        let mut state = lock.lock();
        state.stop_requested = true;
        if state.paused_at.is_some() {
            state.signal = Some(Signal::Stop);
        }
        cvar.notify_all();
    }

    /// Line index the engine is paused at
    pub fn is_paused(&self) -> Option<usize> {
        self.shared.0.lock().paused_at
    }

    /* ===================== Engine Side ===================== */

    /// Whether to pause before executing `index`
    pub(crate) fn pause_reason(&self, index: usize) -> Option<PauseReason> {
        let mut state = self.shared.0.lock();
        if state.breakpoints.contains(&index) {
            state.break_next = false;
            Some(PauseReason::Breakpoint)
        } else if state.step_mode || state.break_next {
            state.break_next = false;
            Some(PauseReason::Step)
        } else {
            None
        }
    }

    pub(crate) fn begin_pause(&self, index: usize) {
        let mut state = self.shared.0.lock();
        state.paused_at = Some(index);
        state.signal = None;
    }

    /// Park until the host signals; used in `Block` mode
    pub(crate) fn wait_for_signal(&self) -> Signal {
        let (lock, cvar) = &*self.shared;
        let mut state = lock.lock();
        let signal = loop {
            if state.stop_requested {
                break Signal::Stop;
            }
            if let Some(signal) = state.signal.take() {
                break signal;
            }
            cvar.wait(&mut state);
        };
        state.paused_at = None;
        signal
    }

    pub(crate) fn end_pause(&self) {
        let mut state = self.shared.0.lock();
        state.paused_at = None;
        state.signal = None;
    }

    pub(crate) fn request_break_next(&self) {
        self.shared.0.lock().break_next = true;
    }

    /// Consume a pending stop request
    pub(crate) fn take_stop(&self) -> bool {
        std::mem::take(&mut self.shared.0.lock().stop_requested)
    }

    /// Forget run-scoped state; breakpoints and step mode persist
    pub(crate) fn reset_run(&self) {
        let mut state = self.shared.0.lock();
        state.break_next = false;
        state.paused_at = None;
        state.signal = None;
        state.stop_requested = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_breakpoint() {
        let handle = DebugHandle::new();
        assert!(handle.toggle_breakpoint(3));
        assert_eq!(handle.breakpoints(), vec![3]);
        assert!(!handle.toggle_breakpoint(3));
        assert!(handle.breakpoints().is_empty());
    }

    #[test]
    fn test_pause_reasons() {
        let handle = DebugHandle::new();
        assert_eq!(handle.pause_reason(0), None);
        handle.toggle_breakpoint(1);
        assert_eq!(handle.pause_reason(1), Some(PauseReason::Breakpoint));
        handle.step();
        assert_eq!(handle.pause_reason(2), Some(PauseReason::Step));
        assert_eq!(handle.pause_reason(3), None);
        handle.set_step_mode(true);
        assert_eq!(handle.pause_reason(4), Some(PauseReason::Step));
    }

    #[test]
    fn test_signals_are_ignored_unless_paused() {
        let handle = DebugHandle::new();
        handle.resume();
        handle.begin_pause(5);
        assert_eq!(handle.is_paused(), Some(5));
        handle.resume();
        assert_eq!(handle.wait_for_signal(), Signal::Resume);
        assert_eq!(handle.is_paused(), None);
    }

    #[test]
    fn test_stop_wakes_a_parked_engine() {
        let handle = DebugHandle::new();
        handle.begin_pause(0);
        let remote = handle.clone();
        let waiter = std::thread::spawn(move || remote.wait_for_signal());
        handle.stop();
        assert_eq!(waiter.join().unwrap(), Signal::Stop);
    }
}

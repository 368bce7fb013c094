//! Core execution loop
//!
//! `run_loop` drives the engine one top-level line at a time:
//! 1. honor stop requests and the iteration ceiling
//! 2. consult the debugger (breakpoints, stepping)
//! 3. execute the line and apply the resulting directive
//! 4. report errors and publish `LineExecuted`

use super::context::{self, ExecContext};
use super::engine::{Engine, RunOutcome};
use crate::interpreter::debug::{PauseReason, Signal, SuspendMode};
use crate::interpreter::errors::ExecError;
use crate::interpreter::events::{Event, Output};
use crate::interpreter::types::Directive;
use tracing::{debug, info, warn};

/* ===================== Driver ===================== */

/// Run until the program finishes, is stopped, or pauses in `Yield` mode
pub(crate) fn run_loop(engine: &mut Engine, mode: SuspendMode) -> RunOutcome {
    loop {
        if engine.debug.take_stop() {
            return finish_stopped(engine);
        }
        if !engine.cursor.running {
            return RunOutcome::Idle;
        }
        let index = engine.cursor.index;
        let limit = engine.config.max_iterations;
        if engine.cursor.iteration_count >= limit {
            let error = ExecError::RunawayProgram { limit };
            report(engine, index, &error);
            return finish_halted(engine, error);
        }
        if index >= engine.program.len() {
            return finish_completed(engine);
        }

        let resuming = engine.resume_at.take() == Some(index);
        if !resuming {
            if let Some(reason) = engine.debug.pause_reason(index) {
                engine.debug.begin_pause(index);
                if reason == PauseReason::Breakpoint {
                    info!(index, "Breakpoint hit");
                    engine.bus.emit(Event::BreakpointHit { index });
                }
                match mode {
                    SuspendMode::Yield => return RunOutcome::Paused(index),
                    SuspendMode::Block => match engine.debug.wait_for_signal() {
                        Signal::Stop => {
                            engine.debug.take_stop();
                            return finish_stopped(engine);
                        }
                        Signal::Step => {
                            engine.debug.request_break_next();
                            engine.resume_at = Some(index);
                            continue;
                        }
                        Signal::Resume => {
                            engine.resume_at = Some(index);
                            continue;
                        }
                    },
                }
            }
        }

        // counted before executing so nested commands see the exact total
        engine.cursor.iteration_count += 1;
        let result = execute_line(engine, index);

        match result {
            Ok(Directive::Continue) => engine.cursor.index = index + 1,
            Ok(Directive::Jump(target)) => engine.cursor.index = target,
            Ok(Directive::Halt) | Ok(Directive::Exit) => {
                engine.bus.emit(Event::LineExecuted { index });
                return finish_completed(engine);
            }
            Err(error) => {
                report(engine, index, &error);
                if error.is_fatal() {
                    return finish_halted(engine, error);
                }
                engine.errors += 1;
                engine.cursor.index = index + 1;
            }
        }
        engine.bus.emit(Event::LineExecuted { index });
    }
}

fn execute_line(engine: &mut Engine, index: usize) -> Result<Directive, ExecError> {
    let Engine {
        config,
        program,
        machine,
        bus,
        host,
        cursor,
        ..
    } = engine;
    let Some(line) = program.line(index) else {
        return Ok(Directive::Halt);
    };
    let mut ctx = ExecContext {
        program,
        machine,
        bus,
        host,
        config,
        iterations: &mut cursor.iteration_count,
        index,
        call_depth: 0,
    };
    let result = context::execute(&mut ctx, &line.text);
    ctx.machine.stacks.match_flag.settle();
    result
}

/* ===================== Reporting ===================== */

fn report(engine: &mut Engine, index: usize, error: &ExecError) {
    let source_line = engine
        .program
        .line(index)
        .map_or(index + 1, |line| line.source_line);
    let fatal = error.is_fatal();
    if fatal {
        warn!(index, source_line, %error, "Fatal error");
    } else {
        debug!(index, source_line, %error, "Command failed");
    }
    engine.bus.emit(Event::Output(Output::LineError {
        index,
        source_line,
        message: error.to_string(),
        fatal,
    }));
}

/* ===================== Completion ===================== */

fn finish_completed(engine: &mut Engine) -> RunOutcome {
    engine.cursor.running = false;
    info!(
        iterations = engine.cursor.iteration_count,
        errors = engine.errors,
        "Program finished"
    );
    engine.bus.emit(Event::ProgramFinished { success: true });
    RunOutcome::Completed {
        errors: engine.errors,
    }
}

fn finish_halted(engine: &mut Engine, error: ExecError) -> RunOutcome {
    engine.cursor.running = false;
    info!(%error, "Program halted");
    engine.bus.emit(Event::ProgramFinished { success: false });
    RunOutcome::Halted { error }
}

pub(crate) fn finish_stopped(engine: &mut Engine) -> RunOutcome {
    engine.cursor.running = false;
    engine.debug.end_pause();
    info!(index = engine.cursor.index, "Program stopped");
    engine.bus.emit(Event::ProgramFinished { success: false });
    RunOutcome::Stopped
}

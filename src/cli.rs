use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::{BTreeSet, VecDeque};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::EngineConfig;
use crate::interpreter::debug::SuspendMode;
use crate::interpreter::events::{Channel, Event, Output};
use crate::interpreter::executor::{Engine, RunOutcome};
use crate::interpreter::host::InputProvider;
use crate::interpreter::loader;

#[derive(Parser)]
#[command(name = "timewarp")]
#[command(about = "Time Warp - run PILOT, BASIC and Logo programs", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a program
    Run {
        /// Program file
        file: PathBuf,

        /// Pause before this line index (repeatable)
        #[arg(short = 'b', long = "breakpoint")]
        breakpoints: Vec<usize>,

        /// Input line for A: and INPUT, used before reading stdin (repeatable)
        #[arg(short = 'i', long = "input")]
        inputs: Vec<String>,

        /// Override the executed-command ceiling
        #[arg(long)]
        max_iterations: Option<u64>,

        /// Print variables and turtle state as JSON when the run ends
        #[arg(long)]
        dump_state: bool,
    },

    /// Load a program and report its structure without running it
    Check {
        /// Program file
        file: PathBuf,
    },
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load configuration up front so errors show before any program output
    let mut config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            file,
            breakpoints,
            inputs,
            max_iterations,
            dump_state,
        } => {
            if let Some(limit) = max_iterations {
                config.max_iterations = limit;
            }
            // Breakpoints are reported and passed over; nobody is there to resume
            config.suspend_mode = SuspendMode::Yield;

            let source = read_program(&file)?;
            let mut engine = Engine::new(config);
            engine
                .load(&source)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            engine.set_input(Box::new(ConsoleInput::new(inputs)));
            engine.subscribe(Channel::Output, print_output);
            for index in breakpoints.into_iter().collect::<BTreeSet<_>>() {
                engine.toggle_breakpoint(index);
            }

            let outcome = drive(&mut engine);

            if dump_state {
                let snapshot = serde_json::to_string_pretty(&engine.snapshot())
                    .context("Failed to serialize engine state")?;
                println!("{}", snapshot);
            }

            match outcome {
                RunOutcome::Completed { errors } if errors > 0 => {
                    eprintln!("Finished with {} failed command(s)", errors);
                }
                RunOutcome::Completed { .. } | RunOutcome::Idle => {}
                RunOutcome::Halted { error } => bail!("Program halted: {}", error),
                RunOutcome::Stopped => bail!("Program stopped"),
                RunOutcome::Paused(index) => bail!("Program left paused at line index {}", index),
            }
        }

        Commands::Check { file } => {
            let source = read_program(&file)?;
            let program = loader::load(&source)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            println!("✓ {}", file.display());
            println!("  Lines: {}", program.len());
            println!("  Labels: {}", program.labels().count());
            println!("  Procedures: {}", program.procedures().count());
            println!("  DATA items: {}", program.data().len());
        }
    }

    Ok(())
}

fn read_program(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Run to the end, noting and passing over every breakpoint
fn drive(engine: &mut Engine) -> RunOutcome {
    let mut outcome = engine.run();
    while let RunOutcome::Paused(index) = outcome {
        let source_line = engine
            .program()
            .line(index)
            .map_or(index + 1, |line| line.source_line);
        eprintln!("-- breakpoint at line {} (index {})", source_line, index);
        outcome = engine.resume();
    }
    outcome
}

fn print_output(event: &Event) -> Result<()> {
    match event {
        Event::Output(Output::Text { text }) => {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", text)?;
        }
        Event::Output(Output::LineError {
            source_line,
            message,
            fatal,
            ..
        }) => {
            let kind = if *fatal { "error" } else { "warning" };
            eprintln!("line {}: {}: {}", source_line, kind, message);
        }
        _ => {}
    }
    Ok(())
}

/// Scripted lines first, then stdin
struct ConsoleInput {
    scripted: VecDeque<String>,
}

impl ConsoleInput {
    fn new(lines: Vec<String>) -> Self {
        ConsoleInput {
            scripted: lines.into(),
        }
    }
}

impl InputProvider for ConsoleInput {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        if let Some(line) = self.scripted.pop_front() {
            return Some(line);
        }
        let mut out = io::stdout().lock();
        if write!(out, "{}", prompt).and_then(|_| out.flush()).is_err() {
            warn!("Failed to write input prompt");
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                warn!(error = %err, "Failed to read input");
                None
            }
        }
    }
}

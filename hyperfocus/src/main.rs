//! Hyperfocus focus agents CLI.
//!
//! Each command builds the service from `hyperfocus.toml` (or defaults) and
//! talks to the configured Mistral endpoint. `session` runs a live focus
//! session in the terminal: type `d` + Enter to log a distraction, `q` + Enter
//! or Ctrl-C to stop early.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, Timelike};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use hyperfocus::Hyperfocus;
use hyperfocus::concepts;
use hyperfocus::core::types::FocusMode;
use hyperfocus::io::config::{DEFAULT_CONFIG_PATH, HyperfocusConfig, load_config, write_config};
use hyperfocus::streamer::SessionMessage;

#[derive(Parser)]
#[command(
    name = "hyperfocus",
    version,
    about = "Focus agents for the Hyperfocus methodology"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default configuration file if missing.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Sort a task into one of the four quadrants.
    Categorize {
        task_title: String,
    },
    /// Suggest what kind of work fits your current energy.
    Energy {
        /// Current energy level, e.g. low, moderate, high.
        current_energy: String,
        /// Hour of day (0-23). Defaults to the local clock.
        #[arg(long)]
        hour: Option<u8>,
        /// What you have been doing recently.
        #[arg(long)]
        activities: Option<String>,
    },
    /// Ask the coach for advice.
    Coach {
        #[arg(short, long, default_value = "local")]
        user: String,
        context: String,
    },
    /// Ask the team; the question is routed to the right member(s).
    Ask {
        #[arg(short, long, default_value = "local")]
        user: String,
        question: String,
    },
    /// Run a focus session with guardian check-ins.
    Session {
        #[arg(short, long, default_value = "hyperfocus")]
        mode: FocusMode,
        /// Session length in minutes. Defaults to the configured length.
        #[arg(long)]
        minutes: Option<u32>,
        /// What you are working on.
        #[arg(long)]
        task: Option<String>,
    },
    /// Explain a methodology concept.
    Concept {
        name: String,
    },
}

#[tokio::main]
async fn main() {
    hyperfocus::logging::init();
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Concept { name } => {
            println!("{}", concepts::explain(&name));
            Ok(())
        }
        command => {
            let config = load_config(&cli.config)?;
            let app = Hyperfocus::from_config(&config)?;
            match command {
                Command::Categorize { task_title } => {
                    print_json(&app.categorizer().categorize(&task_title).await)
                }
                Command::Energy {
                    current_energy,
                    hour,
                    activities,
                } => {
                    let hour = resolve_hour(hour)?;
                    let advice = app
                        .energy_advisor()
                        .advise(&current_energy, hour, activities.as_deref())
                        .await;
                    print_json(&advice)
                }
                Command::Coach { user, context } => {
                    println!("{}", app.coach().coach(&user, &context).await);
                    Ok(())
                }
                Command::Ask { user, question } => {
                    println!("{}", app.team().route(&user, &question).await);
                    Ok(())
                }
                Command::Session {
                    mode,
                    minutes,
                    task,
                } => {
                    let minutes = minutes.unwrap_or(app.default_target_minutes());
                    cmd_session(&app, mode, minutes, task).await
                }
                Command::Init { .. } | Command::Concept { .. } => unreachable!("handled above"),
            }
        }
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    write_config(path, &HyperfocusConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn resolve_hour(hour: Option<u8>) -> Result<u8> {
    match hour {
        Some(hour) if hour > 23 => bail!("hour must be within 0-23, got {hour}"),
        Some(hour) => Ok(hour),
        None => Ok(Local::now().hour() as u8),
    }
}

async fn cmd_session<G>(
    app: &Hyperfocus<G>,
    mode: FocusMode,
    minutes: u32,
    task: Option<String>,
) -> Result<()>
where
    G: hyperfocus::io::generator::Generator + 'static,
{
    let session = app
        .streamer()
        .start(mode, minutes, task)
        .context("start session")?;
    let control = session.control().clone();
    let mut messages = Box::pin(session.into_stream());
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            message = messages.next() => match message {
                Some(message) => print_message(&message),
                None => break,
            },
            line = input.next_line(), if input_open => match line.context("read stdin")? {
                Some(line) => match line.trim() {
                    "d" => {
                        if let Err(err) = control.log_distraction().await {
                            eprintln!("{err}");
                        }
                    }
                    "q" => {
                        if let Err(err) = control.stop().await {
                            eprintln!("{err}");
                        }
                    }
                    "" => {}
                    other => eprintln!("unknown input {other:?}: d = distraction, q = stop"),
                },
                None => input_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                if control.stop().await.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn print_message(message: &SessionMessage) {
    let checkpoint = &message.checkpoint;
    println!(
        "[{} {:>3}m elapsed, {:>3}m left] {}",
        message.at.with_timezone(&Local).format("%H:%M"),
        checkpoint.minutes_elapsed,
        checkpoint.minutes_remaining,
        message.message
    );
}

/// Print `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}

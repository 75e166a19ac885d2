// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Numinix command-line client
//!
//! Drives the session manager and quiz generator from a terminal. Results
//! are printed as JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use numinix::{
    config::Config,
    models::{ProfileDefaults, UserProfile},
    AppState,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "numinix", version, about = "Numinix student client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        class_level: Option<u32>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign in with e-mail and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    SignOut,
    /// Show the current identity and profile
    Whoami,
    /// Record the result of a quiz round
    Record {
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
        correct: i64,
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
        wrong: i64,
    },
    /// Ask the math tutor a question
    Solve { question: String },
    /// Generate a quiz for the given chapter ids
    Quiz {
        #[arg(required = true)]
        chapters: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let state = AppState::from_config(config)?;

    state.session.start().await;
    let result = run(&state, cli.command).await;
    state.session.shutdown().await;

    result
}

async fn run(state: &AppState, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let session = &state.session;

    match command {
        Command::SignUp {
            email,
            password,
            name,
            class_level,
            phone,
        } => {
            let defaults = ProfileDefaults {
                name,
                class_level,
                phone,
            };
            session.sign_up(&email, &password, defaults).await?;
            print_json(&session.profile().await)?;
        }
        Command::SignIn { email, password } => {
            session.sign_in(&email, &password).await?;
            print_json(&session.profile().await)?;
        }
        Command::SignOut => {
            session.sign_out().await;
        }
        Command::Whoami => {
            let snapshot = session.state().await;
            print_json(&serde_json::json!({
                "identity": snapshot.identity,
                "profile": snapshot.profile,
            }))?;
        }
        Command::Record { correct, wrong } => {
            session.update_user_stats(correct, wrong, 0).await?;
            // Let the reconcile read land before printing.
            tokio::time::sleep(state.config.reconcile_delay * 2).await;
            print_json(&session.profile().await)?;
        }
        Command::Solve { question } => {
            print_json(&state.ai.solve_math_problem(&question).await)?;
        }
        Command::Quiz { chapters } => {
            let profile = require_profile(session.profile().await)?;
            print_json(&state.ai.generate_questions(&profile, &chapters).await)?;
        }
    }
    Ok(())
}

fn require_profile(profile: Option<UserProfile>) -> Result<UserProfile, numinix::error::AppError> {
    profile.ok_or(numinix::error::AppError::NotAuthenticated)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("numinix=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}

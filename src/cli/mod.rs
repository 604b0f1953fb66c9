//! Operator CLI.
//!
//! Drives the session services from a terminal:
//! - `status` initializes the session and prints the route
//! - `login` / `logout` run the sign-in and sign-out transitions
//! - `get` sends an authenticated request through the pipeline
//!
//! # Usage
//!
//! ```ignore
//! use learnpath_session::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args());
//! run_cli_command(command, &services).await?;
//! ```

pub mod args;

pub use args::{parse_args, CliCommand, USAGE};

use color_eyre::eyre::{eyre, Report, WrapErr};
use color_eyre::Result;
use tracing::debug;

use crate::error::{ApiError, SessionError};
use crate::pipeline::ApiRequest;
use crate::session::{LoginCredentials, SessionState};
use crate::startup::SessionServices;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn describe(state: &SessionState) -> String {
    match state {
        SessionState::Authenticated { role, route } => {
            format!("Signed in as {} -> {}", role, route)
        }
        other => format!("Not signed in ({})", other.name()),
    }
}

/// Attach `context` and the category's recovery hint to an API error.
fn api_failure(error: ApiError, context: String) -> Report {
    let category = error.category();
    debug!(%category, retryable = category.is_retryable(), "{}", context);
    Report::new(error).wrap_err(format!("{}. {}", context, category.recovery_hint()))
}

fn store_warning(error: &SessionError) -> String {
    format!(
        "{} {} ({})",
        error.user_message(),
        error.category().recovery_hint(),
        error
    )
}

/// Execute a session command against `services`.
///
/// `Version` and `Help` are handled by the caller before any service is
/// built. `Invalid` becomes an error carrying the usage text.
pub async fn run_cli_command(command: CliCommand, services: &SessionServices) -> Result<()> {
    let orchestrator = &services.orchestrator;
    match command {
        CliCommand::Status => {
            let state = orchestrator.initialize().await;
            println!("{}", describe(&state));
            if let Some(snapshot) = orchestrator.snapshot() {
                if !snapshot.email.is_empty() {
                    println!("Email: {}", snapshot.email);
                }
                println!(
                    "Goal set: {}, placement test done: {}",
                    snapshot.is_goal_set, snapshot.is_placement_test_done
                );
            }
        }
        CliCommand::Login { email } => {
            let password = rpassword::prompt_password("Password: ")
                .wrap_err("Failed to read password")?;
            let login = services
                .auth_api
                .login(&email, &password)
                .await
                .map_err(|e| api_failure(e, "Login failed".to_string()))?;
            let transition = orchestrator
                .complete_login(&login, &LoginCredentials::new(email))
                .await
                .wrap_err("Login could not be applied")?;
            if !login.message.is_empty() {
                println!("{}", login.message);
            }
            println!("{}", describe(&transition.state));
            if let Some(e) = transition.store_error {
                eprintln!("Warning: {}", store_warning(&e));
            }
        }
        CliCommand::Logout => {
            let transition = orchestrator.logout().await;
            match transition.store_error {
                Some(e) => eprintln!("Signed out, but some credentials remain. {}", store_warning(&e)),
                None => println!("Signed out"),
            }
        }
        CliCommand::Get { path } => {
            orchestrator.initialize().await;
            let response = services
                .client
                .send(&ApiRequest::get(path.clone()))
                .await
                .map_err(|e| api_failure(e, format!("GET {} failed", path)))?;
            println!("HTTP {}", response.status);
            println!("{}", response.text());
        }
        CliCommand::Version | CliCommand::Help => {}
        CliCommand::Invalid(reason) => return Err(eyre!("{}\n\n{}", reason, USAGE)),
    }
    Ok(())
}

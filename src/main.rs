use learnpath_session::cli::{parse_args, run_cli_command, CliCommand, USAGE, VERSION};
use learnpath_session::config::SessionConfig;
use learnpath_session::startup::SessionServices;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

/// Log to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("learnpath_session=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Handle flags that need no services before any initialization
    let command = parse_args(std::env::args());
    match &command {
        CliCommand::Version => {
            println!("learnpath-session {}", VERSION);
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        _ => {}
    }

    color_eyre::install()?;
    init_tracing();

    let runtime = tokio::runtime::Runtime::new().wrap_err("Failed to start async runtime")?;
    runtime.block_on(async {
        let config = SessionConfig::from_env();
        tracing::debug!(api = %config.api_base_url, "Loaded configuration");
        let services =
            SessionServices::from_config(config).wrap_err("Failed to build session services")?;
        run_cli_command(command, &services).await
    })
}

//! Command-line argument parsing.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Initialize the session and print the resulting state (default)
    Status,
    /// Sign in with email and password
    Login { email: String },
    /// Sign out and wipe stored credentials
    Logout,
    /// Authenticated GET through the request pipeline
    Get { path: String },
    /// Print usage
    Help,
    /// Arguments that could not be understood
    Invalid(String),
}

/// Usage text printed by `--help` and after invalid arguments.
pub const USAGE: &str = "\
Usage: learnpath-session [COMMAND]

Commands:
  status          Show the current session state (default)
  login <email>   Sign in; the password is read from the terminal
  logout          Sign out and delete stored credentials
  get <path>      Send an authenticated GET request and print the body

Options:
  -V, --version   Print version
  -h, --help      Print this help";

/// Parse command-line arguments and return the appropriate command.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use learnpath_session::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["learnpath-session".to_string(), "logout".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Logout);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1);
    let Some(command) = args.next() else {
        return CliCommand::Status;
    };

    match command.as_str() {
        "--version" | "-V" => CliCommand::Version,
        "--help" | "-h" | "help" => CliCommand::Help,
        "status" => CliCommand::Status,
        "logout" => CliCommand::Logout,
        "login" => match args.next() {
            Some(email) if email.contains('@') => CliCommand::Login { email },
            Some(other) => CliCommand::Invalid(format!("'{}' is not an email address", other)),
            None => CliCommand::Invalid("login requires an email address".to_string()),
        },
        "get" => match args.next() {
            Some(path) => CliCommand::Get { path },
            None => CliCommand::Invalid("get requires a path".to_string()),
        },
        other => CliCommand::Invalid(format!("unknown command '{}'", other)),
    }
}

pub mod auth;

use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_PLATFORM: &str = "platform";
pub const ARG_FILEPATH_ROOT: &str = "filepath-root";
pub const ARG_VERBOSITY: &str = "verbosity";

/// `CHIRPY_LOG_LEVEL` names, indexed by the matching `-v` count.
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accept a level name or its `-v` count.
fn parse_log_level(level: &str) -> Result<u8, String> {
    let level = level.trim().to_ascii_lowercase();
    if let Ok(count) = level.parse::<u8>() {
        if usize::from(count) < LOG_LEVELS.len() {
            return Ok(count);
        }
        return Err(format!("log level count must be below {}", LOG_LEVELS.len()));
    }
    LOG_LEVELS
        .iter()
        .position(|name| *name == level)
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("unknown log level `{level}`"))
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("chirpy")
        .about("Short-post social API")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("CHIRPY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .long_help(
                    "Postgres connection string. Without it the server keeps everything in memory and loses it on exit.",
                )
                .env("CHIRPY_DSN"),
        )
        .arg(
            Arg::new(ARG_PLATFORM)
                .long(ARG_PLATFORM)
                .help("Deployment platform; `dev` enables /admin/reset")
                .env("CHIRPY_PLATFORM")
                .default_value("prod"),
        )
        .arg(
            Arg::new(ARG_FILEPATH_ROOT)
                .long(ARG_FILEPATH_ROOT)
                .help("Directory served under /app")
                .env("CHIRPY_FILEPATH_ROOT")
                .default_value("."),
        )
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Log level: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
                .env("CHIRPY_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(parse_log_level),
        );

    auth::with_args(command)
}

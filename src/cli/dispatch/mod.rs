//! Map parsed CLI arguments to an [`Action`].

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_FILEPATH_ROOT, ARG_PLATFORM, ARG_PORT, auth};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>(ARG_DSN).cloned();
    let platform = matches
        .get_one::<String>(ARG_PLATFORM)
        .cloned()
        .context("missing required argument: --platform")?;
    let filepath_root = matches
        .get_one::<String>(ARG_FILEPATH_ROOT)
        .map(PathBuf::from)
        .context("missing required argument: --filepath-root")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        platform,
        filepath_root,
        jwt_secret: auth_opts.jwt_secret,
        jwt_issuer: auth_opts.jwt_issuer,
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        refresh_token_ttl_seconds: auth_opts.refresh_token_ttl_seconds,
        work_factor: auth_opts.work_factor,
    }))
}

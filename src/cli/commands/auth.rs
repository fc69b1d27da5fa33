use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, builder::NonEmptyStringValueParser};
use secrecy::SecretString;

use crate::api::handlers::auth::WorkFactor;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_JWT_ISSUER: &str = "jwt-issuer";
pub const ARG_ACCESS_TOKEN_TTL_SECONDS: &str = "access-token-ttl-seconds";
pub const ARG_REFRESH_TOKEN_TTL_SECONDS: &str = "refresh-token-ttl-seconds";
pub const ARG_ARGON2_MEMORY_KIB: &str = "argon2-memory-kib";
pub const ARG_ARGON2_ITERATIONS: &str = "argon2-iterations";
pub const ARG_ARGON2_PARALLELISM: &str = "argon2-parallelism";

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_password_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HMAC key used to sign access tokens")
                .env("CHIRPY_JWT_SECRET")
                .hide_env_values(true)
                .required(true)
                .value_parser(NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new(ARG_JWT_ISSUER)
                .long(ARG_JWT_ISSUER)
                .help("Issuer written to and required in access tokens")
                .env("CHIRPY_JWT_ISSUER")
                .default_value("chirpy"),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .long(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .help("Access token TTL in seconds")
                .env("CHIRPY_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .long(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .help("Refresh token TTL in seconds")
                .env("CHIRPY_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("5184000")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_password_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ARGON2_MEMORY_KIB)
                .long(ARG_ARGON2_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("CHIRPY_ARGON2_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_ITERATIONS)
                .long(ARG_ARGON2_ITERATIONS)
                .help("Argon2id iterations")
                .env("CHIRPY_ARGON2_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_PARALLELISM)
                .long(ARG_ARGON2_PARALLELISM)
                .help("Argon2id lanes")
                .env("CHIRPY_ARGON2_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}

/// Auth settings pulled out of the parsed arguments.
#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub jwt_issuer: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub work_factor: WorkFactor,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .context("missing required argument: --jwt-secret")?;
        let jwt_issuer = matches
            .get_one::<String>(ARG_JWT_ISSUER)
            .cloned()
            .context("missing required argument: --jwt-issuer")?;
        let access_token_ttl_seconds = matches
            .get_one::<i64>(ARG_ACCESS_TOKEN_TTL_SECONDS)
            .copied()
            .context("missing required argument: --access-token-ttl-seconds")?;
        let refresh_token_ttl_seconds = matches
            .get_one::<i64>(ARG_REFRESH_TOKEN_TTL_SECONDS)
            .copied()
            .context("missing required argument: --refresh-token-ttl-seconds")?;

        let defaults = WorkFactor::default();
        let work_factor = WorkFactor {
            memory_kib: matches
                .get_one::<u32>(ARG_ARGON2_MEMORY_KIB)
                .copied()
                .unwrap_or(defaults.memory_kib),
            iterations: matches
                .get_one::<u32>(ARG_ARGON2_ITERATIONS)
                .copied()
                .unwrap_or(defaults.iterations),
            parallelism: matches
                .get_one::<u32>(ARG_ARGON2_PARALLELISM)
                .copied()
                .unwrap_or(defaults.parallelism),
        };

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            jwt_issuer,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            work_factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn command() -> Command {
        with_args(Command::new("chirpy"))
    }

    #[test]
    fn defaults() -> Result<()> {
        temp_env::with_vars(
            [
                ("CHIRPY_JWT_SECRET", None::<&str>),
                ("CHIRPY_JWT_ISSUER", None),
                ("CHIRPY_ACCESS_TOKEN_TTL_SECONDS", None),
                ("CHIRPY_REFRESH_TOKEN_TTL_SECONDS", None),
                ("CHIRPY_ARGON2_MEMORY_KIB", None),
            ],
            || {
                let matches =
                    command().try_get_matches_from(["chirpy", "--jwt-secret", "s3cr3t"])?;
                let options = Options::parse(&matches)?;
                assert_eq!(options.jwt_secret.expose_secret(), "s3cr3t");
                assert_eq!(options.jwt_issuer, "chirpy");
                assert_eq!(options.access_token_ttl_seconds, 3600);
                assert_eq!(options.refresh_token_ttl_seconds, 5_184_000);
                assert_eq!(options.work_factor.memory_kib, 19456);
                assert_eq!(options.work_factor.iterations, 2);
                assert_eq!(options.work_factor.parallelism, 1);
                Ok(())
            },
        )
    }

    #[test]
    fn secret_is_required() {
        temp_env::with_vars([("CHIRPY_JWT_SECRET", None::<&str>)], || {
            let result = command().try_get_matches_from(["chirpy"]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }

    #[test]
    fn empty_secret_rejected() {
        temp_env::with_vars([("CHIRPY_JWT_SECRET", None::<&str>)], || {
            let result = command().try_get_matches_from(["chirpy", "--jwt-secret", ""]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn env_overrides() -> Result<()> {
        temp_env::with_vars(
            [
                ("CHIRPY_JWT_SECRET", Some("from-env")),
                ("CHIRPY_JWT_ISSUER", Some("chirpy-test")),
                ("CHIRPY_ACCESS_TOKEN_TTL_SECONDS", Some("60")),
                ("CHIRPY_REFRESH_TOKEN_TTL_SECONDS", Some("120")),
                ("CHIRPY_ARGON2_MEMORY_KIB", Some("8")),
            ],
            || {
                let matches = command().try_get_matches_from(["chirpy"])?;
                let options = Options::parse(&matches)?;
                assert_eq!(options.jwt_secret.expose_secret(), "from-env");
                assert_eq!(options.jwt_issuer, "chirpy-test");
                assert_eq!(options.access_token_ttl_seconds, 60);
                assert_eq!(options.refresh_token_ttl_seconds, 120);
                assert_eq!(options.work_factor.memory_kib, 8);
                Ok(())
            },
        )
    }
}

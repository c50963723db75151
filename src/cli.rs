//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::{MAX_ACCESS_TTL_MINUTES, MAX_REFRESH_TTL_DAYS, MIN_SECRET_LEN, TokenSettings};
use crate::rate_limit::{DEFAULT_LOGIN_BURST, LoginRateLimit};
use clap::Parser;
use tracing::{error, info};

const ACCESS_SECRET_ENV: &str = "JWT_ACCESS_SECRET";
const REFRESH_SECRET_ENV: &str = "JWT_REFRESH_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tbs", about = "Back-office API for a construction business")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tbs.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer the JWT_ACCESS_SECRET env var
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer the JWT_REFRESH_SECRET env var
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Access token lifetime in minutes (at most one day)
    #[arg(long, env = "ACCESS_TTL_MIN", default_value = "15",
        value_parser = clap::value_parser!(u64).range(1..=MAX_ACCESS_TTL_MINUTES))]
    pub access_ttl_min: u64,

    /// Refresh token lifetime in days (at most one year)
    #[arg(long, env = "REFRESH_TTL_DAYS", default_value = "7",
        value_parser = clap::value_parser!(u64).range(1..=MAX_REFRESH_TTL_DAYS))]
    pub refresh_ttl_days: u64,

    /// Omit the Secure flag on the refresh cookie (plain-HTTP local development only)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// Take the client IP from X-Forwarded-For (only behind a trusted reverse proxy)
    #[arg(long)]
    pub trust_proxy: bool,

    /// Do not create the default accounts in an empty database
    #[arg(long)]
    pub no_seed: bool,

    /// Login attempts allowed per client IP per minute
    #[arg(long, default_value_t = DEFAULT_LOGIN_BURST)]
    pub login_burst: u32,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Read one secret from its environment variable, falling back to a file.
/// The environment variable is cleared after reading.
fn load_secret(env_name: &str, file: Option<&str>, flag: &str) -> Option<Vec<u8>> {
    let secret = if let Ok(secret) = std::env::var(env_name) {
        // SAFETY: Called during startup before the runtime spawns any task
        // that reads the environment.
        unsafe { std::env::remove_var(env_name) };
        secret
    } else if let Some(path) = file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the environment variable (recommended) or use {}",
            env_name, flag
        );
        return None;
    };

    if secret.len() < MIN_SECRET_LEN {
        error!(
            "{} is shorter than {} bytes. Use a longer secret",
            env_name, MIN_SECRET_LEN
        );
        return None;
    }

    Some(secret.into_bytes())
}

/// Load and validate both signing secrets and the token lifetimes.
/// Returns None and logs an error if anything is missing or unsafe.
pub fn load_token_settings(args: &Args) -> Option<TokenSettings> {
    let access = load_secret(
        ACCESS_SECRET_ENV,
        args.access_secret_file.as_deref(),
        "--access-secret-file",
    );
    let refresh = load_secret(
        REFRESH_SECRET_ENV,
        args.refresh_secret_file.as_deref(),
        "--refresh-secret-file",
    );
    let (access_secret, refresh_secret) = (access?, refresh?);

    let settings = TokenSettings {
        access_secret,
        refresh_secret,
        access_ttl_minutes: args.access_ttl_min,
        refresh_ttl_days: args.refresh_ttl_days,
    };

    if let Err(reason) = settings.validate() {
        error!("{}", reason);
        return None;
    }

    Some(settings)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, tokens: TokenSettings) -> ServerConfig {
    ServerConfig {
        db,
        tokens,
        secure_cookies: !args.insecure_cookies,
        login_limit: LoginRateLimit::new(args.login_burst, args.trust_proxy),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tbs"]).unwrap();
        assert_eq!(args.database, "tbs.db");
        assert_eq!(args.login_burst, DEFAULT_LOGIN_BURST);
        assert!(!args.insecure_cookies);
        assert!(!args.no_seed);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(Args::try_parse_from(["tbs", "--access-ttl-min", "0"]).is_err());
        assert!(Args::try_parse_from(["tbs", "--refresh-ttl-days", "0"]).is_err());
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        assert!(Args::try_parse_from(["tbs", "--access-ttl-min", "1440"]).is_ok());
        assert!(Args::try_parse_from(["tbs", "--access-ttl-min", "1441"]).is_err());
        assert!(
            Args::try_parse_from(["tbs", "--access-ttl-min", "18446744073709551615"]).is_err()
        );
        assert!(Args::try_parse_from(["tbs", "--refresh-ttl-days", "366"]).is_err());
    }

    #[tokio::test]
    async fn test_build_config_cookie_flag() {
        let args = Args::try_parse_from(["tbs", "--insecure-cookies", "--trust-proxy"]).unwrap();
        let tokens = TokenSettings {
            access_secret: vec![b'a'; 32],
            refresh_secret: vec![b'b'; 32],
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        };
        let db = Database::open(":memory:").await.unwrap();

        let config = build_config(&args, db, tokens);
        assert!(!config.secure_cookies);
        assert!(config.login_limit.trust_proxy());
    }
}

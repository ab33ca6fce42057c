use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use clap::Parser;
use std::env;

const DEFAULT_TIMEZONE: &str = "Europe/London";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Zone the availability clock observes "now" in.
    pub timezone: Tz,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "OTA firmware asset server")]
pub struct Args {
    /// Host to bind to (overrides OTA_SERVER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides OTA_SERVER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides OTA_SERVER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// IANA time zone name (overrides TZ)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args, |key| env::var(key))?, migrate))
    }

    /// Merge CLI arguments over values looked up through `var`.
    fn merge<F>(args: Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = var("OTA_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match var("OTA_SERVER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing OTA_SERVER_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading OTA_SERVER_PORT"),
        };
        let env_db = var("OTA_SERVER_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/ota_server.db".into());
        let env_tz = var("TZ").unwrap_or_else(|_| DEFAULT_TIMEZONE.into());

        // --- Merge ---
        let tz_name = args.timezone.unwrap_or(env_tz);
        let timezone = tz_name
            .parse::<Tz>()
            .map_err(|err| anyhow!("unknown time zone `{}`: {}", tz_name, err))?;

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            timezone,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

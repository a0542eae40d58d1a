use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub aws_region: String,
    pub jwt_secret: String,
    /// Access token lifetime in seconds (15 minutes).
    pub access_token_ttl_secs: i64,
    /// Refresh token / session lifetime in seconds (7 days).
    pub refresh_token_ttl_secs: i64,
    /// Presigned URL lifetime in seconds (1 hour).
    pub presign_expiry_secs: u64,
    pub argon2: Argon2Params,
}

/// Argon2id cost parameters. Defaults follow the deployment baseline:
/// 64 MiB memory, 3 iterations, no lane parallelism.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Presigned upload gateway with JWT sessions")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides UPLOAD_GATEWAY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// AWS region used for public object URLs (overrides AWS_REGION)
    #[arg(long)]
    pub aws_region: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("UPLOAD_GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("UPLOAD_GATEWAY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing UPLOAD_GATEWAY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading UPLOAD_GATEWAY_PORT"),
        };
        let env_db = env::var("UPLOAD_GATEWAY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/upload_gateway.db".into());
        let env_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into());

        // The JWT secret has no usable default.
        let jwt_secret = env::var("JWT_ACCESS_SECRET").context("reading JWT_ACCESS_SECRET")?;

        let argon2 = Argon2Params {
            memory_kib: env_u32("ARGON2_MEMORY_COST", 65536)?,
            time_cost: env_u32("ARGON2_TIME_COST", 3)?,
            parallelism: env_u32("ARGON2_PARALLELISM", 1)?,
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            aws_region: args.aws_region.unwrap_or(env_region),
            jwt_secret,
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            presign_expiry_secs: 3600,
            argon2,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_u32(name: &str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u32>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

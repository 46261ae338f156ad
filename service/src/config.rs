use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is not provided. Only suitable for local development.
pub const DEFAULT_JWT_SECRET: &str = "task-board-development-secret";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 8080)]
    pub port: u16,

    /// HMAC secret used to validate bearer tokens.
    #[arg(long, env, default_value = DEFAULT_JWT_SECRET)]
    jwt_secret: String,

    /// Maximum number of undelivered events held for a single WebSocket connection.
    /// When full, the oldest queued event is evicted to make room.
    #[arg(long, env, default_value_t = 256)]
    outbox_capacity: usize,

    /// Maximum number of broadcasts waiting on the hub coordinator before new ones are rejected.
    #[arg(long, env, default_value_t = 4096)]
    submission_capacity: usize,

    /// Seconds a single WebSocket write may take before the connection is torn down
    #[arg(long, env, default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// Seconds without any inbound frame before a connection is considered dead
    #[arg(long, env, default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Seconds between keep-alive pings sent to each connection
    #[arg(long, env, default_value_t = 25)]
    pub ping_interval_secs: u64,

    /// Seconds to wait for connections and the hub to wind down on shutdown
    #[arg(long, env, default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    /// Defaults plus whatever the environment provides; command line arguments are ignored
    /// so this is safe to call from tests.
    fn default() -> Self {
        Config::parse_from([env!("CARGO_PKG_NAME")])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn set_jwt_secret(mut self, jwt_secret: impl Into<String>) -> Self {
        self.jwt_secret = jwt_secret.into();
        self
    }

    pub fn is_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity.max(1)
    }

    pub fn set_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }

    pub fn submission_capacity(&self) -> usize {
        self.submission_capacity.max(1)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs.max(1))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.max(1))
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

//! Service configuration management

use crate::error::{LeagueServiceError, Result};
use keeper_cost::SelfTradePolicy;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueServiceConfig {
    /// HTTP listener configuration
    pub http: HttpConfig,

    /// League data configuration
    pub data: DataConfig,

    /// Keeper pricing configuration
    pub keeper: KeeperConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// League data file loaded at startup
    pub data_file: PathBuf,

    /// Write the league data back to `data_file` on shutdown
    pub save_on_shutdown: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// How a player listed on both sides of one trade is counted
    pub self_trade_policy: SelfTradePolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8081 }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_file: PathBuf::from("data/league.json"), save_on_shutdown: false }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["json", "pretty", "compact"];

impl LeagueServiceConfig {
    /// Create config from a `.env` file and `LEAGUE_*` environment variables.
    ///
    /// Values are parsed but not validated, so later overrides (command-line
    /// flags) can still replace them; call [`Self::validate`] once they are in.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with `LEAGUE_*` overrides from a variable lookup, unvalidated
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply `LEAGUE_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LEAGUE_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Some(format) = lookup("LEAGUE_LOG_FORMAT") {
            self.logging.format = format.to_lowercase();
        }

        if let Some(host) = lookup("LEAGUE_HTTP_HOST") {
            self.http.host = host;
        }

        if let Some(port) = lookup("LEAGUE_HTTP_PORT") {
            self.http.port = port.parse().map_err(|_| invalid(format!("LEAGUE_HTTP_PORT: {port}")))?;
        }

        if let Some(data_file) = lookup("LEAGUE_DATA_FILE") {
            self.data.data_file = PathBuf::from(data_file);
        }

        if let Some(save) = lookup("LEAGUE_SAVE_ON_SHUTDOWN") {
            self.data.save_on_shutdown =
                save.parse().map_err(|_| invalid(format!("LEAGUE_SAVE_ON_SHUTDOWN: {save}")))?;
        }

        if let Some(policy) = lookup("LEAGUE_SELF_TRADE_POLICY") {
            self.keeper.self_trade_policy = policy.parse()?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!("unknown log level {}", self.logging.level)));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(invalid(format!("unknown log format {}", self.logging.format)));
        }

        if self.data.data_file.as_os_str().is_empty() {
            return Err(invalid("data file path is empty".to_string()));
        }

        self.socket_addr()?;
        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.http.host, self.http.port)
            .parse()
            .map_err(|_| invalid(format!("bad listen address {}:{}", self.http.host, self.http.port)))
    }
}

fn invalid(message: String) -> LeagueServiceError {
    LeagueServiceError::InvalidConfig { message }
}

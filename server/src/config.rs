//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use xrate_fx::{ConfigError, RateServiceConfig, RefreshSchedule};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human readable lines.
    Pretty,
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Rate service configuration.
    pub rate: RateServiceConfig,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// HTTP listen address.
    pub listen_addr: SocketAddr,
}

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8000;

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rate = RateServiceConfig::from_lookup(&lookup)?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let host = match lookup("HOST") {
            Some(value) => value.parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                var: "HOST",
                value,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            rate,
            log_level,
            log_format,
            listen_addr: SocketAddr::new(host, port),
        })
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate.validate()?;

        if self.log_level.is_empty() {
            return Err(ConfigError::Rejected("Log level cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Background refresh schedule, aligned to the wall clock.
    pub fn refresh_schedule(&self) -> RefreshSchedule {
        RefreshSchedule {
            interval: self.rate.refresh_interval,
            align_to_wall_clock: true,
        }
    }
}

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_STATE_PATH: &str = "./rollcall.db";
const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SYNC_INTERVAL_HOURS: u64 = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        name: &'static str,
        reason: String,
    },
}

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform API token, also required as the bearer token on the intake.
    pub token: String,
    /// The single group whose membership is watched.
    pub group_id: String,
    /// Channel that receives join/leave announcements.
    pub channel_id: String,
    /// SQLite file holding the membership mirror and migration ledger.
    pub state_path: PathBuf,
    /// Base URL of the platform REST API.
    pub api_base: String,
    /// Bind address for the live-event intake and health routes.
    pub listen_addr: SocketAddr,
    /// Period between scheduled full roster syncs.
    pub sync_interval: Duration,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// All missing required variables are collected and reported in a single
    /// error so a misconfigured deployment fails with one actionable message.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let token = require("ROLLCALL_TOKEN", &mut missing);
        let group_id = require("ROLLCALL_GROUP_ID", &mut missing);
        let channel_id = require("ROLLCALL_CHANNEL_ID", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let state_path = PathBuf::from(
            env::var("ROLLCALL_STATE_PATH").unwrap_or_else(|_| DEFAULT_STATE_PATH.to_string()),
        );
        let api_base = env::var("ROLLCALL_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let listen_addr = parse_listen_addr(env::var("ROLLCALL_LISTEN_ADDR").ok())?;
        let sync_interval = parse_sync_interval(env::var("ROLLCALL_SYNC_INTERVAL_HOURS").ok())?;

        Ok(Self {
            token,
            group_id,
            channel_id,
            state_path,
            api_base,
            listen_addr,
            sync_interval,
        })
    }
}

fn require(name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

fn parse_listen_addr(raw: Option<String>) -> Result<SocketAddr, ConfigError> {
    let raw = raw.unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
    raw.parse().map_err(|e| ConfigError::Invalid {
        name: "ROLLCALL_LISTEN_ADDR",
        reason: format!("{e}: {raw:?}"),
    })
}

fn parse_sync_interval(raw: Option<String>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_SYNC_INTERVAL_HOURS * 3600));
    };
    let hours: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
        name: "ROLLCALL_SYNC_INTERVAL_HOURS",
        reason: format!("expected a positive integer, got {raw:?}"),
    })?;
    if hours == 0 {
        return Err(ConfigError::Invalid {
            name: "ROLLCALL_SYNC_INTERVAL_HOURS",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(Duration::from_secs(hours * 3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_interval_defaults_to_twelve_hours() {
        let interval = parse_sync_interval(None).unwrap();
        assert_eq!(interval, Duration::from_secs(12 * 3600));
    }

    #[test]
    fn sync_interval_parses_hours() {
        let interval = parse_sync_interval(Some("1".to_string())).unwrap();
        assert_eq!(interval, Duration::from_secs(3600));
    }

    #[test]
    fn sync_interval_rejects_zero_and_garbage() {
        assert!(parse_sync_interval(Some("0".to_string())).is_err());
        assert!(parse_sync_interval(Some("soon".to_string())).is_err());
    }

    #[test]
    fn listen_addr_defaults_and_parses() {
        assert_eq!(
            parse_listen_addr(None).unwrap(),
            "0.0.0.0:3000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_listen_addr(Some("127.0.0.1:9000".to_string())).unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_addr(Some("not-an-addr".to_string())).is_err());
    }
}

//! Environment-variable configuration.
//!
//! All settings are read once at startup from `PIGEON_*` variables:
//! - `PIGEON_DISCORD_TOKEN` - Discord bot token (required)
//! - `PIGEON_CHANNEL_ID` - Discord channel to relay from (required)
//! - `PIGEON_WHATSAPP_JID` - WhatsApp group/conversation JID (required)
//! - `PIGEON_GATEWAY_URL` - WhatsApp gateway WebSocket URL
//! - `PIGEON_SESSION_DIR` - directory for the persisted session
//! - `PIGEON_RECONNECT_DELAY_MS` - delay before transient reconnects

use std::env;
use std::time::Duration;

use crate::common::error::{ConfigError, ConfigResult};
use crate::common::types::DiscordId;

/// Environment variable prefix for all settings.
const ENV_PREFIX: &str = "PIGEON";

/// Default WhatsApp gateway endpoint.
const DEFAULT_GATEWAY_URL: &str = "ws://127.0.0.1:3001";

/// Default session store directory (same location every run, so a
/// completed pairing survives restarts).
const DEFAULT_SESSION_DIR: &str = "auth";

/// Default delay before reconnecting after a transient disconnect.
const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;

/// Immutable process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token.
    pub discord_token: String,
    /// Discord channel messages are relayed from.
    pub source_channel: DiscordId,
    /// WhatsApp conversation messages are relayed to.
    pub target_jid: String,
    /// WhatsApp gateway WebSocket URL.
    pub gateway_url: String,
    /// Directory the session credentials are persisted in.
    pub session_dir: String,
    /// Delay before reconnecting after a transient disconnect.
    pub reconnect_delay: Duration,
}

impl Config {
    /// Load configuration from process environment variables.
    ///
    /// Fails fast: every missing or invalid value is collected and
    /// reported in a single error before any component starts.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through a variable lookup function.
    fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        let discord_token = require(&lookup, "DISCORD_TOKEN", &mut errors);
        let channel_raw = require(&lookup, "CHANNEL_ID", &mut errors);
        let target_jid = require(&lookup, "WHATSAPP_JID", &mut errors);

        let source_channel = match channel_raw.parse::<DiscordId>() {
            Ok(id) if id != 0 => id,
            _ if channel_raw.is_empty() => 0, // already reported as missing
            _ => {
                errors.push(format!(
                    "{}_CHANNEL_ID must be a non-zero numeric channel id (got '{}')",
                    ENV_PREFIX, channel_raw
                ));
                0
            }
        };

        let gateway_url = lookup(&var_name("GATEWAY_URL"))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

        let session_dir = lookup(&var_name("SESSION_DIR"))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_DIR.to_string());

        let reconnect_delay = match lookup(&var_name("RECONNECT_DELAY_MS")) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    errors.push(format!(
                        "{}_RECONNECT_DELAY_MS must be an integer number of milliseconds (got '{}')",
                        ENV_PREFIX, raw
                    ));
                    Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS)
                }
            },
            None => Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        };

        if !errors.is_empty() {
            return Err(ConfigError::ValidationError {
                message: errors.join("\n"),
            });
        }

        Ok(Self {
            discord_token,
            source_channel,
            target_jid,
            gateway_url,
            session_dir,
            reconnect_delay,
        })
    }
}

fn var_name(suffix: &str) -> String {
    format!("{}_{}", ENV_PREFIX, suffix)
}

/// Read a required variable, recording an error if it is absent or empty.
fn require<F>(lookup: &F, suffix: &str, errors: &mut Vec<String>) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let var = var_name(suffix);
    match lookup(&var) {
        Some(value) if !value.is_empty() => value,
        _ => {
            errors.push(format!("{} is required", var));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_minimal_valid_config() {
        let lookup = lookup_from(&[
            ("PIGEON_DISCORD_TOKEN", "token"),
            ("PIGEON_CHANNEL_ID", "123456789"),
            ("PIGEON_WHATSAPP_JID", "123@g.us"),
        ]);

        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(config.discord_token, "token");
        assert_eq!(config.source_channel, 123456789);
        assert_eq!(config.target_jid, "123@g.us");
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.session_dir, DEFAULT_SESSION_DIR);
        assert_eq!(config.reconnect_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_missing_required_vars_all_reported() {
        let result = Config::from_lookup(|_| None);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("PIGEON_DISCORD_TOKEN"));
        assert!(message.contains("PIGEON_CHANNEL_ID"));
        assert!(message.contains("PIGEON_WHATSAPP_JID"));
    }

    #[test]
    fn test_empty_required_var_fails() {
        let lookup = lookup_from(&[
            ("PIGEON_DISCORD_TOKEN", ""),
            ("PIGEON_CHANNEL_ID", "1"),
            ("PIGEON_WHATSAPP_JID", "x@g.us"),
        ]);

        let result = Config::from_lookup(lookup);
        assert!(result.unwrap_err().to_string().contains("PIGEON_DISCORD_TOKEN"));
    }

    #[test]
    fn test_non_numeric_channel_id_fails() {
        let lookup = lookup_from(&[
            ("PIGEON_DISCORD_TOKEN", "token"),
            ("PIGEON_CHANNEL_ID", "general"),
            ("PIGEON_WHATSAPP_JID", "x@g.us"),
        ]);

        let result = Config::from_lookup(lookup);
        assert!(result.unwrap_err().to_string().contains("PIGEON_CHANNEL_ID"));
    }

    #[test]
    fn test_overrides_applied() {
        let lookup = lookup_from(&[
            ("PIGEON_DISCORD_TOKEN", "token"),
            ("PIGEON_CHANNEL_ID", "42"),
            ("PIGEON_WHATSAPP_JID", "x@g.us"),
            ("PIGEON_GATEWAY_URL", "ws://gateway:9000"),
            ("PIGEON_SESSION_DIR", "/var/lib/pigeon"),
            ("PIGEON_RECONNECT_DELAY_MS", "500"),
        ]);

        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(config.gateway_url, "ws://gateway:9000");
        assert_eq!(config.session_dir, "/var/lib/pigeon");
        assert_eq!(config.reconnect_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_delay_fails() {
        let lookup = lookup_from(&[
            ("PIGEON_DISCORD_TOKEN", "token"),
            ("PIGEON_CHANNEL_ID", "42"),
            ("PIGEON_WHATSAPP_JID", "x@g.us"),
            ("PIGEON_RECONNECT_DELAY_MS", "soon"),
        ]);

        let result = Config::from_lookup(lookup);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("PIGEON_RECONNECT_DELAY_MS"));
    }
}

use crate::{Error, Result};

pub const DEFAULT_DERIV_WS_URL: &str = "wss://ws.derivws.com/websockets/v3";
pub const DEFAULT_DERIV_APP_ID: u32 = 1089;
pub const DEFAULT_MARKET: &str = "1HZ100V";
pub const DEFAULT_PORT: u16 = 3000;

/// Process configuration loaded from environment variables at startup.
/// Every variable has a default; a present but unparseable value is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Upstream feed
    pub deriv_ws_url: String,
    pub deriv_app_id: u32,
    pub market: String,

    // Dashboard
    pub port: u16,

    // Pipeline parameters file. `None` runs with built-in defaults.
    pub pipeline_config_path: Option<String>,
}

impl Config {
    /// Load configuration from the environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            deriv_ws_url: lookup("DERIV_WS_URL")
                .unwrap_or_else(|| DEFAULT_DERIV_WS_URL.to_string()),
            deriv_app_id: parsed(&lookup, "DERIV_APP_ID")?.unwrap_or(DEFAULT_DERIV_APP_ID),
            market: lookup("DERIV_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            port: parsed(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT),
            pipeline_config_path: lookup("PIPELINE_CONFIG_PATH").filter(|p| !p.trim().is_empty()),
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            Error::Config(format!("environment variable '{key}' has invalid value '{raw}'"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.deriv_app_id, 1089);
        assert_eq!(cfg.market, "1HZ100V");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.pipeline_config_path, None);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DERIV_APP_ID", "4242"),
            ("DERIV_MARKET", "R_50"),
            ("PORT", " 8080 "),
            ("PIPELINE_CONFIG_PATH", "config/pipeline.toml"),
        ]))
        .unwrap();
        assert_eq!(cfg.deriv_app_id, 4242);
        assert_eq!(cfg.market, "R_50");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.pipeline_config_path.as_deref(), Some("config/pipeline.toml"));
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }
}

use purgehook_dispatch::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Outbound invalidation webhook
    pub webhook: DispatchConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        self.addr()?;
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.webhook.public_url.trim().is_empty() {
            return Err("webhook.public_url must not be empty".into());
        }
        self.webhook
            .validate()
            .map_err(|e| format!("webhook config error: {e}"))?;
        Ok(())
    }

    /// Listen address; `server.host` must be an IP literal.
    pub fn addr(&self) -> Result<SocketAddr, String> {
        let host: IpAddr = self.server.host.parse().map_err(|_| {
            format!(
                "server.host must be a valid IP address, got `{}`",
                self.server.host
            )
        })?;
        Ok(SocketAddr::from((host, self.server.port)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    2369
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "purgehook.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., PURGEHOOK__WEBHOOK__RETRY_COUNT=5
        builder = builder.add_source(
            Environment::with_prefix("PURGEHOOK")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_config(host: &str) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: host.into(),
                port: 8080,
            },
            logging: LoggingConfig::default(),
            webhook: DispatchConfig::new("https://cdn.example.com/purge", "https://site"),
        }
    }

    #[test]
    fn test_addr_accepts_ip_literals() {
        assert_eq!(
            app_config("127.0.0.1").addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            app_config("::1").addr().unwrap(),
            "[::1]:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_invalid_host_is_rejected_not_replaced() {
        let cfg = app_config("localhost");
        assert!(cfg.addr().unwrap_err().contains("server.host"));
        assert!(cfg.validate().unwrap_err().contains("server.host"));
    }
}

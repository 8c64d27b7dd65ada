//! Env-driven configuration for the service and library.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults point at a local dashboards instance.
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub relevance_url: String,
    pub api_host: String,
    pub api_port: String,
    pub request_timeout_secs: u64,
}

const VARS: &[&str] = &["RELEVANCE_URL", "API_HOST", "API_PORT", "REQUEST_TIMEOUT_SECS"];

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn from_env() -> Self {
        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid REQUEST_TIMEOUT_SECS '{}', falling back to 30", raw);
                30
            }),
            Err(_) => 30,
        };
        Config {
            relevance_url: env::var("RELEVANCE_URL").unwrap_or_else(|_| "http://localhost:5601".to_string()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8190".to_string()),
            request_timeout_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Bind address for the HTTP surface, falling back to 127.0.0.1:8190 on
    /// unparsable values.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip: IpAddr = self.api_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", self.api_host);
            IpAddr::from([127, 0, 0, 1])
        });
        let port: u16 = self.api_port.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid API_PORT '{}', falling back to 8190", self.api_port);
            8190
        });
        SocketAddr::new(ip, port)
    }

    pub fn log_env_vars() {
        for name in VARS {
            let value = env::var(name).unwrap_or_else(|_| "<unset>".to_string());
            tracing::info!("{}: {}", name, value);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            relevance_url: "http://localhost:5601".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: "8190".to_string(),
            request_timeout_secs: 30,
        }
    }
}

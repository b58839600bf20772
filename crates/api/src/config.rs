//! Server configuration from environment variables.

/// Runtime configuration.
///
/// - `HOST` / `PORT` — bind address (defaults `0.0.0.0:3000`)
/// - `DATABASE_URL` — PostgreSQL connection string; when unset the server
///   runs on the in-memory store
/// - `PG_MAX_CONNECTIONS` — pool size for the Postgres store (default 10)
/// - `SEED_DEMO` — set to `false` to skip seeding the demo catalog on the
///   in-memory store
/// - `RUST_LOG` — tracing filter directive (default `info`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub pg_max_connections: u32,
    pub seed_demo: bool,
    pub log_level: String,
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("PORT", 3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            pg_max_connections: env_parsed("PG_MAX_CONNECTIONS", 10),
            seed_demo: env_parsed("SEED_DEMO", true),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// The `host:port` string handed to the TCP listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            pg_max_connections: 10,
            seed_demo: true,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert!(config.seed_demo);
        assert_eq!(config.pg_max_connections, 10);
    }

    #[test]
    fn addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}

use anyhow::{bail, Context, Result};
use mockable::{DefaultEnv, Env};
use std::str::FromStr;

const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_GRPC_PORT: u16 = 50051;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8000,http://127.0.0.1:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown STORAGE_BACKEND '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub http_port: u16,
    pub grpc_port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub seed: Option<SeedConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::load(&DefaultEnv::new())
    }

    /// Blank variables count as unset.
    pub fn load<E: Env>(env: &E) -> Result<Self> {
        let var = |key: &str| env.string(key).filter(|v| !v.trim().is_empty());

        let storage = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };

        let database_url = var("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set");
        }

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let http_port = parse_or(var("HTTP_PORT"), DEFAULT_HTTP_PORT, "HTTP_PORT")?;
        let grpc_port = parse_or(var("GRPC_PORT"), DEFAULT_GRPC_PORT, "GRPC_PORT")?;
        let database_max_connections = parse_or(
            var("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
            "DATABASE_MAX_CONNECTIONS",
        )?;

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let seed = match (var("SEED_ADMIN_EMAIL"), var("SEED_ADMIN_PASSWORD")) {
            (Some(admin_email), Some(admin_password)) => Some(SeedConfig {
                admin_email,
                admin_password,
            }),
            _ => None,
        };

        Ok(Self {
            storage,
            database_url,
            database_max_connections,
            jwt_secret,
            http_port,
            grpc_port,
            cors_allowed_origins,
            seed,
        })
    }

    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }

    pub fn grpc_addr(&self) -> String {
        format!("0.0.0.0:{}", self.grpc_port)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T, key: &str) -> Result<T> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use serial_test::serial;
    use std::collections::HashMap;

    fn mock_env(pairs: &[(&str, &str)]) -> MockEnv {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    #[test]
    fn defaults_fill_in_optional_values() {
        let config = AppConfig::load(&mock_env(&[
            ("DATABASE_URL", "postgres://localhost/postboard"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.grpc_port, 50051);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(
            config.cors_allowed_origins,
            ["http://localhost:8000", "http://127.0.0.1:8000"]
        );
        assert!(config.seed.is_none());
        assert_eq!(config.http_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn postgres_backend_requires_a_database_url() {
        let err = AppConfig::load(&mock_env(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = AppConfig::load(&mock_env(&[
            ("DATABASE_URL", "   "),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn memory_backend_runs_without_a_database() {
        let config = AppConfig::load(&mock_env(&[
            ("STORAGE_BACKEND", "Memory"),
            ("JWT_SECRET", "secret"),
            ("HTTP_PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]))
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.http_port, 8080);
        assert_eq!(
            config.cors_allowed_origins,
            ["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn missing_secret_and_bad_ports_are_errors() {
        assert!(AppConfig::load(&mock_env(&[("STORAGE_BACKEND", "memory")])).is_err());
        assert!(AppConfig::load(&mock_env(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", "secret"),
            ("GRPC_PORT", "not-a-port"),
        ]))
        .is_err());
        assert!(AppConfig::load(&mock_env(&[
            ("STORAGE_BACKEND", "sqlite"),
            ("JWT_SECRET", "secret"),
        ]))
        .is_err());
    }

    #[test]
    fn seeding_needs_both_credentials() {
        let config = AppConfig::load(&mock_env(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", "secret"),
            ("SEED_ADMIN_EMAIL", "admin@example.com"),
        ]))
        .unwrap();
        assert!(config.seed.is_none());

        let config = AppConfig::load(&mock_env(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", "secret"),
            ("SEED_ADMIN_EMAIL", "admin@example.com"),
            ("SEED_ADMIN_PASSWORD", "change-me"),
        ]))
        .unwrap();
        assert_eq!(
            config.seed,
            Some(SeedConfig {
                admin_email: "admin@example.com".into(),
                admin_password: "change-me".into(),
            })
        );
    }

    #[test]
    #[serial]
    fn from_env_reads_the_process_environment() {
        std::env::set_var("STORAGE_BACKEND", "memory");
        std::env::set_var("JWT_SECRET", "from-env");
        let config = AppConfig::from_env();
        std::env::remove_var("STORAGE_BACKEND");
        std::env::remove_var("JWT_SECRET");

        assert_eq!(config.unwrap().jwt_secret, "from-env");
    }
}

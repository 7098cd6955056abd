/// Configuration management for the leaderboard service
///
/// Loads configuration from environment variables, with defaults suitable
/// for local development.
use serde::Deserialize;
use std::env;

use crate::error::{Result, ServiceError};
use crate::store::hash_index::{DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub store: StoreConfig,
}

/// Service settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    pub service_name: String,
}

/// Ranked-store tuning
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Initial hash index capacity (buckets)
    pub initial_capacity: usize,
    /// Hash index resize threshold as a fraction of capacity
    pub load_factor: f64,
    /// Fixed skip-list level seed; unset means seeded from entropy.
    /// Only useful for reproducible test runs.
    pub level_seed: Option<u64>,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ServiceError::Config(format!("{name} has an invalid value: {raw:?}"))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let level_seed = match env::var("STORE_LEVEL_SEED") {
            Ok(raw) => Some(raw.parse().map_err(|_| {
                ServiceError::Config(format!("STORE_LEVEL_SEED has an invalid value: {raw:?}"))
            })?),
            Err(_) => None,
        };

        Ok(Config {
            service: ServiceConfig {
                host: env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                http_port: var_or("HTTP_PORT", 8080)?,
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "leaderboard-service".to_string()),
            },
            store: StoreConfig {
                initial_capacity: var_or("STORE_INITIAL_CAPACITY", DEFAULT_INITIAL_CAPACITY)?,
                load_factor: var_or("STORE_LOAD_FACTOR", DEFAULT_LOAD_FACTOR)?,
                level_seed,
            },
        })
    }
}

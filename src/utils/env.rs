// src/utils/env.rs
use log::{info, warn};
use std::path::Path;
use std::str::FromStr;

/// Loads the first `.env` file found; system variables are used otherwise.
pub fn load_env() {
    let env_paths = [".env", ".env.local", "../.env"];
    for path in env_paths.iter() {
        if Path::new(path).exists() {
            match dotenv::from_path(path) {
                Ok(()) => {
                    info!("Loaded environment variables from {}", path);
                    return;
                }
                Err(e) => warn!("Failed to load environment from {}: {}", path, e),
            }
        }
    }
    info!("No .env file found, using environment variables from system");
}

/// Reads `key` and parses it, falling back to `default` when unset or invalid.
pub fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    "Ignoring invalid value {:?} for {}; using default {}",
                    raw, key, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

/// Reads `key` as a non-blank string.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

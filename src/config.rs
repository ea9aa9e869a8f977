use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub meili_url: String,
    pub meili_key: String,
    pub jwt_secret: String,
    /// Uploaded images land here and are served under `/assets`.
    pub assets_dir: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
    /// Run against in-memory store and search, no external services.
    pub standalone: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "6001"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            meili_url: try_load("MEILI_URL", "http://127.0.0.1:7700"),
            meili_key: load_secret("MEILI_ADMIN_KEY", "dev-meili-key"),
            jwt_secret: load_secret("JWT_SECRET", "dev-jwt-secret"),
            assets_dir: try_load("ASSETS_DIR", "public/assets"),
            token_ttl_secs: try_load("TOKEN_TTL_SECS", "86400"),
            standalone: env::var("STANDALONE").is_ok_and(|v| v == "1" || v == "true"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Secrets come from `/run/secrets/<name>` when deployed, the environment
/// otherwise. The default only exists so local development can boot.
fn load_secret(secret_name: &str, default: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    if let Ok(contents) = read_to_string(&path) {
        return contents.trim().to_string();
    }

    var(secret_name).unwrap_or_else(|_| {
        warn!("{secret_name} not provided, using insecure development default");
        default.to_string()
    })
}

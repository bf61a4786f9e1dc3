use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173/dashboard";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:3001/auth/google/callback";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub session_secret: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub frontend_url: String,
}

impl Config {
    /// Read the environment, honoring a `.env` file in the working directory.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        let config = Self {
            port: try_load("PORT", DEFAULT_PORT),
            session_secret: var("SESSION_SECRET").ok(),
            client_id: var("CLIENT_ID").unwrap_or_default(),
            client_secret: var("CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: try_load("REDIRECT_URI", DEFAULT_REDIRECT_URI.to_string()),
            frontend_url: try_load("FRONTEND_URL", DEFAULT_FRONTEND_URL.to_string()),
        };
        info!(
            session_secret = config.session_secret.is_some(),
            "Server configuration loaded"
        );
        config
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

/// Front-end base URL for links printed by the CLI, read quietly so
/// commands other than `serve` do not log configuration warnings.
pub fn frontend_url() -> String {
    dotenvy::dotenv().ok();
    env::var("FRONTEND_URL").unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string())
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value: {e}, using default: {default}");
            default
        }),
        Err(()) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            port: DEFAULT_PORT,
            session_secret: None,
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            frontend_url: DEFAULT_FRONTEND_URL.into(),
        }
    }
}

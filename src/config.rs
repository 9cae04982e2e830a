use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    /// Base URL of the contest API server, e.g. `https://beers.example.org/`.
    pub api_base_url: String,
    /// Rows fetched per validation queue page.
    pub page_size: u32,
    /// Bearer token forwarded to the contest API, if one is provisioned.
    pub api_token: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("STEIN_PORT", "2222"),
            api_base_url: normalize_base(try_load::<String>(
                "STEIN_API_URL",
                "http://localhost:8000/",
            )),
            page_size: try_load("STEIN_PAGE_SIZE", "25"),
            api_token: read_secret("STEIN_API_TOKEN"),
        }
    }
}

fn normalize_base(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
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

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret mounted: {e}");
        })
        .ok()
        .or_else(|| var(secret_name).ok())
}

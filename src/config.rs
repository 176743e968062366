use anyhow::{bail, Context};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_url: String,
    pub coingecko_api_url: String,
    pub allowed_origins: Vec<String>,
    pub history_hours: usize,
}

impl Config {
    /// Load configuration from the environment (and `.env`, if present).
    ///
    /// Only `GEMINI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let port: u16 = var("PORT", "5500")
            .parse()
            .context("PORT must be a valid port number")?;

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("GEMINI_API_KEY must be set")?;

        let history_hours: usize = var("HISTORY_HOURS", "6")
            .parse()
            .context("HISTORY_HOURS must be a positive integer")?;
        if history_hours == 0 {
            bail!("HISTORY_HOURS must be a positive integer");
        }

        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_api_url: var("GEMINI_API_URL", DEFAULT_GEMINI_URL),
            coingecko_api_url: var("COINGECKO_API_URL", DEFAULT_COINGECKO_URL),
            allowed_origins: parse_origins(&var("CORS_ALLOWED_ORIGINS", "http://localhost:3000")),
            history_hours,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

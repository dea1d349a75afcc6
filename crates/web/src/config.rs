use anyhow::{Context, Result};
use rust_decimal::Decimal;
use storage::config::{Settings, TieBreakPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Without a database URL the API runs on the in-memory store.
    pub database_url: Option<String>,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut settings = Settings::default();

        if let Ok(ms) = std::env::var("STORE_TIMEOUT_MS") {
            settings.store_timeout_ms = ms.parse().context("STORE_TIMEOUT_MS must be a number")?;
        }
        if let Ok(verify) = std::env::var("VERIFY_WRITES") {
            settings.persister.verify_writes =
                verify.parse().context("VERIFY_WRITES must be true or false")?;
        }
        if let Ok(retries) = std::env::var("VERIFY_RETRIES") {
            settings.persister.verify_retries =
                retries.parse().context("VERIFY_RETRIES must be a number")?;
        }
        if let Ok(max) = std::env::var("JUDGE_SCORE_MAX") {
            settings.scoring.judge_max = max
                .parse::<Decimal>()
                .context("JUDGE_SCORE_MAX must be a decimal")?;
        }
        if let Ok(policy) = std::env::var("TIE_BREAK_POLICY") {
            settings.persister.tie_break_policy = policy
                .parse::<TieBreakPolicy>()
                .map_err(anyhow::Error::msg)
                .context("Invalid TIE_BREAK_POLICY")?;
        }

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            settings,
        })
    }
}

use std::env;

use anyhow::{Context, Result};

use crate::engine::{MatcherConfig, RoleMap, MATCH_THRESHOLD};

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// variable has a working default except the master API key, which is
/// only honored in development/testing.
pub struct Config {
    pub db_path: String,
    /// Diarization label resolved to the Agent role.
    pub agent_speaker: String,
    /// Diarization label resolved to the Customer role.
    pub customer_speaker: String,
    /// Fuzzy match threshold, 0–100.
    pub threshold: u32,
    /// Deployment environment name ("development", "testing", "production").
    #[cfg(feature = "web")]
    pub environment: String,
    /// Master API key honored only outside production (CALLSCAN_MASTER_API_KEY).
    #[cfg(feature = "web")]
    pub master_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let threshold = match env::var("CALLSCAN_THRESHOLD") {
            Ok(raw) => {
                let value: u32 = raw
                    .parse()
                    .with_context(|| format!("CALLSCAN_THRESHOLD is not a number: {raw:?}"))?;
                if value > 100 {
                    anyhow::bail!("CALLSCAN_THRESHOLD must be between 0 and 100, got {value}");
                }
                value
            }
            Err(_) => MATCH_THRESHOLD,
        };

        Ok(Self {
            db_path: env::var("CALLSCAN_DB_PATH").unwrap_or_else(|_| "./callscan.db".to_string()),
            agent_speaker: env::var("CALLSCAN_AGENT_SPEAKER")
                .unwrap_or_else(|_| "Speaker_1".to_string()),
            customer_speaker: env::var("CALLSCAN_CUSTOMER_SPEAKER")
                .unwrap_or_else(|_| "Speaker_0".to_string()),
            threshold,
            #[cfg(feature = "web")]
            environment: env::var("CALLSCAN_ENV").unwrap_or_else(|_| "development".to_string()),
            #[cfg(feature = "web")]
            master_api_key: env::var("CALLSCAN_MASTER_API_KEY").unwrap_or_default(),
        })
    }

    /// The role map for this deployment's two configured labels.
    pub fn role_map(&self) -> RoleMap {
        RoleMap::two_party(&self.agent_speaker, &self.customer_speaker)
    }

    /// Matcher configuration: deployment role map plus the configured
    /// threshold, optionally overridden per call (e.g. by a CLI flag).
    pub fn matcher_config(&self, threshold_override: Option<u32>) -> MatcherConfig {
        MatcherConfig {
            threshold: threshold_override.unwrap_or(self.threshold),
            role_map: self.role_map(),
        }
    }

    /// Whether the master API key may authenticate requests.
    /// Production deployments must use issued keys only.
    #[cfg(feature = "web")]
    pub fn master_key_enabled(&self) -> bool {
        !self.master_api_key.is_empty()
            && matches!(self.environment.as_str(), "development" | "testing")
    }
}

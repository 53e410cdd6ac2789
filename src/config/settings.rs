// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::*;
use crate::api::{ApiSettings, RetryPolicy};
use crate::costing::CostingSettings;
use crate::enrichment::EnrichmentOptions;

/// Enrichment tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Objectives and initiatives fetched in parallel
    pub concurrency: usize,
    /// Merge initiatives found by objective, in the full list and by program
    pub three_way_initiative_merge: bool,
    /// Load the detail activities under each main activity
    pub detail_activities: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            three_way_initiative_merge: true,
            detail_activities: true,
        }
    }
}

/// Credentials come from the environment only and are never written to disk.
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the planning REST API
    pub api_url: String,

    pub request_timeout_secs: u64,

    /// Minutes between session keep-alive checks
    pub keepalive_minutes: u64,

    pub retry: RetryPolicy,

    pub enrichment: EnrichmentConfig,

    pub costing: CostingSettings,

    /// Viewing organization when the session does not report one
    pub organization_id: Option<u64>,

    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            keepalive_minutes: DEFAULT_KEEPALIVE_MINUTES,
            retry: RetryPolicy::default(),
            enrichment: EnrichmentConfig::default(),
            costing: CostingSettings::default(),
            organization_id: None,
            credentials: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| anyhow::anyhow!("Invalid api_url '{}': {}", self.api_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "api_url must use http or https, got '{}'\n\n\
                 Edit ~/.stratplan/config.toml",
                url.scheme()
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        if self.keepalive_minutes == 0 {
            bail!("keepalive_minutes must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.enrichment.concurrency == 0 {
            bail!("enrichment.concurrency must be at least 1");
        }
        if self.costing.land_fallback_rate < 0.0 || self.costing.air_fallback_rate < 0.0 {
            bail!("costing fallback rates cannot be negative");
        }
        Ok(())
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            retry: self.retry.clone(),
            keepalive_interval: Duration::from_secs(self.keepalive_minutes * 60),
        }
    }

    pub fn enrichment_options(&self) -> EnrichmentOptions {
        EnrichmentOptions {
            concurrency: self.enrichment.concurrency,
            retry: self.retry.clone(),
            three_way_merge: self.enrichment.three_way_initiative_merge,
            detail_activities: self.enrichment.detail_activities,
        }
    }
}

use anyhow::{Result, anyhow};
use std::env;

use crate::meraki::DEFAULT_BASE_URL;

pub const ORG_ID_ENV: &str = "MERAKI_ORG_ID";
pub const API_KEY_ENV: &str = "MERAKI_API_KEY";
pub const BASE_URL_ENV: &str = "MERAKI_BASE_URL";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

const LEGACY_ORG_ID_ENV: &str = "MERAKI_ORG";
const LEGACY_API_KEY_ENV: &str = "MERAKI_KEY";

/// Settings loaded once at startup and passed to the shells.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub organization_id: String,
    pub api_key: String,
    pub base_url: String,
    pub verbose: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("organization_id", &self.organization_id)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    /// * Returns error if the organization id or API key is unset
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key).filter(|value| !value.is_empty()))
        };

        let organization_id = first_set(&[ORG_ID_ENV, LEGACY_ORG_ID_ENV])
            .ok_or_else(|| anyhow!("{ORG_ID_ENV} is not set"))?;
        let api_key = first_set(&[API_KEY_ENV, LEGACY_API_KEY_ENV])
            .ok_or_else(|| anyhow!("{API_KEY_ENV} is not set"))?;
        let base_url = first_set(&[BASE_URL_ENV]).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let verbose = first_set(&[LOG_LEVEL_ENV]).is_some_and(|level| level.eq_ignore_ascii_case("debug"));

        Ok(Config {
            organization_id,
            api_key,
            base_url,
            verbose,
        })
    }
}

//! Application configuration. Endpoints, run defaults.

use serde::Deserialize;

/// Default max API requests per 30-second rate window.
pub const DEFAULT_RATE_LIMIT: u32 = 40;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    /// Base URL of the registry's structured API. Read from KEEPER_API_BASE_URL.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Base URL of the login/restore form endpoint. Defaults to the API base.
    /// Read from KEEPER_SUBMIT_BASE_URL.
    #[serde(default)]
    pub submit_base_url: Option<String>,

    /// Default operator tag embedded into the client identity string.
    /// Read from KEEPER_OPERATOR_TAG.
    #[serde(default)]
    pub operator_tag: Option<String>,

    /// Max API requests per rate window. Read from KEEPER_RATE_LIMIT.
    #[serde(default)]
    pub rate_limit: Option<u32>,

    /// Default mode (login, restore, auto). Read from KEEPER_MODE.
    #[serde(default)]
    pub mode: Option<String>,

    /// Default credentials file path. Read from KEEPER_CREDENTIALS_PATH.
    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Verbose failure diagnostics by default. Read from KEEPER_VERBOSE.
    #[serde(default)]
    pub verbose: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("KEEPER"));
        if let Ok(path) = std::env::var("KEEPER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Side-channel endpoint; falls back to the API base URL.
    pub fn submit_base_url_or_api(&self) -> Option<String> {
        self.submit_base_url
            .clone()
            .or_else(|| self.api_base_url.clone())
    }

    pub fn operator_tag_or_default(&self) -> String {
        self.operator_tag
            .clone()
            .unwrap_or_else(|| "anonymous operator".to_string())
    }

    /// Returns the rate limit. Defaults to DEFAULT_RATE_LIMIT if unset.
    pub fn rate_limit_or_default(&self) -> u32 {
        self.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT)
    }

    pub fn mode_or_default(&self) -> String {
        self.mode.clone().unwrap_or_else(|| "auto".to_string())
    }

    pub fn credentials_path_or_default(&self) -> String {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| "./credentials.txt".to_string())
    }

    pub fn verbose_or_default(&self) -> bool {
        self.verbose.unwrap_or(false)
    }
}

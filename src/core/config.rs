//! Configuration management for Gondola
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/gondola/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::core::error::{GondolaError, Result};

/// Main configuration for Gondola
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storefront page and collection settings
    #[serde(default)]
    pub target: TargetConfig,
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Pauses between workflow steps
    #[serde(default)]
    pub waits: WaitConfig,
    /// Output file locations
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to collect and from where
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Category page URL
    pub url: String,
    /// Delivery postal code (CEP), digits only
    pub postal_code: String,
    /// Products per page to select, also used to estimate page count
    pub page_size: usize,
    /// Page count assumed when no pagination indicator is found
    pub fallback_total_pages: usize,
    /// Estimates above this are treated as misread and replaced by the fallback
    pub page_ceiling: usize,
    /// Upper bound on pages visited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Session name for agent-browser
    pub session_name: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    /// Timeout for a single browser command in ms
    pub timeout_ms: u64,
}

/// Fixed pauses, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// After every navigation
    pub after_load: u64,
    /// After clicking the postal code button, for the modal to open
    pub after_postal_button: u64,
    /// After submitting the postal code
    pub after_postal_submit: u64,
    /// After opening the page size menu
    pub after_menu_open: u64,
    /// After choosing a page size
    pub after_page_size: u64,
    /// How long to poll for a site-specific selector before falling back
    pub selector_timeout: u64,
    /// Delay between polls
    pub poll_interval: u64,
}

/// Output file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Product list JSON file
    pub products_path: PathBuf,
    /// Statistics JSON file
    pub stats_path: PathBuf,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: env::var("GONDOLA_URL")
                .unwrap_or_else(|_| "https://mercado.carrefour.com.br/bebidas".to_string()),
            postal_code: env::var("GONDOLA_CEP").unwrap_or_else(|_| "13403130".to_string()),
            page_size: 60,
            fallback_total_pages: 23,
            page_ceiling: 1000,
            max_pages: env::var("GONDOLA_MAX_PAGES")
                .ok()
                .and_then(|p| p.parse().ok()),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            session_name: env::var("GONDOLA_BROWSER_SESSION")
                .unwrap_or_else(|_| "gondola".to_string()),
            headed: env::var("GONDOLA_BROWSER_HEADED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            timeout_ms: 60000,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            after_load: 5000,
            after_postal_button: 2000,
            after_postal_submit: 5000,
            after_menu_open: 2000,
            after_page_size: 5000,
            selector_timeout: 5000,
            poll_interval: 500,
        }
    }
}

impl WaitConfig {
    /// All pauses disabled
    pub fn none() -> Self {
        Self {
            after_load: 0,
            after_postal_button: 0,
            after_postal_submit: 0,
            after_menu_open: 0,
            after_page_size: 0,
            selector_timeout: 0,
            poll_interval: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            products_path: PathBuf::from("output.json"),
            stats_path: PathBuf::from("stats.json"),
        }
    }
}

/// Convert a millisecond setting into a `Duration`
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gondola")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let config_path = Self::config_file();
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path).unwrap_or_else(|e| {
                warn!(path = %config_path.display(), error = %e, "ignoring config file");
                Self::default()
            })
        } else {
            Self::default()
        };
        config.apply_env();
        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(GondolaError::config("Config file not found"));
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| GondolaError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GondolaError::config(format!("Failed to parse config: {}", e)))
    }

    /// Environment variables win over values read from the config file
    fn apply_env(&mut self) {
        if let Ok(url) = env::var("GONDOLA_URL") {
            self.target.url = url;
        }
        if let Ok(cep) = env::var("GONDOLA_CEP") {
            self.target.postal_code = cep;
        }
        if let Some(max) = env::var("GONDOLA_MAX_PAGES")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.target.max_pages = Some(max);
        }
        if let Ok(session) = env::var("GONDOLA_BROWSER_SESSION") {
            self.browser.session_name = session;
        }
        if let Ok(headed) = env::var("GONDOLA_BROWSER_HEADED") {
            self.browser.headed = headed == "true" || headed == "1";
        }
    }

    /// Save configuration to the default config file, returning its path
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_file();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to a specific file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(config_dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).map_err(|e| {
                    GondolaError::config(format!("Failed to create config dir: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GondolaError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| GondolaError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Check the settings the workflow cannot run without
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.target.url)
            .map_err(|e| GondolaError::config(format!("Invalid target url: {}", e)))?;

        if self.target.postal_code.is_empty()
            || !self.target.postal_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(GondolaError::config(format!(
                "Postal code must contain only digits, got '{}'",
                self.target.postal_code
            )));
        }

        if self.target.page_size == 0 {
            return Err(GondolaError::config("page_size must be greater than zero"));
        }

        Ok(())
    }

    /// URL of the given 1-based results page
    ///
    /// Page 1 is the category URL itself. Later pages add `page=<n>` while
    /// keeping any query pairs already present.
    pub fn page_url(&self, page: usize) -> Result<String> {
        let mut url = Url::parse(&self.target.url)?;
        if page <= 1 {
            return Ok(url.into());
        }

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "page")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("page", &page.to_string());

        Ok(url.into())
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

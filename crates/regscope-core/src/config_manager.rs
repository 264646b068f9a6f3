use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to write config: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for RegScope
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegScopeConfig {
    /// Upstream corpus service and response caching
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Per-agency sampling caps and concurrency ceilings
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Historical series shape and event calendar
    #[serde(default)]
    pub history: HistoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream corpus service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the corpus service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long a cached response stays fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upper bound on cached responses
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Retries for transient upstream failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

/// Sampling caps trade completeness for bounded cost per agency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Titles walked per agency for word counts
    #[serde(default = "default_word_count_titles")]
    pub word_count_titles: usize,

    /// Titles analyzed per agency for complexity
    #[serde(default = "default_complexity_titles")]
    pub complexity_titles: usize,

    /// Agencies processed at the same time
    #[serde(default = "default_max_concurrent_agencies")]
    pub max_concurrent_agencies: usize,

    /// Upstream calls in flight at the same time
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            word_count_titles: default_word_count_titles(),
            complexity_titles: default_complexity_titles(),
            max_concurrent_agencies: default_max_concurrent_agencies(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

/// Static annotation attached to one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub year: i32,
    /// 1-based month
    pub month: u32,
    pub label: String,
}

impl CalendarEvent {
    pub fn new(year: i32, month: u32, label: impl Into<String>) -> Self {
        Self {
            year,
            month,
            label: label.into(),
        }
    }
}

/// Historical series configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Default window length ending today
    #[serde(default = "default_trailing_years")]
    pub trailing_years: u32,

    /// Compounding growth applied per elapsed month
    #[serde(default = "default_monthly_growth")]
    pub monthly_growth: f64,

    /// Half-width of the uniform perturbation (0.05 = ±5%)
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Sections assumed for titles that do not report a count
    #[serde(default = "default_sections")]
    pub default_sections: u64,

    /// Word estimate per regulation
    #[serde(default = "default_words_per_regulation")]
    pub words_per_regulation: u64,

    #[serde(default = "default_events")]
    pub events: Vec<CalendarEvent>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            trailing_years: default_trailing_years(),
            monthly_growth: default_monthly_growth(),
            jitter: default_jitter(),
            default_sections: default_sections(),
            words_per_regulation: default_words_per_regulation(),
            events: default_events(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "compact", "full"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://www.ecfr.gov".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_cache_max_entries() -> usize {
    1024
}
fn default_max_retries() -> u32 {
    2
}
fn default_user_agent() -> String {
    concat!("RegScope/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_word_count_titles() -> usize {
    2
}
fn default_complexity_titles() -> usize {
    1
}
fn default_max_concurrent_agencies() -> usize {
    8
}
fn default_max_concurrent_requests() -> usize {
    4
}
fn default_trailing_years() -> u32 {
    10
}
fn default_monthly_growth() -> f64 {
    0.005
}
fn default_jitter() -> f64 {
    0.05
}
fn default_sections() -> u64 {
    100
}
fn default_words_per_regulation() -> u64 {
    500
}
fn default_events() -> Vec<CalendarEvent> {
    vec![
        CalendarEvent::new(2017, 1, "New administration transition"),
        CalendarEvent::new(2018, 4, "Major regulatory reform initiative"),
        CalendarEvent::new(2020, 3, "COVID-19 emergency regulations"),
        CalendarEvent::new(2021, 1, "New administration transition"),
        CalendarEvent::new(2022, 11, "Infrastructure modernization regulations"),
    ]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with layered sources
pub struct ConfigManager {
    config: RegScopeConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Layered load rooted at the process working directory and the user's home.
    ///
    /// Precedence, highest first: process environment, `./.env`, `~/.regscope.env`,
    /// `./.regscope.toml`, `~/.regscope/config.toml`, defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::ReadError(e.to_string()))?;
        let home = dirs::home_dir();
        Self::load_from(&cwd, home.as_deref())
    }

    /// Same layering as [`load`](Self::load) with explicit search roots.
    pub fn load_from(cwd: &Path, home: Option<&Path>) -> Result<Self, ConfigError> {
        info!("Loading RegScope configuration");

        for env_file in env_file_candidates(cwd, home) {
            // dotenv never replaces a variable that is already set, so earlier files win
            match dotenv::from_path(&env_file) {
                Ok(()) => info!("Loaded environment from {}", env_file.display()),
                Err(e) => warn!("Skipping {}: {}", env_file.display(), e),
            }
        }

        let (config, config_path) = match config_file_candidates(cwd, home).into_iter().next() {
            Some(path) => (Self::read_toml_file(&path)?, Some(path)),
            None => (RegScopeConfig::default(), None),
        };
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Config file: {}", path.display()),
            None => info!("Config file: none, using defaults"),
        }
        info!(
            base_url = %config.gateway.base_url,
            cache_ttl_secs = config.gateway.cache_ttl_secs,
            word_count_titles = config.sampling.word_count_titles,
            complexity_titles = config.sampling.complexity_titles,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load an explicit file without consulting the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::read_toml_file(path)?;
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory configuration after validating it.
    pub fn from_config(config: RegScopeConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn read_toml_file(path: &Path) -> Result<RegScopeConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: RegScopeConfig) -> RegScopeConfig {
        if let Ok(url) = std::env::var("REGSCOPE_BASE_URL") {
            config.gateway.base_url = url;
        }
        if let Some(secs) = env_parse("REGSCOPE_TIMEOUT_SECS") {
            config.gateway.timeout_secs = secs;
        }
        if let Some(secs) = env_parse("REGSCOPE_CACHE_TTL_SECS") {
            config.gateway.cache_ttl_secs = secs;
        }
        if let Some(retries) = env_parse("REGSCOPE_MAX_RETRIES") {
            config.gateway.max_retries = retries;
        }
        if let Some(cap) = env_parse("REGSCOPE_WORD_COUNT_TITLES") {
            config.sampling.word_count_titles = cap;
        }
        if let Some(cap) = env_parse("REGSCOPE_COMPLEXITY_TITLES") {
            config.sampling.complexity_titles = cap;
        }
        if let Some(n) = env_parse("REGSCOPE_MAX_CONCURRENT_AGENCIES") {
            config.sampling.max_concurrent_agencies = n;
        }
        if let Some(n) = env_parse("REGSCOPE_MAX_CONCURRENT_REQUESTS") {
            config.sampling.max_concurrent_requests = n;
        }

        if let Ok(level) = std::env::var("REGSCOPE_LOG_LEVEL") {
            config.logging.level = level;
        }

        config
    }

    pub fn validate_config(config: &RegScopeConfig) -> Result<(), ConfigError> {
        url::Url::parse(&config.gateway.base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Invalid base URL {:?}: {}",
                config.gateway.base_url, e
            ))
        })?;

        let sampling = &config.sampling;
        for (name, value) in [
            ("word_count_titles", sampling.word_count_titles),
            ("complexity_titles", sampling.complexity_titles),
            ("max_concurrent_agencies", sampling.max_concurrent_agencies),
            ("max_concurrent_requests", sampling.max_concurrent_requests),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "sampling.{} must be at least 1",
                    name
                )));
            }
        }

        let history = &config.history;
        if !(0.0..1.0).contains(&history.jitter) {
            return Err(ConfigError::ValidationError(format!(
                "history.jitter must be in [0, 1), got {}",
                history.jitter
            )));
        }
        if let Some(event) = history.events.iter().find(|e| !(1..=12).contains(&e.month)) {
            return Err(ConfigError::ValidationError(format!(
                "Event {:?} has invalid month {}",
                event.label, event.month
            )));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &RegScopeConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write the default configuration to `path`, creating parent directories.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(&RegScopeConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }
        std::fs::write(path, format!("{}{}", DEFAULT_CONFIG_HEADER, body))
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

const DEFAULT_CONFIG_HEADER: &str =
    "# RegScope configuration. Every key is optional; REGSCOPE_* variables override it.\n\n";

/// Existing `.env` style files, highest precedence first.
fn env_file_candidates(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join(".env")];
    candidates.extend(home.map(|h| h.join(".regscope.env")));
    candidates.retain(|path| path.is_file());
    candidates
}

/// Existing TOML config files, highest precedence first.
fn config_file_candidates(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join(".regscope.toml")];
    candidates.extend(home.map(|h| h.join(".regscope").join("config.toml")));
    candidates.retain(|path| path.is_file());
    candidates
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegScopeConfig::default();
        assert_eq!(config.gateway.cache_ttl_secs, 3600);
        assert_eq!(config.sampling.word_count_titles, 2);
        assert_eq!(config.sampling.complexity_titles, 1);
        assert_eq!(config.history.words_per_regulation, 500);
        assert_eq!(config.history.events.len(), 5);
    }

    #[test]
    fn test_config_validation() {
        let config = RegScopeConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());

        let mut bad_level = config.clone();
        bad_level.logging.level = "loud".to_string();
        assert!(ConfigManager::validate_config(&bad_level).is_err());

        let mut zero_cap = config.clone();
        zero_cap.sampling.word_count_titles = 0;
        assert!(ConfigManager::validate_config(&zero_cap).is_err());

        let mut bad_event = config.clone();
        bad_event.history.events.push(CalendarEvent::new(2024, 13, "Nope"));
        assert!(ConfigManager::validate_config(&bad_event).is_err());

        let mut bad_url = config;
        bad_url.gateway.base_url = "not a url".to_string();
        assert!(ConfigManager::validate_config(&bad_url).is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: RegScopeConfig = toml::from_str(
            r#"
            [sampling]
            word_count_titles = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.sampling.word_count_titles, 3);
        assert_eq!(config.sampling.complexity_titles, 1);
        assert_eq!(config.gateway.base_url, "https://www.ecfr.gov");
    }
}

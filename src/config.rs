use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::doc::fetcher::default_user_agent;
use crate::doc::parser::TocParser;
use crate::doc::{DocCategory, DocType};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub categories: CategoriesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Pre-warm every enabled category when a long-lived session starts.
    #[serde(default)]
    pub refresh_cache_on_load: bool,

    /// Seconds allowed for a single TOC fetch.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,

    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_log_file")]
    pub log_file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoriesConfig {
    #[serde(default)]
    pub apex: CategoryConfig,
    #[serde(default)]
    pub visualforce: CategoryConfig,
    #[serde(default)]
    pub service_console: CategoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Whether the category takes part in "all categories" requests.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub exclude_from_all_documentation_command: bool,

    /// Overrides `settings.refresh_cache_on_load` for this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_cache_on_load: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc_source_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_base_url: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| Error::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults with `SFREF_*` environment overrides applied. Used
    /// where no file is read, such as when writing a fresh one.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Loads the file at `path`, or the default location when `path` is `None`.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file at an explicit path is an error.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_with_env(path),
            None => {
                let default_path = Self::default_path()?;
                if default_path.exists() {
                    Self::load_with_env(default_path)
                } else {
                    let config = Self::from_env();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.settings.timeout == 0 {
            return Err(Error::Config("Timeout must be greater than 0".to_string()));
        }

        let parser = TocParser::new();
        for category in DocCategory::ALL {
            let overrides = self.category(category);
            for url in [&overrides.toc_source_url, &overrides.doc_base_url].into_iter().flatten() {
                parser.validate_toc_url(url).map_err(|e| {
                    Error::Config(format!("categories.{}: {}", category.config_key(), e))
                })?;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("SFREF_REFRESH_CACHE_ON_LOAD") {
            if let Some(flag) = parse_flag(&value) {
                self.settings.refresh_cache_on_load = flag;
            }
        }

        if let Ok(timeout) = std::env::var("SFREF_TIMEOUT") {
            if let Ok(val) = timeout.parse() {
                self.settings.timeout = val;
            }
        }

        if let Ok(level) = std::env::var("SFREF_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn category(&self, category: DocCategory) -> &CategoryConfig {
        match category {
            DocCategory::Apex => &self.categories.apex,
            DocCategory::Visualforce => &self.categories.visualforce,
            DocCategory::ServiceConsole => &self.categories.service_console,
        }
    }

    pub fn category_mut(&mut self, category: DocCategory) -> &mut CategoryConfig {
        match category {
            DocCategory::Apex => &mut self.categories.apex,
            DocCategory::Visualforce => &mut self.categories.visualforce,
            DocCategory::ServiceConsole => &mut self.categories.service_console,
        }
    }

    /// The registry descriptor for `category` with any configured URL overrides applied.
    pub fn doc_type(&self, category: DocCategory) -> DocType {
        let overrides = self.category(category);
        let mut doc_type = DocType::builtin(category);
        if let Some(url) = &overrides.toc_source_url {
            doc_type = doc_type.with_toc_source_url(url.clone());
        }
        if let Some(url) = &overrides.doc_base_url {
            doc_type = doc_type.with_doc_base_url(url.clone());
        }
        doc_type
    }

    /// Categories taking part in the "all documentation" command.
    pub fn categories_for_all(&self) -> Vec<DocCategory> {
        DocCategory::ALL
            .into_iter()
            .filter(|c| {
                let cfg = self.category(*c);
                cfg.enabled && !cfg.exclude_from_all_documentation_command
            })
            .collect()
    }

    /// Categories to pre-warm when a session starts.
    pub fn categories_for_prewarm(&self) -> Vec<DocCategory> {
        DocCategory::ALL
            .into_iter()
            .filter(|c| {
                let cfg = self.category(*c);
                cfg.enabled
                    && cfg
                        .refresh_cache_on_load
                        .unwrap_or(self.settings.refresh_cache_on_load)
            })
            .collect()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout)
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("sfref"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_cache_on_load: false,
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            log_to_file: false,
            log_file: default_log_file(),
        }
    }
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            exclude_from_all_documentation_command: false,
            refresh_cache_on_load: None,
            toc_source_url: None,
            doc_base_url: None,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_file() -> String {
    "sfref.log".to_string()
}

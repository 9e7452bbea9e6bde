//! Configuration management for confmark.
//!
//! Parses `confmark.toml` with serde and discovers the file in the current
//! directory or its parents.
//!
//! Precedence, lowest first: file values, the
//! `CONFLUENCE_PRESERVE_INLINE_ATTACHMENTS` environment variable, then
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `confluence.base_url`
//! - `confluence.username`
//! - `confluence.api_token`
//! - `confluence.personal_token`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "confmark.toml";

/// Environment variable that overrides `conversion.inline_attachments`.
pub const INLINE_ATTACHMENTS_ENV: &str = "CONFLUENCE_PRESERVE_INLINE_ATTACHMENTS";

/// CLI settings that override configuration values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override Confluence base URL.
    pub base_url: Option<String>,
    /// Override inline attachment rewriting.
    pub inline_attachments: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confluence site and credentials.
    pub confluence: Option<ConfluenceConfig>,
    /// Conversion behavior.
    pub conversion: ConversionConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Conversion configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Rewrite images and attachment references to download links.
    pub inline_attachments: bool,
}

/// Confluence configuration.
#[derive(Debug, Deserialize)]
pub struct ConfluenceConfig {
    /// Confluence site base URL.
    pub base_url: String,
    /// Cloud account email, used with `api_token`.
    #[serde(default)]
    pub username: Option<String>,
    /// Cloud API token.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Server/Data Center personal access token.
    #[serde(default)]
    pub personal_token: Option<String>,
}

/// Credentials selected from [`ConfluenceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials<'a> {
    /// Username and API token.
    Basic {
        /// Account email or username.
        username: &'a str,
        /// API token.
        api_token: &'a str,
    },
    /// Personal access token.
    Bearer(&'a str),
}

impl ConfluenceConfig {
    /// Validate the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the URL is empty or not http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "confluence.base_url")?;
        require_http_url(&self.base_url, "confluence.base_url")?;
        Ok(())
    }

    /// Credentials to authenticate with.
    ///
    /// Username and API token win over a personal token when both are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if neither form is complete.
    pub fn credentials(&self) -> Result<Credentials<'_>, ConfigError> {
        match (
            non_empty(self.username.as_deref()),
            non_empty(self.api_token.as_deref()),
            non_empty(self.personal_token.as_deref()),
        ) {
            (Some(username), Some(api_token), _) => Ok(Credentials::Basic {
                username,
                api_token,
            }),
            (_, _, Some(token)) => Ok(Credentials::Bearer(token)),
            (Some(_), None, None) => Err(ConfigError::Validation(
                "confluence.api_token is required with confluence.username".to_owned(),
            )),
            _ => Err(ConfigError::Validation(
                "confluence.username and confluence.api_token, or confluence.personal_token, \
                 must be set"
                    .to_owned(),
            )),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`confluence.api_token`").
        field: String,
        /// Error message (e.g., "${`CONFLUENCE_API_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Truthy values of boolean environment variables.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

impl Config {
    /// Load configuration with environment and CLI overrides.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `confmark.toml` in the current directory and parents, and falls
    /// back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if parsing,
    /// expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        config.apply_env(std::env::var(INLINE_ATTACHMENTS_ENV).ok().as_deref());

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings)?;
        }

        Ok(config)
    }

    /// Base URL of the configured site, if any.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.confluence.as_ref().map(|c| c.base_url.as_str())
    }

    /// Get validated Confluence configuration.
    ///
    /// Use this instead of the `confluence` field when the command talks to
    /// the REST API.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or its
    /// base URL or credentials are invalid.
    pub fn require_confluence(&self) -> Result<&ConfluenceConfig, ConfigError> {
        let conf = self.confluence.as_ref().ok_or_else(|| {
            ConfigError::Validation("[confluence] section required in config".into())
        })?;
        conf.validate()?;
        conf.credentials()?;
        Ok(conf)
    }

    /// Apply the inline attachments environment override.
    fn apply_env(&mut self, inline_attachments: Option<&str>) {
        if let Some(value) = inline_attachments {
            self.conversion.inline_attachments = parse_flag(value);
        }
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        if let Some(base_url) = &settings.base_url {
            require_http_url(base_url, "--base-url")?;
            match &mut self.confluence {
                Some(confluence) => confluence.base_url.clone_from(base_url),
                None => {
                    self.confluence = Some(ConfluenceConfig {
                        base_url: base_url.clone(),
                        username: None,
                        api_token: None,
                        personal_token: None,
                    });
                }
            }
        }
        if let Some(inline_attachments) = settings.inline_attachments {
            self.conversion.inline_attachments = inline_attachments;
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Credentials are only checked by [`require_confluence`](Self::require_confluence).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(confluence) = &self.confluence {
            confluence.validate()?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let Some(confluence) = &mut self.confluence else {
            return Ok(());
        };

        confluence.base_url = expand::expand_env(&confluence.base_url, "confluence.base_url")?;
        for (value, field) in [
            (&mut confluence.username, "confluence.username"),
            (&mut confluence.api_token, "confluence.api_token"),
            (&mut confluence.personal_token, "confluence.personal_token"),
        ] {
            if let Some(raw) = value {
                *raw = expand::expand_env(raw, field)?;
            }
        }

        Ok(())
    }
}

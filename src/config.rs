//! Application configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TEMPLATE_FILE};
use crate::error::{Error, Result};
use crate::stanza::StyleTag;

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The application name
    app_name: String,
    /// The application version
    app_version: String,
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Path to the Word template
    pub template_path: PathBuf,
    /// Style applied to every generated rhyme paragraph
    pub paragraph_style: Option<StyleTag>,
}

impl Config {
    /// Get the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            template_path: PathBuf::from(DEFAULT_TEMPLATE_FILE),
            paragraph_style: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse::<u16>().map_err(|_| {
                Error::config(
                    format!("PORT must be a number between 0 and 65535, got {port:?}"),
                    "Set PORT to a value like 5000 or remove it to use the default",
                )
            })?;
        }

        if let Some(path) = lookup("TEMPLATE_PATH").filter(|p| !p.trim().is_empty()) {
            config.template_path = PathBuf::from(shellexpand::tilde(path.trim()).to_string());
        }

        config.paragraph_style = lookup("PARAGRAPH_STYLE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(StyleTag::new);

        Ok(config)
    }

    /// Use the Word template at `path`
    #[must_use]
    pub fn with_template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = path.into();
        self
    }

    /// Whether the template file is present
    pub fn template_exists(&self) -> bool {
        self.template_path.is_file()
    }
}

use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::API_URL;

const APP_DIR: &str = "taskdesk";
const CONFIG_FILE: &str = "config.toml";
const TOKEN_FILE: &str = "token";

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Settings read from `<config dir>/taskdesk/config.toml`. Flags and
/// environment variables override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

fn default_api_url() -> String {
    API_URL.to_string()
}

fn default_token_path() -> PathBuf {
    config_dir().join(TOKEN_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_path: default_token_path(),
        }
    }
}

impl Config {
    pub fn load() -> eyre::Result<Self> {
        let path = config_dir().join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Config::default());
        }

        info!(path = %path.display(), "loading config");
        Self::parse(&fs::read_to_string(&path)?)
    }

    pub fn parse(content: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies command-line or environment values on top of the file.
    pub fn with_overrides(mut self, api_url: Option<String>, token_path: Option<PathBuf>) -> Self {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }

        if let Some(token_path) = token_path {
            self.token_path = token_path;
        }

        self
    }
}

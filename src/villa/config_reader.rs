use std::fs;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::villa::client::DEFAULT_CACHE_TTL;
use crate::villa::io_gsheets::DEFAULT_API_BASE;
use crate::villa::*;

pub const DEFAULT_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1bkrQ4q4maV0eAt4Ap4cBL5XNWvrgq0SLV3EsEcieTF4/edit?gid=0#gid=0";
pub const DEFAULT_WORKSHEET_NAME: &str = "Participants";
pub const DEFAULT_SECRETS_PATH: &str = "secrets.json";

/// The content of the JSON configuration file. Every field is optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "sheetUrl")]
    pub sheet_url: Option<String>,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
    #[serde(rename = "secretsPath")]
    pub secrets_path: Option<String>,
    #[serde(rename = "cacheTtlSeconds")]
    pub cache_ttl_seconds: Option<u64>,
    #[serde(rename = "apiBase")]
    pub api_base: Option<String>,
}

impl AppConfig {
    /// Fields set in `other` take precedence.
    pub fn merge(self, other: AppConfig) -> AppConfig {
        AppConfig {
            sheet_url: other.sheet_url.or(self.sheet_url),
            worksheet_name: other.worksheet_name.or(self.worksheet_name),
            secrets_path: other.secrets_path.or(self.secrets_path),
            cache_ttl_seconds: other.cache_ttl_seconds.or(self.cache_ttl_seconds),
            api_base: other.api_base.or(self.api_base),
        }
    }

    pub fn target(&self) -> SheetTarget {
        SheetTarget {
            url: self
                .sheet_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SHEET_URL.to_string()),
            worksheet: self
                .worksheet_name
                .clone()
                .unwrap_or_else(|| DEFAULT_WORKSHEET_NAME.to_string()),
        }
    }

    pub fn secrets_path(&self) -> &str {
        self.secrets_path.as_deref().unwrap_or(DEFAULT_SECRETS_PATH)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

pub fn read_config(path: &str) -> SheetResult<AppConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: AppConfig =
        serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

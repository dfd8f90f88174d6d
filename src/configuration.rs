use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_aux::field_attributes::{
    deserialize_bool_from_anything, deserialize_number_from_string,
};

use crate::services::RetryPolicy;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub directory: DirectorySettings,
    pub api_keys: ApiKeys,
    pub description: DescriptionSettings,
    pub business_lookup: BusinessLookupSettings,
    pub export: ExportSettings,
}

#[derive(Deserialize, Clone)]
pub struct DirectorySettings {
    pub start_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_pages: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Deserialize, Clone)]
pub struct ApiKeys {
    pub openai: String,
    #[serde(default)]
    pub google_maps: String,
}

#[derive(Deserialize, Clone)]
pub struct DescriptionSettings {
    pub model: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_tokens: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub temperature: f32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub concurrency: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_attempts: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub base_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct BusinessLookupSettings {
    #[serde(deserialize_with = "deserialize_bool_from_anything")]
    pub enabled: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub radius_m: u32,
    pub place_type: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub concurrency: usize,
}

#[derive(Deserialize, Clone)]
pub struct ExportSettings {
    pub snapshot_path: PathBuf,
    pub enriched_path: PathBuf,
}

impl DirectorySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn page_limit(&self) -> usize {
        self.max_pages.max(1)
    }
}

impl DescriptionSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

/// Layers `configuration/base.yaml`, the file for `APP_ENVIRONMENT`, then
/// `APP_*` variables (`APP_DIRECTORY__MAX_PAGES=5`). `API_URL` and
/// `OPENAI_API_KEY` are honoured as well.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename))
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("directory.start_url", std::env::var("API_URL").ok())?
        .set_override_option("api_keys.openai", std::env::var("OPENAI_API_KEY").ok())?
        .build()?;

    settings.try_deserialize::<Settings>()
}

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;

use crate::domain::processing::ProcessingConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub processing: ProcessingConfig,
    pub inference: InferenceConfig,
    pub logging: LoggingConfig,
}

/// Remote inference service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub model_id: String,
    /// Falls back to the AWS default chain when unset
    pub region: Option<String>,
    pub temperature: f32,
    pub max_tokens: i32,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_id: "us.anthropic.claude-sonnet-4-5-20250929-v1:0".to_string(),
            region: None,
            temperature: 0.3,
            max_tokens: 4096,
            connect_timeout_secs: 60,
            read_timeout_secs: 300,
            max_attempts: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `APP__*` variables.
    ///
    /// Any source that fails to parse or deserialize is an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(Self::sources())
    }

    /// File and environment sources, lowest precedence first
    fn sources() -> ConfigBuilder<DefaultState> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

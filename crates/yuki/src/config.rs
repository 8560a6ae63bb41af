//! Layered configuration for the whole gateway.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Bundled defaults (include_str! from yuki.toml)
//! 2. `~/.config/yuki/yuki.toml`
//! 3. `./yuki.toml`
//! 4. `YUKI_`-prefixed environment variables, `__` between section and key
//!    (e.g. `YUKI_SESSION__STORAGE=sqlite`)

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use yuki_error::{ConfigError, YukiResult};
use yuki_inference::InferenceConfig;
use yuki_rate_limit::RateLimitConfig;
use yuki_storage::StorageConfig;

const DEFAULT_CONFIG: &str = include_str!("../../../yuki.toml");

/// Log output format.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `yuki=debug,info`
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Settings for every component, built once at startup and handed to each
/// component's constructor by reference.
///
/// # Example
///
/// ```no_run
/// use yuki::YukiConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = YukiConfig::load()?;
/// println!("talking to {}", config.inference.base_url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YukiConfig {
    /// Upstream inference server
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Session storage
    #[serde(default)]
    pub session: StorageConfig,
    /// Admission control
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl YukiConfig {
    /// Load configuration from every source.
    ///
    /// Missing user files are skipped. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value is invalid.
    #[instrument]
    pub fn load() -> YukiResult<Self> {
        debug!("Loading configuration: env > current dir > home dir > bundled defaults");

        let mut builder = Self::defaults();
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/yuki/yuki.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }
        builder = builder.add_source(File::with_name("yuki").required(false));

        Self::finish(builder.add_source(environment()))
    }

    /// Bundled defaults overlaid with one TOML document.
    ///
    /// User files and the process environment are not consulted.
    pub fn from_toml(overrides: &str) -> YukiResult<Self> {
        Self::finish(Self::defaults().add_source(File::from_str(overrides, FileFormat::Toml)))
    }

    /// Bundled defaults overlaid with a TOML document and an explicit
    /// environment source.
    pub fn from_sources(overrides: &str, env: Environment) -> YukiResult<Self> {
        Self::finish(
            Self::defaults()
                .add_source(File::from_str(overrides, FileFormat::Toml))
                .add_source(env),
        )
    }

    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> YukiResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.inference.validate()?;
        self.session.validate()?;
        self.rate_limit.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::new("logging.level must not be empty"));
        }
        Ok(())
    }
}

/// The `YUKI_` environment source.
pub fn environment() -> Environment {
    Environment::with_prefix("YUKI")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

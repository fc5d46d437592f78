use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::Credentials;
use crate::registry::LoadWhileShowPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    #[serde(default = "AdUnitSettings::rewarded")]
    pub rewarded: AdUnitSettings,
    #[serde(default)]
    pub interstitial: AdUnitSettings,
    #[serde(default)]
    pub banner: AdUnitSettings,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Network name used in logs
    #[serde(default = "default_network_name")]
    pub name: String,
    /// Application id passed to SDK init
    pub app_id: String,
    #[serde(default)]
    pub app_signature: Option<String>,
    /// Settings JSON field carrying the placement id
    #[serde(default = "default_placement_field")]
    pub placement_field: String,
}

fn default_network_name() -> String {
    "simulated".to_string()
}

fn default_placement_field() -> String {
    "placementId".to_string()
}

impl NetworkConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            app_id: self.app_id.clone(),
            app_signature: self.app_signature.clone(),
        }
    }
}

/// Behaviour of one ad unit type
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdUnitSettings {
    #[serde(default)]
    pub load_while_show: LoadWhileShowPolicy,
    /// Start a new load as soon as a shown ad is closed
    #[serde(default)]
    pub auto_reload_on_close: bool,
    /// Loaded ads older than this are no longer available
    #[serde(default)]
    pub max_ad_age_secs: Option<u64>,
}

impl AdUnitSettings {
    /// Rewarded video defaults: other placements may load during a show
    pub fn rewarded() -> Self {
        Self {
            load_while_show: LoadWhileShowPolicy::ByNetwork,
            ..Self::default()
        }
    }

    pub fn max_ad_age(&self) -> Option<chrono::Duration> {
        self.max_ad_age_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }
}

/// Knobs for the simulated SDK used by the demo
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_init_delay")]
    pub init_delay_ms: u64,
    /// Make SDK init fail
    #[serde(default)]
    pub init_fails: bool,
    #[serde(default = "default_load_delay")]
    pub load_delay_ms: u64,
    /// Probability (0..=1) that a load is filled
    #[serde(default = "default_fill_rate")]
    pub fill_rate: f64,
    #[serde(default = "default_show_duration")]
    pub show_duration_ms: u64,
}

fn default_init_delay() -> u64 {
    200
}

fn default_load_delay() -> u64 {
    150
}

fn default_fill_rate() -> f64 {
    0.9
}

fn default_show_duration() -> u64 {
    300
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            init_delay_ms: default_init_delay(),
            init_fails: false,
            load_delay_ms: default_load_delay(),
            fill_rate: default_fill_rate(),
            show_duration_ms: default_show_duration(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("network.name", default_network_name())?
            .set_default("network.placement_field", default_placement_field())?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("MEDLEY_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (MEDLEY_NETWORK__APP_ID, etc.)
            .add_source(
                Environment::with_prefix("MEDLEY")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration for CLI usage
    pub fn default_config(app_id: &str) -> Self {
        Self {
            network: NetworkConfig {
                name: default_network_name(),
                app_id: app_id.to_string(),
                app_signature: None,
                placement_field: default_placement_field(),
            },
            rewarded: AdUnitSettings::rewarded(),
            interstitial: AdUnitSettings::default(),
            banner: AdUnitSettings::default(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.network.name.trim().is_empty() {
            errors.push("network.name must not be empty".to_string());
        }

        if let Err(e) = self.network.credentials().validate() {
            errors.push(format!("network credentials: {}", e));
        }

        if self.network.placement_field.trim().is_empty() {
            errors.push("network.placement_field must not be empty".to_string());
        }

        if !(0.0..=1.0).contains(&self.simulation.fill_rate) {
            errors.push("simulation.fill_rate must be between 0 and 1".to_string());
        }

        for (name, settings) in [
            ("rewarded", &self.rewarded),
            ("interstitial", &self.interstitial),
            ("banner", &self.banner),
        ] {
            if settings.max_ad_age_secs == Some(0) {
                errors.push(format!("{}.max_ad_age_secs must be positive", name));
            } else if settings.max_ad_age_secs.is_some() && settings.max_ad_age().is_none() {
                errors.push(format!("{}.max_ad_age_secs is out of range", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

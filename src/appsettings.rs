use std::fmt;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::dispatch::PurgePolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Deserialize)]
pub struct TelegramSettings {
    pub token: String,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
pub struct StoreSettings {
    pub url: String,
    pub secret_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("url", &self.url)
            .field("secret_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Deserialize, Debug)]
pub struct MessengerSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MessengerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SweepSettings {
    /// Zero disables the in-process ticker; sweeps then only run on trigger.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub purge_policy: PurgePolicy,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            purge_policy: PurgePolicy::default(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub telegram: TelegramSettings,
    /// Without a store section reminders are kept in memory.
    pub store: Option<StoreSettings>,
    #[serde(default)]
    pub messenger: MessengerSettings,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sweep: SweepSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Self::from_config(settings)
    }

    pub fn from_config(settings: Config) -> Result<Self, ConfigError> {
        settings.try_deserialize()
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_timezone() -> Tz {
    Tz::Europe__Paris
}

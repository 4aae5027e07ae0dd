use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub gateway: GatewaySettings,
    pub feed: FeedSettings,
    pub refresh: RefreshSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub page_size: u32,
}

/// Auto-refresh period per role, in seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct RefreshSettings {
    pub patient_secs: u64,
    pub staff_secs: u64,
    pub admin_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            patient_secs: 60,
            staff_secs: 30,
            admin_secs: 60,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("CLINICFLOW"),
            )
            .set_default("gateway.base_url", "http://localhost:54321")?
            .set_default("gateway.timeout_secs", 10)?
            .set_default("feed.page_size", 20)?
            .set_default("refresh.patient_secs", 60)?
            .set_default("refresh.staff_secs", 30)?
            .set_default("refresh.admin_secs", 60)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway: GatewaySettings {
                base_url: "http://localhost:54321".to_string(),
                api_key: None,
                timeout_secs: 10,
            },
            feed: FeedSettings { page_size: 20 },
            refresh: RefreshSettings::default(),
        }
    }
}

use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Deserializer};

use crate::transport::{
    Endpoints, HttpTransportFactory, TransportConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};

const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    pub api_key: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_period", deserialize_with = "humantime_duration")]
    pub period: Duration,
    #[serde(default = "default_timeout", deserialize_with = "humantime_duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_timeout", deserialize_with = "humantime_duration")]
    pub read_timeout: Duration,
}
impl ReporterConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("invalid reporter config")?;
        if config.period.is_zero() {
            anyhow::bail!("period must be non-zero");
        }
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("in {}", path.display()))
    }

    pub fn endpoints(&self) -> anyhow::Result<Endpoints> {
        Endpoints::new(&self.base_url, &self.api_key)
            .with_context(|| format!("invalid base url {}", self.base_url))
    }

    pub fn transport(&self) -> HttpTransportFactory {
        HttpTransportFactory::new(TransportConfig {
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
        })
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_period() -> Duration {
    DEFAULT_PERIOD
}
fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn humantime_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

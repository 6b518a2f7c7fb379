//! Dashboard configuration: a RON file with defaults, then environment overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dashboard_engine::{
    ApiSettings, CredentialSettings, EngineConfig, ReconcilerSettings, TransferLookup,
    TransportSettings, DEFAULT_PAGE_SIZE,
};
use dashboard_logging::{level_from_name, LogDestination};
use log::LevelFilter;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "transfer-dashboard.ron";
const ENV_PREFIX: &str = "TRANSFER_DASHBOARD_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LookupMode {
    #[default]
    JobTransfers,
    Direct,
}

impl From<LookupMode> for TransferLookup {
    fn from(mode: LookupMode) -> Self {
        match mode {
            LookupMode::JobTransfers => TransferLookup::JobTransfers,
            LookupMode::Direct => TransferLookup::Direct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub base_url: String,
    /// Defaults to `{base_url}/oauth/token`.
    pub token_url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub poll_interval_secs: u64,
    pub settle_delay_ms: u64,
    pub page_size: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub transfer_lookup: LookupMode,
    pub log_level: String,
    pub log_destination: String,
    pub log_file: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token_url: None,
            client_id: String::new(),
            client_secret: String::new(),
            poll_interval_secs: 10,
            settle_delay_ms: 1500,
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            transfer_lookup: LookupMode::default(),
            log_level: "info".to_string(),
            log_destination: "file".to_string(),
            log_file: PathBuf::from("transfer-dashboard.log"),
        }
    }
}

impl DashboardConfig {
    /// Reads the config file, then applies environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `transfer-dashboard.ron` in
    /// the working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        ron::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
        };
        if let Some(value) = var("BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = var("TOKEN_URL") {
            self.token_url = Some(value);
        }
        if let Some(value) = var("CLIENT_ID") {
            self.client_id = value;
        }
        if let Some(value) = var("CLIENT_SECRET") {
            self.client_secret = value;
        }
    }

    pub fn token_url(&self) -> String {
        match &self.token_url {
            Some(url) => url.clone(),
            None => format!("{}/oauth/token", self.base_url.trim_end_matches('/')),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        level_from_name(&self.log_level)
    }

    pub fn log_destination(&self) -> LogDestination {
        LogDestination::from_name(&self.log_destination)
    }

    pub fn to_engine_config(&self) -> Result<EngineConfig> {
        if self.base_url.trim().is_empty() {
            bail!("no base url configured (set base_url or {ENV_PREFIX}BASE_URL)");
        }
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            bail!(
                "client credentials are incomplete (set client_id and client_secret or \
                 {ENV_PREFIX}CLIENT_ID and {ENV_PREFIX}CLIENT_SECRET)"
            );
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }

        let mut api = ApiSettings::new(self.base_url.clone());
        api.page_size = self.page_size;
        api.transfer_lookup = self.transfer_lookup.into();

        let mut engine = EngineConfig::new(
            api,
            CredentialSettings::new(self.token_url(), &self.client_id, &self.client_secret),
        );
        engine.transport = TransportSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        };
        engine.reconciler = ReconcilerSettings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        };
        engine.poll_interval = Duration::from_secs(self.poll_interval_secs);
        Ok(engine)
    }
}

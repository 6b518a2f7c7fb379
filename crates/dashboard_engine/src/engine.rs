use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, ApiSettings};
use crate::auth::{CredentialManager, CredentialSettings};
use crate::clock::{Clock, SystemClock};
use crate::poller::{Poller, PollerHandle, DEFAULT_POLL_INTERVAL};
use crate::reconcile::{Reconciler, ReconcilerSettings, Timestamper};
use crate::transport::{HttpTransport, ReqwestTransport, TransportSettings};
use crate::RequestError;

/// Everything needed to talk to one orchestration service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api: ApiSettings,
    pub credentials: CredentialSettings,
    pub transport: TransportSettings,
    pub reconciler: ReconcilerSettings,
    pub poll_interval: Duration,
}

impl EngineConfig {
    pub fn new(api: ApiSettings, credentials: CredentialSettings) -> Self {
        Self {
            api,
            credentials,
            transport: TransportSettings::default(),
            reconciler: ReconcilerSettings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Wires transport, credentials, API client and reconciler together.
pub struct DashboardEngine {
    reconciler: Arc<Reconciler>,
    poll_interval: Duration,
}

impl DashboardEngine {
    pub fn new(config: EngineConfig, fetched_utc: Timestamper) -> Result<Self, RequestError> {
        let transport = Arc::new(ReqwestTransport::new(&config.transport)?);
        Self::with_transport(config, transport, Arc::new(SystemClock), fetched_utc)
    }

    pub fn with_transport(
        config: EngineConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        fetched_utc: Timestamper,
    ) -> Result<Self, RequestError> {
        let credentials = Arc::new(CredentialManager::new(
            Arc::clone(&transport),
            clock,
            config.credentials,
        ));
        let api = Arc::new(ApiClient::new(transport, credentials, config.api)?);
        let reconciler = Reconciler::new(api, config.reconciler, fetched_utc);
        Ok(Self {
            reconciler,
            poll_interval: config.poll_interval,
        })
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn start_polling(&self) -> PollerHandle {
        Poller::spawn(Arc::clone(&self.reconciler), self.poll_interval)
    }
}

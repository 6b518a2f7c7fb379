//! Dashboard engine: authenticated service access and the reconciler runtime.
mod api;
mod auth;
mod clock;
mod engine;
mod error;
mod poller;
mod reconcile;
mod transport;
mod types;

pub use api::{ApiClient, ApiSettings, TransferLookup, DEFAULT_PAGE_SIZE};
pub use auth::{AuthError, Credential, CredentialManager, CredentialSettings, TOKEN_SAFETY_MARGIN};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{DashboardEngine, EngineConfig};
pub use error::DashboardError;
pub use poller::{Poller, PollerHandle, DEFAULT_POLL_INTERVAL};
pub use reconcile::{Reconciler, ReconcilerSettings, Timestamper, DEFAULT_SETTLE_DELAY};
pub use transport::{
    BearerToken, HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, ReqwestTransport,
    TransportSettings,
};
pub use types::{FailureKind, RequestError};

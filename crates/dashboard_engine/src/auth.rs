//! Client-credentials token cache with coalesced refresh.
//!
//! A [`CredentialManager`] hands out bearer tokens. The first caller to find
//! the cache empty or expired starts a refresh; every caller arriving while
//! that refresh is outstanding awaits the same shared future, so the token
//! endpoint sees one request and all callers see one outcome.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use dashboard_logging::{dash_debug, dash_info, dash_warn};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;

use crate::clock::Clock;
use crate::transport::{HttpRequest, HttpTransport, Method, RequestBody};

/// Tokens are treated as expired this long before the service says they are.
pub const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Upper bound on how long a token is cached, whatever `expires_in` says.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("token request failed: {0}")]
    Transport(String),
    #[error("token response could not be parsed: {0}")]
    InvalidResponse(String),
}

#[derive(Clone)]
pub struct CredentialSettings {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub safety_margin: Duration,
}

impl CredentialSettings {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            safety_margin: TOKEN_SAFETY_MARGIN,
        }
    }
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("safety_margin", &self.safety_margin)
            .finish()
    }
}

#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: Instant,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

type RefreshFuture = Shared<BoxFuture<'static, Result<Credential, AuthError>>>;

#[derive(Default)]
struct CacheState {
    current: Option<Credential>,
    refresh: Option<(u64, RefreshFuture)>,
    generation: u64,
}

pub struct CredentialManager {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    settings: Arc<CredentialSettings>,
    state: Mutex<CacheState>,
}

impl CredentialManager {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        settings: CredentialSettings,
    ) -> Self {
        Self {
            transport,
            clock,
            settings: Arc::new(settings),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns a bearer token valid at the time of the call.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        let (generation, refresh) = {
            let mut state = self.lock_state();
            let now = self.clock.now();
            if let Some(credential) = state.current.as_ref().filter(|c| now < c.expires_at) {
                return Ok(credential.token.clone());
            }
            if let Some((generation, refresh)) = state.refresh.clone() {
                dash_debug!("Joining outstanding token refresh #{}", generation);
                (generation, refresh)
            } else {
                state.generation += 1;
                let generation = state.generation;
                let refresh = self.start_refresh();
                state.refresh = Some((generation, refresh.clone()));
                dash_debug!("Starting token refresh #{}", generation);
                (generation, refresh)
            }
        };

        let outcome = refresh.await;

        let mut state = self.lock_state();
        if matches!(&state.refresh, Some((current, _)) if *current == generation) {
            state.refresh = None;
            match &outcome {
                Ok(credential) => {
                    dash_info!("Obtained access token (refresh #{})", generation);
                    state.current = Some(credential.clone());
                }
                Err(err) => dash_warn!("Token refresh #{} failed: {}", generation, err),
            }
        }
        outcome.map(|credential| credential.token)
    }

    /// Drops the cached token so the next call refreshes. An outstanding
    /// refresh is left to finish.
    pub fn invalidate(&self) {
        if self.lock_state().current.take().is_some() {
            dash_info!("Cached access token invalidated");
        }
    }

    /// Expiry of the cached token, if any.
    pub fn expires_at(&self) -> Option<Instant> {
        self.lock_state().current.as_ref().map(|c| c.expires_at)
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_refresh(&self) -> RefreshFuture {
        let transport = Arc::clone(&self.transport);
        let clock = Arc::clone(&self.clock);
        let settings = Arc::clone(&self.settings);
        async move { request_token(transport.as_ref(), clock.as_ref(), &settings).await }
            .boxed()
            .shared()
    }
}

async fn request_token(
    transport: &dyn HttpTransport,
    clock: &dyn Clock,
    settings: &CredentialSettings,
) -> Result<Credential, AuthError> {
    let requested_at = clock.now();
    let body = RequestBody::Form(vec![
        ("client_id".to_string(), settings.client_id.clone()),
        ("client_secret".to_string(), settings.client_secret.clone()),
        ("grant_type".to_string(), "client_credentials".to_string()),
    ]);
    let request = HttpRequest::new(Method::Post, settings.token_url.clone()).with_body(body);

    let response = transport
        .send(request)
        .await
        .map_err(|err| AuthError::Transport(err.to_string()))?;
    if !response.is_success() {
        return Err(AuthError::Rejected {
            status: response.status,
            body: response.body,
        });
    }

    let parsed: TokenResponse = serde_json::from_str(&response.body)
        .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
    let ttl = Duration::from_secs(parsed.expires_in).min(MAX_TOKEN_LIFETIME);
    let lifetime = ttl.saturating_sub(settings.safety_margin);

    Ok(Credential {
        token: parsed.access_token,
        expires_at: requested_at + lifetime,
    })
}

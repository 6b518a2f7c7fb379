#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use dashboard_engine::{
    ApiSettings, CredentialSettings, DashboardEngine, EngineConfig, FailureKind, HttpRequest,
    HttpResponse, HttpTransport, ManualClock, Method, ReconcilerSettings, RequestError,
};
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://orchestrator.test/api/v2";
pub const TOKEN_URL: &str = "http://auth.test/oauth/token";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(dashboard_logging::initialize_for_tests);
}

#[derive(Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(FailureKind),
}

/// In-memory service keyed by method and path. The last reply queued for a
/// route repeats; unknown routes answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Reply::Respond(HttpResponse::new(status, body.to_string())));
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Reply::Respond(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, method: Method, path: &str, kind: FailureKind) {
        self.push(method, path, Reply::Fail(kind));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && path_of(&request.url) == path)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, method: Method, path: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::Respond(HttpResponse::new(404, r#"{"message":"no such route"}"#)),
        }
    }
}

#[async_trait::async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let path = path_of(&request.url);
        let method = request.method;
        self.requests.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply(method, &path) {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(kind) => Err(RequestError {
                kind,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

pub fn path_of(url: &str) -> String {
    url::Url::parse(url).unwrap().path().to_string()
}

pub fn api_path(suffix: &str) -> String {
    format!("/api/v2{suffix}")
}

pub fn token_path() -> &'static str {
    "/oauth/token"
}

pub fn grant_token(transport: &ScriptedTransport, token: &str, ttl_secs: u64) {
    transport.respond(
        Method::Post,
        token_path(),
        200,
        json!({"access_token": token, "expires_in": ttl_secs, "token_type": "Bearer"}),
    );
}

pub fn engine_config() -> EngineConfig {
    let mut config = EngineConfig::new(
        ApiSettings::new(BASE_URL),
        CredentialSettings::new(TOKEN_URL, "dashboard", "s3cret"),
    );
    config.reconciler = ReconcilerSettings {
        settle_delay: Duration::from_millis(1500),
    };
    config
}

pub fn engine(transport: Arc<ScriptedTransport>) -> DashboardEngine {
    DashboardEngine::with_transport(
        engine_config(),
        transport,
        Arc::new(ManualClock::new()),
        Arc::new(|| "2026-10-17T12:00:00Z".to_string()),
    )
    .unwrap()
}

pub fn job_json(id: &str, status: &str) -> Value {
    json!({
        "jobId": id,
        "name": format!("Job {id}"),
        "status": status,
        "actions": [{"type": "COPY", "status": {"state": status}, "target": "s3://bucket"}],
        "triggers": [{"type": "HOT_FOLDER", "events": ["CREATED"], "path": "/incoming"}]
    })
}

pub fn transfer_json(transferred: u64, total: u64) -> Value {
    json!({
        "transferId": "t-1",
        "state": "IN_PROGRESS",
        "currentRateBitsPerSecond": 8_000_000.0,
        "transferProgress": {
            "transferred": {"bytes": transferred, "count": 1},
            "remaining": {"bytes": total - transferred, "count": 3}
        },
        "objectsManifest": {"summary": {"bytes": total, "count": 4}}
    })
}

pub fn search_returns(transport: &ScriptedTransport, jobs: Vec<Value>) {
    transport.respond(Method::Post, &api_path("/jobs/search"), 200, json!({"items": jobs}));
}

use std::sync::Arc;

use dashboard_core::{Job, JobId, JobPatch, Transfer};
use dashboard_logging::{dash_debug, dash_warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::auth::CredentialManager;
use crate::transport::{BearerToken, HttpRequest, HttpResponse, HttpTransport, Method, RequestBody};
use crate::{FailureKind, RequestError};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
const IN_PROGRESS: &str = "IN_PROGRESS";

/// How the active transfer of an in-progress job is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferLookup {
    /// `GET /jobs/{jobId}/transfers?state=IN_PROGRESS`, first item.
    #[default]
    JobTransfers,
    /// `GET /transfers/{jobId}`.
    Direct,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub page_size: u32,
    pub sort_by: String,
    pub transfer_lookup: TransferLookup,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: "lastModifiedOn".to_string(),
            transfer_lookup: TransferLookup::default(),
        }
    }
}

#[derive(Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Authenticated access to the orchestration service's job and transfer endpoints.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<CredentialManager>,
    base: Url,
    settings: ApiSettings,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<CredentialManager>,
        settings: ApiSettings,
    ) -> Result<Self, RequestError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| RequestError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(RequestError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        Ok(Self {
            transport,
            credentials,
            base,
            settings,
        })
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// All jobs, most recently active first, bounded by the page size.
    pub async fn search_jobs(&self) -> Result<Vec<Job>, RequestError> {
        let body = json!({
            "sortBy": self.settings.sort_by,
            "sortOrder": "DESC",
            "limit": self.settings.page_size,
        });
        let url = self.endpoint(&["jobs", "search"]);
        let response = self.execute(Method::Post, url, RequestBody::Json(body)).await?;
        let page: Items<Value> = decode(&response)?;
        let returned = page.items.len();
        let jobs: Vec<Job> = page
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Job>(item) {
                Ok(job) => Some(job),
                Err(err) => {
                    dash_warn!("Skipping unreadable job in search results: {}", err);
                    None
                }
            })
            .collect();
        dash_debug!("Job search returned {} jobs, {} readable", returned, jobs.len());
        Ok(jobs)
    }

    /// The job's active transfer, `None` when the service reports none.
    pub async fn active_transfer(&self, job_id: &JobId) -> Result<Option<Transfer>, RequestError> {
        match self.settings.transfer_lookup {
            TransferLookup::JobTransfers => {
                let mut url = self.endpoint(&["jobs", job_id.as_str(), "transfers"]);
                url.query_pairs_mut().append_pair("state", IN_PROGRESS);
                let response = self.execute(Method::Get, url, RequestBody::Empty).await?;
                let page: Items<Transfer> = decode(&response)?;
                Ok(page.items.into_iter().next())
            }
            TransferLookup::Direct => {
                let url = self.endpoint(&["transfers", job_id.as_str()]);
                match self.execute(Method::Get, url, RequestBody::Empty).await {
                    Ok(response) => decode(&response).map(Some),
                    Err(err) if err.status() == Some(404) => Ok(None),
                    Err(err) => Err(err),
                }
            }
        }
    }

    pub async fn get_job(&self, job_id: &JobId) -> Result<Job, RequestError> {
        let url = self.endpoint(&["jobs", job_id.as_str()]);
        let response = self.execute(Method::Get, url, RequestBody::Empty).await?;
        decode(&response)
    }

    pub async fn patch_job(&self, job_id: &JobId, patch: &JobPatch) -> Result<(), RequestError> {
        let url = self.endpoint(&["jobs", job_id.as_str()]);
        let body = serde_json::to_value(patch).map_err(RequestError::decode)?;
        self.execute(Method::Patch, url, RequestBody::Json(body))
            .await
            .map(drop)
    }

    pub async fn delete_job(&self, job_id: &JobId) -> Result<(), RequestError> {
        let url = self.endpoint(&["jobs", job_id.as_str()]);
        self.execute(Method::Delete, url, RequestBody::Empty)
            .await
            .map(drop)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: RequestBody,
    ) -> Result<HttpResponse, RequestError> {
        let token = self.credentials.get_token().await?;
        let request = HttpRequest::new(method, url.to_string())
            .with_bearer(BearerToken::new(token))
            .with_body(body);

        let response = self.transport.send(request).await?;
        if response.status == 401 {
            dash_warn!("{} {} was unauthorized; dropping cached token", method, url.path());
            self.credentials.invalidate();
        }
        if !response.is_success() {
            return Err(RequestError::from_status(response.status, &response.body));
        }
        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, RequestError> {
    serde_json::from_str(&response.body).map_err(RequestError::decode)
}

//! Fleets client.
//!
//! [`FleetsClient`] is the seam the resource controller talks to. The ARM
//! implementation issues `PUT`/`GET`/`DELETE` against
//! `{endpoint}{fleet id}?api-version=...` and tracks long-running operations
//! through the `Azure-AsyncOperation` and `Location` response headers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

use super::models::{strip_nulls, ApiErrorResponse, Fleet, OperationStatus};
use super::FleetId;
use crate::error::{Error, Result};
use crate::model::Sensitive;

/// Default Azure Resource Manager endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// API version of `Microsoft.AzureFleet/fleets`
pub const DEFAULT_API_VERSION: &str = "2024-11-01";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";

/// Handle on an accepted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LongRunningOperation {
    /// The API finished the operation synchronously.
    Done,
    /// Poll the `Azure-AsyncOperation` status URL.
    AsyncOperation {
        url: String,
        retry_after: Option<Duration>,
    },
    /// Poll the `Location` URL until it stops returning 202.
    Location {
        url: String,
        retry_after: Option<Duration>,
    },
}

impl LongRunningOperation {
    /// Server-suggested delay before the next probe.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Done => None,
            Self::AsyncOperation { retry_after, .. } | Self::Location { retry_after, .. } => {
                *retry_after
            }
        }
    }
}

/// Result of one status probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed { status: String, message: String },
}

impl OperationState {
    /// Maps an ARM status string. Anything not terminal keeps polling.
    pub fn from_status(status: &str, message: Option<String>) -> Self {
        if status.eq_ignore_ascii_case("Succeeded") {
            Self::Succeeded
        } else if status.eq_ignore_ascii_case("Failed") || status.eq_ignore_ascii_case("Canceled") {
            Self::Failed {
                status: status.to_string(),
                message: message.unwrap_or_default(),
            }
        } else {
            Self::InProgress
        }
    }
}

/// Operations the resource controller needs from the Azure Fleet API.
#[async_trait]
pub trait FleetsClient: Send + Sync {
    /// Fetches a fleet. A missing fleet is `Error::NotFound`.
    async fn get(&self, id: &FleetId) -> Result<Fleet>;

    /// Starts a create-or-update.
    async fn begin_create_or_update(&self, id: &FleetId, fleet: &Fleet)
        -> Result<LongRunningOperation>;

    /// Starts a delete.
    async fn begin_delete(&self, id: &FleetId) -> Result<LongRunningOperation>;

    /// Probes a long-running operation once.
    async fn operation_status(&self, operation: &LongRunningOperation) -> Result<OperationState>;
}

/// Configuration for the ARM client
#[derive(Debug, Clone)]
pub struct ArmFleetsClientConfig {
    /// Resource Manager endpoint, without trailing slash
    pub endpoint: String,
    /// `api-version` query parameter
    pub api_version: String,
    /// Request timeout
    pub timeout: Duration,
    /// Bearer token
    pub token: Option<Sensitive>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ArmFleetsClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token: None,
            user_agent: format!("azurefleet/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for creating an ArmFleetsClient
pub struct ArmFleetsClientBuilder {
    config: ArmFleetsClientConfig,
}

impl ArmFleetsClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ArmFleetsClientConfig::default(),
        }
    }

    /// Set the Resource Manager endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the API version
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.config.api_version = api_version.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the bearer token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(Sensitive::new(token));
        self
    }

    /// Set the user agent string
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ArmFleetsClient> {
        ArmFleetsClient::from_config(self.config)
    }
}

impl Default for ArmFleetsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client for the Azure Resource Manager fleets API
pub struct ArmFleetsClient {
    client: Client,
    config: ArmFleetsClientConfig,
}

impl ArmFleetsClient {
    fn from_config(config: ArmFleetsClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn builder() -> ArmFleetsClientBuilder {
        ArmFleetsClientBuilder::new()
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn url(&self, id: &FleetId) -> String {
        format!(
            "{}{}?api-version={}",
            self.config.endpoint, id, self.config.api_version
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    /// Turns a non-success response into an error.
    async fn error_for(response: Response, id: &str) -> Error {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Error::NotFound(id.to_string());
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .map(|detail| detail.describe())
            .unwrap_or(body);
        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    fn long_running_operation(headers: &HeaderMap) -> LongRunningOperation {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let retry_after = header(RETRY_AFTER.as_str())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        if let Some(url) = header(AZURE_ASYNC_OPERATION) {
            LongRunningOperation::AsyncOperation { url, retry_after }
        } else if let Some(url) = header(LOCATION) {
            LongRunningOperation::Location { url, retry_after }
        } else {
            LongRunningOperation::Done
        }
    }
}

#[async_trait]
impl FleetsClient for ArmFleetsClient {
    async fn get(&self, id: &FleetId) -> Result<Fleet> {
        let url = self.url(id);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, &id.to_string()).await);
        }
        Ok(response.json::<Fleet>().await?)
    }

    async fn begin_create_or_update(
        &self,
        id: &FleetId,
        fleet: &Fleet,
    ) -> Result<LongRunningOperation> {
        let url = self.url(id);
        let mut body = serde_json::to_value(fleet)?;
        strip_nulls(&mut body);
        debug!("PUT {}", url);

        let response = self
            .authorize(self.client.put(&url))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, &id.to_string()).await);
        }
        Ok(Self::long_running_operation(response.headers()))
    }

    async fn begin_delete(&self, id: &FleetId) -> Result<LongRunningOperation> {
        let url = self.url(id);
        debug!("DELETE {}", url);

        let response = self.authorize(self.client.delete(&url)).send().await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(LongRunningOperation::Done),
            status if status.is_success() => Ok(Self::long_running_operation(response.headers())),
            _ => Err(Self::error_for(response, &id.to_string()).await),
        }
    }

    async fn operation_status(&self, operation: &LongRunningOperation) -> Result<OperationState> {
        match operation {
            LongRunningOperation::Done => Ok(OperationState::Succeeded),
            LongRunningOperation::AsyncOperation { url, .. } => {
                let response = self.authorize(self.client.get(url)).send().await?;
                if !response.status().is_success() {
                    return Err(Self::error_for(response, url).await);
                }
                let status: OperationStatus = response.json().await?;
                debug!("operation {} reports {}", url, status.status);
                Ok(OperationState::from_status(
                    &status.status,
                    status.error.map(|e| e.describe()),
                ))
            }
            LongRunningOperation::Location { url, .. } => {
                let response = self.authorize(self.client.get(url)).send().await?;
                match response.status() {
                    StatusCode::ACCEPTED => Ok(OperationState::InProgress),
                    status if status.is_success() => Ok(OperationState::Succeeded),
                    _ => Err(Self::error_for(response, url).await),
                }
            }
        }
    }
}

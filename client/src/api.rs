//! HTTP client for the count API
//!
//! Thin typed wrapper over reqwest. Non-2xx responses are decoded into
//! the shared error taxonomy so callers can branch on
//! `ClientError::InvalidSessionState` and friends instead of status
//! codes.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use shared::{
    CountSession, CreateSessionRequest, CreatedSession, FinalizeResponse, Page, ScanRequest,
    SessionFilter, SetQuantityRequest, StockLedgerEntry, Store, Variant,
};

/// Client for the count-session API
#[derive(Debug, Clone)]
pub struct CountApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl CountApi {
    /// Create a client for `base_url` (e.g. `http://pos.local:3000`)
    /// authenticating with the given bearer token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// List the tenant's stores
    pub async fn list_stores(&self) -> ClientResult<Vec<Store>> {
        let response = self
            .http
            .get(self.url("/stores"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// List count sessions with optional filters
    pub async fn list_sessions(&self, filter: &SessionFilter) -> ClientResult<Page<CountSession>> {
        let response = self
            .http
            .get(self.url("/counts"))
            .query(filter)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Create a count session in draft
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> ClientResult<CreatedSession> {
        let response = self
            .http
            .post(self.url("/counts"))
            .json(request)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Fetch one session with its lines. This is also the
    /// resynchronization path after any failed mutating call.
    pub async fn get_session(&self, session_id: Uuid) -> ClientResult<CountSession> {
        let response = self
            .http
            .get(self.url(&format!("/counts/{}", session_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Apply a scan. Not idempotent (each call adds); never auto-retry.
    pub async fn scan(&self, session_id: Uuid, request: &ScanRequest) -> ClientResult<CountSession> {
        let response = self
            .http
            .post(self.url(&format!("/counts/{}/scan", session_id)))
            .json(request)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Overwrite one line's counted quantity
    pub async fn set_quantity(
        &self,
        session_id: Uuid,
        request: &SetQuantityRequest,
    ) -> ClientResult<CountSession> {
        let response = self
            .http
            .put(self.url(&format!("/counts/{}/lines", session_id)))
            .json(request)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Finalize the session, committing deltas to the stock ledger
    pub async fn finalize(&self, session_id: Uuid) -> ClientResult<FinalizeResponse> {
        let response = self
            .http
            .post(self.url(&format!("/counts/{}/finalize", session_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Search catalog variants
    pub async fn search_variants(
        &self,
        query: &str,
        store_id: Option<Uuid>,
        limit: Option<u32>,
    ) -> ClientResult<Vec<Variant>> {
        let mut request = self
            .http
            .get(self.url("/variants/search"))
            .query(&[("q", query)]);
        if let Some(store_id) = store_id {
            request = request.query(&[("store_id", store_id.to_string())]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.bearer_auth(&self.token).send().await?;
        Self::decode(response).await
    }

    /// Ledger entries written by a session's finalize
    pub async fn session_ledger(&self, session_id: Uuid) -> ClientResult<Vec<StockLedgerEntry>> {
        let response = self
            .http
            .get(self.url(&format!("/counts/{}/ledger", session_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
        Err(match body.error.code.as_str() {
            "MISSING_IDENTIFIER" => ClientError::MissingIdentifier,
            "VARIANT_NOT_FOUND" => ClientError::VariantNotFound,
            "INVALID_SESSION_STATE" => ClientError::InvalidSessionState(body.error.message),
            "NOT_FOUND" => ClientError::NotFound(body.error.message),
            _ => ClientError::Api {
                status: status.as_u16(),
                code: body.error.code,
                message: body.error.message,
            },
        })
    }
}

//! Dashboard REST API Client
//!
//! Typed async client for the dashboard API. Attaches the bearer credential
//! when one is set and tags every request with an `X-Request-ID`.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::dto::*;
use super::error::{ClientError, ClientResult};
use crate::config::ApiConfig;

const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Dashboard API client
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace (or clear) the bearer credential
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    // ============================================
    // Auth
    // ============================================

    /// Exchange credentials for a bearer token. Does not store it.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let builder = self.anonymous_request(Method::POST, "/auth/login").json(&body);
        self.execute(builder).await
    }

    /// Revoke the session server-side
    pub async fn logout(&self) -> ClientResult<()> {
        let _: serde_json::Value = self
            .post("/auth/logout", &serde_json::json!({ "refresh_token": null }))
            .await?;
        Ok(())
    }

    // ============================================
    // Sync / health
    // ============================================

    pub async fn trigger_sync(&self, force: bool) -> ClientResult<SyncResponse> {
        let path = if force { "/sync?force=1" } else { "/sync" };
        self.post(path, &serde_json::json!({})).await
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.get("/health").await
    }

    // ============================================
    // Overview
    // ============================================

    pub async fn weekly(&self, limit: usize) -> ClientResult<WeeklyResponse> {
        self.get(&format!("/weekly?limit={}", limit)).await
    }

    /// Totals per activity type, optionally restricted to `[start, end]`
    pub async fn activity_totals(
        &self,
        range: Option<(&str, &str)>,
    ) -> ClientResult<ActivityTotalsResponse> {
        let path = match range {
            Some((start, end)) => format!(
                "/activity_totals?start={}&end={}",
                urlencoding::encode(start),
                urlencoding::encode(end)
            ),
            None => "/activity_totals".to_string(),
        };
        self.get(&path).await
    }

    pub async fn insights(&self) -> ClientResult<InsightsPayload> {
        self.get("/insights").await
    }

    // ============================================
    // Activities
    // ============================================

    pub async fn activities(&self, query: &ActivitiesQuery) -> ClientResult<ActivitiesResponse> {
        let mut path = format!(
            "/activities?type={}&limit={}&offset={}",
            urlencoding::encode(&query.activity_type),
            query.limit,
            query.offset
        );
        if let Some(start) = &query.start {
            path.push_str(&format!("&start={}", urlencoding::encode(start)));
        }
        if let Some(end) = &query.end {
            path.push_str(&format!("&end={}", urlencoding::encode(end)));
        }
        self.get(&path).await
    }

    pub async fn activity_detail(&self, id: &str) -> ClientResult<ActivityDetail> {
        self.get(&activity_path(id, "")).await
    }

    pub async fn activity_summary(&self, id: &str) -> ClientResult<ActivitySummary> {
        self.get(&activity_path(id, "/summary")).await
    }

    pub async fn activity_series(&self, id: &str) -> ClientResult<SeriesResponse> {
        self.get(&activity_path(id, "/series")).await
    }

    pub async fn activity_route(&self, id: &str) -> ClientResult<RouteResponse> {
        self.get(&activity_path(id, "/route")).await
    }

    pub async fn activity_laps(&self, id: &str) -> ClientResult<LapsResponse> {
        self.get(&activity_path(id, "/laps")).await
    }

    pub async fn activity_segments(&self, id: &str) -> ClientResult<ActivitySegmentsResponse> {
        self.get(&activity_path(id, "/segments")).await
    }

    pub async fn segments_best(&self) -> ClientResult<SegmentsBestResponse> {
        self.get("/segments_best").await
    }

    // ============================================
    // Insights / assistant
    // ============================================

    pub async fn insights_series(
        &self,
        metric: &str,
        weeks: u32,
    ) -> ClientResult<InsightSeriesResponse> {
        self.get(&format!(
            "/insights/series?metric={}&weeks={}",
            urlencoding::encode(metric),
            weeks
        ))
        .await
    }

    pub async fn insights_evaluate(
        &self,
        request: &EvaluateRequest,
    ) -> ClientResult<EvaluateResponse> {
        self.post("/insights/evaluate", request).await
    }

    /// Record a context event. The acknowledgement body is ignored.
    pub async fn insights_context(&self, event: &ContextEvent) -> ClientResult<()> {
        let _: serde_json::Value = self.post("/insights/context", event).await?;
        Ok(())
    }

    pub async fn assistant_overview(&self) -> ClientResult<AssistantOverview> {
        self.get("/assistant/overview").await
    }

    // ============================================
    // Transport
    // ============================================

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let builder = self.request(Method::GET, path).await;
        self.execute(builder).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.request(Method::POST, path).await.json(body);
        self.execute(builder).await
    }

    /// Request without the bearer credential
    fn anonymous_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.anonymous_request(method, path);
        if let Some(token) = self.token.read().await.as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let request = builder.build().map_err(ClientError::Request)?;
        let method = request.method().clone();
        let url = request.url().path().to_string();
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        tracing::debug!(request_id = %request_id, %method, path = %url, "Dispatching request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(request_id = %request_id, path = %url, "Credential rejected");
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(
                request_id = %request_id,
                status = status.as_u16(),
                path = %url,
                "Request failed"
            );
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(ClientError::from_transport)?;
        if bytes.is_empty() {
            // Bodyless acknowledgements decode as JSON null
            return serde_json::from_slice(b"null").map_err(|e| ClientError::Decode(e.to_string()));
        }
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn activity_path(id: &str, suffix: &str) -> String {
    format!("/activity/{}{}", urlencoding::encode(id), suffix)
}

use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use sarovar_core::config::LayeredConfig;
use sarovar_core::error::{BackendError, BackendResult};
use sarovar_core::models::{CollectionQuery, Geometry};
use sarovar_core::ports::{
    ComputeBackend, ExportRequest, ExportTicket, FeatureQuery, FeatureRecord, ReduceOutput,
    ReduceRequest, RegionView, SeriesPoint, SeriesRequest, ThumbnailRequest, VideoRequest,
};

/// Environment variable holding an optional bearer token.
pub const TOKEN_ENV: &str = "SAROVAR_BACKEND_TOKEN";

/// Compute backend reached over HTTP
///
/// Every operation is a JSON `POST {endpoint}/v1/<operation>` whose body
/// is the request graph as serialized by `sarovar-core`.
pub struct HttpBackend {
    /// Base URL (e.g., "http://localhost:8085")
    endpoint: String,

    /// Bearer token sent with every request, if any
    token: Option<String>,

    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { endpoint: endpoint.into().trim_end_matches('/').to_string(), token: None, timeout, client }
    }

    /// Create from the layered configuration, picking the token up from the environment
    pub fn from_config(config: &LayeredConfig) -> Self {
        let backend = Self::new(
            config.backend_endpoint.value.clone(),
            Duration::from_secs(config.request_timeout_secs.value),
        );
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => backend.with_token(token),
            _ => backend,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/v1/{}", self.endpoint, operation)
    }

    fn post<B, R>(&self, operation: &str, body: &B) -> BackendResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        // Use tokio runtime to execute async request
        let runtime = tokio::runtime::Runtime::new().map_err(|e| BackendError::Transport {
            message: format!("Failed to create async runtime: {}", e),
        })?;

        let url = self.url(operation);
        tracing::debug!(%url, "Backend request");

        runtime.block_on(async {
            let mut request = self.client.post(&url).json(body);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(|e| self.transport_error(&e))?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let error_text = response.text().await.unwrap_or_default();
                let error = status_error(status, error_text, self.timeout.as_secs());
                tracing::warn!(operation, status, error = %error, "Backend request failed");
                return Err(error);
            }

            response.json::<R>().await.map_err(|e| BackendError::Rejected {
                message: format!("Unexpected response to {}: {}", operation, e),
            })
        })
    }

    fn transport_error(&self, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout { seconds: self.timeout.as_secs() }
        } else {
            BackendError::Transport { message: format!("{} ({})", error, self.endpoint) }
        }
    }
}

/// Map a non-success HTTP status and its body to a backend error.
fn status_error(status: u16, body: String, timeout_secs: u64) -> BackendError {
    match status {
        401 | 403 => BackendError::PermissionDenied { message: body },
        408 | 504 => BackendError::Timeout { seconds: timeout_secs },
        _ if body.trim().is_empty() => BackendError::Rejected { message: format!("HTTP {}", status) },
        _ => BackendError::from_message(body),
    }
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct DateResponse {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct FeatureResponse {
    feature: Option<FeatureRecord>,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    points: Vec<SeriesPoint>,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: String,
}

impl ComputeBackend for HttpBackend {
    fn collection_size(&self, query: &CollectionQuery) -> BackendResult<usize> {
        self.post::<_, CountResponse>("collection/size", query).map(|r| r.count)
    }

    fn first_acquisition(&self, query: &CollectionQuery) -> BackendResult<Option<NaiveDate>> {
        self.post::<_, DateResponse>("collection/first-date", query).map(|r| r.date)
    }

    fn reduce_region(&self, request: &ReduceRequest) -> BackendResult<ReduceOutput> {
        self.post("image/reduce-region", request)
    }

    fn time_series(&self, request: &SeriesRequest) -> BackendResult<Vec<SeriesPoint>> {
        self.post::<_, SeriesResponse>("collection/series", request).map(|r| r.points)
    }

    fn first_feature(&self, query: &FeatureQuery) -> BackendResult<Option<FeatureRecord>> {
        self.post::<_, FeatureResponse>("features/first", query).map(|r| r.feature)
    }

    fn locate(&self, roi: &Geometry) -> BackendResult<RegionView> {
        self.post("geometry/locate", roi)
    }

    fn thumbnail_url(&self, request: &ThumbnailRequest) -> BackendResult<String> {
        self.post::<_, UrlResponse>("image/thumbnail", request).map(|r| r.url)
    }

    fn video_thumbnail_url(&self, request: &VideoRequest) -> BackendResult<String> {
        self.post::<_, UrlResponse>("collection/video", request).map(|r| r.url)
    }

    fn start_export(&self, request: &ExportRequest) -> BackendResult<ExportTicket> {
        self.post("export/start", request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_backend_creation() {
        let backend = HttpBackend::new("http://compute:8085/", Duration::from_secs(30));
        assert_eq!(backend.endpoint(), "http://compute:8085");
        assert_eq!(backend.url("collection/size"), "http://compute:8085/v1/collection/size");
        assert!(backend.token.is_none());

        let backend = backend.with_token("secret");
        assert_eq!(backend.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_from_config_uses_endpoint_and_timeout() {
        let config = LayeredConfig::with_defaults();
        let backend = HttpBackend::from_config(&config);
        assert_eq!(backend.endpoint(), config.backend_endpoint.value.trim_end_matches('/'));
        assert_eq!(backend.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_status_mapping() {
        assert!(status_error(403, "forbidden".to_string(), 120).is_permission());
        assert!(status_error(401, String::new(), 120).is_permission());
        assert_eq!(status_error(504, String::new(), 60), BackendError::Timeout { seconds: 60 });
        assert_eq!(status_error(408, String::new(), 5), BackendError::Timeout { seconds: 5 });
        assert!(status_error(400, "serviceUsage API has not been used".to_string(), 120).is_permission());
        assert_eq!(
            status_error(500, "Too many pixels".to_string(), 120),
            BackendError::Rejected { message: "Too many pixels".to_string() }
        );
        assert_eq!(
            status_error(502, "  ".to_string(), 120),
            BackendError::Rejected { message: "HTTP 502".to_string() }
        );
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2));
        let err = backend.collection_size(&CollectionQuery::new("COPERNICUS/S1_GRD")).unwrap_err();
        assert!(matches!(err, BackendError::Transport { .. } | BackendError::Timeout { .. }));
        assert!(!err.is_permission());
    }
}

//! Base-URL resolution and the HTTP client for the tracking backend.

use chrono::{NaiveDate, NaiveTime};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::home::default_sleep_goal;
use crate::models::{AddCaffeinePayload, AuthParams, DailySummaryRequest, ResultEnvelope};
use crate::stats::{StatsPeriod, StatsSeries};
use crate::utils::{format_query_date, format_time_label, parse_time_label};

/// Environment variables consulted, in order, after the config file value
pub const API_URL_ENV_VARS: [&str; 2] = ["SLEEPLOG_API_URL", "API_URL"];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API URL is not configured (set api_url in the config file or SLEEPLOG_API_URL)")]
    MissingBaseUrl,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pick the first non-blank candidate and strip trailing slashes.
pub fn resolve_base_url_from<I>(candidates: I) -> Result<String, ApiError>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(|value| value.trim_end_matches('/').to_string())
        .ok_or(ApiError::MissingBaseUrl)
}

/// Resolve the base URL from the config value, then the environment.
pub fn resolve_base_url(config_value: Option<&str>) -> Result<String, ApiError> {
    let mut candidates = vec![config_value.map(str::to_string)];
    candidates.extend(API_URL_ENV_VARS.iter().map(|key| std::env::var(key).ok()));
    resolve_base_url_from(candidates)
}

/// Join `path` onto an already-normalised base URL
pub fn build_api_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// HTTP client for the sleep/caffeine backend.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth: Option<AuthParams>,
}

impl ApiClient {
    /// Create a client for `base_url` (trailing slashes are stripped).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
        }
    }

    /// Resolve the base URL from config/env and build a client.
    pub fn from_config_value(config_value: Option<&str>) -> Result<Self, ApiError> {
        let base_url = resolve_base_url(config_value)?;
        Ok(Self::new(&base_url))
    }

    pub fn with_auth(mut self, auth: AuthParams) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn set_auth(&mut self, auth: Option<AuthParams>) {
        self.auth = auth;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        build_api_url(&self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(auth) => {
                let request = request.header("X-User-Id", &auth.user_id);
                match &auth.token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            }
            None => request,
        }
    }

    /// Send a request and return the body text of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let resp = self.authorize(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url = %url, "GET");
        let body = self.send(self.client.get(url)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /caffeine/add`. The response body is only checked for
    /// being JSON-ish; an empty body counts as success.
    pub async fn add_caffeine(
        &self,
        payload: &AddCaffeinePayload,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url("/caffeine/add");
        info!(url = %url, menu = %payload.menu_name, "submitting caffeine entry");
        let body = self.send(self.client.post(&url).json(payload)).await?;
        Ok(parse_lenient(&body))
    }

    /// `POST /api/daily-summary`
    pub async fn daily_summary(
        &self,
        request: &DailySummaryRequest,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url("/api/daily-summary");
        info!(url = %url, freshness = request.freshness, "requesting daily summary");
        let body = self.send(self.client.post(&url).json(request)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /api/add/sleapGoal` with the 12-hour label as a plain-text body
    pub async fn set_sleep_goal(&self, goal: NaiveTime) -> Result<(), ApiError> {
        let url = self.url("/api/add/sleapGoal");
        let label = format_time_label(goal);
        info!(url = %url, goal = %label, "saving sleep goal");
        let request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(label);
        self.send(request).await?;
        Ok(())
    }

    /// `GET /api/sleepGoal?date=`; absent or unparsable values fall back
    /// to the default goal.
    pub async fn sleep_goal(&self, date: NaiveDate) -> Result<NaiveTime, ApiError> {
        let url = format!(
            "{}?date={}",
            self.url("/api/sleepGoal"),
            format_query_date(date)
        );
        let envelope: ResultEnvelope<serde_json::Value> = self.get_json(&url).await?;
        Ok(goal_from_result(envelope.result))
    }

    /// `GET /api/conditionTemp?date=`
    pub async fn condition_temp(&self, date: NaiveDate) -> Result<Option<f64>, ApiError> {
        let url = format!(
            "{}?date={}",
            self.url("/api/conditionTemp"),
            format_query_date(date)
        );
        let envelope: ResultEnvelope<f64> = self.get_json(&url).await?;
        Ok(envelope.result)
    }

    /// Aggregate statistics, returned as raw JSON for display
    pub async fn stats(
        &self,
        series: StatsSeries,
        period: StatsPeriod,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url(series.path(period));
        self.get_json(&url).await
    }
}

fn parse_lenient(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

fn goal_from_result(result: Option<serde_json::Value>) -> NaiveTime {
    match result {
        Some(serde_json::Value::String(label)) => parse_time_label(&label).unwrap_or_else(|| {
            warn!(label = %label, "unparsable sleep goal, using default");
            default_sleep_goal()
        }),
        Some(other) => {
            warn!(value = %other, "unexpected sleep goal value, using default");
            default_sleep_goal()
        }
        None => default_sleep_goal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one connection, answer with `status`/`body`, and hand back
    /// the raw request text.
    async fn serve_once(status: u16, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let len = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.trim()
                                .eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn sample_payload() -> AddCaffeinePayload {
        AddCaffeinePayload {
            date_time: "2024-05-01T13:05:09".to_string(),
            store_name: "스타벅스".to_string(),
            size: "Tall".to_string(),
            menu_name: "아메리카노".to_string(),
        }
    }

    #[test]
    fn resolver_prefers_first_non_blank_value() {
        let url = resolve_base_url_from(vec![
            None,
            Some("   ".to_string()),
            Some("https://api.example.com//".to_string()),
            Some("https://ignored.example.com".to_string()),
        ])
        .unwrap();
        assert_eq!(url, "https://api.example.com");
    }

    #[test]
    fn resolver_fails_without_any_value() {
        let err = resolve_base_url_from(vec![None, Some(String::new())]).unwrap_err();
        assert!(matches!(err, ApiError::MissingBaseUrl));
    }

    #[test]
    fn build_api_url_normalises_leading_slash() {
        assert_eq!(build_api_url("http://h", "caffeine/add"), "http://h/caffeine/add");
        assert_eq!(build_api_url("http://h", "/caffeine/add"), "http://h/caffeine/add");
        assert_eq!(build_api_url("http://h", ""), "http://h/");
    }

    #[test]
    fn goal_fallback_covers_bad_values() {
        let default = default_sleep_goal();
        assert_eq!(goal_from_result(None), default);
        assert_eq!(goal_from_result(Some(serde_json::json!("soon"))), default);
        assert_eq!(goal_from_result(Some(serde_json::json!(42))), default);
        let parsed = goal_from_result(Some(serde_json::json!("오전 1:30")));
        assert_eq!((parsed.hour(), parsed.minute()), (1, 30));
    }

    #[tokio::test]
    async fn add_caffeine_posts_json_payload() {
        let (base, server) = serve_once(200, r#"{"ok":true}"#).await;
        let client = ApiClient::new(&base).with_auth(AuthParams {
            user_id: "u1".to_string(),
            token: Some("secret".to_string()),
        });
        let body = client.add_caffeine(&sample_payload()).await.unwrap();
        assert_eq!(body["ok"], true);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /caffeine/add "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.to_ascii_lowercase().contains("x-user-id: u1"));
        assert!(request.contains(r#""dateTime":"2024-05-01T13:05:09""#));
        assert!(request.contains(r#""menuName":"아메리카노""#));
    }

    #[tokio::test]
    async fn server_error_surfaces_status() {
        let (base, server) = serve_once(500, r#"{"error":"boom"}"#).await;
        let client = ApiClient::new(&base);
        let err = client.add_caffeine(&sample_payload()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn sleep_goal_parses_label_and_sends_date() {
        let (base, server) = serve_once(200, r#"{"result":"오후 10:30"}"#).await;
        let client = ApiClient::new(&base);
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let goal = client.sleep_goal(date).await.unwrap();
        assert_eq!((goal.hour(), goal.minute()), (22, 30));
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/sleepGoal?date=2024-05-01 "));
    }

    #[tokio::test]
    async fn condition_temp_accepts_null() {
        let (base, server) = serve_once(200, r#"{"result":null}"#).await;
        let client = ApiClient::new(&base);
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(client.condition_temp(date).await.unwrap(), None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn set_sleep_goal_sends_plain_text_label() {
        let (base, server) = serve_once(200, "").await;
        let client = ApiClient::new(&base);
        client
            .set_sleep_goal(NaiveTime::from_hms_opt(23, 0, 0).unwrap())
            .await
            .unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/add/sleapGoal "));
        assert!(request.ends_with("오후 11:00"));
    }
}

//! HTTP client for the seating endpoints.
//!
//! Wraps `GET /seating/api/seats/{event}`, `GET /seating/api/revisions/{event}`
//! and `POST /seating/api/submit/{event}` using [`reqwest`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use seating_core::snapshot::{Revision, RevisionList, SeatingSnapshot, SubmitLayout, SubmitResponse};
use seating_core::types::RevisionNumber;

use crate::remote::{RemoteError, SeatingRemote};

/// Header carrying the anti-forgery token on every request (`X-CSRFToken`).
pub const CSRF_HEADER: &str = "x-csrftoken";

/// HTTP client for one event's seating plan.
#[derive(Clone)]
pub struct SeatingApi {
    client: reqwest::Client,
    base_url: String,
    event_id: i64,
    csrf_token: Option<String>,
    session_cookie: Option<String>,
}

impl SeatingApi {
    /// * `base_url` - Site root, e.g. `https://example.org`. A trailing
    ///   slash is ignored.
    pub fn new(base_url: impl Into<String>, event_id: i64) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, event_id)
    }

    /// Reuse an existing [`reqwest::Client`] (timeouts, pooling).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        event_id: i64,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            event_id,
            csrf_token: None,
            session_cookie: None,
        }
    }

    /// Send `token` as `X-CSRFToken` and as the `csrftoken` cookie.
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Send `cookie` as the `sessionid` cookie.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    // ---- private helpers ----

    fn url(&self, endpoint: &str) -> String {
        format!("{}/seating/api/{}/{}", self.base_url, endpoint, self.event_id)
    }

    /// Auth headers shared by every request. Values that are not valid
    /// header text are skipped with a warning.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut cookies = Vec::new();

        if let Some(token) = &self.csrf_token {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(CSRF_HEADER, value);
                    cookies.push(format!("csrftoken={token}"));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring CSRF token that is not valid header text")
                }
            }
        }
        if let Some(session) = &self.session_cookie {
            cookies.push(format!("sessionid={session}"));
        }

        if !cookies.is_empty() {
            match HeaderValue::from_str(&cookies.join("; ")) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring cookies that are not valid header text")
                }
            }
        }
        headers
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`RemoteError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SeatingRemote for SeatingApi {
    async fn fetch_seats(
        &self,
        revision: Option<RevisionNumber>,
    ) -> Result<SeatingSnapshot, RemoteError> {
        let mut request = self.client.get(self.url("seats")).headers(self.auth_headers());
        if let Some(number) = revision {
            request = request.query(&[("revision", number)]);
        }

        let response = request.send().await?;
        Self::parse_response(response).await
    }

    async fn fetch_revisions(&self) -> Result<Vec<Revision>, RemoteError> {
        let response = self
            .client
            .get(self.url("revisions"))
            .headers(self.auth_headers())
            .send()
            .await?;

        let list: RevisionList = Self::parse_response(response).await?;
        Ok(list.revisions)
    }

    async fn submit(&self, layout: &SubmitLayout) -> Result<Option<Revision>, RemoteError> {
        let json = serde_json::to_string(layout)?;
        let response = self
            .client
            .post(self.url("submit"))
            .headers(self.auth_headers())
            .form(&[("json", json.as_str())])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let parsed: SubmitResponse = serde_json::from_slice(&body)?;
        Ok(parsed.revision)
    }
}

//! Outbound calls to the user directory service.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;

use crate::error::LookupError;
use crate::models::{Identifier, RawUserRecord, UserListEnvelope};

/// Error bodies kept for diagnostics are cut to this many bytes.
pub const MAX_DIAGNOSTIC_BODY: usize = 4096;

/// Non-success outcomes of a directory call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    NotFound,
    PaymentRequired,
    Unauthorized { status: u16 },
    Status { status: u16, body: String },
    Malformed { status: u16, body: String },
    Transport(String),
}

/// Anything that can resolve an identifier to the directory's raw user records.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch_users(&self, id: &Identifier) -> Result<Vec<RawUserRecord>, UpstreamFailure>;
}

// reqwest-backed client for the bulk user endpoint
pub struct DirectoryClient {
    client: reqwest::Client,
    url: Url,
    api_key: String,
    timeout: Duration,
}

impl DirectoryClient {
    pub fn new(
        client: reqwest::Client,
        url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let url = Url::parse(url)
            .map_err(|e| LookupError::ConfigurationError(format!("invalid upstream url {url:?}: {e}")))?;
        Ok(Self {
            client,
            url,
            api_key: api_key.into(),
            timeout,
        })
    }
}

#[async_trait]
impl Upstream for DirectoryClient {
    async fn fetch_users(&self, id: &Identifier) -> Result<Vec<RawUserRecord>, UpstreamFailure> {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("fids", id.as_str());

        let res = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamFailure::Transport(format!("timed out after {:?}", self.timeout))
                } else {
                    UpstreamFailure::Transport(e.to_string())
                }
            })?;

        let status = res.status();
        let body = if status.is_success() {
            res.text().await
        } else {
            read_capped(res, MAX_DIAGNOSTIC_BODY).await
        }
        .map_err(|e| UpstreamFailure::Transport(format!("failed reading body: {e}")))?;

        classify(status, body)
    }
}

// Stops pulling chunks once `limit` bytes are buffered
async fn read_capped(mut res: reqwest::Response, limit: usize) -> Result<String, reqwest::Error> {
    let mut buf = Vec::new();
    while buf.len() < limit {
        match res.chunk().await? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    buf.truncate(limit);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_DIAGNOSTIC_BODY {
        let mut end = MAX_DIAGNOSTIC_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

// Maps an HTTP status plus body onto records or a typed failure
pub fn classify(status: StatusCode, body: String) -> Result<Vec<RawUserRecord>, UpstreamFailure> {
    match status {
        StatusCode::NOT_FOUND => Err(UpstreamFailure::NotFound),
        StatusCode::PAYMENT_REQUIRED => Err(UpstreamFailure::PaymentRequired),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(UpstreamFailure::Unauthorized {
            status: status.as_u16(),
        }),
        s if s.is_success() => serde_json::from_str::<UserListEnvelope>(&body)
            .map(UserListEnvelope::into_records)
            .map_err(|_| UpstreamFailure::Malformed {
                status: s.as_u16(),
                body: truncate_body(body),
            }),
        s => Err(UpstreamFailure::Status {
            status: s.as_u16(),
            body: truncate_body(body),
        }),
    }
}

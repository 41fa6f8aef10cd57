// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote document store backed by a hosted repository's contents API.
//!
//! Each document is a file on a branch. Writes are read-modify-write: fetch
//! the file's current content hash (`sha`), then PUT the new content with
//! that hash attached. A stale hash makes the API reject the write with a
//! conflict, so concurrent edits are detected rather than overwritten.
//!
//! Handles:
//! - Reads that treat every failure as "absent"
//! - Writes retried a fixed number of times with a fixed pause
//! - Reporting the last HTTP status seen when a write gives up

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::GithubConfig;
use crate::store::{SaveStatus, StoreError};

/// Total write attempts before giving up.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Pause between write attempts.
pub const WRITE_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "deck-tracker";
const ACCEPT: &str = "application/vnd.github+json";

/// Contents API client scoped to one repository and branch.
#[derive(Clone)]
pub struct GithubStore {
    http: reqwest::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    branch: String,
    data_dir: String,
}

impl std::fmt::Debug for GithubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keep the token out of logs
        f.debug_struct("GithubStore")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

/// GET response; only the fields we use.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

impl GithubStore {
    pub fn new(config: &GithubConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Client(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            data_dir: config.data_dir.clone(),
        })
    }

    /// Repository path of a user's document.
    pub fn path_for(&self, user_key: &str) -> String {
        let file = format!("tracker_{}.json", user_key);
        if self.data_dir.is_empty() {
            file
        } else {
            format!("{}/{}", self.data_dir, file)
        }
    }

    fn contents_url(&self, path: &str) -> String {
        let encoded: Vec<_> = path.split('/').map(|s| urlencoding::encode(s)).collect();
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo),
            encoded.join("/")
        )
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT)
    }

    /// Fetch and decode the JSON file at `path`.
    ///
    /// Returns `None` on any failure, including "not found": callers cannot
    /// tell a missing file from a transient error.
    pub async fn read_json(&self, path: &str) -> Option<Value> {
        let url = self.contents_url(path);

        let response = match self
            .request(Method::GET, &url)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path, error = %e, "Remote read failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(path, status = %response.status(), "Remote document not available");
            return None;
        }

        let body: ContentsResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(path, error = %e, "Remote read returned unexpected body");
                return None;
            }
        };

        let encoded = body.content.filter(|c| !c.is_empty())?;
        let decoded = decode_content(&encoded);
        if decoded.is_none() {
            tracing::warn!(path, "Remote document is not valid base64 JSON");
        }
        decoded
    }

    /// Write `data` to `path` as a commit with `message`.
    ///
    /// Never returns an error: after [`MAX_WRITE_ATTEMPTS`] failed attempts
    /// the result is [`SaveStatus::Failed`] with the last HTTP status seen.
    pub async fn write_json<T: Serialize>(&self, path: &str, data: &T, message: &str) -> SaveStatus {
        let content = match serde_json::to_string_pretty(data) {
            Ok(raw) => STANDARD.encode(raw.as_bytes()),
            Err(e) => {
                tracing::error!(path, error = %e, "Failed to encode document");
                return SaveStatus::Failed { status: None };
            }
        };

        let url = self.contents_url(path);
        let mut last_status: Option<u16> = None;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            match self
                .write_once(&url, &content, message, &mut last_status)
                .await
            {
                Ok(()) => {
                    tracing::info!(path, attempt, "Remote document saved");
                    return SaveStatus::Saved;
                }
                Err(status) => {
                    if status.is_some() {
                        last_status = status;
                    }
                    tracing::warn!(path, attempt, status = ?status, "Remote write attempt failed");
                }
            }

            if attempt < MAX_WRITE_ATTEMPTS {
                tokio::time::sleep(WRITE_RETRY_BACKOFF).await;
            }
        }

        tracing::error!(path, status = ?last_status, "Giving up on remote write");
        SaveStatus::Failed {
            status: last_status,
        }
    }

    /// One read-modify-write cycle. `Err` carries the PUT's HTTP status if
    /// there was a response.
    async fn write_once(
        &self,
        url: &str,
        content: &str,
        message: &str,
        last_status: &mut Option<u16>,
    ) -> Result<(), Option<u16>> {
        let sha = self.current_sha(url, last_status).await;

        let payload = PutContentsRequest {
            message,
            content,
            branch: &self.branch,
            sha,
        };

        let response = self
            .request(Method::PUT, url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Remote write request failed");
                e.status().map(|s| s.as_u16())
            })?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, body = %body, "Remote write rejected");
        Err(Some(status.as_u16()))
    }

    /// Content hash of the file currently at `url`, if there is one.
    ///
    /// A 404 means no prior version. Other failures are recorded in
    /// `last_status` and the write goes ahead without a hash.
    async fn current_sha(&self, url: &str, last_status: &mut Option<u16>) -> Option<String> {
        let response = match self
            .request(Method::GET, url)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if let Some(status) = e.status() {
                    *last_status = Some(status.as_u16());
                }
                return None;
            }
        };

        match response.status() {
            status if status.is_success() => response
                .json::<ContentsResponse>()
                .await
                .ok()
                .and_then(|b| b.sha),
            StatusCode::NOT_FOUND => None,
            status => {
                *last_status = Some(status.as_u16());
                None
            }
        }
    }
}

/// Decode a contents-API `content` field: base64 (possibly line-wrapped)
/// over UTF-8 JSON.
fn decode_content(encoded: &str) -> Option<Value> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&text).ok()
}

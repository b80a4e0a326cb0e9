// Redunda HTTP client
//
// Wraps `reqwest::Client` with Redunda URL construction, API-key
// authentication, and status/body handling for the three endpoint
// families: instance status, file listing, and file content.

use bytes::Bytes;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{RemoteFile, StatusPing, StatusReport};
use crate::transport::TransportConfig;

/// Longest body excerpt carried inside an error.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the Redunda coordination service.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference-counted,
/// so the heartbeat and file services can each hold their own copy.
#[derive(Clone)]
pub struct RedundaClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl std::fmt::Debug for RedundaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedundaClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RedundaClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the service root, e.g. `https://redunda.sobotics.org`.
    pub fn new(
        base_url: Url,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, api_key))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, api_key: SecretString) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn key(&self) -> &str {
        self.api_key.expose_secret()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Instance status ──────────────────────────────────────────────

    /// Report liveness and receive the current directive.
    ///
    /// `POST /status.json` with a form body `key=...[&version=...]`.
    pub async fn report_status(&self, version: Option<&str>) -> Result<StatusReport, Error> {
        let url = self.endpoint(&["status.json"])?;
        debug!("POST {}", url);

        let ping = StatusPing {
            key: self.key(),
            version,
        };
        let resp = self.http.post(url).form(&ping).send().await?;
        parse_json(resp).await
    }

    // ── Files ────────────────────────────────────────────────────────

    /// List every file the service stores for this bot.
    ///
    /// `GET /bots/data.json?key=...`
    pub async fn list_files(&self) -> Result<Vec<RemoteFile>, Error> {
        let url = self.endpoint(&["bots", "data.json"])?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[("key", self.key())])
            .send()
            .await?;
        parse_json(resp).await
    }

    /// Download one file by its encoded key.
    ///
    /// Returns `Ok(None)` when the service answers with anything but
    /// `200 OK` (missing file, revoked key, server offline page). Only
    /// transport failures are errors.
    pub async fn download_file(&self, key: &str) -> Result<Option<Bytes>, Error> {
        let url = self.endpoint(&["bots", "data", key])?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[("key", self.key())])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            debug!(%status, file = key, "remote file unavailable");
            return Ok(None);
        }

        let body = resp.bytes().await?;
        trace!(file = key, len = body.len(), "downloaded remote file");
        Ok(Some(body))
    }

    /// Upload one file, unconditionally overwriting the remote copy.
    ///
    /// `POST /bots/data/{key}?key=...` with the raw content as body.
    pub async fn upload_file(&self, key: &str, content: Bytes) -> Result<(), Error> {
        let url = self.endpoint(&["bots", "data", key])?;
        debug!("POST {} ({} bytes)", url, content.len());

        let resp = self
            .http
            .post(url)
            .query(&[("key", self.key())])
            .body(content)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status, resp).await);
        }
        Ok(())
    }
}

// ── Response helpers ─────────────────────────────────────────────────

/// Check the status, then decode the body as JSON.
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(status_error(status, resp).await);
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let body = resp.text().await.unwrap_or_default();
    Error::Status {
        status: status.as_u16(),
        body: preview(&body).to_owned(),
    }
}

/// First few hundred bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

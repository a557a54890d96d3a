//! filebin HTTP client

use crate::error::{CliError, Result};
use crate::types::{EventOutcome, ListedFile};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Client for one filebin server and credential
pub struct FilebinClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl FilebinClient {
    /// Long enough to outlast the server's own long-poll timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

    pub fn new(base_url: &str, username: Option<String>, password: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, username, password, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| CliError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CliError::InvalidUrl(format!(
                "unsupported scheme {:?}",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_deref()),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CliError::Status { status, body })
    }

    /// A line of the upload response as an absolute URL. The server prints
    /// bare ids when it has no base URL configured.
    pub fn absolute_url(&self, line: &str) -> String {
        if line.starts_with("http://") || line.starts_with("https://") {
            line.to_string()
        } else {
            self.endpoint(line)
        }
    }

    /// Upload one file; returns its URL.
    pub async fn upload(&self, path: &Path) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        self.upload_bytes(&filename, data).await
    }

    pub async fn upload_bytes(&self, filename: &str, data: Vec<u8>) -> Result<String> {
        debug!(filename = %filename, size = data.len(), "Uploading");
        let form = Form::new().part("file", Part::bytes(data).file_name(filename.to_string()));
        let request = self.authorize(self.http.post(self.endpoint("/"))).multipart(form);
        let response = Self::check(request.send().await?).await?;

        let body = response.text().await?;
        let line = body.lines().next().unwrap_or_default().trim();
        if line.is_empty() || line == "failed" {
            return Err(CliError::UploadFailed(filename.to_string()));
        }
        Ok(self.absolute_url(line))
    }

    pub async fn list(&self) -> Result<Vec<ListedFile>> {
        let request = self
            .authorize(self.http.get(self.endpoint("/list")))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        let response = Self::check(request.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let request = self.authorize(self.http.delete(self.endpoint(id)));
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// Block until the server reports a change or the long-poll expires.
    pub async fn wait_for_event(&self) -> Result<EventOutcome> {
        let request = self.authorize(self.http.get(self.endpoint("/event")));
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(EventOutcome::TimedOut),
            Err(e) => return Err(e.into()),
        };

        if response.status() == StatusCode::REQUEST_TIMEOUT {
            return Ok(EventOutcome::TimedOut);
        }
        Self::check(response).await?;
        Ok(EventOutcome::Changed)
    }
}

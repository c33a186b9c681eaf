// Submission client: a small blocking HTTP client that uploads one archive
// to the analysis service and classifies whatever comes back.
//
// One request per invocation, no retries. The response body is always read
// as text first and only then inspected, so an HTML error page from a proxy
// can never be mistaken for an analysis result.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::archive::{Archive, ARCHIVE_NAME};
use crate::config::Settings;
use crate::error::{preview, AliceError};
use crate::model::AnalysisResult;

/// Header carrying the project API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Everything needed for one upload. Only constructible with a non-empty key.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRequest<'a> {
    archive: &'a Path,
    api_key: &'a str,
    developer_name: &'a str,
    developer_email: &'a str,
}

impl<'a> SubmissionRequest<'a> {
    pub fn new(archive: &'a Archive, settings: &'a Settings) -> Result<Self, AliceError> {
        Self::from_parts(
            archive.path(),
            settings.require_api_key()?,
            &settings.developer_name,
            &settings.developer_email,
        )
    }

    pub fn from_parts(
        archive: &'a Path,
        api_key: &'a str,
        developer_name: &'a str,
        developer_email: &'a str,
    ) -> Result<Self, AliceError> {
        if api_key.trim().is_empty() {
            return Err(AliceError::Configuration(
                "API key not configured. Run: alice init".into(),
            ));
        }
        Ok(Self {
            archive,
            api_key,
            developer_name,
            developer_email,
        })
    }
}

/// Response body as received: JSON when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Parsed(Value),
    Malformed(String),
}

impl RawResponse {
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(json) => Self::Parsed(json),
            Err(_) => Self::Malformed(body),
        }
    }
}

/// Blocking client bound to one server and timeout.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
}

impl ApiClient {
    /// Build a client for `settings.server_url` with the configured timeout.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.analyze_endpoint(), settings.timeout)
    }

    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("alice-sdk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn auth_headers(api_key: &str) -> Result<HeaderMap, AliceError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(api_key.trim()).map_err(|_| {
            AliceError::Configuration("API key contains characters not allowed in a header".into())
        })?;
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        Ok(headers)
    }

    /// Upload the archive and return the parsed analysis.
    ///
    /// The archive is streamed from disk rather than buffered. The caller
    /// keeps ownership of the file and is responsible for deleting it.
    pub fn submit(&self, request: &SubmissionRequest<'_>) -> Result<AnalysisResult, AliceError> {
        let headers = Self::auth_headers(request.api_key)?;

        let file = File::open(request.archive)
            .map_err(|e| AliceError::archive("Failed to open archive for upload", e))?;
        let len = file
            .metadata()
            .map_err(|e| AliceError::archive("Failed to stat archive", e))?
            .len();
        let part = multipart::Part::reader_with_length(file, len)
            .file_name(ARCHIVE_NAME)
            .mime_str("application/zip")
            .map_err(|e| self.transport_error(e))?;
        let form = multipart::Form::new()
            .part("archive", part)
            .text("developer_email", request.developer_email.to_string())
            .text("developer_name", request.developer_name.to_string());

        info!(endpoint = %self.endpoint, bytes = len, "uploading archive");
        let res = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .multipart(form)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = res.status();
        let body = res.text().map_err(|e| self.transport_error(e))?;
        debug!(status = status.as_u16(), body_len = body.len(), "received response");
        interpret_response(status, body)
    }

    fn transport_error(&self, err: reqwest::Error) -> AliceError {
        let message = if err.is_timeout() {
            format!("Request to {} timed out: {err}", self.endpoint)
        } else if err.is_connect() {
            format!("Could not connect to {}: {err}", self.endpoint)
        } else {
            format!("Request to {} failed: {err}", self.endpoint)
        };
        AliceError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message,
            payload: None,
        }
    }
}

/// Classify a status and body into a result or a typed failure.
pub fn interpret_response(status: StatusCode, body: String) -> Result<AnalysisResult, AliceError> {
    match (status.is_success(), RawResponse::from_body(body)) {
        (true, RawResponse::Parsed(json)) => {
            serde_json::from_value::<AnalysisResult>(json.clone()).map_err(|e| AliceError::Format {
                status: status.as_u16(),
                message: format!("response JSON is not an analysis result: {e}"),
                preview: preview(&json.to_string()),
            })
        }
        (false, RawResponse::Parsed(json)) => Err(AliceError::Transport {
            status: Some(status.as_u16()),
            message: server_error_message(status, &json),
            payload: Some(json),
        }),
        (ok, RawResponse::Malformed(text)) => Err(AliceError::Format {
            status: status.as_u16(),
            message: if ok {
                "server returned a body that is not JSON".into()
            } else {
                "server returned a non-JSON error page; the service may be misdeployed or unreachable behind a proxy".into()
            },
            preview: preview(&text),
        }),
    }
}

fn server_error_message(status: StatusCode, json: &Value) -> String {
    match json.get("error").and_then(Value::as_str) {
        Some(msg) => format!("server responded {status}: {msg}"),
        None => format!("server responded {status}: {json}"),
    }
}

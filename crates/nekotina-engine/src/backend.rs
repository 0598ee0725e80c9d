use std::fmt;

use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::requests::BackendRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Non-success HTTP status.
    Status(u16),
    /// Connection, timeout or body read failure.
    Network,
    /// The body was not JSON.
    MalformedBody,
    /// No API key available.
    NotConfigured,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Status(_) => "status",
            TransportErrorKind::Network => "network",
            TransportErrorKind::MalformedBody => "malformed_body",
            TransportErrorKind::NotConfigured => "not_configured",
        }
    }
}

/// The backend call did not produce a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTransportError {
    kind: TransportErrorKind,
    message: String,
}

impl BackendTransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransportErrorKind::Status(code) => {
                write!(f, "request failed ({code}): {}", self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BackendTransportError {}

/// Executes one request and hands back the raw JSON body.
pub trait Backend: Send + Sync {
    fn execute(&self, request: &BackendRequest) -> Result<Value, BackendTransportError>;
}

/// Google Generative Language API over blocking HTTP.
pub struct GeminiBackend {
    api_base: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl GeminiBackend {
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn endpoint_for(&self, request: &BackendRequest) -> String {
        format!("{}/{}", self.api_base, request.endpoint_path())
    }
}

impl Backend for GeminiBackend {
    fn execute(&self, request: &BackendRequest) -> Result<Value, BackendTransportError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(BackendTransportError::new(
                TransportErrorKind::NotConfigured,
                "NEKOTINA_API_KEY, GEMINI_API_KEY or GOOGLE_API_KEY not set",
            ));
        };
        let endpoint = self.endpoint_for(request);
        let payload = request.body_json().map_err(|err| {
            BackendTransportError::new(
                TransportErrorKind::MalformedBody,
                format!("request body could not be encoded: {err}"),
            )
        })?;
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .map_err(|err| describe_send_error(request, err))?;
        response_json_or_error(request, response)
    }
}

fn describe_send_error(request: &BackendRequest, err: reqwest::Error) -> BackendTransportError {
    let what = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    // reqwest errors embed the URL, which carries the key as a query param.
    let err = err.without_url();
    BackendTransportError::network(format!(
        "{} request {what} ({}): {err}",
        request.intent().as_str(),
        request.endpoint_path()
    ))
}

fn response_json_or_error(
    request: &BackendRequest,
    response: HttpResponse,
) -> Result<Value, BackendTransportError> {
    let status = response.status();
    let code = status.as_u16();
    let body = response.text().map_err(|err| {
        BackendTransportError::network(format!(
            "{} response body read failed: {}",
            request.endpoint_path(),
            err.without_url()
        ))
    })?;
    if !status.is_success() {
        return Err(BackendTransportError::new(
            TransportErrorKind::Status(code),
            truncate_text(&body, 512),
        ));
    }
    serde_json::from_str(&body).map_err(|err| {
        BackendTransportError::new(
            TransportErrorKind::MalformedBody,
            format!(
                "{} returned invalid JSON payload: {err}",
                request.endpoint_path()
            ),
        )
    })
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

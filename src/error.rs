use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the client and the pagination driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A single request/response exchange that did not produce a usable body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not connect to {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Status {
        status: StatusCode,
        url: String,
        message: String,
    },

    #[error("failed to decode response body (url={url})")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status(),
            Self::Decode { .. } => None,
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    // API management gateway: {"statusCode":401,"message":"..."}
    #[serde(default, rename = "statusCode")]
    pub(crate) status_code: Option<u16>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    // Backend errors: {"title":...,"detail":...}
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) detail: Option<String>,
    // GraphQL: {"errors":[{"message":...}]}
    #[serde(default)]
    pub(crate) errors: Vec<GraphQlError>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct GraphQlError {
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl ApiErrorResponse {
    fn summary(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for s in [&self.title, &self.message, &self.detail].into_iter().flatten() {
            if !s.is_empty() {
                parts.push(s);
            }
        }
        parts.extend(self.errors.iter().filter_map(|e| e.message.as_deref()));
        parts.join("\n")
    }
}

pub(crate) fn format_api_error(status: StatusCode, url: &str, body: &str) -> TransportError {
    let parsed = serde_json::from_str::<ApiErrorResponse>(body).ok();
    let server_message = match &parsed {
        Some(e) => e.summary(),
        None => body.trim().to_string(),
    };
    let status_in_body = parsed
        .as_ref()
        .and_then(|e| e.status_code)
        .unwrap_or(status.as_u16());

    let message = if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        format!(
            "API authentication failed (HTTP {}).\n- Check that API_KEY holds a valid subscription key\n- Ensure your subscription includes this API\n\nServer message: {}\nrequest: {}",
            status_in_body, server_message, url
        )
    } else if status == StatusCode::NOT_FOUND {
        format!(
            "API endpoint or resource not found (HTTP 404).\n- The configured base URL may be incorrect (default: https://api.agrimetrics.co.uk)\n\nServer message: {}\nrequest: {}",
            server_message, url
        )
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        format!(
            "API rate limit exceeded (HTTP 429); wait before retrying.\n\nServer message: {}\nrequest: {}",
            server_message, url
        )
    } else {
        format!(
            "API request failed: HTTP {} for url ({})\n{}",
            status_in_body, url, server_message
        )
    };

    TransportError::Status {
        status,
        url: url.to_string(),
        message,
    }
}

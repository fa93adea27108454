use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Engine catalog error: {0}")]
    CatalogError(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized(msg) => {
                tracing::warn!(error = %msg, "Rejected unauthenticated request");
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::CatalogError(msg) => {
                tracing::error!(error = %msg, "Engine catalog error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ResourceNotFound(msg) => {
                tracing::debug!(resource = %msg, "Resource not found");
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::CatalogError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Response observed on an upstream HTTP failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Raw body text, when it could be read.
    pub body: Option<String>,
}

/// Failure raised while talking to the upstream search API.
///
/// Every boundary (transport, decode, application) wraps the failure below it
/// through an explicit `cause`, so the original HTTP response stays reachable
/// from the outermost error. Only `Status` carries a response.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{message}")]
    Status {
        message: String,
        response: UpstreamResponse,
    },

    #[error("{message}{}", cause_suffix(.cause))]
    Transport {
        message: String,
        cause: Option<Box<UpstreamError>>,
    },

    #[error("{message}{}", cause_suffix(.cause))]
    Decode {
        message: String,
        cause: Option<Box<UpstreamError>>,
    },

    #[error("{message}{}", cause_suffix(.cause))]
    Application {
        message: String,
        cause: Option<Box<UpstreamError>>,
    },
}

impl UpstreamError {
    pub fn status(status: u16, body: Option<String>) -> Self {
        UpstreamError::Status {
            message: format!("upstream returned HTTP {}", status),
            response: UpstreamResponse { status, body },
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        UpstreamError::Transport {
            message: message.into(),
            cause: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        UpstreamError::Decode {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap `cause` in an application-level error with its own message.
    pub fn wrap(message: impl Into<String>, cause: UpstreamError) -> Self {
        UpstreamError::Application {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The next link in the cause chain, if any.
    pub fn cause(&self) -> Option<&UpstreamError> {
        match self {
            UpstreamError::Status { .. } => None,
            UpstreamError::Transport { cause, .. }
            | UpstreamError::Decode { cause, .. }
            | UpstreamError::Application { cause, .. } => cause.as_deref(),
        }
    }

    /// The HTTP response carried directly by this link.
    pub fn response(&self) -> Option<&UpstreamResponse> {
        match self {
            UpstreamError::Status { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// `": <cause>"` when a cause is present, so Display reads outer to inner.
fn cause_suffix(cause: &Option<Box<UpstreamError>>) -> String {
    cause
        .as_ref()
        .map(|c| format!(": {}", c))
        .unwrap_or_default()
}

/// Message of `err` followed by its `source()` chain.
fn describe_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the api_key query parameter.
        let err = err.without_url();
        let message = describe_chain(&err);
        if err.is_decode() {
            UpstreamError::decode(message)
        } else {
            UpstreamError::transport(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_cause_chain() {
        let err = UpstreamError::wrap(
            "search failed",
            UpstreamError::Transport {
                message: "error sending request".into(),
                cause: Some(Box::new(UpstreamError::status(502, None))),
            },
        );
        assert_eq!(
            err.to_string(),
            "search failed: error sending request: upstream returned HTTP 502"
        );
    }

    #[test]
    fn test_describe_chain_appends_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        assert_eq!(describe_chain(&Wrapper(inner)), "tcp connect error: connection refused");
    }

    #[derive(Debug)]
    struct Wrapper(std::io::Error);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("tcp connect error")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }
}

use crate::api::OutboundResponse;
use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Every way a handler invocation can end early.
///
/// Each variant knows the status it is answered with; the display text is
/// the response body.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Must `{0}`.")]
    MethodNotAllowed(Method),
    #[error("{0}")]
    BadRequest(String),
    /// The body a variant reads could not be decoded. Keeps the server's status, e.g. 413.
    #[error("{message}")]
    UnreadableBody { status: StatusCode, message: String },
    #[error("`{0}` not set.")]
    MissingConfig(&'static str),
    #[error("{0}")]
    InvalidConfig(String),
    /// The hosting service refused the repository lookup.
    #[error("{message}")]
    GitHub { status: StatusCode, message: String },
    /// A chat-service call answered outside `200..300`. `url` is already redacted.
    #[error("{url}\n\n{body}")]
    Zulip {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            BridgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::MissingConfig(_)
            | BridgeError::InvalidConfig(_)
            | BridgeError::Transport(_)
            | BridgeError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BridgeError::UnreadableBody { status, .. }
            | BridgeError::GitHub { status, .. }
            | BridgeError::Zulip { status, .. } => *status,
        }
    }

    /// Wraps a `reqwest` failure for `redacted_url`, dropping the URL `reqwest`
    /// attaches itself.
    pub fn transport(redacted_url: &str, error: reqwest::Error) -> Self {
        BridgeError::Transport(format!("{redacted_url}: {}", error.without_url()))
    }
}

impl From<BridgeError> for OutboundResponse {
    fn from(error: BridgeError) -> Self {
        OutboundResponse::text(error.status(), error.to_string())
    }
}

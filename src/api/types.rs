//! Serving-endpoint API response handling and probe errors.

use serde_json::Value;
use thiserror::Error;

/// Reported when the payload carries no recognizable state field.
pub const UNKNOWN_STATE: &str = "UNKNOWN";

/// Maximum number of body characters echoed for unexpected HTTP statuses.
pub const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Why a connectivity probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// HTTP 401
    #[error("authentication failed (HTTP 401)")]
    Unauthorized,

    /// HTTP 404
    #[error("serving endpoint '{endpoint}' not found (HTTP 404)")]
    EndpointNotFound { endpoint: String },

    /// Any other non-200 status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// DNS failure, refused or unreachable host
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Unexpected(String),
}

impl ProbeError {
    /// Classify a transport-level reqwest failure.
    ///
    /// Connect-phase failures are connection errors even when they timed
    /// out; only a stalled request or response is a timeout.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_connect() {
            ProbeError::Connection(err.to_string())
        } else if err.is_timeout() {
            ProbeError::Timeout(timeout_secs)
        } else {
            ProbeError::Unexpected(err.to_string())
        }
    }

    /// Build the error for a non-success status.
    pub fn from_status(status: u16, body: &str, endpoint: &str) -> Self {
        match status {
            401 => ProbeError::Unauthorized,
            404 => ProbeError::EndpointNotFound {
                endpoint: endpoint.to_string(),
            },
            _ => ProbeError::Http {
                status,
                body: body_preview(body),
            },
        }
    }
}

/// First [`ERROR_BODY_PREVIEW_CHARS`] characters of a response body.
pub fn body_preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect()
}

/// Successful probe of a serving endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStatus {
    pub state: String,
}

impl EndpointStatus {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            state: endpoint_state(payload),
        }
    }
}

/// Extract the endpoint state from a status payload.
///
/// The lookup follows the nesting of the payload rather than trying each
/// path independently: once `state` is present, `status` is never
/// consulted, and a present `config_update` shadows `state.state`.
pub fn endpoint_state(payload: &Value) -> String {
    let Some(root) = payload.as_object() else {
        return UNKNOWN_STATE.to_string();
    };

    let found = if let Some(state) = root.get("state") {
        match state {
            Value::Object(state_obj) => {
                if let Some(config_update) = state_obj.get("config_update") {
                    config_update.as_object().and_then(|cu| cu.get("state"))
                } else {
                    state_obj.get("state")
                }
            }
            Value::String(_) => Some(state),
            _ => None,
        }
    } else {
        root.get("status")
    };

    found
        .map(render_value)
        .unwrap_or_else(|| UNKNOWN_STATE.to_string())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

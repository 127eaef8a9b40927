// Artifactory MCP Gateway - Error Taxonomy
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every failure in the gateway is one of these kinds. The MCP layer
// collapses them into a single human-readable message via format_error;
// callers never see the variant names.

use thiserror::Error;

/// Gateway-wide error type.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Bad argument shape, range, or pattern. Detected locally, before any
    /// network call.
    #[error("{0}")]
    Validation(String),

    /// Missing artifact, missing handle, or missing method.
    #[error("{0}")]
    NotFound(String),

    /// Artifact exists and overwrite was not requested.
    #[error("{0}")]
    Conflict(String),

    /// Non-callable attribute, private-name access, deferred method result.
    #[error("{0}")]
    Unsupported(String),

    /// The Artifactory server (or the transport under it) failed during a
    /// network call. Message carries the HTTP status line and a body snippet.
    #[error("{0}")]
    Upstream(String),

    /// Anything else, wrapped with the original error's type name.
    #[error("{kind}: {message}")]
    Internal { kind: String, message: String },
}

impl BridgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BridgeError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        BridgeError::NotFound(msg.into())
    }

    pub fn internal(kind: &str, msg: impl Into<String>) -> Self {
        BridgeError::Internal {
            kind: kind.to_string(),
            message: msg.into(),
        }
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Upstream(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::internal("io error", err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::internal("json error", err.to_string())
    }
}

/// Render an error as the uniform user-facing message for a tool call.
///
/// Locally-detected errors pass through verbatim. Upstream failures get an
/// action prefix plus contextual hints for the two failure signatures that
/// cost users the most diagnosis time: a base URL missing its /artifactory
/// suffix, and a truncated access token.
pub fn format_error(action: &str, err: &BridgeError) -> String {
    match err {
        BridgeError::Validation(msg)
        | BridgeError::NotFound(msg)
        | BridgeError::Conflict(msg)
        | BridgeError::Unsupported(msg) => msg.clone(),
        BridgeError::Upstream(text) => {
            let mut message = format!("Artifactory error during {}: {}", action, text);
            if text.contains("404 Client Error") && text.contains("/api/") {
                message.push_str(
                    " Hint: use a base URL that includes '/artifactory', e.g. https://host/artifactory.",
                );
            }
            if text.contains("Props Authentication Token not found") {
                message.push_str(
                    " Hint: verify ARTIFACTORY_TOKEN is a valid full access token for this Artifactory instance.",
                );
            }
            message
        }
        BridgeError::Internal { kind, message } => {
            format!("Unexpected error during {}: {}: {}", action, kind, message)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

//! Error types for the SOAP auth gateway.
//!
//! Only transport and configuration problems become errors. A payload that
//! cannot be parsed as JSON is a normal outcome and is reported through
//! [`crate::interpreter::InterpretedResult`] instead.

use thiserror::Error;

/// SOAP auth gateway errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Upstream answered with a non-2xx status.
    #[error("SOAP action '{action}' failed with status {status}. Response body: {body}")]
    SoapRequest {
        action: String,
        status: u16,
        body: String,
    },

    /// Request never produced a response (timeout, refused connection, ...).
    #[error("SOAP action '{action}' failed: {source}")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl GatewayError {
    /// Classify this error for the boundary layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SoapRequest { .. } | Self::Transport { .. } => ErrorKind::TransportFailure,
            Self::Config(_) | Self::Unexpected(_) => ErrorKind::UnexpectedFailure,
        }
    }

    /// Upstream HTTP status, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SoapRequest { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Upstream response body, when one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::SoapRequest { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for timeouts raised by the transport.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

/// Caller-visible failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-2xx status or network-level failure
    TransportFailure,
    /// Anything else (bad configuration, internal fault)
    UnexpectedFailure,
}

impl ErrorKind {
    /// Get the string code for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransportFailure => "TRANSPORT_FAILURE",
            Self::UnexpectedFailure => "UNEXPECTED_FAILURE",
        }
    }
}

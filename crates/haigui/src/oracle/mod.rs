//! The oracle: an external judge that answers questions and verdicts.
//!
//! [`Oracle`] is the seam between the turn controller and the network. The
//! production implementation is [`OpenRouterOracle`]; tests and embedders
//! can supply their own (a scripted oracle, a local model, ...).
//!
//! Every exchange is a single attempt. Failures are terminal for the turn
//! that triggered them and leave the session untouched.

pub mod client;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::prompt::OraclePrompt;

pub use client::{OpenRouterOracle, OracleConfig};

/// Boxed future returned by [`Oracle::send`].
pub type OracleFuture<'a> = Pin<Box<dyn Future<Output = Result<String, OracleError>> + Send + 'a>>;

/// Why an oracle exchange produced no reply text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The request never completed (connection, DNS, TLS, timeout, body read).
    #[error("oracle request failed: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success status.
    #[error("oracle returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    /// A success status whose body carried an error object.
    #[error("oracle API error: {0}")]
    Api(String),
    /// A success status whose body had no first completion text.
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

impl OracleError {
    /// HTTP status for [`OracleError::Status`], `None` otherwise.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OracleError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// One request/response exchange with the oracle.
///
/// # Example
///
/// ```ignore
/// struct Always(&'static str);
///
/// impl Oracle for Always {
///     fn send<'a>(&'a self, _prompt: &'a OraclePrompt) -> OracleFuture<'a> {
///         Box::pin(async move { Ok(self.0.to_string()) })
///     }
/// }
/// ```
pub trait Oracle: Send + Sync {
    /// Send `prompt` and return the first completion's text.
    fn send<'a>(&'a self, prompt: &'a OraclePrompt) -> OracleFuture<'a>;
}

impl<O: Oracle + ?Sized> Oracle for std::sync::Arc<O> {
    fn send<'a>(&'a self, prompt: &'a OraclePrompt) -> OracleFuture<'a> {
        (**self).send(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_for_status_errors() {
        let status = OracleError::Status {
            code: 429,
            body: "slow down".into(),
        };
        assert_eq!(status.status_code(), Some(429));
        assert_eq!(OracleError::Transport("dns".into()).status_code(), None);
        assert_eq!(status.to_string(), "oracle returned HTTP 429: slow down");
    }
}

//! Request-scoped diagnostic logging.
//!
//! Every resolver operation takes a logger so upstream traffic and failures
//! can be traced back to the client request that caused them.

use std::fmt;
use tracing::Span;

/// Logger collaborator passed into every resolver operation
pub trait RequestLogger: Send + Sync {
    /// Trace of an upstream request
    fn debug(&self, message: &str);

    /// Upstream failure worth an operator's attention
    fn error(&self, message: &str);
}

/// Forwards request diagnostics to `tracing`, inside a per-request span
#[derive(Debug, Clone)]
pub struct TracingLogger {
    span: Span,
}

impl TracingLogger {
    /// Logger with a fresh span tagged with the request id
    pub fn new(request_id: impl fmt::Display) -> Self {
        Self {
            span: tracing::info_span!("request", id = %request_id),
        }
    }
}

impl RequestLogger for TracingLogger {
    fn debug(&self, message: &str) {
        self.span.in_scope(|| tracing::debug!(target: "pkgate::upstream", "{}", message));
    }

    fn error(&self, message: &str) {
        self.span.in_scope(|| tracing::error!(target: "pkgate::upstream", "{}", message));
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingLogger;

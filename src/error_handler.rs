use std::error::Error;

/// External sink for fatal errors that terminate a run loop.
pub trait ErrorHandler: Send + Sync {
    fn capture(&self, error: &(dyn Error + 'static));
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullErrorHandler;

impl ErrorHandler for NullErrorHandler {
    fn capture(&self, _error: &(dyn Error + 'static)) {}
}

/// Logs captured errors, including their source chain, at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn capture(&self, error: &(dyn Error + 'static)) {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        tracing::error!(error = %error, causes = ?chain, "outbox worker error captured");
    }
}

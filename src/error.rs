//! Error types for the encceja-boletim library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ValidationError`] — **Recoverable**: the participant left the form
//!   incomplete (CPF not fully typed, no boletim attached, unsupported file).
//!   The `Display` text is the Portuguese message shown inline on the form;
//!   the flow stays where it is until the participant edits their input.
//!
//! * [`BoletimError`] — **Attempt-fatal**: reading the document, calling the
//!   extraction service or delivering the submission failed. The flow
//!   collapses every extraction-side variant into one generic message and
//!   returns to the form; delivery failures are only logged.

use std::path::PathBuf;
use thiserror::Error;

use crate::messages;

/// User-recoverable problems with the form input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The CPF does not have all 11 digits yet.
    #[error("{}", messages::CPF_INCOMPLETE)]
    CpfIncomplete,

    /// No boletim file has been selected.
    #[error("{}", messages::FILE_MISSING)]
    FileMissing,

    /// The selected file is neither an image nor a PDF.
    #[error("{}", messages::UNSUPPORTED_FILE)]
    UnsupportedFile { content_type: String },

    /// The selected file has no content.
    #[error("{}", messages::EMPTY_FILE)]
    EmptyFile { path: PathBuf },
}

/// All attempt-fatal errors returned by the encceja-boletim library.
#[derive(Debug, Error)]
pub enum BoletimError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Document was not found at the given path.
    #[error("Boletim file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the document.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The form input was rejected before any work started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The extraction service has no credential configured.
    #[error("Extraction provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The extraction API returned a non-retryable error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The extraction API returned HTTP 401/403.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The extraction API returned HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The extraction call exceeded the configured timeout.
    #[error("API call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// The extraction API answered without any text payload.
    #[error("Empty AI response")]
    EmptyResponse,

    /// The text payload was not the JSON object that was asked for.
    #[error("Malformed AI response: {detail}")]
    MalformedResponse { detail: String },

    // ── Delivery errors ───────────────────────────────────────────────────
    /// The webhook could not be reached or answered with an error status.
    #[error("Webhook delivery to '{url}' failed: {reason}")]
    WebhookFailed { url: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BoletimError {
    /// Map an I/O error on `path` to the most specific input variant.
    pub(crate) fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => BoletimError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => BoletimError::PermissionDenied { path },
            _ => BoletimError::ReadFailed { path, source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_portuguese() {
        assert_eq!(
            ValidationError::CpfIncomplete.to_string(),
            "Por favor, preencha o CPF corretamente."
        );
        assert_eq!(
            ValidationError::FileMissing.to_string(),
            "Por favor, anexe o boletim."
        );
    }

    #[test]
    fn validation_converts_transparently() {
        let e: BoletimError = ValidationError::FileMissing.into();
        assert_eq!(e.to_string(), "Por favor, anexe o boletim.");
    }

    #[test]
    fn rate_limit_display() {
        let e = BoletimError::RateLimitExceeded {
            provider: "gemini".into(),
            retry_after_secs: None,
        };
        assert!(e.to_string().contains("gemini"));
    }

    #[test]
    fn api_timeout_display() {
        let e = BoletimError::ApiTimeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn io_not_found_maps_to_file_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e = BoletimError::from_io("/tmp/boletim.png", err);
        assert!(matches!(e, BoletimError::FileNotFound { .. }));
    }

    #[test]
    fn io_other_keeps_source() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let e = BoletimError::from_io("/tmp/boletim.png", err);
        assert!(e.to_string().contains("disk on fire"));
    }
}

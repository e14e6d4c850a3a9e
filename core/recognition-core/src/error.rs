//! Error types for recognition-core operations.
//! Keep RecognitionFfiError minimal and stable to avoid breaking host bindings.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Swift/Kotlin hosts)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
///
/// Carries only a message string so UniFFI can lift it into host errors.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RecognitionFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<RecognitionError> for RecognitionFfiError {
    fn from(err: RecognitionError) -> Self {
        RecognitionFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur in recognition-core operations.
///
/// Engine command failures are not represented here: they are reported through
/// [`crate::engine::EngineError`] and swallowed by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid navigation base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Session mailbox is closed")]
    SessionClosed,

    #[error("Session snapshot requested from the session thread")]
    SnapshotOnSessionThread,

    #[error("Failed to spawn session thread: {0}")]
    SpawnFailed(#[source] std::io::Error),
}

/// Convenience type alias for Results using RecognitionError.
pub type Result<T> = std::result::Result<T, RecognitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffi_error_keeps_message() {
        let err = RecognitionFfiError::from(RecognitionError::SessionClosed);
        assert_eq!(err.to_string(), "Session mailbox is closed");
    }

    #[test]
    fn malformed_config_mentions_path() {
        let err = RecognitionError::ConfigMalformed {
            path: PathBuf::from("/tmp/session.toml"),
            details: "expected a table".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("/tmp/session.toml"));
        assert!(message.contains("expected a table"));
    }
}

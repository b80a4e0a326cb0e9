// ── Core error types ──
//
// The taxonomy consumers see: transport failures, protocol parse
// failures, local I/O failures, and identifier encoding violations.
// `From<redunda_api::Error>` folds the transport crate's errors into it.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote ───────────────────────────────────────────────────────
    /// Connection, timeout, or non-success status from the service.
    #[error("Redunda request failed: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if the service answered at all).
        status: Option<u16>,
        /// Whether retrying later may succeed.
        transient: bool,
    },

    /// The service answered, but not with the expected payload.
    #[error("Unexpected response from Redunda: {message}")]
    ProtocolParse { message: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Cannot access local file {path}: {source}")]
    LocalIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The identifier cannot be encoded into a remote file key.
    #[error("Cannot track {identifier:?}: {reason}")]
    EncodingPrecondition { identifier: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn local_io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for failures of the remote service or the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::ProtocolParse { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<redunda_api::Error> for CoreError {
    fn from(err: redunda_api::Error) -> Self {
        let transient = err.is_transient();
        let status = err.status();
        match err {
            redunda_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
                status,
                transient,
            },
            redunda_api::Error::Status { status, body } => CoreError::Transport {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
                transient,
            },
            redunda_api::Error::Deserialization { message, body: _ } => {
                CoreError::ProtocolParse { message }
            }
            redunda_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            redunda_api::Error::Tls(message) => CoreError::Config { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn status_errors_map_to_transport() {
        let err: CoreError = redunda_api::Error::Status {
            status: 503,
            body: "down for maintenance".into(),
        }
        .into();
        match err {
            CoreError::Transport {
                ref message,
                status,
                transient,
            } => {
                assert_eq!(status, Some(503));
                assert!(transient);
                assert!(message.contains("maintenance"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn deserialization_maps_to_protocol_parse() {
        let err: CoreError = redunda_api::Error::Deserialization {
            message: "missing field `should_standby`".into(),
            body: "{}".into(),
        }
        .into();
        assert!(matches!(err, CoreError::ProtocolParse { .. }));
        assert!(err.is_remote());
    }

    #[test]
    fn local_io_is_not_remote() {
        let err = CoreError::local_io(
            "data/state.json",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(!err.is_remote());
        assert!(err.to_string().contains("data/state.json"));
    }
}

// ── File key codec ──
//
// Remote file keys are flat: path separators are replaced by a sentinel
// token. The mapping is not invertible for every path (a literal sentinel,
// or "_slash" followed by a separator, decodes differently), so
// `check_identifier` rejects such identifiers before they are tracked.

use std::path::{Component, Path};

use crate::error::CoreError;

/// Stand-in for `/` in remote file keys.
pub const SENTINEL: &str = "_slash_";

/// Turn a local path into a remote file key.
pub fn encode(identifier: &str) -> String {
    identifier.replace('/', SENTINEL)
}

/// Turn a remote file key back into a local path.
pub fn decode(key: &str) -> String {
    key.replace(SENTINEL, "/")
}

/// Verify that `identifier` survives an encode/decode round trip.
pub fn check_identifier(identifier: &str) -> Result<(), CoreError> {
    if identifier.is_empty() {
        return Err(CoreError::EncodingPrecondition {
            identifier: identifier.to_owned(),
            reason: "identifier is empty".into(),
        });
    }
    if identifier.contains(SENTINEL) {
        return Err(CoreError::EncodingPrecondition {
            identifier: identifier.to_owned(),
            reason: format!("identifier contains the reserved token {SENTINEL:?}"),
        });
    }
    if decode(&encode(identifier)) != identifier {
        return Err(CoreError::EncodingPrecondition {
            identifier: identifier.to_owned(),
            reason: format!("identifier would not survive {SENTINEL:?} encoding"),
        });
    }
    Ok(())
}

/// Verify that an identifier learned from the remote listing stays inside
/// the local working tree: relative, with no `..` components.
///
/// Locally tracked identifiers may be absolute; remote keys only ever
/// select files relative to the bot's own directory.
pub fn check_remote_identifier(identifier: &str) -> Result<(), CoreError> {
    check_identifier(identifier)?;
    let escapes = Path::new(identifier).components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    });
    if escapes {
        return Err(CoreError::EncodingPrecondition {
            identifier: identifier.to_owned(),
            reason: "remote identifier must be a relative path without \"..\"".into(),
        });
    }
    Ok(())
}

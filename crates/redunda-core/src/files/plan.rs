// ── Reconciliation planning ──
//
// Pure diff of the tracked set against the remote listing. The remote
// listing is consulted first and decides classification: a file present
// remotely is never pushed by a pass, only pulled (when the remote copy is
// strictly newer) or left alone.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use redunda_api::RemoteFile;

use super::codec;

/// A remote file with its key decoded back into a local identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFileDescriptor {
    pub identifier: String,
    pub encoded_key: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<RemoteFile> for RemoteFileDescriptor {
    fn from(file: RemoteFile) -> Self {
        Self {
            identifier: codec::decode(&file.key),
            encoded_key: file.key,
            updated_at: file.updated_at,
        }
    }
}

/// What one pass will transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Tracked locally, absent remotely.
    pub push: Vec<String>,
    /// Remote copy wins: untracked, or strictly newer than the local file.
    pub pull: Vec<String>,
    /// Remote files not yet tracked; the pass starts tracking them.
    pub discovered: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.push.is_empty() && self.pull.is_empty()
    }
}

/// Classify every tracked and remote file.
///
/// `local_modified` returns the local file's last modification time, or
/// `None` when there is no local copy. Ties go to the local copy.
pub fn plan<F>(tracked: &[String], remote: &[RemoteFileDescriptor], local_modified: F) -> SyncPlan
where
    F: Fn(&str) -> Option<DateTime<Utc>>,
{
    let tracked_set: HashSet<&str> = tracked.iter().map(String::as_str).collect();
    let mut remote_ids: HashSet<&str> = HashSet::with_capacity(remote.len());
    let mut plan = SyncPlan::default();

    for file in remote {
        let id = file.identifier.as_str();
        if !remote_ids.insert(id) {
            continue;
        }

        if !tracked_set.contains(id) {
            plan.discovered.push(id.to_owned());
            plan.pull.push(id.to_owned());
            continue;
        }

        let remote_newer = match local_modified(id) {
            Some(local) => file.updated_at > local,
            None => true,
        };
        if remote_newer {
            plan.pull.push(id.to_owned());
        }
    }

    plan.push = tracked
        .iter()
        .filter(|id| !remote_ids.contains(id.as_str()))
        .cloned()
        .collect();

    plan
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }

    fn remote(identifier: &str, updated_at: i64) -> RemoteFileDescriptor {
        RemoteFileDescriptor {
            identifier: identifier.to_owned(),
            encoded_key: codec::encode(identifier),
            updated_at: at(updated_at),
        }
    }

    fn tracked(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn classifies_push_pull_and_keep() {
        let mtimes = HashMap::from([("a", at(2_000)), ("b", at(1_000))]);
        let plan = plan(
            &tracked(&["a", "b"]),
            &[remote("a", 1_500), remote("c", 9_999)],
            |id| mtimes.get(id).copied(),
        );

        assert_eq!(plan.push, vec!["b"]);
        assert_eq!(plan.pull, vec!["c"]);
        assert_eq!(plan.discovered, vec!["c"]);
    }

    #[test]
    fn strictly_newer_remote_is_pulled() {
        let plan = plan(&tracked(&["a"]), &[remote("a", 2_001)], |_| Some(at(2_000)));
        assert_eq!(plan.pull, vec!["a"]);
        assert!(plan.push.is_empty());
        assert!(plan.discovered.is_empty());
    }

    #[test]
    fn equal_timestamps_keep_local() {
        let plan = plan(&tracked(&["a"]), &[remote("a", 2_000)], |_| Some(at(2_000)));
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_local_copy_is_pulled() {
        let plan = plan(&tracked(&["data/a.json"]), &[remote("data/a.json", 10)], |_| None);
        assert_eq!(plan.pull, vec!["data/a.json"]);
    }

    #[test]
    fn no_identifier_is_both_pushed_and_pulled() {
        let ids = tracked(&["a", "b", "c", "d"]);
        let listing = [remote("b", 5), remote("c", 50), remote("e", 1)];
        let plan = plan(&ids, &listing, |_| Some(at(10)));

        for id in &plan.push {
            assert!(!plan.pull.contains(id), "{id} in both sets");
        }
        assert_eq!(plan.push, vec!["a", "d"]);
        assert_eq!(plan.pull, vec!["c", "e"]);
    }

    #[test]
    fn duplicate_remote_entries_are_pulled_once() {
        let plan = plan(&[], &[remote("x", 1), remote("x", 2)], |_| None);
        assert_eq!(plan.pull, vec!["x"]);
        assert_eq!(plan.discovered, vec!["x"]);
    }

    #[test]
    fn descriptor_decodes_remote_key() {
        let file = RemoteFile {
            key: "data_slash_state.json".into(),
            updated_at: at(42),
        };
        let descriptor = RemoteFileDescriptor::from(file);
        assert_eq!(descriptor.identifier, "data/state.json");
        assert_eq!(descriptor.encoded_key, "data_slash_state.json");
    }
}

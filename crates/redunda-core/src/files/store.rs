// ── Local file access ──
//
// The reconciler reads, writes, and stats local files through this trait
// so tests can substitute an in-memory store with a controllable clock.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

/// Local filesystem operations used by the reconciler.
///
/// Identifiers are passed through as given; implementations decide how to
/// resolve them.
pub trait FileStore: Send + Sync {
    /// Read a whole file.
    fn read(&self, identifier: &str) -> io::Result<Vec<u8>>;

    /// Replace a whole file, creating it (and missing parents) if needed.
    fn write(&self, identifier: &str, content: &[u8]) -> io::Result<()>;

    /// Last modification time, or `None` if the file does not exist.
    fn modified(&self, identifier: &str) -> io::Result<Option<DateTime<Utc>>>;
}

/// [`FileStore`] backed by the real filesystem.
///
/// Relative identifiers resolve against `root` when one is set, otherwise
/// against the process working directory. A rooted store refuses absolute
/// identifiers and `..` components.
#[derive(Debug, Clone, Default)]
pub struct LocalFileStore {
    root: Option<PathBuf>,
}

impl LocalFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `root`.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, identifier: &str) -> io::Result<PathBuf> {
        let Some(root) = &self.root else {
            return Ok(PathBuf::from(identifier));
        };
        let confined = Path::new(identifier)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !confined {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{identifier:?} resolves outside {}", root.display()),
            ));
        }
        Ok(root.join(identifier))
    }
}

impl FileStore for LocalFileStore {
    fn read(&self, identifier: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(identifier)?)
    }

    fn write(&self, identifier: &str, content: &[u8]) -> io::Result<()> {
        let path = self.resolve(identifier)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }

    fn modified(&self, identifier: &str) -> io::Result<Option<DateTime<Utc>>> {
        match std::fs::metadata(self.resolve(identifier)?) {
            Ok(meta) => Ok(Some(meta.modified()?.into())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn write_creates_parents_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::rooted(dir.path());

        store.write("nested/deeper/state.json", b"{}").unwrap();
        assert_eq!(store.read("nested/deeper/state.json").unwrap(), b"{}");
        assert!(dir.path().join("nested/deeper/state.json").is_file());
    }

    #[test]
    fn missing_file_has_no_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::rooted(dir.path());
        assert_eq!(store.modified("nope.txt").unwrap(), None);
        assert_eq!(
            store.read("nope.txt").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn mtime_tracks_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::rooted(dir.path());
        let before = Utc::now() - chrono::Duration::seconds(5);

        store.write("a.txt", b"1").unwrap();
        let mtime = store.modified("a.txt").unwrap().unwrap();
        assert!(mtime >= before);
    }

    #[test]
    fn rooted_store_resolves_relative_identifiers() {
        let store = LocalFileStore::rooted("/srv/bot");
        assert_eq!(
            store.resolve("data/x.json").unwrap(),
            PathBuf::from("/srv/bot/data/x.json")
        );
        assert_eq!(
            LocalFileStore::new().resolve("x.json").unwrap(),
            PathBuf::from("x.json")
        );
    }

    #[test]
    fn rooted_store_refuses_escaping_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let store = LocalFileStore::rooted(dir.path().join("root"));
        let absolute = outside.path().join("pwned.txt");

        for id in [absolute.to_str().unwrap(), "../escape.txt", "data/../../x"] {
            let err = store.write(id, b"x").unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{id}");
            assert_eq!(store.read(id).unwrap_err().kind(), io::ErrorKind::InvalidInput);
            assert!(store.modified(id).is_err());
        }
        assert!(!absolute.exists());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn unrooted_store_accepts_absolute_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("seen.txt");
        let id = target.to_str().unwrap();

        LocalFileStore::new().write(id, b"1").unwrap();
        assert_eq!(LocalFileStore::new().read(id).unwrap(), b"1");
    }
}

//! Output file writing

use crate::error::{ExportError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sibling temporary path: `<file>.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` so that either the complete file or nothing is
/// left behind.
///
/// The parent directory is created if missing. Data goes to `<file>.tmp`,
/// is synced, then renamed over `path`.
///
/// # Errors
/// `Io` with the failing path; the temporary file is removed.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    let written = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .map_err(|e| ExportError::io(&tmp, e))
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| ExportError::io(path, e)));

    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    } else {
        debug!(path = %path.display(), bytes = bytes.len(), "File written");
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("terrain2fds_io_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_write_creates_parent_and_replaces() {
        let dir = scratch_dir("replace");
        let path = dir.join("nested").join("case.fds");

        write_atomically(&path, b"first").unwrap();
        write_atomically(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!temp_path(&path).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = scratch_dir("fail");
        fs::create_dir_all(&dir).unwrap();
        // Target is an existing non-empty directory: rename must fail
        let path = dir.join("occupied");
        fs::create_dir_all(path.join("child")).unwrap();

        let err = write_atomically(&path, b"data").unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!temp_path(&path).exists());
        assert!(path.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path(Path::new("/out/chid_terrain.bingeom")),
            PathBuf::from("/out/chid_terrain.bingeom.tmp")
        );
    }
}

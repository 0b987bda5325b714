//! Atomic filesystem operations for the shared lock file.
//!
//! The lock file lives on a shared, possibly slow network folder where a
//! torn write is plausible, so nothing here mutates a file in place.
//!
//! # Implementation Strategy
//!
//! Replacing writes follow this pattern:
//! 1. Write content to a uniquely named temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Atomically rename it over the target
//!
//! Exclusive creation publishes a fully written temporary file with
//! `hard_link`, which fails atomically when the target exists. A reader never
//! sees a created-but-empty lock file. Filesystems without hard links get an
//! I/O error, which the session resolves through its failure policy.
//!
//! # Important Notes
//!
//! - Temporary names carry a random suffix: several processes on different
//!   machines may write the same target concurrently
//! - On crash, a temporary file may remain (named `.{filename}.{id}.tmp`)

use crate::error::{LockError, Result};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Atomically replace `path` with `content`.
///
/// Readers observe either the previous file or the complete new one.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = sibling_path(path, "tmp")?;
    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LockError::Io(format!(
            "failed to atomically replace '{}': {}",
            path.display(),
            e
        ))
    })?;

    sync_parent(path);
    Ok(())
}

/// Create `path` with `content` only if it does not exist yet.
///
/// Returns `LockError::AlreadyExists` when another file occupies the path.
/// Never implemented as check-then-write: the existence test and the
/// creation are one filesystem operation.
pub fn create_exclusive<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = sibling_path(path, "tmp")?;
    write_and_sync(&temp_path, content)?;

    let linked = fs::hard_link(&temp_path, path);
    let _ = fs::remove_file(&temp_path);

    match linked {
        Ok(()) => {
            sync_parent(path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(LockError::AlreadyExists),
        Err(e) => Err(LockError::Io(format!(
            "failed to create '{}' exclusively: {}",
            path.display(),
            e
        ))),
    }
}

/// Read a file as text (lossy UTF-8), mapping a missing file to `None`.
pub fn read_optional<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LockError::Io(format!(
            "failed to read '{}': {}",
            path.display(),
            e
        ))),
    }
}

/// Remove a file. Removing a file that does not exist is not an error.
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LockError::Io(format!(
            "failed to remove '{}': {}",
            path.display(),
            e
        ))),
    }
}

/// Move `path` aside to a unique `.{filename}.corrupt-{id}` sibling and
/// return the bytes that were moved, or `None` if nothing was there.
///
/// Rename is atomic: when several processes quarantine the same file, only
/// one of them moves it.
pub fn quarantine<P: AsRef<Path>>(path: P) -> Result<Option<(PathBuf, Vec<u8>)>> {
    let path = path.as_ref();
    let aside = sibling_path(path, "corrupt")?;

    match fs::rename(path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LockError::Io(format!(
                "failed to move '{}' aside: {}",
                path.display(),
                e
            )));
        }
    }

    let content = fs::read(&aside).map_err(|e| {
        LockError::Io(format!(
            "failed to read quarantined '{}': {}",
            aside.display(),
            e
        ))
    })?;
    Ok(Some((aside, content)))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            LockError::Io(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Build `.{filename}.{id}.{kind}` next to the target (`corrupt` uses
/// `.{filename}.corrupt-{id}` so operators can spot it).
fn sibling_path(target: &Path, kind: &str) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LockError::Io(format!("invalid file path '{}'", target.display())))?;

    let id = Uuid::new_v4().simple();
    let name = match kind {
        "corrupt" => format!(".{}.corrupt-{}", filename, id),
        other => format!(".{}.{}.{}", filename, id, other),
    };
    Ok(parent.join(name))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        LockError::Io(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            let _ = fs::remove_file(path);
            LockError::Io(format!(
                "failed to write temporary file '{}': {}",
                path.display(),
                e
            ))
        })
}

/// Persist the directory entry after a rename or link. Best effort.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.lock");

        atomic_write(&file_path, b"hello world").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "hello world");
        assert!(leftover_temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_atomic_write_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.lock");
        fs::write(&file_path, "original content").unwrap();

        atomic_write(&file_path, b"new content").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("app.lock");

        atomic_write(&file_path, b"nested").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "nested");
    }

    #[test]
    fn test_create_exclusive_refuses_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.lock");

        create_exclusive(&file_path, b"first").unwrap();
        let second = create_exclusive(&file_path, b"second");

        assert_eq!(second, Err(LockError::AlreadyExists));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "first");
        assert!(leftover_temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_create_exclusive_concurrent_single_winner() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.lock");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let path = file_path.clone();
                std::thread::spawn(move || {
                    create_exclusive(&path, format!("writer {}", i).as_bytes()).is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(
            fs::read_to_string(&file_path)
                .unwrap()
                .starts_with("writer ")
        );
    }

    #[test]
    fn test_create_exclusive_never_exposes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.lock");
        let content = "x".repeat(64 * 1024);

        for _ in 0..20 {
            remove_if_exists(&file_path).unwrap();
            let reader = {
                let path = file_path.clone();
                std::thread::spawn(move || {
                    loop {
                        if let Some(seen) = read_optional(&path).unwrap() {
                            return seen.len();
                        }
                    }
                })
            };

            create_exclusive(&file_path, content.as_bytes()).unwrap();

            assert_eq!(reader.join().unwrap(), content.len());
        }
    }

    #[test]
    fn test_read_optional_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(read_optional(temp_dir.path().join("absent")).unwrap(), None);
    }

    #[test]
    fn test_remove_if_exists_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.lock");
        fs::write(&file_path, "x").unwrap();

        remove_if_exists(&file_path).unwrap();
        remove_if_exists(&file_path).unwrap();

        assert!(!file_path.exists());
    }

    #[test]
    fn test_quarantine_moves_file_aside() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("app.lock");
        fs::write(&file_path, "{not json").unwrap();

        let (aside, content) = quarantine(&file_path).unwrap().unwrap();

        assert!(!file_path.exists());
        assert!(aside.exists());
        assert_eq!(content, b"{not json");
        assert!(
            aside
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(".app.lock.corrupt-")
        );
        assert!(quarantine(&file_path).unwrap().is_none());
    }

    #[test]
    fn test_sibling_path_is_hidden_and_unique() {
        let target = Path::new("/shared/app.lock");
        let a = sibling_path(target, "tmp").unwrap();
        let b = sibling_path(target, "tmp").unwrap();

        assert_eq!(a.parent().unwrap(), Path::new("/shared"));
        assert_ne!(a, b);
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(".app.lock."));
        assert!(name.ends_with(".tmp"));
    }
}

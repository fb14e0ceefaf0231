//! Clip storage and retention.
//!
//! There is no metadata store: the output directory listing is the index.
//! Retention keeps the newest `max_files` clips by modification time and
//! deletes the rest, oldest first.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::clip::is_clip_file;
use crate::error::{Error, Result};

/// One clip file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipEntry {
    /// Absolute path of the clip file.
    pub path: PathBuf,
    /// Modification time, used for retention ordering.
    pub modified: SystemTime,
    /// File size in bytes.
    pub len: u64,
}

/// Summary of the clip store, for the status command.
#[derive(Debug, Clone, Serialize)]
pub struct ClipStoreStats {
    /// Number of clip files on disk.
    pub clip_count: usize,
    /// Total bytes used by clips.
    pub total_bytes: u64,
    /// Modification time of the oldest clip.
    pub oldest: Option<DateTime<Utc>>,
    /// Modification time of the newest clip.
    pub newest: Option<DateTime<Utc>>,
}

/// The on-disk clip store.
#[derive(Debug, Clone)]
pub struct ClipStore {
    dir: PathBuf,
}

impl ClipStore {
    /// Create a store rooted at the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path for a clip with the given file name.
    #[must_use]
    pub fn clip_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Create the output directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| Error::DirectoryCreate {
            path: self.dir.clone(),
            source,
        })
    }

    /// List all clip files in the output directory.
    ///
    /// Files that do not look like clips are ignored. A missing directory
    /// yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<ClipEntry>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut clips = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !is_clip_file(&path) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            clips.push(ClipEntry {
                modified: metadata.modified()?,
                len: metadata.len(),
                path,
            });
        }
        Ok(clips)
    }

    /// Delete the oldest clips until at most `max_files` remain.
    ///
    /// Per-file deletion failures are logged and do not abort the remaining
    /// deletions; a clip that could not be deleted still counts as retained.
    /// Returns the number of clips deleted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory listing itself fails.
    pub fn prune(&self, max_files: usize) -> Result<usize> {
        self.prune_with(max_files, |path| std::fs::remove_file(path))
    }

    /// Retention pass with an injectable removal operation, so the
    /// delete-failure path is testable.
    fn prune_with<F>(&self, max_files: usize, mut remove: F) -> Result<usize>
    where
        F: FnMut(&Path) -> std::io::Result<()>,
    {
        let mut clips = self.list()?;
        if clips.len() <= max_files {
            return Ok(0);
        }

        clips.sort_by_key(|clip| clip.modified);
        let excess = clips.len() - max_files;

        let mut deleted = 0;
        for clip in &clips[..excess] {
            match remove(&clip.path) {
                Ok(()) => {
                    debug!(path = %clip.path.display(), "deleted old clip");
                    deleted += 1;
                }
                Err(e) => {
                    warn!(path = %clip.path.display(), error = %e, "failed to delete old clip");
                }
            }
        }
        Ok(deleted)
    }

    /// Summarize the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn stats(&self) -> Result<ClipStoreStats> {
        let clips = self.list()?;
        let total_bytes = clips.iter().map(|clip| clip.len).sum();
        let oldest = clips
            .iter()
            .map(|clip| clip.modified)
            .min()
            .map(DateTime::<Utc>::from);
        let newest = clips
            .iter()
            .map(|clip| clip.modified)
            .max()
            .map(DateTime::<Utc>::from);

        Ok(ClipStoreStats {
            clip_count: clips.len(),
            total_bytes,
            oldest,
            newest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Create `count` clip files with strictly increasing modification times.
    /// Returns the file names, oldest first.
    fn make_clips(dir: &Path, count: usize) -> Vec<String> {
        let base = SystemTime::now() - Duration::from_secs(3600);
        let mut names = Vec::new();
        for i in 0..count {
            let name = format!("dashcam_20260314_{i:06}_GPS:_--_--.mp4");
            let path = dir.join(&name);
            std::fs::write(&path, b"clip data").unwrap();
            let file = std::fs::OpenOptions::new()
                .write(true)
                .open(&path)
                .unwrap();
            file.set_modified(base + Duration::from_secs(i as u64 * 10))
                .unwrap();
            names.push(name);
        }
        names
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let tmp = TempDir::new().unwrap();
        let store = ClipStore::new(tmp.path().join("a/b/clips"));
        store.ensure_dir().unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = ClipStore::new(tmp.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let tmp = TempDir::new().unwrap();
        make_clips(tmp.path(), 3);
        std::fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(tmp.path().join("holiday.mp4"), b"x").unwrap();

        let store = ClipStore::new(tmp.path());
        assert_eq!(store.list().unwrap().len(), 3);
    }

    #[test]
    fn test_prune_under_threshold_is_noop() {
        let tmp = TempDir::new().unwrap();
        make_clips(tmp.path(), 5);

        let store = ClipStore::new(tmp.path());
        assert_eq!(store.prune(20).unwrap(), 0);
        assert_eq!(store.list().unwrap().len(), 5);
    }

    #[test]
    fn test_prune_at_threshold_is_noop() {
        let tmp = TempDir::new().unwrap();
        make_clips(tmp.path(), 20);

        let store = ClipStore::new(tmp.path());
        assert_eq!(store.prune(20).unwrap(), 0);
        assert_eq!(store.list().unwrap().len(), 20);
    }

    #[test]
    fn test_prune_25_keeps_20_most_recent() {
        let tmp = TempDir::new().unwrap();
        let names = make_clips(tmp.path(), 25);

        let store = ClipStore::new(tmp.path());
        assert_eq!(store.prune(20).unwrap(), 5);

        let remaining: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|clip| clip.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining.len(), 20);

        // The 5 oldest are gone; the 20 most recent remain.
        for name in &names[..5] {
            assert!(!remaining.contains(name), "{name} should have been deleted");
        }
        for name in &names[5..] {
            assert!(remaining.contains(name), "{name} should have been kept");
        }
    }

    #[test]
    fn test_prune_deletes_only_older_than_retained() {
        let tmp = TempDir::new().unwrap();
        make_clips(tmp.path(), 8);

        let store = ClipStore::new(tmp.path());
        let before = store.list().unwrap();
        store.prune(3).unwrap();
        let after = store.list().unwrap();

        let newest_deleted = before
            .iter()
            .filter(|clip| !after.contains(clip))
            .map(|clip| clip.modified)
            .max()
            .unwrap();
        let oldest_retained = after.iter().map(|clip| clip.modified).min().unwrap();
        assert!(newest_deleted < oldest_retained);
    }

    #[test]
    fn test_prune_continues_past_delete_failure() {
        let tmp = TempDir::new().unwrap();
        let names = make_clips(tmp.path(), 5);
        let store = ClipStore::new(tmp.path());

        // The second-oldest clip refuses to go; the pass must still delete
        // the other candidates and report the partial count.
        let blocked = tmp.path().join(&names[1]);
        let deleted = store
            .prune_with(2, |path| {
                if path == blocked.as_path() {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        "in use",
                    ))
                } else {
                    std::fs::remove_file(path)
                }
            })
            .unwrap();
        assert_eq!(deleted, 2);

        let remaining: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|clip| clip.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(!remaining.contains(&names[0]));
        assert!(remaining.contains(&names[1]), "undeletable clip is retained");
        assert!(!remaining.contains(&names[2]));
        assert!(remaining.contains(&names[3]));
        assert!(remaining.contains(&names[4]));
    }

    #[test]
    fn test_prune_ignores_foreign_files() {
        let tmp = TempDir::new().unwrap();
        make_clips(tmp.path(), 4);
        std::fs::write(tmp.path().join("holiday.mp4"), b"keep me").unwrap();

        let store = ClipStore::new(tmp.path());
        store.prune(2).unwrap();
        assert!(tmp.path().join("holiday.mp4").exists());
    }

    #[test]
    fn test_stats_empty() {
        let tmp = TempDir::new().unwrap();
        let store = ClipStore::new(tmp.path());
        let stats = store.stats().unwrap();
        assert_eq!(stats.clip_count, 0);
        assert_eq!(stats.total_bytes, 0);
        assert!(stats.oldest.is_none());
        assert!(stats.newest.is_none());
    }

    #[test]
    fn test_stats_with_clips() {
        let tmp = TempDir::new().unwrap();
        make_clips(tmp.path(), 3);

        let store = ClipStore::new(tmp.path());
        let stats = store.stats().unwrap();
        assert_eq!(stats.clip_count, 3);
        assert_eq!(stats.total_bytes, 27); // 3 files x "clip data"
        assert!(stats.oldest.unwrap() <= stats.newest.unwrap());
    }

    #[test]
    fn test_clip_path() {
        let store = ClipStore::new("/data/clips");
        assert_eq!(
            store.clip_path("dashcam_x.mp4"),
            PathBuf::from("/data/clips/dashcam_x.mp4")
        );
    }

    #[test]
    fn test_stats_serialize() {
        let stats = ClipStoreStats {
            clip_count: 2,
            total_bytes: 1024,
            oldest: None,
            newest: None,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("clip_count"));
        assert!(json.contains("total_bytes"));
    }
}

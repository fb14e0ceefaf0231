//! Daemon lifecycle: pid file management and signalling.
//!
//! `daemon start` writes a pid file and refuses to run when one already
//! points at a live process; `daemon stop` signals the recorded pid. A pid
//! file left behind by a crashed daemon is treated as stale and cleaned up.

use std::path::Path;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Check whether a process with the given pid is alive.
#[must_use]
pub fn is_alive(pid: i32) -> bool {
    // Signal 0 probes for existence without delivering anything.
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Read the pid recorded in the pid file, if the file exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_pid(path: &Path) -> Result<Option<i32>> {
    match std::fs::read_to_string(path) {
        Ok(text) => text
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| Error::pid_file(path, format!("malformed pid: {:?}", text.trim()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::pid_file(path, e.to_string())),
    }
}

/// Read the pid file and return the pid only if that process is alive.
///
/// A stale pid file (dead process) is removed.
///
/// # Errors
///
/// Returns an error if the pid file cannot be read.
pub fn read_live_pid(path: &Path) -> Result<Option<i32>> {
    match read_pid(path)? {
        Some(pid) if is_alive(pid) => Ok(Some(pid)),
        Some(pid) => {
            debug!(pid, path = %path.display(), "removing stale pid file");
            let _ = std::fs::remove_file(path);
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Write this process's pid to the pid file.
///
/// # Errors
///
/// Returns [`Error::DaemonAlreadyRunning`] if the pid file points at a live
/// process, or an I/O error if the file cannot be written.
pub fn write_pid_file(path: &Path) -> Result<()> {
    if let Some(pid) = read_live_pid(path)? {
        return Err(Error::DaemonAlreadyRunning { pid });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, format!("{}\n", std::process::id()))
        .map_err(|e| Error::pid_file(path, e.to_string()))
}

/// Remove the pid file. Failures are logged, not propagated.
pub fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove pid file");
        }
    }
}

/// Send a signal to the running daemon.
///
/// Returns the pid that was signalled.
///
/// # Errors
///
/// Returns [`Error::DaemonNotRunning`] if no live daemon is recorded, or an
/// error if the signal cannot be delivered.
pub fn signal_daemon(path: &Path, signal: Signal) -> Result<i32> {
    let pid = read_live_pid(path)?.ok_or(Error::DaemonNotRunning)?;
    kill(Pid::from_raw(pid), signal)
        .map_err(|e| Error::internal(format!("failed to signal pid {pid}: {e}")))?;
    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Far above any realistic pid_max, so never a live process.
    const DEAD_PID: i32 = 2_000_000_000;

    #[test]
    fn test_own_pid_is_alive() {
        #[allow(clippy::cast_possible_wrap)]
        let own = std::process::id() as i32;
        assert!(is_alive(own));
    }

    #[test]
    fn test_dead_pid_is_not_alive() {
        assert!(!is_alive(DEAD_PID));
    }

    #[test]
    fn test_read_pid_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dashcam.pid");
        assert_eq!(read_pid(&path).unwrap(), None);
    }

    #[test]
    fn test_read_pid_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dashcam.pid");
        std::fs::write(&path, "not a pid\n").unwrap();
        assert!(read_pid(&path).is_err());
    }

    #[test]
    fn test_write_then_read_pid() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run/dashcam.pid");

        write_pid_file(&path).unwrap();
        #[allow(clippy::cast_possible_wrap)]
        let own = std::process::id() as i32;
        assert_eq!(read_pid(&path).unwrap(), Some(own));
    }

    #[test]
    fn test_write_refuses_when_already_running() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dashcam.pid");

        // The pid file points at this (live) test process.
        write_pid_file(&path).unwrap();
        let result = write_pid_file(&path);
        assert!(matches!(result, Err(Error::DaemonAlreadyRunning { .. })));
    }

    #[test]
    fn test_stale_pid_file_is_reclaimed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dashcam.pid");
        std::fs::write(&path, format!("{DEAD_PID}\n")).unwrap();

        assert_eq!(read_live_pid(&path).unwrap(), None);
        assert!(!path.exists(), "stale pid file should be removed");

        // And a new daemon may start.
        std::fs::write(&path, format!("{DEAD_PID}\n")).unwrap();
        write_pid_file(&path).unwrap();
    }

    #[test]
    fn test_remove_pid_file_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        remove_pid_file(&tmp.path().join("gone.pid"));
    }

    #[test]
    fn test_signal_daemon_not_running() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dashcam.pid");
        let result = signal_daemon(&path, Signal::SIGTERM);
        assert!(matches!(result, Err(Error::DaemonNotRunning)));
    }
}

//! Path utilities for patchlink
//!
//! Handles XDG Base Directory specification compliance for state, log and
//! scratch directories.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Application identifier for XDG directories
const APP_NAME: &str = "patchlink";

/// Get project directories (cached)
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the runtime directory
///
/// Location: `$XDG_RUNTIME_DIR/patchlink` or `/tmp/patchlink-$UID`
pub fn runtime_dir() -> PathBuf {
    if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(xdg_runtime).join(APP_NAME)
    } else {
        // Fallback to /tmp with UID for security
        // SAFETY: getuid() is always safe to call
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/{}-{}", APP_NAME, uid))
    }
}

/// Get the state directory (persistent state)
///
/// Location: `$XDG_STATE_HOME/patchlink` or `~/.local/state/patchlink`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| {
            dirs_home()
                .join(".local")
                .join("state")
                .join(APP_NAME)
        })
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/patchlink/logs`
pub fn log_dir() -> PathBuf {
    state_dir().join("logs")
}

/// Default scratch directory for the remote peer's autosave tree.
///
/// Hosts that embed the remote peer usually supply their own autosave path;
/// this is the fallback for standalone use.
pub fn scratch_dir() -> PathBuf {
    runtime_dir().join("autosave-remote")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_dir_ends_with_app_name() {
        let dir = runtime_dir();
        let s = dir.to_string_lossy();
        assert!(s.contains("patchlink"));
    }

    #[test]
    fn test_log_dir_under_state_dir() {
        assert!(log_dir().starts_with(state_dir()));
    }

    #[test]
    fn test_scratch_dir_under_runtime_dir() {
        assert!(scratch_dir().starts_with(runtime_dir()));
    }
}

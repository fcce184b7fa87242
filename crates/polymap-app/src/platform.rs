//! OS-specific directory resolution for config and log files.

use std::io;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "polymap";

/// Errors that can occur while resolving or creating directories.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    /// Directory creation failed.
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where the tool keeps its configuration and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Holds JSON log files.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve the OS defaults (XDG on Linux, Known Folders on Windows,
    /// Library on macOS) without touching the disk.
    pub fn resolve() -> Result<Self, PlatformError> {
        let base = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?;
        Ok(Self::resolve_with_root(&base))
    }

    /// Resolve directories rooted under a custom base path.
    pub fn resolve_with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            config_dir: app_dir.clone(),
            log_dir: app_dir.join("logs"),
        }
    }

    /// Use an explicit config directory, keeping logs beside it.
    pub fn from_config_dir(config_dir: PathBuf) -> Self {
        let log_dir = config_dir.join("logs");
        Self {
            config_dir,
            log_dir,
        }
    }

    /// Create every directory on disk.
    pub fn create_all(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_with_root() {
        let dirs = PlatformDirs::resolve_with_root(Path::new("/tmp/root"));
        assert_eq!(dirs.config_dir, PathBuf::from("/tmp/root/polymap"));
        assert_eq!(dirs.log_dir, PathBuf::from("/tmp/root/polymap/logs"));
    }

    #[test]
    fn test_explicit_config_dir() {
        let dirs = PlatformDirs::from_config_dir(PathBuf::from("cfg"));
        assert_eq!(dirs.log_dir, PathBuf::from("cfg/logs"));
    }

    #[test]
    fn test_create_all() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::resolve_with_root(tmp.path());
        dirs.create_all().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
    }
}

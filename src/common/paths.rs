//! Configuration and test data locations

use std::path::{Path, PathBuf};

/// Name used for the per-user configuration directory
const APP_NAME: &str = "lumidb-e2e";

/// Project-local configuration file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "e2e.toml";

/// File extension of test archives
pub const ARCHIVE_EXTENSION: &str = "txtar";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/lumidb-e2e/`
/// - macOS: `~/Library/Application Support/lumidb-e2e/`
/// - Windows: `%APPDATA%\lumidb-e2e\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the per-user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the project-local configuration file
pub fn local_config_path() -> PathBuf {
    PathBuf::from(LOCAL_CONFIG_FILE)
}

/// Whether a path looks like a test archive
pub fn is_archive(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(ARCHIVE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_extension() {
        assert!(is_archive(Path::new("e2e/data/select.txtar")));
    }

    #[test]
    fn test_non_archive_rejected() {
        assert!(!is_archive(Path::new("e2e/data/README.md")));
        assert!(!is_archive(Path::new("e2e/data/txtar")));
    }
}

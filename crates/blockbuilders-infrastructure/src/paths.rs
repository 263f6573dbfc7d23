//! Path management for blockbuilders configuration files.
//!
//! ```text
//! ~/.config/blockbuilders/     # Config directory (platform specific)
//! ├── config.toml              # Application configuration
//! └── oauth-verifier           # Pending PKCE verifier between `oauth` and `callback`
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "blockbuilders";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct BlockbuildersPaths;

impl BlockbuildersPaths {
    /// Returns the blockbuilders configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/blockbuilders/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path holding a pending OAuth PKCE verifier.
    pub fn oauth_verifier_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("oauth-verifier"))
    }
}

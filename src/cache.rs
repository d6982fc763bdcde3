use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory holding the rolling log files
pub const LOG_DIR: &str = "logs";

/// Manages the cache directory (currently only logs live there)
#[derive(Clone, Debug)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    /// Create a new CacheManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    /// Use an explicit directory (tests)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn log_dir(&self) -> PathBuf {
        self.cache_dir.join(LOG_DIR)
    }

    /// Ensure the log directory exists, returning its path
    pub fn ensure_log_dir(&self) -> Result<PathBuf> {
        let dir = self.log_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Remove every log file. A missing directory is not an error.
    pub fn clear_all(&self) -> Result<()> {
        let dir = self.log_dir();
        if !dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!("Warning: Could not remove cache file {}: {}", path.display(), e);
                }
            }
        }
        Ok(())
    }
}

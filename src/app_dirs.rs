use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where persisted history and settings live
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CHROMATCH_DATA_DIR") {
            return PathBuf::from(dir);
        }
        ProjectDirs::from("", "", "chromatch")
            .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".chromatch"))
    }
}

use std::path::PathBuf;

pub trait AppPaths: Send + Sync {
    fn downloads_dir(&self) -> PathBuf;
    fn config_dir(&self) -> PathBuf;
    fn settings_file(&self) -> PathBuf {
        self.config_dir().join("settings.json")
    }
}

pub struct DesktopPaths;

impl AppPaths for DesktopPaths {
    fn downloads_dir(&self) -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    fn config_dir(&self) -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("reelgrab"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

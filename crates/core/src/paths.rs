use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".lingopane"))
            .unwrap_or_else(|| PathBuf::from(".lingopane"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base.join("settings.json")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

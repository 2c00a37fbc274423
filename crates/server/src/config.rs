use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Slicing engine executable (looked up on `PATH` if not absolute).
    pub slicer_bin: PathBuf,
    /// Holds `printer.json`, `quality/*.json` and `material/*.json`.
    pub slicer_config_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub slicer_timeout: Duration,
    /// Allowed CORS origin; `*` allows any.
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".into(),
            slicer_bin: PathBuf::from("CuraEngine"),
            slicer_config_dir: PathBuf::from("configs"),
            upload_dir: PathBuf::from("uploads"),
            slicer_timeout: Duration::from_secs(120),
            cors_origin: "http://localhost:5173".into(),
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys keep their default;
    /// unparseable values keep it too, with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            slicer_bin: get("SLICER_BIN").map_or(defaults.slicer_bin, PathBuf::from),
            slicer_config_dir: get("SLICER_CONFIG_DIR").map_or(defaults.slicer_config_dir, PathBuf::from),
            upload_dir: get("UPLOAD_DIR").map_or(defaults.upload_dir, PathBuf::from),
            slicer_timeout: parsed(get("SLICER_TIMEOUT_SECS"), "SLICER_TIMEOUT_SECS")
                .map_or(defaults.slicer_timeout, Duration::from_secs),
            cors_origin: get("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            max_upload_bytes: parsed::<usize>(get("MAX_UPLOAD_MB"), "MAX_UPLOAD_MB")
                .map_or(defaults.max_upload_bytes, |mb| mb.saturating_mul(1024 * 1024)),
        }
    }

    /// Resolve relative paths against the current directory. The engine runs
    /// with the upload directory as its working directory, so every path
    /// handed to it must be absolute. A bare `slicer_bin` stays a `PATH`
    /// lookup.
    pub fn with_absolute_paths(mut self) -> std::io::Result<Self> {
        self.upload_dir = std::path::absolute(&self.upload_dir)?;
        self.slicer_config_dir = std::path::absolute(&self.slicer_config_dir)?;
        if self.slicer_bin.components().count() > 1 {
            self.slicer_bin = std::path::absolute(&self.slicer_bin)?;
        }
        Ok(self)
    }
}

fn parsed<T: FromStr>(value: Option<String>, key: &str) -> Option<T> {
    let value = value?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", key, value);
            None
        }
    }
}

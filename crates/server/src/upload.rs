use std::path::{Path, PathBuf};

/// An uploaded model written to the upload directory.
///
/// The model file and the engine's G-code output next to it are removed
/// when the guard is dropped, whichever way the request ends.
#[derive(Debug)]
pub struct StoredUpload {
    model_path: PathBuf,
    gcode_path: PathBuf,
}

impl StoredUpload {
    /// Write `bytes` under a fresh random name, keeping the original
    /// extension so the engine can tell STL from 3MF.
    pub async fn store(dir: &Path, original_name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let id = uuid::Uuid::new_v4();
        let file_name = match safe_extension(original_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        let model_path = dir.join(file_name);
        let mut gcode_name = model_path.as_os_str().to_owned();
        gcode_name.push(".gcode");
        let gcode_path = PathBuf::from(gcode_name);

        // Guard exists before the write so a partial file is cleaned up too.
        let upload = Self {
            model_path,
            gcode_path,
        };
        tokio::fs::write(&upload.model_path, bytes).await?;
        tracing::debug!("Stored upload {} ({} bytes)", upload.model_path.display(), bytes.len());
        Ok(upload)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn gcode_path(&self) -> &Path {
        &self.gcode_path
    }
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        for path in [&self.model_path, &self.gcode_path] {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Lower-cased extension if it is short and alphanumeric.
fn safe_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension("Part.STL").as_deref(), Some("stl"));
        assert_eq!(safe_extension("plate.3mf").as_deref(), Some("3mf"));
        assert_eq!(safe_extension("noext"), None);
        assert_eq!(safe_extension("x.s t l"), None);
        assert_eq!(safe_extension("../../etc/passwd"), None);
    }

    #[tokio::test]
    async fn test_files_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload = StoredUpload::store(dir.path(), "part.stl", b"solid x\nendsolid x\n")
            .await
            .unwrap();

        let model = upload.model_path().to_path_buf();
        let gcode = upload.gcode_path().to_path_buf();
        assert!(model.starts_with(dir.path()));
        assert_eq!(model.extension().unwrap(), "stl");
        assert!(gcode.to_string_lossy().ends_with(".stl.gcode"));
        assert!(model.exists());

        std::fs::write(&gcode, b"G1 X0").unwrap();
        drop(upload);
        assert!(!model.exists());
        assert!(!gcode.exists());
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = StoredUpload::store(dir.path(), "a.stl", b"").await.unwrap();
        let b = StoredUpload::store(dir.path(), "a.stl", b"").await.unwrap();
        assert_ne!(a.model_path(), b.model_path());
    }
}

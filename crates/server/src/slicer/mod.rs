//! External slicing engine invocation.
//!
//! The engine runs as a child process with an explicit argument list (no
//! shell), one process per request, bounded by a timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SlicerError {
    #[error("invalid {kind} profile: {name:?}")]
    InvalidProfile { kind: &'static str, name: String },

    #[error("failed to start slicer: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("slicer exited with status {code:?}: {}", stderr.trim())]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("slicer did not finish within {0:?}")]
    Timeout(Duration),
}

/// Normalize a profile name from the request: trimmed, lower-cased, and
/// confined to its config subdirectory.
pub fn profile_name(kind: &'static str, raw: &str) -> Result<String, SlicerError> {
    let name = raw.trim().to_lowercase();
    let invalid = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0');
    if invalid {
        return Err(SlicerError::InvalidProfile {
            kind,
            name: raw.to_string(),
        });
    }
    Ok(name)
}

/// Arguments for one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceJob {
    pub printer_config: PathBuf,
    pub quality_config: PathBuf,
    pub material_config: PathBuf,
    pub model: PathBuf,
    pub output: PathBuf,
}

impl SliceJob {
    /// Resolve profile files under `config_dir`.
    pub fn new(
        config_dir: &Path,
        quality: &str,
        material: &str,
        model: &Path,
        output: &Path,
    ) -> Result<Self, SlicerError> {
        let quality = profile_name("quality", quality)?;
        let material = profile_name("material", material)?;
        Ok(Self {
            printer_config: config_dir.join("printer.json"),
            quality_config: config_dir.join("quality").join(format!("{quality}.json")),
            material_config: config_dir.join("material").join(format!("{material}.json")),
            model: model.to_path_buf(),
            output: output.to_path_buf(),
        })
    }

    /// `slice -j printer -j quality -j material -l model -o output`
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "slice".into(),
            "-j".into(),
            self.printer_config.clone().into(),
            "-j".into(),
            self.quality_config.clone().into(),
            "-j".into(),
            self.material_config.clone().into(),
            "-l".into(),
            self.model.clone().into(),
            "-o".into(),
            self.output.clone().into(),
        ]
    }
}

/// Run the engine and return its stdout.
///
/// The child is killed if the timeout expires or the request is dropped.
pub async fn run(
    bin: &Path,
    job: &SliceJob,
    work_dir: &Path,
    timeout: Duration,
) -> Result<String, SlicerError> {
    tracing::info!("Running {} {:?}", bin.display(), job.args());

    let child = Command::new(bin)
        .args(job.args())
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => return Err(SlicerError::Timeout(timeout)),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        tracing::error!("Slicer stderr: {}", stderr);
        return Err(SlicerError::NonZeroExit {
            code: output.status.code(),
            stderr,
        });
    }

    tracing::debug!("Slicer stdout: {}", stdout);
    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(dir: &Path) -> SliceJob {
        SliceJob::new(
            Path::new("configs"),
            "Standard",
            "PETG",
            &dir.join("model.stl"),
            &dir.join("model.stl.gcode"),
        )
        .unwrap()
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(profile_name("quality", " Fine ").unwrap(), "fine");
        assert_eq!(profile_name("material", "PLA+").unwrap(), "pla+");
        for bad in ["", "  ", "../printer", "a/b", "a\\b", ".."] {
            assert!(
                matches!(profile_name("material", bad), Err(SlicerError::InvalidProfile { .. })),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn test_argument_layout() {
        let j = job(Path::new("/tmp/up"));
        assert_eq!(j.quality_config, PathBuf::from("configs/quality/standard.json"));
        assert_eq!(j.material_config, PathBuf::from("configs/material/petg.json"));

        let args = j.args();
        assert_eq!(args.len(), 11);
        assert_eq!(args[0], "slice");
        assert_eq!(args[2], OsString::from("configs/printer.json"));
        assert_eq!(args[7], "-l");
        assert_eq!(args[10], OsString::from("/tmp/up/model.stl.gcode"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(
            Path::new("/nonexistent/slicer-engine"),
            &job(dir.path()),
            dir.path(),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(result, Err(SlicerError::Spawn(_))));
    }

    // `/bin/sh slice ...` runs the file `slice` in the working directory as
    // a script, which stands in for the engine.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_scripted_engine() {
        let dir = tempfile::tempdir().unwrap();
        let sh = Path::new("/bin/sh");

        std::fs::write(dir.path().join("slice"), "echo 'Filament used: 3.5m'\necho 'Print time: 90min'\n").unwrap();
        let out = run(sh, &job(dir.path()), dir.path(), Duration::from_secs(5)).await.unwrap();
        assert!(out.contains("Filament used: 3.5m"));

        std::fs::write(dir.path().join("slice"), "echo boom >&2\nexit 3\n").unwrap();
        let err = run(sh, &job(dir.path()), dir.path(), Duration::from_secs(5)).await.unwrap_err();
        match err {
            SlicerError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected non-zero exit, got {other:?}"),
        }

        std::fs::write(dir.path().join("slice"), "sleep 5\n").unwrap();
        let err = run(sh, &job(dir.path()), dir.path(), Duration::from_millis(200)).await.unwrap_err();
        assert!(matches!(err, SlicerError::Timeout(_)));
    }
}

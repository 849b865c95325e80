//! On-disk artifacts: `{media_root}/uploads` and `{media_root}/converted`.

use std::io;
use std::path::{Path, PathBuf};

use jpg2pdf_core::naming;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct MediaRoot {
    root: PathBuf,
}

/// Outcome of a best-effort file removal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileRemoval {
    pub removed: usize,
    pub failed: usize,
}

impl MediaRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn converted_dir(&self) -> PathBuf {
        self.root.join("converted")
    }

    pub fn upload_path(&self, file_name: &str) -> PathBuf {
        self.uploads_dir().join(file_name)
    }

    pub fn converted_path(&self, file_name: &str) -> PathBuf {
        self.converted_dir().join(file_name)
    }

    pub async fn ensure_dirs(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(self.uploads_dir()).await?;
        tokio::fs::create_dir_all(self.converted_dir()).await
    }

    /// Write an upload under `uploads/` and return its path.
    pub async fn save_upload(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(self.uploads_dir()).await?;
        let path = self.upload_path(file_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Remove a stored upload, logging instead of failing.
    pub async fn remove_upload(&self, path: &Path) -> bool {
        match tokio::fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove file");
                false
            }
        }
    }

    /// Remove the converted output and every stored upload of the job with
    /// id `job_id`. Missing files are not failures.
    pub async fn remove_job_files(
        &self,
        job_id: &str,
        converted_filename: Option<&str>,
    ) -> FileRemoval {
        let mut outcome = FileRemoval::default();

        if let Some(name) = converted_filename.filter(|n| is_plain_file_name(n)) {
            remove_into(&self.converted_path(name), &mut outcome).await;
        }
        if job_id.is_empty() {
            return outcome;
        }

        let prefix = naming::upload_prefix(job_id);
        let mut entries = match tokio::fs::read_dir(self.uploads_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return outcome,
            Err(e) => {
                warn!(job_id, error = %e, "failed to list uploads");
                outcome.failed += 1;
                return outcome;
            }
        };
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if entry.file_name().to_string_lossy().starts_with(&prefix) {
                        remove_into(&entry.path(), &mut outcome).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(job_id, error = %e, "failed to read uploads entry");
                    outcome.failed += 1;
                    break;
                }
            }
        }
        outcome
    }
}

/// Stored names never contain separators; anything else stays put.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().is_some_and(|n| n == name)
}

async fn remove_into(path: &Path, outcome: &mut FileRemoval) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed file");
            outcome.removed += 1;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove file");
            outcome.failed += 1;
        }
    }
}

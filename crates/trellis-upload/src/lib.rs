//! Batch file upload collaborator
//!
//! Accepts a batch of files for a target folder, enforces count, size and
//! type constraints, reports 0–100 percent progress per file, and returns
//! a retrievable URL per stored file. A failed file never aborts its
//! siblings; the caller surfaces per-file failures (typically as a
//! destructive toast) and keeps the successes.

use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use trellis_config::UploadConfig;
use uuid::Uuid;

/// Write granularity; one progress callback per chunk
const CHUNK_SIZE: usize = 64 * 1024;

/// Upload errors, reported per file
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Batch exceeds the maximum of {max} files")]
    TooManyFiles { max: usize },

    #[error("File {name} exceeds the maximum size of {max} bytes")]
    TooLarge { name: String, max: u64 },

    #[error("File {name} has an unsupported type")]
    UnsupportedType { name: String },

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Constraints applied to every batch
#[derive(Debug, Clone)]
pub struct UploadConstraints {
    pub max_files: usize,
    pub max_file_bytes: u64,
    /// Allowed extensions, lowercase, without the dot
    pub allowed_extensions: Vec<String>,
}

impl From<&UploadConfig> for UploadConstraints {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_file_bytes: config.max_file_bytes,
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }
}

/// One file of an upload batch
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Result for one file of a batch
#[derive(Debug)]
pub struct UploadOutcome {
    pub name: String,
    /// Retrievable URL on success
    pub result: UploadResult<String>,
}

/// Stores upload batches under a root directory
#[derive(Debug, Clone)]
pub struct Uploader {
    root: PathBuf,
    public_base_url: String,
    constraints: UploadConstraints,
}

impl Uploader {
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        constraints: UploadConstraints,
    ) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
            constraints,
        }
    }

    /// Store a batch of files under `folder`
    ///
    /// Outcomes come back in input order. `progress` is called with the
    /// file name and a 0–100 percentage as each file is written.
    pub async fn upload_batch<F>(
        &self,
        folder: &str,
        files: Vec<UploadFile>,
        progress: F,
    ) -> Vec<UploadOutcome>
    where
        F: Fn(&str, u8),
    {
        if files.len() > self.constraints.max_files {
            let max = self.constraints.max_files;
            warn!("Rejecting batch of {} files (max {})", files.len(), max);
            return files
                .into_iter()
                .map(|file| UploadOutcome {
                    name: file.name,
                    result: Err(UploadError::TooManyFiles { max }),
                })
                .collect();
        }

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let name = file.name.clone();
            let result = self.store_file(folder, file, &progress).await;
            if let Err(ref e) = result {
                // Siblings keep going; the failure is reported per file.
                warn!("Upload of {} failed: {}", name, e);
            }
            outcomes.push(UploadOutcome { name, result });
        }
        outcomes
    }

    async fn store_file<F>(
        &self,
        folder: &str,
        file: UploadFile,
        progress: &F,
    ) -> UploadResult<String>
    where
        F: Fn(&str, u8),
    {
        self.validate(&file)?;

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;

        // Uuid prefix keeps concurrent uploads of the same name apart.
        let stored_name = format!("{}_{}", Uuid::new_v4(), file.name);
        let path = dir.join(&stored_name);

        let mut out = tokio::fs::File::create(&path).await?;
        let total = file.bytes.len();
        let mut written = 0usize;

        if total == 0 {
            out.flush().await?;
            progress(&file.name, 100);
        } else {
            for chunk in file.bytes.chunks(CHUNK_SIZE) {
                out.write_all(chunk).await?;
                written += chunk.len();
                progress(&file.name, ((written * 100) / total) as u8);
            }
            out.flush().await?;
        }

        debug!("Stored {} as {:?}", file.name, path);
        Ok(format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            folder,
            stored_name
        ))
    }

    fn validate(&self, file: &UploadFile) -> UploadResult<()> {
        if file.name.is_empty()
            || file.name.contains('/')
            || file.name.contains('\\')
            || file.name.contains("..")
        {
            return Err(UploadError::InvalidName(file.name.clone()));
        }

        let extension = file
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !self
            .constraints
            .allowed_extensions
            .iter()
            .any(|allowed| *allowed == extension)
        {
            return Err(UploadError::UnsupportedType {
                name: file.name.clone(),
            });
        }

        if file.bytes.len() as u64 > self.constraints.max_file_bytes {
            return Err(UploadError::TooLarge {
                name: file.name.clone(),
                max: self.constraints.max_file_bytes,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn constraints() -> UploadConstraints {
        UploadConstraints {
            max_files: 3,
            max_file_bytes: 1024,
            allowed_extensions: vec!["png".to_string(), "pdf".to_string()],
        }
    }

    fn uploader(dir: &TempDir) -> Uploader {
        Uploader::new(dir.path(), "http://localhost:4000/uploads", constraints())
    }

    #[test]
    fn test_constraints_follow_config() {
        let config = trellis_config::UploadConfig::default();
        let constraints = UploadConstraints::from(&config);
        assert_eq!(constraints.max_files, config.max_files);
        assert_eq!(constraints.max_file_bytes, config.max_file_bytes);
        assert!(constraints.allowed_extensions.contains(&"png".to_string()));
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_returns_url() {
        let dir = TempDir::new().unwrap();
        let uploader = uploader(&dir);

        let outcomes = uploader
            .upload_batch(
                "banners",
                vec![UploadFile::new("logo.png", vec![1; 100])],
                |_, _| {},
            )
            .await;

        assert_eq!(outcomes.len(), 1);
        let url = outcomes[0].result.as_ref().unwrap();
        assert!(url.starts_with("http://localhost:4000/uploads/banners/"));
        assert!(url.ends_with("_logo.png"));

        let stored: Vec<_> = std::fs::read_dir(dir.path().join("banners"))
            .unwrap()
            .collect();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_progress_reaches_one_hundred() {
        let dir = TempDir::new().unwrap();
        let uploader = uploader(&dir);
        let reported: Mutex<Vec<u8>> = Mutex::new(Vec::new());

        uploader
            .upload_batch(
                "banners",
                vec![UploadFile::new("logo.png", vec![0; 500])],
                |_, pct| reported.lock().unwrap().push(pct),
            )
            .await;

        let reported = reported.lock().unwrap();
        assert_eq!(reported.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_failed_file_does_not_abort_siblings() {
        let dir = TempDir::new().unwrap();
        let uploader = uploader(&dir);

        let outcomes = uploader
            .upload_batch(
                "banners",
                vec![
                    UploadFile::new("huge.png", vec![0; 4096]),
                    UploadFile::new("small.png", vec![0; 10]),
                ],
                |_, _| {},
            )
            .await;

        assert!(matches!(
            outcomes[0].result,
            Err(UploadError::TooLarge { .. })
        ));
        assert!(outcomes[1].result.is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected() {
        let dir = TempDir::new().unwrap();
        let uploader = uploader(&dir);

        let outcomes = uploader
            .upload_batch(
                "banners",
                vec![UploadFile::new("script.exe", vec![0; 10])],
                |_, _| {},
            )
            .await;

        assert!(matches!(
            outcomes[0].result,
            Err(UploadError::UnsupportedType { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_over_max_files_rejected() {
        let dir = TempDir::new().unwrap();
        let uploader = uploader(&dir);
        let files = (0..4)
            .map(|i| UploadFile::new(format!("f{}.png", i), vec![0; 1]))
            .collect();

        let outcomes = uploader.upload_batch("banners", files, |_, _| {}).await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o.result, Err(UploadError::TooManyFiles { .. }))));
    }

    #[tokio::test]
    async fn test_path_traversal_name_rejected() {
        let dir = TempDir::new().unwrap();
        let uploader = uploader(&dir);

        let outcomes = uploader
            .upload_batch(
                "banners",
                vec![UploadFile::new("../escape.png", vec![0; 1])],
                |_, _| {},
            )
            .await;

        assert!(matches!(
            outcomes[0].result,
            Err(UploadError::InvalidName(_))
        ));
    }
}

//! Evidence storage
//!
//! Verification evidence (scanned documents) is stored outside the
//! certificate row; the lifecycle engine only ever sees the opaque
//! reference returned by [`EvidenceStore::store`].

use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::types::{Result, TrackerError};

/// Blob storage seam for verification evidence
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Store a blob and return its reference
    async fn store(&self, data: &[u8]) -> Result<String>;

    /// Read a blob back by reference
    async fn retrieve(&self, reference: &str) -> Result<Vec<u8>>;
}

/// Content-addressed filesystem evidence store
///
/// Blobs land at `<root>/<aa>/<hash>` where `aa` is the first hash byte,
/// so identical uploads deduplicate to one file.
pub struct FsEvidenceStore {
    root: PathBuf,
}

impl FsEvidenceStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.root.join(&hash[..2]).join(hash)
    }
}

#[async_trait]
impl EvidenceStore for FsEvidenceStore {
    async fn store(&self, data: &[u8]) -> Result<String> {
        let hash = hex::encode(Sha256::digest(data));
        let path = self.blob_path(&hash);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;

        Ok(hash)
    }

    async fn retrieve(&self, reference: &str) -> Result<Vec<u8>> {
        if reference.len() < 2 {
            return Err(TrackerError::NotFound(format!(
                "Evidence reference '{}' is malformed",
                reference
            )));
        }

        let path = self.blob_path(reference);
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TrackerError::NotFound(
                format!("Evidence {} not found", reference),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

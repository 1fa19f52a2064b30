use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use super::{PersistenceBackend, StorageError};

/// File-system backend storing each key as a JSON file under a base directory.
///
/// Keys are percent-encoded into file names, so namespaced keys such as
/// `@GoMarketplace:cart` map to `%40GoMarketplace%3Acart.json`. Writes go to
/// a temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileBackend {
    base_path: PathBuf,
}

impl FileBackend {
    /// Create a new file backend rooted at `base_path`.
    ///
    /// The directory is created on first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub(crate) fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", encode_key(key))))
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".to_string()));
        }
        if key.chars().any(char::is_control) {
            return Err(StorageError::InvalidKey(format!(
                "key contains control characters: {key:?}"
            )));
        }
        Ok(())
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]`.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

#[async_trait]
impl PersistenceBackend for FileBackend {
    #[instrument(skip(self), fields(base_path = %self.base_path.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value), fields(base_path = %self.base_path.display(), len = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        tokio::fs::create_dir_all(&self.base_path).await?;

        let tmp_path = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }
}

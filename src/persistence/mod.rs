//! Document store access for chunking jobs.
//!
//! Documents are JSON values addressed by bucket and key. The filesystem
//! implementation maps them to `<root>/<bucket>/<key>`.

use crate::error::StorageError;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

pub trait DocumentStore: Send + Sync {
    fn read(&self, bucket: &str, key: &str) -> Result<Value, StorageError>;

    fn write(&self, bucket: &str, key: &str, document: &Value) -> Result<(), StorageError>;
}

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path, refusing anything that would escape the root.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        for part in [bucket, key] {
            let relative = Path::new(part);
            let is_safe = !part.is_empty()
                && relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !is_safe {
                return Err(StorageError::InvalidKey(format!("{}/{}", bucket, key)));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl DocumentStore for FsDocumentStore {
    fn read(&self, bucket: &str, key: &str) -> Result<Value, StorageError> {
        let path = self.object_path(bucket, key)?;

        let file = File::open(&path).map_err(|source| StorageError::Read {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })?;

        let document = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            StorageError::Decode {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            }
        })?;

        tracing::debug!(path = %path.display(), "Document read");
        Ok(document)
    }

    fn write(&self, bucket: &str, key: &str, document: &Value) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        let write_err = |source| StorageError::Write {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let file = File::create(&path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, document).map_err(|e| write_err(e.into()))?;
        writer.flush().map_err(write_err)?;

        tracing::debug!(path = %path.display(), "Document written");
        Ok(())
    }
}

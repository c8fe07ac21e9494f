//! Byte-level document storage seam.
//!
//! # Responsibility
//! - Abstract the host's reader/writer bound to one document location.
//!
//! # Invariants
//! - A document that does not exist yet reads as `Ok(None)`.
//! - `write` replaces the whole document.

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "document store I/O failed at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Reader/writer bound to one document location.
pub trait DocumentStore {
    /// Reads the full document, or `None` when it does not exist.
    fn read(&self) -> StoreResult<Option<Vec<u8>>>;
    /// Replaces the full document.
    fn write(&self, bytes: &[u8]) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        (**self).write(bytes)
    }
}

/// In-memory store used by the FFI bridge and tests.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
        }
    }

    /// Current contents, if any were written.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        Ok(())
    }
}

/// Store backed by one file path.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    path: PathBuf,
}

impl FileDocumentStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentStore for FileDocumentStore {
    fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                info!(
                    "event=document_read module=repo status=ok mode=file bytes={}",
                    bytes.len()
                );
                Ok(Some(bytes))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("event=document_read module=repo status=ok mode=file found=false");
                Ok(None)
            }
            Err(err) => {
                error!(
                    "event=document_read module=repo status=error mode=file error_code=io_failed error={}",
                    err
                );
                Err(self.io_error(err))
            }
        }
    }

    fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        std::fs::write(&self.path, bytes).map_err(|err| {
            error!(
                "event=document_write module=repo status=error mode=file error_code=io_failed error={}",
                err
            );
            self.io_error(err)
        })?;
        info!(
            "event=document_write module=repo status=ok mode=file bytes={}",
            bytes.len()
        );
        Ok(())
    }
}

//! # Document Store
//!
//! File I/O for the namespace and pool documents.
//!
//! Every mutation runs as one transaction: take the writer lock, load both
//! documents, apply the operation to a `Session`, and persist both documents
//! only if the operation succeeded. Index allocation reads the namespace
//! cursor and then writes tokens above it, so the whole sequence must be
//! serialized per document pair.
//!
//! ## Locking
//!
//! Each CLI invocation is its own process, so the writer lock is an advisory
//! file lock on `<memory document>.lock`, held for the whole transaction.
//! Readers take the same lock shared. Tasks of one process are serialized by
//! an in-process mutex before they reach the file lock.
//!
//! ## Writes
//!
//! Both documents are first written to uniquely named temporary files in
//! their target directories. Only when both are staged are they renamed over
//! the targets.

use crate::config::Settings;
use fs2::FileExt;
use insepa_core::{
    InsepaError, NamespaceRegistry, Session, TextPool, namespaces_from_json, namespaces_to_json,
    pool_from_json, pool_to_json, primitives::MAX_DOCUMENT_SIZE,
};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// Owner of the two document paths and their single-writer lock.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    memory_path: PathBuf,
    pool_path: PathBuf,
    lock_path: PathBuf,
    lock: Arc<Mutex<()>>,
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock on the document pair. Released on drop.
struct DocumentLock {
    file: File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl DocumentStore {
    /// Create a store over resolved settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let mut lock_path = settings.memory_path.as_os_str().to_owned();
        lock_path.push(".lock");

        Self {
            memory_path: settings.memory_path.clone(),
            pool_path: settings.pool_path.clone(),
            lock_path: PathBuf::from(lock_path),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the namespace document.
    #[must_use]
    pub fn memory_path(&self) -> &Path {
        &self.memory_path
    }

    /// Path of the pool document.
    #[must_use]
    pub fn pool_path(&self) -> &Path {
        &self.pool_path
    }

    /// Load both documents for reading. Missing files yield fresh documents.
    pub async fn load(&self) -> Result<Session, InsepaError> {
        let _guard = self.lock.lock().await;
        let _file_lock = self.acquire(LockMode::Shared).await?;
        self.read_session().await
    }

    /// Run `operation` against the current documents and persist the result.
    ///
    /// Nothing is written when `operation` fails.
    pub async fn transact<T, F>(&self, operation: F) -> Result<T, InsepaError>
    where
        F: FnOnce(&mut Session) -> Result<T, InsepaError>,
    {
        let _guard = self.lock.lock().await;
        let _file_lock = self.acquire(LockMode::Exclusive).await?;
        let mut session = self.read_session().await?;
        let value = operation(&mut session)?;
        self.write_session(&session).await?;
        Ok(value)
    }

    /// Write fresh documents. Returns `false` without touching anything if a
    /// document already exists and `force` is not set.
    pub async fn init(&self, force: bool) -> Result<bool, InsepaError> {
        let _guard = self.lock.lock().await;
        let _file_lock = self.acquire(LockMode::Exclusive).await?;
        if !force && (exists(&self.memory_path).await? || exists(&self.pool_path).await?) {
            return Ok(false);
        }
        self.write_session(&Session::new()).await?;
        Ok(true)
    }

    // =========================================================================
    // LOCKING
    // =========================================================================

    async fn acquire(&self, mode: LockMode) -> Result<DocumentLock, InsepaError> {
        let path = self.lock_path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InsepaError::IoError(format!("Create {:?}: {}", parent, e)))?;
        }

        tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| InsepaError::IoError(format!("Open lock {:?}: {}", path, e)))?;

            match mode {
                LockMode::Shared => FileExt::lock_shared(&file),
                LockMode::Exclusive => FileExt::lock_exclusive(&file),
            }
            .map_err(|e| InsepaError::IoError(format!("Acquire lock {:?}: {}", path, e)))?;

            Ok(DocumentLock { file })
        })
        .await
        .map_err(|e| InsepaError::IoError(format!("Join lock task: {}", e)))?
    }

    // =========================================================================
    // FILE I/O
    // =========================================================================

    async fn read_session(&self) -> Result<Session, InsepaError> {
        let namespaces = match read_document(&self.memory_path).await? {
            Some(bytes) => {
                let (registry, report) = namespaces_from_json(&bytes)?;
                if !report.is_clean() {
                    tracing::info!(
                        "Upgraded {:?}: {} legacy blocks, {} recomputed checksums, {} qualified markers",
                        self.memory_path,
                        report.legacy_blocks,
                        report.recomputed_checksums,
                        report.qualified_markers
                    );
                }
                registry
            }
            None => NamespaceRegistry::new(),
        };

        let pool = match read_document(&self.pool_path).await? {
            Some(bytes) => {
                let (pool, report) = pool_from_json(&bytes)?;
                if report.legacy_pool_entries > 0 {
                    tracing::info!(
                        "Upgraded {:?}: {} bare-string pool entries",
                        self.pool_path,
                        report.legacy_pool_entries
                    );
                }
                pool
            }
            None => TextPool::new(),
        };

        Ok(Session::with_documents(namespaces, pool))
    }

    async fn write_session(&self, session: &Session) -> Result<(), InsepaError> {
        let documents = vec![
            (self.memory_path.clone(), namespaces_to_json(session.namespaces())?),
            (self.pool_path.clone(), pool_to_json(session.pool())?),
        ];
        tokio::task::spawn_blocking(move || write_documents(&documents))
            .await
            .map_err(|e| InsepaError::IoError(format!("Join write task: {}", e)))??;
        tracing::debug!("Persisted {:?} and {:?}", self.memory_path, self.pool_path);
        Ok(())
    }
}

async fn exists(path: &Path) -> Result<bool, InsepaError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| InsepaError::IoError(format!("Cannot stat {:?}: {}", path, e)))
}

/// Read a document, or `None` if it does not exist yet.
///
/// The size is validated before the file is read.
async fn read_document(path: &Path) -> Result<Option<Vec<u8>>, InsepaError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(InsepaError::IoError(format!(
                "Cannot read file metadata {:?}: {}",
                path, e
            )));
        }
    };

    if metadata.len() > MAX_DOCUMENT_SIZE as u64 {
        return Err(InsepaError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_DOCUMENT_SIZE
        )));
    }

    tokio::fs::read(path)
        .await
        .map(Some)
        .map_err(|e| InsepaError::IoError(format!("Read {:?}: {}", path, e)))
}

/// Stage every document in a temporary sibling file, then rename them all
/// into place. A failure while staging leaves every target untouched.
fn write_documents(documents: &[(PathBuf, Vec<u8>)]) -> Result<(), InsepaError> {
    let mut staged = Vec::with_capacity(documents.len());
    for (path, bytes) in documents {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| InsepaError::IoError(format!("Stage {:?}: {}", path, e)))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| InsepaError::IoError(format!("Write {:?}: {}", tmp.path(), e)))?;
        staged.push((tmp, path));
    }

    for (tmp, path) in staged {
        tmp.persist(path)
            .map_err(|e| InsepaError::IoError(format!("Persist {:?}: {}", path, e)))?;
    }
    Ok(())
}

// src/storage/scheme_folder.rs
//! Local scheme directory.
//!
//! Layout: one subdirectory per scheme, named after the scheme identifier,
//! each holding a `scheme.json` description:
//!
//! ```text
//! <root>/
//!   irma-demo/scheme.json
//!   pbdf/scheme.json
//! ```
//!
//! Writes go through a temporary file followed by a rename, so a reader
//! never observes a half-written description.

use crate::models::scheme::{SchemeDescription, SCHEME_FILE};
use crate::storage::{validate_scheme_id, StorageError};
use crate::utils::serialization::{deserialize, serialize_pretty};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const TEMP_FILE: &str = ".scheme.json.tmp";

/// A scheme read from disk, keyed by the directory it was found in.
pub type StoredScheme = (String, Result<SchemeDescription, StorageError>);

/// Handle on the scheme directory.
#[derive(Clone, Debug)]
pub struct SchemeFolder {
    root: PathBuf,
}

impl SchemeFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SchemeFolder { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scheme_path(&self, id: &str) -> PathBuf {
        self.root.join(id).join(SCHEME_FILE)
    }

    /// Reads every scheme description below the root.
    ///
    /// # Returns
    /// One entry per subdirectory containing a `scheme.json`, sorted by
    /// directory name. A description that cannot be read or parsed is
    /// reported in its entry instead of failing the whole listing.
    ///
    /// A missing root directory is treated as empty.
    ///
    /// # Errors
    /// Returns `Err` only if the root itself cannot be listed.
    pub async fn read_all(&self) -> Result<Vec<StoredScheme>, StorageError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.root, e)),
        };

        let mut schemes = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.root, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_dir || name.starts_with('.') {
                continue;
            }

            match self.read_scheme(&name).await {
                Ok(Some(scheme)) => schemes.push((name, Ok(scheme))),
                Ok(None) => continue,
                Err(e) => schemes.push((name, Err(e))),
            }
        }

        schemes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(schemes)
    }

    /// Reads the description stored for `id`, or `None` if there is none.
    pub async fn read_scheme(&self, id: &str) -> Result<Option<SchemeDescription>, StorageError> {
        let path = self.scheme_path(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        deserialize(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Parse {
                origin: path.display().to_string(),
                source,
            })
    }

    /// Stores a scheme description under its own identifier.
    ///
    /// # Returns
    /// Path of the written `scheme.json`
    ///
    /// # Errors
    /// - The identifier is not a valid directory name
    /// - Creating the directory, writing or renaming fails
    pub async fn write_scheme(&self, scheme: &SchemeDescription) -> Result<PathBuf, StorageError> {
        validate_scheme_id(&scheme.id)?;

        let directory = self.root.join(&scheme.id);
        fs::create_dir_all(&directory)
            .await
            .map_err(|e| StorageError::io(&directory, e))?;

        let contents = serialize_pretty(scheme).map_err(|source| StorageError::Parse {
            origin: scheme.id.clone(),
            source,
        })?;

        let temp = directory.join(TEMP_FILE);
        fs::write(&temp, contents)
            .await
            .map_err(|e| StorageError::io(&temp, e))?;

        let target = directory.join(SCHEME_FILE);
        fs::rename(&temp, &target)
            .await
            .map_err(|e| StorageError::io(&target, e))?;

        Ok(target)
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rooftop_logging::rooftop_trace;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot create directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("{path:?} exists and is not a directory")]
    NotADirectory { path: PathBuf },
    #[error("{path:?} is a directory, not an asset")]
    TargetIsDirectory { path: PathBuf },
    #[error("cannot write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Destination for build assets, keyed by output-relative path.
pub trait AssetSink {
    fn emit(&mut self, path: &str, contents: &str) -> Result<(), PersistError>;
}

/// Writes assets below an output directory.
///
/// Each asset is written to a temp file next to its target and renamed into
/// place, so a failed build never leaves a half-written page behind.
/// `path` must already be sanitized.
#[derive(Debug, Clone)]
pub struct DirectoryAssetSink {
    output_dir: PathBuf,
}

impl DirectoryAssetSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn prepare_dir(dir: &Path) -> Result<(), PersistError> {
        if dir.is_dir() {
            return Ok(());
        }
        if dir.exists() {
            return Err(PersistError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }
}

impl AssetSink for DirectoryAssetSink {
    fn emit(&mut self, path: &str, contents: &str) -> Result<(), PersistError> {
        let target = self.output_dir.join(path);
        if target.is_dir() {
            return Err(PersistError::TargetIsDirectory { path: target });
        }
        let dir = target.parent().unwrap_or(&self.output_dir);
        Self::prepare_dir(dir)?;

        let write_error = |source| PersistError::Write {
            path: target.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
        staged.write_all(contents.as_bytes()).map_err(write_error)?;
        staged.as_file().sync_all().map_err(write_error)?;
        staged
            .persist(&target)
            .map_err(|err| write_error(err.error))?;
        rooftop_trace!("wrote {:?}", target);
        Ok(())
    }
}

/// Keeps assets in memory; later emits to the same path replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAssetSink {
    assets: BTreeMap<String, String>,
}

impl MemoryAssetSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.assets.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }
}

impl AssetSink for MemoryAssetSink {
    fn emit(&mut self, path: &str, contents: &str) -> Result<(), PersistError> {
        self.assets.insert(path.to_string(), contents.to_string());
        Ok(())
    }
}

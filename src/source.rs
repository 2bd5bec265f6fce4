use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// How the file's bytes were turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Valid UTF-8.
    Clean,
    /// Invalid sequences were dropped.
    Lossy { dropped_bytes: usize },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} changed on disk since it was read; refusing to overwrite")]
    ChangedOnDisk(PathBuf),

    #[error("path has no parent directory: {0}")]
    NoParent(PathBuf),
}

/// The whole target file, loaded once.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    text: String,
    decode: DecodeMode,
    fingerprint: u64,
}

impl SourceDocument {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let bytes = fs::read(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        let (text, decode) = decode(&bytes);
        Ok(Self {
            path,
            text,
            decode,
            fingerprint: xxh3_64(&bytes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Overwrite the file with `new_text` as UTF-8.
    ///
    /// Symlinks are followed, so the file they point at is rewritten and the
    /// link itself stays in place. The file is re-read first; if its bytes no
    /// longer hash to what was loaded, nothing is written.
    pub fn write_back(&self, new_text: &str) -> Result<(), SourceError> {
        let real_path = fs::canonicalize(&self.path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })?;

        let current = fs::read(&real_path).map_err(|source| SourceError::Read {
            path: real_path.clone(),
            source,
        })?;
        if xxh3_64(&current) != self.fingerprint {
            return Err(SourceError::ChangedOnDisk(self.path.clone()));
        }

        atomic_write(&real_path, new_text.as_bytes()).map_err(|err| match err {
            WriteFailure::NoParent => SourceError::NoParent(real_path.clone()),
            WriteFailure::Io(source) => SourceError::Write {
                path: real_path.clone(),
                source,
            },
        })
    }
}

/// Decode as UTF-8, dropping invalid sequences if there are any.
pub fn decode(bytes: &[u8]) -> (String, DecodeMode) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), DecodeMode::Clean),
        Err(_) => {
            let mut text = String::with_capacity(bytes.len());
            let mut dropped_bytes = 0;
            for chunk in bytes.utf8_chunks() {
                text.push_str(chunk.valid());
                dropped_bytes += chunk.invalid().len();
            }
            (text, DecodeMode::Lossy { dropped_bytes })
        }
    }
}

enum WriteFailure {
    NoParent,
    Io(std::io::Error),
}

impl From<std::io::Error> for WriteFailure {
    fn from(err: std::io::Error) -> Self {
        WriteFailure::Io(err)
    }
}

/// Atomic file write: tempfile + fsync + rename, keeping the original permissions.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), WriteFailure> {
    // Same directory so the rename stays on one filesystem.
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(WriteFailure::NoParent),
    };

    let permissions = fs::metadata(path)?.permissions();
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

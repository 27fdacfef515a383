//! Bundle source providers.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sha2::{Digest as Sha2Digest, Sha256};

use crate::error::{Result, SsrError};

/// Supplies the server bundle source for a configured path.
pub trait BundleLoader: Send + Sync {
    /// Return the bundle source. Unreadable or empty bundles are
    /// configuration errors.
    fn load(&self, path: &Path) -> Result<String>;
}

impl<T: BundleLoader + ?Sized> BundleLoader for Arc<T> {
    fn load(&self, path: &Path) -> Result<String> {
        (**self).load(path)
    }
}

/// Reads bundles from the filesystem on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsBundleLoader;

impl BundleLoader for FsBundleLoader {
    fn load(&self, path: &Path) -> Result<String> {
        let source = fs::read_to_string(path).map_err(|source| SsrError::BundleNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        if source.is_empty() {
            return Err(SsrError::EmptyBundle {
                path: path.to_path_buf(),
            });
        }
        Ok(source)
    }
}

/// In-memory bundles keyed by path (tests and embedding hosts).
#[derive(Debug, Default)]
pub struct MemoryBundleLoader {
    bundles: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryBundleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    /// Add or replace the bundle stored at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, source: impl Into<String>) {
        let mut bundles = self.bundles.lock().unwrap_or_else(|e| e.into_inner());
        bundles.insert(path.into(), source.into());
    }
}

impl BundleLoader for MemoryBundleLoader {
    fn load(&self, path: &Path) -> Result<String> {
        let bundles = self.bundles.lock().unwrap_or_else(|e| e.into_inner());
        match bundles.get(path) {
            Some(source) if source.is_empty() => Err(SsrError::EmptyBundle {
                path: path.to_path_buf(),
            }),
            Some(source) => Ok(source.clone()),
            None => Err(SsrError::BundleNotFound {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

/// SHA-256 of a bundle's source, used to detect changes between renders.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BundleDigest([u8; 32]);

impl BundleDigest {
    pub fn compute(source: &str) -> Self {
        let hash = Sha256::digest(source.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for BundleDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BundleDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BundleDigest({})", self.short())
    }
}

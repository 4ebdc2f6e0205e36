//! Byte-oriented persistence for ensemble member artifacts.
//!
//! The store works in opaque bytes keyed by `(kind, member index)`, so the
//! serialization format stays an implementation detail of the caller. The
//! on-disk naming (`reservoir_{i}.bin`, `readout_{i}.bin`, indices 1..=N)
//! is the interoperability contract with downstream tooling.

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::Mutex,
};

use thiserror::Error;

/// The two artifact families an ensemble member produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The serialized reservoir model (weights, projection, parameters)
    Reservoir,
    /// The serialized readout weight matrix
    Readout,
}

impl ArtifactKind {
    fn file_name(&self, index: usize) -> String {
        match self {
            ArtifactKind::Reservoir => format!("reservoir_{}.bin", index),
            ArtifactKind::Readout => format!("readout_{}.bin", index),
        }
    }
}

/// Errors of artifact persistence, separate from the numerical pipeline's
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Filesystem access failed
    #[error("artifact i/o failed: {0}")]
    Io(#[from] io::Error),

    /// Encoding or decoding the artifact bytes failed
    #[error("artifact codec failed: {0}")]
    Codec(#[from] bincode::Error),

    /// No artifact stored under the requested key
    #[error("no {kind:?} artifact stored for member {index}")]
    Missing {
        /// Which artifact family was requested
        kind: ArtifactKind,
        /// The member index of the request
        index: usize,
    },
}

/// Keyed byte storage for model artifacts
pub trait ArtifactStore {
    /// Persist `bytes` under `(kind, index)`, overwriting any previous value
    fn save(&self, kind: ArtifactKind, index: usize, bytes: &[u8]) -> Result<(), ArtifactError>;

    /// Load the bytes stored under `(kind, index)`
    fn load(&self, kind: ArtifactKind, index: usize) -> Result<Vec<u8>, ArtifactError>;
}

/// Filesystem-backed store, one file per artifact in a flat directory
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (and create if needed) the artifact directory
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

impl ArtifactStore for DirStore {
    fn save(&self, kind: ArtifactKind, index: usize, bytes: &[u8]) -> Result<(), ArtifactError> {
        let path = self.root.join(kind.file_name(index));
        fs::write(path, bytes)?;
        Ok(())
    }

    fn load(&self, kind: ArtifactKind, index: usize) -> Result<Vec<u8>, ArtifactError> {
        let path = self.root.join(kind.file_name(index));
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ArtifactError::Missing { kind, index })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemStore {
    entries: Mutex<HashMap<(ArtifactKind, usize), Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemStore {
    fn save(&self, kind: ArtifactKind, index: usize, bytes: &[u8]) -> Result<(), ArtifactError> {
        self.entries
            .lock()
            .expect("artifact store lock poisoned")
            .insert((kind, index), bytes.to_vec());
        Ok(())
    }

    fn load(&self, kind: ArtifactKind, index: usize) -> Result<Vec<u8>, ArtifactError> {
        self.entries
            .lock()
            .expect("artifact store lock poisoned")
            .get(&(kind, index))
            .cloned()
            .ok_or(ArtifactError::Missing { kind, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_store_round_trips_bytes() {
        let store = MemStore::new();
        store.save(ArtifactKind::Reservoir, 1, b"abc").unwrap();
        assert_eq!(store.load(ArtifactKind::Reservoir, 1).unwrap(), b"abc");
    }

    #[test]
    fn kinds_and_indices_do_not_collide() {
        let store = MemStore::new();
        store.save(ArtifactKind::Reservoir, 1, b"r1").unwrap();
        store.save(ArtifactKind::Readout, 1, b"o1").unwrap();
        store.save(ArtifactKind::Reservoir, 2, b"r2").unwrap();

        assert_eq!(store.load(ArtifactKind::Reservoir, 1).unwrap(), b"r1");
        assert_eq!(store.load(ArtifactKind::Readout, 1).unwrap(), b"o1");
        assert_eq!(store.load(ArtifactKind::Reservoir, 2).unwrap(), b"r2");
    }

    #[test]
    fn missing_key_is_reported_as_missing() {
        let store = MemStore::new();
        let err = store.load(ArtifactKind::Readout, 9).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::Missing {
                kind: ArtifactKind::Readout,
                index: 9
            }
        ));
    }

    #[test]
    fn dir_store_uses_the_indexed_naming_convention() {
        let root = std::env::temp_dir().join(format!("esn-artifacts-{}", std::process::id()));
        let store = DirStore::new(&root).unwrap();

        store.save(ArtifactKind::Reservoir, 3, b"payload").unwrap();
        assert!(root.join("reservoir_3.bin").exists());
        assert_eq!(store.load(ArtifactKind::Reservoir, 3).unwrap(), b"payload");

        let err = store.load(ArtifactKind::Readout, 3).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));

        fs::remove_dir_all(&root).unwrap();
    }
}

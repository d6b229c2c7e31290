//! Asynchronous sample loading
//!
//! Fetch and decode run on worker threads so the game never waits on them.
//! Results are collected by the engine thread, which is the only place the
//! sample library is modified.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::{decode_sample, AudioBuffer};
use crate::error::{Result, SoundError};

/// Resolves opaque sample URIs to raw bytes
pub trait SampleSource: Send + Sync {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Reads samples from files under a root directory
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SampleSource for FileSource {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root.join(uri);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SoundError::SampleNotFound {
                uri: uri.to_string(),
                source: Some(e),
            },
            _ => SoundError::FetchFailed {
                uri: uri.to_string(),
                source: e,
            },
        })
    }
}

/// In-memory samples keyed by URI
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, bytes: Vec<u8>) -> Self {
        self.insert(uri, bytes);
        self
    }

    pub fn insert(&mut self, uri: &str, bytes: Vec<u8>) {
        self.entries.insert(uri.to_string(), bytes);
    }
}

impl SampleSource for MemorySource {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        self.entries
            .get(uri)
            .cloned()
            .ok_or_else(|| SoundError::SampleNotFound {
                uri: uri.to_string(),
                source: None,
            })
    }
}

/// Outcome of one finished load
#[derive(Debug)]
pub struct CompletedLoad {
    pub name: String,
    pub uri: String,
    pub result: Result<AudioBuffer>,
}

#[derive(Debug)]
struct PendingLoad {
    name: String,
    uri: String,
    handle: JoinHandle<Result<AudioBuffer>>,
}

/// Tracks in-flight loads
#[derive(Debug, Default)]
pub struct SampleLoader {
    pending: Vec<PendingLoad>,
}

impl SampleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.iter().any(|p| p.name == name)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Fetch and decode `uri` in the background, resampled to `sample_rate`
    pub fn spawn(
        &mut self,
        name: &str,
        uri: &str,
        source: Arc<dyn SampleSource>,
        sample_rate: u32,
    ) -> Result<()> {
        let (thread_name, thread_uri) = (name.to_string(), uri.to_string());
        let handle = thread::Builder::new()
            .name(format!("sample-load-{}", name))
            .spawn(move || {
                let bytes = source.fetch(&thread_uri)?;
                decode_sample(&thread_name, &thread_uri, bytes, sample_rate)
            })?;

        self.pending.push(PendingLoad {
            name: name.to_string(),
            uri: uri.to_string(),
            handle,
        });
        Ok(())
    }

    /// Collect loads that have finished, without blocking
    pub fn take_finished(&mut self) -> Vec<CompletedLoad> {
        let (finished, pending): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.handle.is_finished());
        self.pending = pending;
        finished.into_iter().map(Self::join).collect()
    }

    /// Block until every pending load has finished
    pub fn wait_all(&mut self) -> Vec<CompletedLoad> {
        self.pending.drain(..).map(Self::join).collect()
    }

    fn join(load: PendingLoad) -> CompletedLoad {
        let result = load.handle.join().unwrap_or_else(|_| {
            Err(SoundError::LoadAborted {
                name: load.name.clone(),
            })
        });
        CompletedLoad {
            name: load.name,
            uri: load.uri,
            result,
        }
    }
}

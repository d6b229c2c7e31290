//! Sample library
//!
//! Decoded samples by logical name. Entries are write-once.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::AudioBuffer;

#[derive(Debug, Default)]
pub struct SampleLibrary {
    samples: HashMap<String, Arc<AudioBuffer>>,
}

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `buffer` to `name` unless the name is already taken
    ///
    /// Returns whether the buffer was stored.
    pub fn insert(&mut self, name: &str, buffer: AudioBuffer) -> bool {
        if self.samples.contains_key(name) {
            return false;
        }
        self.samples.insert(name.to_string(), Arc::new(buffer));
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<AudioBuffer>> {
        self.samples.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.samples.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Loaded names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.samples.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::config::RenderSettings;
use super::emitter::GeneratedSource;
use super::model::TypeGenerationInput;

/// A generated file together with the input it was rendered from.
#[derive(Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub input: TypeGenerationInput,
    pub source: GeneratedSource,
}

/// Output of the previous pass, keyed by type metadata name.
///
/// Entries are immutable and shared; a pass reads the current map and the
/// caller swaps in the new one with [`GenerationCache::replace`] once the pass
/// has completed.
#[derive(Debug, Default)]
pub struct GenerationCache {
    entries: HashMap<String, Arc<CacheEntry>>,
    /// Settings the entries were rendered with.
    settings: Option<RenderSettings>,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached entry for `key` when its input equals `input`.
    pub fn lookup(&self, key: &str, input: &TypeGenerationInput) -> Option<Arc<CacheEntry>> {
        self.entries
            .get(key)
            .filter(|entry| entry.input == *input)
            .cloned()
    }

    pub fn settings(&self) -> Option<&RenderSettings> {
        self.settings.as_ref()
    }

    pub fn replace(&mut self, entries: HashMap<String, Arc<CacheEntry>>, settings: RenderSettings) {
        self.entries = entries;
        self.settings = Some(settings);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.settings = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cooperative cancellation flag shared between a pass and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

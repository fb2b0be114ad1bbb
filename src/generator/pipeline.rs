use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use super::cache::{CacheEntry, CancellationToken, GenerationCache};
use super::config::GeneratorConfig;
use super::diagnostics::Diagnostic;
use super::emitter::{self, GeneratedSource};
use super::extraction::extract_type;
use crate::csharp::symbols::{Compilation, TypeSymbol};
use crate::error::{GeneratorError, Result};

/// Everything one generation pass produced.
#[derive(Debug, Default)]
pub struct GenerationOutput {
    /// Ordered by type metadata name.
    pub files: Vec<GeneratedSource>,
    /// Ordered by file, line, column, id.
    pub diagnostics: Vec<Diagnostic>,
    pub emitted: usize,
    pub reused: usize,
}

struct UnitResult {
    diagnostics: Vec<Diagnostic>,
    entry: Option<(String, Arc<CacheEntry>, bool)>,
}

fn check(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(GeneratorError::Cancelled)
    } else {
        Ok(())
    }
}

fn process_type(
    compilation: &Compilation,
    ty: &TypeSymbol,
    config: &GeneratorConfig,
    cache: Option<&GenerationCache>,
    cancel: &CancellationToken,
) -> Result<UnitResult> {
    check(cancel)?;
    let extraction = extract_type(compilation, ty, config);
    let Some(input) = extraction.input else {
        return Ok(UnitResult {
            diagnostics: extraction.diagnostics,
            entry: None,
        });
    };

    let key = ty.metadata_name();
    if let Some(cached) = cache.and_then(|c| c.lookup(&key, &input)) {
        log::trace!("cache hit for {key}");
        return Ok(UnitResult {
            diagnostics: extraction.diagnostics,
            entry: Some((key, cached, true)),
        });
    }

    let source = emitter::emit(&input, config)?;
    log::debug!("generated {} for {key}", source.hint_name);
    Ok(UnitResult {
        diagnostics: extraction.diagnostics,
        entry: Some((key, Arc::new(CacheEntry { input, source }), false)),
    })
}

/// Run one generation pass over a compilation.
///
/// Types are processed in parallel. Unchanged types reuse their cached
/// output, unless the render settings differ from the cached pass. The cache
/// is replaced only when the pass completes; a cancelled pass returns
/// [`GeneratorError::Cancelled`] and leaves it untouched.
pub fn run(
    compilation: &Compilation,
    config: &GeneratorConfig,
    cache: &mut GenerationCache,
    cancel: &CancellationToken,
) -> Result<GenerationOutput> {
    check(cancel)?;

    let settings = config.render_settings();
    let reusable = cache.settings() == Some(&settings);
    if !reusable && !cache.is_empty() {
        log::debug!("render settings changed; re-emitting every type");
    }

    let units: Vec<UnitResult> = {
        let cache: Option<&GenerationCache> = reusable.then_some(&*cache);
        compilation
            .types()
            .par_iter()
            .map(|ty| process_type(compilation, ty, config, cache, cancel))
            .collect::<Result<Vec<_>>>()?
    };

    check(cancel)?;

    let mut output = GenerationOutput::default();
    let mut entries = HashMap::new();
    for unit in units {
        output.diagnostics.extend(unit.diagnostics);
        if let Some((key, entry, reused)) = unit.entry {
            if reused {
                output.reused += 1;
            } else {
                output.emitted += 1;
            }
            output.files.push(entry.source.clone());
            entries.insert(key, entry);
        }
    }
    output
        .diagnostics
        .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    log::debug!(
        "generation pass: {} files ({} emitted, {} reused), {} diagnostics",
        output.files.len(),
        output.emitted,
        output.reused,
        output.diagnostics.len()
    );
    cache.replace(entries, settings);
    Ok(output)
}

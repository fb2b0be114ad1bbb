use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{GeneratorError, Result};
use crate::generator::config::GeneratorConfig;
use crate::generator::emitter::GeneratedSource;

/// Directories to always skip during project walks.
const SKIP_DIRS: &[&str] = &["Library", "Temp", "obj", "Logs", ".git", "node_modules"];

/// Top-level directories of a Unity project that hold scripts.
const SOURCE_ROOTS: &[&str] = &["Assets", "Packages"];

/// Collect the `.cs` files of a Unity project, sorted.
///
/// Walks `Assets/` and `Packages/`, skipping Unity noise directories, the
/// configured extra exclusions and `output_dir`, where generated files land.
pub fn collect_source_files(project_root: &Path, config: &GeneratorConfig, output_dir: &Path) -> Vec<PathBuf> {
    let mut skip: HashSet<&str> = SKIP_DIRS.iter().copied().collect();
    for dir in &config.exclude_dirs {
        skip.insert(dir.as_str());
    }

    let mut result = Vec::new();
    for source_root in SOURCE_ROOTS {
        let dir = project_root.join(source_root);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir)
            .into_iter()
            .filter_entry(|e| {
                if e.file_type().is_dir() {
                    if e.path() == output_dir {
                        return false;
                    }
                    if let Some(name) = e.file_name().to_str() {
                        return !skip.contains(name);
                    }
                }
                true
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    log::warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "cs") {
                result.push(entry.into_path());
            }
        }
    }
    result.sort();
    log::debug!("collected {} source files under {}", result.len(), project_root.display());
    result
}

/// Project-relative path with forward slashes, as reported in diagnostics.
pub fn relative_path(project_root: &Path, path: &Path) -> String {
    path.strip_prefix(project_root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// What [`write_generated_files`] changed on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// Write generated files into `output_dir`.
///
/// Files whose content is already up to date are left alone so Unity does not
/// reimport them. Generated files with `extension` that this pass did not
/// produce are deleted together with their `.meta` companions.
pub fn write_generated_files(output_dir: &Path, files: &[GeneratedSource], extension: &str) -> Result<WriteSummary> {
    fs::create_dir_all(output_dir).map_err(|e| GeneratorError::io(output_dir, e))?;
    let mut summary = WriteSummary::default();

    let produced: HashSet<&str> = files.iter().map(|f| f.hint_name.as_str()).collect();
    let suffix = format!(".g.{extension}");
    let existing = fs::read_dir(output_dir).map_err(|e| GeneratorError::io(output_dir, e))?;
    for entry in existing.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.ends_with(&suffix) || produced.contains(name.as_str()) {
            continue;
        }
        let path = entry.path();
        fs::remove_file(&path).map_err(|e| GeneratorError::io(&path, e))?;
        let meta = output_dir.join(format!("{name}.meta"));
        if meta.is_file() {
            fs::remove_file(&meta).map_err(|e| GeneratorError::io(&meta, e))?;
        }
        log::debug!("removed stale {}", path.display());
        summary.removed += 1;
    }

    for file in files {
        let path = output_dir.join(&file.hint_name);
        if fs::read_to_string(&path).is_ok_and(|current| current == file.text) {
            summary.unchanged += 1;
            continue;
        }
        fs::write(&path, &file.text).map_err(|e| GeneratorError::io(&path, e))?;
        log::debug!("wrote {}", path.display());
        summary.written += 1;
    }

    Ok(summary)
}

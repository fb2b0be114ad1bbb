use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GeneratorError, Result};

/// File looked up at the project root by [`GeneratorConfig::for_project`].
pub const CONFIG_FILE_NAME: &str = "scriptable-callbacks.json";

/// Indentation used by generated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndentStyle {
    Tabs,
    Spaces(usize),
}

impl IndentStyle {
    pub fn unit(self) -> String {
        match self {
            IndentStyle::Tabs => "\t".to_string(),
            IndentStyle::Spaces(n) => " ".repeat(n),
        }
    }
}

/// What to do when an optional check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticPolicy {
    Ignore,
    Warning,
    Error,
}

/// Configuration for callback generation.
///
/// Attribute names are matched with or without the `Attribute` suffix and
/// regardless of namespace qualification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Type-level marker enabling generation.
    /// Default: "GenerateScriptableCallbacks"
    pub type_marker_attribute: String,

    /// Default: "GenerateValueCallback"
    pub value_callback_attribute: String,

    /// Default: "GenerateEventCallback"
    pub event_callback_attribute: String,

    /// Default: "GenerateCollectionCallback"
    pub collection_callback_attribute: String,

    /// Default: "GeneratePoolCallback"
    pub pool_callback_attribute: String,

    /// Namespace of the runtime types (`CollectionChangedArgs`, `PoolAction`).
    /// Default: "Hertzole.ScriptableValues"
    pub runtime_namespace: String,

    /// Extension of generated files, without the dot.
    /// Default: "cs"
    pub file_extension: String,

    /// Default: tabs
    pub indent: IndentStyle,

    /// Callback attribute on a member of a type without the marker.
    /// Default: ignore
    pub missing_marker: DiagnosticPolicy,

    /// Callback attribute without an implemented partial callback method.
    /// Default: error
    pub missing_implementation: DiagnosticPolicy,

    /// Directory names skipped by project walks, on top of the Unity defaults.
    pub exclude_dirs: BTreeSet<String>,

    /// Directory (relative to the project root) that receives generated files.
    /// Default: "Assets/Generated/ScriptableCallbacks"
    pub output_dir: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            type_marker_attribute: "GenerateScriptableCallbacks".to_string(),
            value_callback_attribute: "GenerateValueCallback".to_string(),
            event_callback_attribute: "GenerateEventCallback".to_string(),
            collection_callback_attribute: "GenerateCollectionCallback".to_string(),
            pool_callback_attribute: "GeneratePoolCallback".to_string(),
            runtime_namespace: "Hertzole.ScriptableValues".to_string(),
            file_extension: "cs".to_string(),
            indent: IndentStyle::Tabs,
            missing_marker: DiagnosticPolicy::Ignore,
            missing_implementation: DiagnosticPolicy::Error,
            exclude_dirs: BTreeSet::new(),
            output_dir: "Assets/Generated/ScriptableCallbacks".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| GeneratorError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Config for a Unity project: `scriptable-callbacks.json` at the root, or defaults.
    pub fn for_project<P: AsRef<Path>>(project_root: P) -> Result<Self> {
        let path = project_root.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::debug!("loading generator config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Add a directory name to skip during project walks.
    pub fn add_exclude_dir(&mut self, name: impl Into<String>) {
        self.exclude_dirs.insert(name.into());
    }

    /// Remove a directory name from the skip list.
    pub fn remove_exclude_dir(&mut self, name: &str) {
        self.exclude_dirs.remove(name);
    }

    /// The settings generated text depends on beyond the type itself.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            indent: self.indent,
            runtime_namespace: self.runtime_namespace.clone(),
            file_extension: self.file_extension.clone(),
        }
    }
}

/// Formatting inputs of the emitter. Cached output is only valid under the
/// settings it was rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub indent: IndentStyle,
    pub runtime_namespace: String,
    pub file_extension: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_render_settings_ignore_non_formatting_fields() {
        let base = GeneratorConfig::default();
        let mut other = base.clone();
        other.missing_marker = DiagnosticPolicy::Error;
        other.add_exclude_dir("Plugins");
        assert_eq!(base.render_settings(), other.render_settings());

        other.indent = IndentStyle::Spaces(4);
        assert_ne!(base.render_settings(), other.render_settings());
    }

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.type_marker_attribute, "GenerateScriptableCallbacks");
        assert_eq!(config.indent, IndentStyle::Tabs);
        assert_eq!(config.missing_marker, DiagnosticPolicy::Ignore);
        assert_eq!(config.missing_implementation, DiagnosticPolicy::Error);
        assert_eq!(config.runtime_namespace, "Hertzole.ScriptableValues");
        assert_eq!(config.output_dir, "Assets/Generated/ScriptableCallbacks");
    }

    #[test]
    fn test_indent_units() {
        assert_eq!(IndentStyle::Tabs.unit(), "\t");
        assert_eq!(IndentStyle::Spaces(4).unit(), "    ");
    }

    #[test]
    fn test_exclude_dirs() {
        let mut config = GeneratorConfig::default();
        config.add_exclude_dir("ThirdParty");
        assert!(config.exclude_dirs.contains("ThirdParty"));
        config.remove_exclude_dir("ThirdParty");
        assert!(config.exclude_dirs.is_empty());
    }

    #[test]
    fn test_load_partial_json_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{ "indent": { "spaces": 2 }, "missingMarker": "warning", "runtimeNamespace": "My.Runtime" }"#,
        )
        .unwrap();

        let config = GeneratorConfig::for_project(tmp.path()).unwrap();
        assert_eq!(config.indent, IndentStyle::Spaces(2));
        assert_eq!(config.missing_marker, DiagnosticPolicy::Warning);
        assert_eq!(config.runtime_namespace, "My.Runtime");
        assert_eq!(config.value_callback_attribute, "GenerateValueCallback");
    }

    #[test]
    fn test_for_project_without_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(GeneratorConfig::for_project(tmp.path()).unwrap(), GeneratorConfig::default());
    }

    #[test]
    fn test_load_invalid_json_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GeneratorConfig::load(&path), Err(GeneratorError::Config { .. })));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            GeneratorConfig::load("/nonexistent/path/12345.json"),
            Err(GeneratorError::Io { .. })
        ));
    }
}

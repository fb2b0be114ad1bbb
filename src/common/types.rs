use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::generator::config::{DiagnosticPolicy, GeneratorConfig, IndentStyle};
use crate::generator::diagnostics::{Diagnostic, Severity};
use crate::generator::emitter::GeneratedSource;
use crate::generator::pipeline::GenerationOutput;

/// A C# source file handed in from JavaScript
#[napi(object)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInput {
    pub path: String,
    pub text: String,
}

/// A generated C# file
#[napi(object)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub hint_name: String,
    pub text: String,
}

impl From<&GeneratedSource> for GeneratedFile {
    fn from(source: &GeneratedSource) -> Self {
        GeneratedFile {
            hint_name: source.hint_name.clone(),
            text: source.text.clone(),
        }
    }
}

#[napi(string_enum)]
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// Diagnostic reported by a generation pass
#[napi(object)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    /// Stable id, e.g. "HSV0001"
    pub id: String,
    pub title: String,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub file_path: String,
    pub line: u32,
    pub column: u32,
}

impl From<&Diagnostic> for DiagnosticInfo {
    fn from(d: &Diagnostic) -> Self {
        DiagnosticInfo {
            id: d.id.code().to_string(),
            title: d.id.title().to_string(),
            severity: match d.severity {
                Severity::Warning => DiagnosticSeverity::Warning,
                Severity::Error => DiagnosticSeverity::Error,
            },
            message: d.message.clone(),
            file_path: d.location.file_path.clone(),
            line: d.location.line,
            column: d.location.column,
        }
    }
}

/// Result of a generation pass
#[napi(object)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<DiagnosticInfo>,
    /// Files rendered in this pass
    pub emitted: u32,
    /// Files taken unchanged from the previous pass
    pub reused: u32,
    /// Files written to disk (project mode only)
    #[napi(ts_type = "number | undefined")]
    pub written: Option<u32>,
    /// Stale files deleted from disk (project mode only)
    #[napi(ts_type = "number | undefined")]
    pub removed: Option<u32>,
}

impl From<&GenerationOutput> for GenerationResult {
    fn from(output: &GenerationOutput) -> Self {
        GenerationResult {
            files: output.files.iter().map(GeneratedFile::from).collect(),
            diagnostics: output.diagnostics.iter().map(DiagnosticInfo::from).collect(),
            emitted: output.emitted as u32,
            reused: output.reused as u32,
            written: None,
            removed: None,
        }
    }
}

#[napi(string_enum)]
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Ignore,
    Warning,
    Error,
}

impl From<DiagnosticLevel> for DiagnosticPolicy {
    fn from(level: DiagnosticLevel) -> Self {
        match level {
            DiagnosticLevel::Ignore => DiagnosticPolicy::Ignore,
            DiagnosticLevel::Warning => DiagnosticPolicy::Warning,
            DiagnosticLevel::Error => DiagnosticPolicy::Error,
        }
    }
}

/// Options for the generator; unset fields keep their defaults
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    #[napi(ts_type = "string | undefined")]
    pub type_marker_attribute: Option<String>,
    #[napi(ts_type = "string | undefined")]
    pub value_callback_attribute: Option<String>,
    #[napi(ts_type = "string | undefined")]
    pub event_callback_attribute: Option<String>,
    #[napi(ts_type = "string | undefined")]
    pub collection_callback_attribute: Option<String>,
    #[napi(ts_type = "string | undefined")]
    pub pool_callback_attribute: Option<String>,
    #[napi(ts_type = "string | undefined")]
    pub runtime_namespace: Option<String>,
    #[napi(ts_type = "string | undefined")]
    pub file_extension: Option<String>,
    /// Spaces per indent level; tabs when unset or 0
    #[napi(ts_type = "number | undefined")]
    pub indent_size: Option<u32>,
    #[napi(ts_type = "DiagnosticLevel | undefined")]
    pub missing_marker: Option<DiagnosticLevel>,
    #[napi(ts_type = "DiagnosticLevel | undefined")]
    pub missing_implementation: Option<DiagnosticLevel>,
    #[napi(ts_type = "string[] | undefined")]
    pub exclude_dirs: Option<Vec<String>>,
    #[napi(ts_type = "string | undefined")]
    pub output_dir: Option<String>,
}

impl GeneratorOptions {
    /// Overlay the set options onto `config`.
    pub fn apply(self, config: &mut GeneratorConfig) {
        if let Some(v) = self.type_marker_attribute {
            config.type_marker_attribute = v;
        }
        if let Some(v) = self.value_callback_attribute {
            config.value_callback_attribute = v;
        }
        if let Some(v) = self.event_callback_attribute {
            config.event_callback_attribute = v;
        }
        if let Some(v) = self.collection_callback_attribute {
            config.collection_callback_attribute = v;
        }
        if let Some(v) = self.pool_callback_attribute {
            config.pool_callback_attribute = v;
        }
        if let Some(v) = self.runtime_namespace {
            config.runtime_namespace = v;
        }
        if let Some(v) = self.file_extension {
            config.file_extension = v;
        }
        if let Some(size) = self.indent_size {
            config.indent = match size {
                0 => IndentStyle::Tabs,
                n => IndentStyle::Spaces(n as usize),
            };
        }
        if let Some(level) = self.missing_marker {
            config.missing_marker = level.into();
        }
        if let Some(level) = self.missing_implementation {
            config.missing_implementation = level.into();
        }
        for dir in self.exclude_dirs.unwrap_or_default() {
            config.add_exclude_dir(dir);
        }
        if let Some(v) = self.output_dir {
            config.output_dir = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_overlay_config() {
        let mut config = GeneratorConfig::default();
        GeneratorOptions {
            runtime_namespace: Some("My.Runtime".to_string()),
            indent_size: Some(4),
            missing_marker: Some(DiagnosticLevel::Warning),
            exclude_dirs: Some(vec!["Plugins".to_string()]),
            ..GeneratorOptions::default()
        }
        .apply(&mut config);

        assert_eq!(config.runtime_namespace, "My.Runtime");
        assert_eq!(config.indent, IndentStyle::Spaces(4));
        assert_eq!(config.missing_marker, DiagnosticPolicy::Warning);
        assert!(config.exclude_dirs.contains("Plugins"));
        assert_eq!(config.type_marker_attribute, "GenerateScriptableCallbacks");
    }

    #[test]
    fn test_zero_indent_means_tabs() {
        let mut config = GeneratorConfig {
            indent: IndentStyle::Spaces(2),
            ..GeneratorConfig::default()
        };
        GeneratorOptions {
            indent_size: Some(0),
            ..GeneratorOptions::default()
        }
        .apply(&mut config);
        assert_eq!(config.indent, IndentStyle::Tabs);
    }
}

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod emitter;
pub mod extraction;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod writer;

use napi_derive::napi;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::common::{self, GenerationResult, GeneratorOptions, SourceInput};
use crate::csharp::symbols::Compilation;
use crate::error::{GeneratorError, Result};
use crate::walker::{self, WriteSummary};
use cache::{CancellationToken, GenerationCache};
use config::GeneratorConfig;
use pipeline::GenerationOutput;

/// Incremental generator of Scriptable Values callback code
#[napi]
pub struct Generator {
    config: GeneratorConfig,
    overrides: GeneratorOptions,
    cache: GenerationCache,
    cancel: CancellationToken,
}

#[napi]
impl Generator {
    #[napi(constructor)]
    pub fn new(options: Option<GeneratorOptions>) -> Self {
        let overrides = options.unwrap_or_default();
        let mut config = GeneratorConfig::default();
        overrides.clone().apply(&mut config);
        Generator::with_config(config, overrides)
    }

    /// Generate from in-memory sources
    #[napi]
    pub fn generate_sources(&mut self, sources: Vec<SourceInput>) -> napi::Result<GenerationResult> {
        let sources: Vec<(String, String)> = sources.into_iter().map(|s| (s.path, s.text)).collect();
        let output = self.run_sources(&sources)?;
        Ok(GenerationResult::from(&output))
    }

    /// Generate for a Unity project and write the files into its output directory.
    ///
    /// Reads `scriptable-callbacks.json` at the project root when present;
    /// options given to the constructor take precedence.
    #[napi]
    pub fn generate_project(&mut self, project_root: String, output_dir: Option<String>) -> napi::Result<GenerationResult> {
        let (output, summary) = self.run_project(Path::new(&project_root), output_dir.as_deref().map(Path::new))?;
        let mut result = GenerationResult::from(&output);
        result.written = Some(summary.written as u32);
        result.removed = Some(summary.removed as u32);
        Ok(result)
    }

    /// Drop every cached file; the next pass renders everything.
    #[napi]
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of types whose output is cached.
    #[napi]
    pub fn cached_type_count(&self) -> u32 {
        self.cache.len() as u32
    }

    pub fn with_config(config: GeneratorConfig, overrides: GeneratorOptions) -> Self {
        Generator {
            config,
            overrides,
            cache: GenerationCache::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Token that cancels the pass currently running on this generator.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn run(&mut self, compilation: &Compilation, config: &GeneratorConfig) -> Result<GenerationOutput> {
        let result = pipeline::run(compilation, config, &mut self.cache, &self.cancel);
        if matches!(result, Err(GeneratorError::Cancelled)) {
            log::debug!("generation pass cancelled");
            self.cancel.reset();
        }
        result
    }

    /// Run a pass over `(path, text)` sources.
    pub fn run_sources(&mut self, sources: &[(String, String)]) -> Result<GenerationOutput> {
        let compilation = Compilation::from_sources(sources);
        let config = self.config.clone();
        self.run(&compilation, &config)
    }

    /// Run a pass over a Unity project and sync the output directory.
    ///
    /// `output_dir` defaults to the configured directory; relative paths are
    /// taken from `project_root`. The output directory is never read as input.
    pub fn run_project(&mut self, project_root: &Path, output_dir: Option<&Path>) -> Result<(GenerationOutput, WriteSummary)> {
        let mut config = GeneratorConfig::for_project(project_root)?;
        self.overrides.clone().apply(&mut config);
        let output_dir: PathBuf = match output_dir {
            Some(dir) => project_root.join(dir),
            None => project_root.join(&config.output_dir),
        };

        let files = walker::collect_source_files(project_root, &config, &output_dir);
        let sources: Vec<(String, String)> = files
            .par_iter()
            .filter_map(|path| match common::read_source_file(path) {
                Ok(text) => Some((walker::relative_path(project_root, path), text)),
                Err(err) => {
                    log::warn!("skipping {}: {err}", path.display());
                    None
                }
            })
            .collect();

        let compilation = Compilation::from_sources(&sources);
        let output = self.run(&compilation, &config)?;
        let summary = walker::write_generated_files(&output_dir, &output.files, &config.file_extension)?;
        log::debug!(
            "{}: {} written, {} unchanged, {} removed",
            output_dir.display(),
            summary.written,
            summary.unchanged,
            summary.removed
        );
        Ok((output, summary))
    }
}

impl Default for Generator {
    fn default() -> Self {
        Generator::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn sources(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(p, t)| (p.to_string(), t.to_string())).collect()
    }

    const TEST_CLASS: &str = r#"using Hertzole.ScriptableValues;
using UnityEngine;

[GenerateScriptableCallbacks]
public partial class TestClass : MonoBehaviour
{
    [GenerateValueCallback(ValueCallbackFlags.Changed)]
    public ScriptableBool valueField;

    [GenerateValueCallback(ValueCallbackFlags.Changed)]
    public ScriptableString valueProperty { get; set; }

    private partial void OnValueFieldChanged(bool oldValue, bool newValue) { }

    private partial void OnValuePropertyChanged(string oldValue, string newValue) { }
}
"#;

    const TEST_CLASS_GENERATED: &str = r#"// <auto-generated/>
#nullable enable

using Hertzole.ScriptableValues;
using UnityEngine;

partial class TestClass
{
	[global::System.Flags]
	private enum SubscribedCallbacksMask : byte
	{
		None = 0,
		valueField = 1 << 0,
		valueProperty = 1 << 1
	}

	private SubscribedCallbacksMask subscribedCallbacks = SubscribedCallbacksMask.None;

	private static readonly global::System.Action<bool, bool, TestClass> __valueFieldScriptableValueCallbackValueChanged = (oldValue, newValue, context) =>
	{
		context.OnValueFieldChanged(oldValue, newValue);
	};

	private static readonly global::System.Action<string, string, TestClass> __valuePropertyScriptableValueCallbackValueChanged = (oldValue, newValue, context) =>
	{
		context.OnValuePropertyChanged(oldValue, newValue);
	};

	protected virtual void SubscribeToCallbacks()
	{
		if ((subscribedCallbacks & SubscribedCallbacksMask.valueField) == 0)
		{
			valueField.RegisterValueChangedListener(__valueFieldScriptableValueCallbackValueChanged, this);
			subscribedCallbacks |= SubscribedCallbacksMask.valueField;
		}
		if ((subscribedCallbacks & SubscribedCallbacksMask.valueProperty) == 0)
		{
			valueProperty.RegisterValueChangedListener(__valuePropertyScriptableValueCallbackValueChanged, this);
			subscribedCallbacks |= SubscribedCallbacksMask.valueProperty;
		}
	}

	protected virtual void UnsubscribeFromCallbacks()
	{
		if ((subscribedCallbacks & SubscribedCallbacksMask.valueField) != 0)
		{
			valueField.UnregisterValueChangedListener(__valueFieldScriptableValueCallbackValueChanged);
			subscribedCallbacks &= ~SubscribedCallbacksMask.valueField;
		}
		if ((subscribedCallbacks & SubscribedCallbacksMask.valueProperty) != 0)
		{
			valueProperty.UnregisterValueChangedListener(__valuePropertyScriptableValueCallbackValueChanged);
			subscribedCallbacks &= ~SubscribedCallbacksMask.valueProperty;
		}
	}

	/// <summary>Called when <see cref="valueField"/> raises OnValueChanged.</summary>
	private partial void OnValueFieldChanged(bool oldValue, bool newValue);

	/// <summary>Called when <see cref="valueProperty"/> raises OnValueChanged.</summary>
	private partial void OnValuePropertyChanged(string oldValue, string newValue);
}
"#;

    #[test]
    fn test_bool_field_and_string_property_end_to_end() {
        let mut generator = Generator::default();
        let output = generator.run_sources(&sources(&[("Assets/TestClass.cs", TEST_CLASS)])).unwrap();
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert_eq!(output.files.len(), 1);
        assert_eq!(output.files[0].hint_name, "TestClass.g.cs");
        assert_eq!(output.files[0].text, TEST_CLASS_GENERATED);
    }

    #[test]
    fn test_no_generation_without_marker_static_or_readonly() {
        let cases = [
            "public partial class NoMarker { [GenerateValueCallback] public ScriptableBool valueField; }",
            "[GenerateScriptableCallbacks] public static partial class StaticClass { [GenerateValueCallback] public static ScriptableBool valueField; }",
            "[GenerateScriptableCallbacks] public readonly partial struct ReadonlyStruct { [GenerateValueCallback] public readonly ScriptableBool valueField; }",
        ];
        for case in cases {
            let mut generator = Generator::default();
            let output = generator.run_sources(&sources(&[("Test.cs", case)])).unwrap();
            assert!(output.files.is_empty(), "{case}");
            assert!(output.diagnostics.is_empty(), "{case}");
        }
    }

    #[test]
    fn test_reordering_members_only_reorders_output() {
        let swapped = TEST_CLASS
            .replace(
                "[GenerateValueCallback(ValueCallbackFlags.Changed)]\n    public ScriptableBool valueField;",
                "@@FIELD@@",
            )
            .replace(
                "[GenerateValueCallback(ValueCallbackFlags.Changed)]\n    public ScriptableString valueProperty { get; set; }",
                "[GenerateValueCallback(ValueCallbackFlags.Changed)]\n    public ScriptableBool valueField;",
            )
            .replace(
                "@@FIELD@@",
                "[GenerateValueCallback(ValueCallbackFlags.Changed)]\n    public ScriptableString valueProperty { get; set; }",
            );
        let mut generator = Generator::default();
        let text = &generator.run_sources(&sources(&[("Assets/TestClass.cs", &swapped)])).unwrap().files[0].text;
        assert!(text.contains("\t\tvalueProperty = 1 << 0,\n\t\tvalueField = 1 << 1\n"));

        let mut lines_a: Vec<&str> = TEST_CLASS_GENERATED.lines().collect();
        let mut lines_b: Vec<&str> = text.lines().collect();
        lines_a.sort();
        lines_b.sort();
        let strip = |l: &&str| !l.contains(" << ");
        assert_eq!(
            lines_a.into_iter().filter(strip).collect::<Vec<_>>(),
            lines_b.into_iter().filter(strip).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_inheritance_chains_to_generated_base() {
        let base = r#"
[GenerateScriptableCallbacks]
public partial class BaseBehaviour : MonoBehaviour
{
    [GenerateEventCallback] protected ScriptableEvent onReset;
    private partial void OnOnResetInvoked(object sender, System.EventArgs args) { }
}
"#;
        let derived = r#"
[GenerateScriptableCallbacks]
public sealed partial class DerivedBehaviour : BaseBehaviour
{
    [GenerateCollectionCallback] private ScriptableList<int> scores;
    private partial void OnScoresChanged(Hertzole.ScriptableValues.CollectionChangedArgs<int> args) { }
}
"#;
        let mut generator = Generator::default();
        let output = generator
            .run_sources(&sources(&[("Base.cs", base), ("Derived.cs", derived)]))
            .unwrap();
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let base_text = &output.files[0].text;
        let derived_text = &output.files[1].text;
        assert_eq!(output.files[0].hint_name, "BaseBehaviour.g.cs");
        assert!(base_text.contains("\tprotected virtual void SubscribeToCallbacks()\n"));
        assert!(!base_text.contains("base."));
        assert!(derived_text.contains("\tprotected override void SubscribeToCallbacks()\n\t{\n\t\tbase.SubscribeToCallbacks();\n"));
        assert!(derived_text.contains("\t\tbase.UnsubscribeFromCallbacks();\n\t}\n"));
    }

    #[test]
    fn test_repeated_passes_reuse_cache() {
        let mut generator = Generator::default();
        let input = sources(&[("Assets/TestClass.cs", TEST_CLASS)]);
        let first = generator.run_sources(&input).unwrap();
        let second = generator.run_sources(&input).unwrap();
        assert_eq!(first.emitted, 1);
        assert_eq!(second.emitted, 0);
        assert_eq!(second.reused, 1);
        assert_eq!(first.files, second.files);
        assert_eq!(generator.cached_type_count(), 1);

        generator.clear_cache();
        assert_eq!(generator.cached_type_count(), 0);
        assert_eq!(generator.run_sources(&input).unwrap().emitted, 1);
    }

    #[test]
    fn test_cancelled_pass_then_recovers() {
        let mut generator = Generator::default();
        generator.cancellation_token().cancel();
        let input = sources(&[("Assets/TestClass.cs", TEST_CLASS)]);
        assert!(matches!(generator.run_sources(&input), Err(GeneratorError::Cancelled)));
        assert_eq!(generator.cached_type_count(), 0);
        assert_eq!(generator.run_sources(&input).unwrap().files.len(), 1);
    }

    #[test]
    fn test_options_change_attribute_names_and_indent() {
        let mut generator = Generator::new(Some(GeneratorOptions {
            type_marker_attribute: Some("AutoCallbacks".to_string()),
            value_callback_attribute: Some("OnValueAttribute".to_string()),
            indent_size: Some(4),
            ..GeneratorOptions::default()
        }));
        let source = "[AutoCallbacks] partial class A { [OnValue] ScriptableInt hp; partial void OnHpChanged(int oldValue, int newValue) { } }";
        let output = generator.run_sources(&sources(&[("A.cs", source)])).unwrap();
        assert_eq!(output.files.len(), 1);
        assert!(output.files[0].text.contains("\n    [global::System.Flags]\n"));
    }

    #[test]
    fn test_generate_project_writes_output() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let scripts = root.join("Assets/Scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(scripts.join("TestClass.cs"), TEST_CLASS.replace('\n', "\r\n")).unwrap();
        fs::write(root.join("scriptable-callbacks.json"), r#"{ "outputDir": "Assets/Gen" }"#).unwrap();

        let mut generator = Generator::default();
        let (output, summary) = generator.run_project(root, None).unwrap();
        assert_eq!(summary.written, 1);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let written = fs::read_to_string(root.join("Assets/Gen/TestClass.g.cs")).unwrap();
        assert_eq!(written, TEST_CLASS_GENERATED);

        let (_, summary) = generator.run_project(root, None).unwrap();
        assert_eq!(summary.written, 0);
        assert_eq!(summary.unchanged, 1);

        fs::remove_file(scripts.join("TestClass.cs")).unwrap();
        let (output, summary) = generator.run_project(root, None).unwrap();
        assert!(output.files.is_empty());
        assert_eq!(summary.removed, 1);
        assert!(!root.join("Assets/Gen/TestClass.g.cs").exists());
    }

    #[test]
    fn test_namespace_scoped_usings_stay_out_of_the_header() {
        let source = r#"using Hertzole.ScriptableValues;

namespace Game
{
    using Data;

    [GenerateScriptableCallbacks]
    public partial class Inventory
    {
        [GenerateValueCallback] public ScriptableValue<Item> item;
    }
}

namespace Game.Data
{
    public class Item { }
}
"#;
        let mut generator = Generator::default();
        let output = generator.run_sources(&sources(&[("Assets/Inventory.cs", source)])).unwrap();
        assert_eq!(output.files.len(), 1);
        let text = &output.files[0].text;
        assert!(
            text.starts_with("// <auto-generated/>\n#nullable enable\n\nusing Hertzole.ScriptableValues;\n\nnamespace Game\n{"),
            "{text}"
        );
        assert!(!text.contains("using Data;"));
        assert!(text.contains("global::Game.Data.Item"));
    }

    #[test]
    fn test_project_config_edit_re_renders_cached_types() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Assets")).unwrap();
        fs::write(root.join("Assets/TestClass.cs"), TEST_CLASS).unwrap();

        let mut generator = Generator::default();
        let (first, _) = generator.run_project(root, None).unwrap();
        assert!(first.files[0].text.contains("\n\t[global::System.Flags]\n"));

        fs::write(
            root.join("scriptable-callbacks.json"),
            r#"{ "indent": { "spaces": 4 }, "runtimeNamespace": "My.Rt" }"#,
        )
        .unwrap();
        let (second, summary) = generator.run_project(root, None).unwrap();
        assert_eq!(second.emitted, 1);
        assert_eq!(second.reused, 0);
        assert_eq!(summary.written, 1);

        let (fresh, _) = Generator::default().run_project(root, None).unwrap();
        assert_eq!(second.files, fresh.files);
        assert!(second.files[0].text.contains("\n    [global::System.Flags]\n"));
    }

    #[test]
    fn test_output_dir_override_is_not_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Assets")).unwrap();
        fs::write(root.join("Assets/TestClass.cs"), TEST_CLASS).unwrap();
        let out = root.join("Assets/Gen");

        let mut generator = Generator::default();
        let (first, _) = generator.run_project(root, Some(&out)).unwrap();
        assert!(out.join("TestClass.g.cs").is_file());

        let (second, summary) = generator.run_project(root, Some(&out)).unwrap();
        assert_eq!(second.files, first.files);
        assert_eq!(second.reused, 1);
        assert_eq!(summary.unchanged, 1);
        assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);

        // Relative overrides resolve against the project root.
        let (third, summary) = generator.run_project(root, Some(Path::new("Assets/Gen"))).unwrap();
        assert_eq!(third.files, first.files);
        assert_eq!(summary.unchanged, 1);
    }

    #[test]
    fn test_diagnostics_report_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Assets")).unwrap();
        fs::write(
            root.join("Assets/Broken.cs"),
            "[GenerateScriptableCallbacks]\npartial class Broken\n{\n    [GenerateValueCallback] int notScriptable;\n}\n",
        )
        .unwrap();

        let mut generator = Generator::default();
        let (output, _) = generator.run_project(root, Some(&root.join("Out"))).unwrap();
        assert_eq!(output.diagnostics.len(), 1);
        let d = &output.diagnostics[0];
        assert_eq!(d.to_string(), "Assets/Broken.cs(4,33): error HSV0002: 'notScriptable' of type 'int' is not supported by [GenerateValueCallback]");
    }
}

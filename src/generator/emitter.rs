//! Renders a [`TypeGenerationInput`] into the partial-type source file.

use serde::Serialize;

use super::config::GeneratorConfig;
use super::model::{CallbackData, CallbackHook, HierarchyInfo, TypeGenerationInput};
use super::naming::{self, MaskBackingType, Parameter};
use super::writer::IndentedTextWriter;
use crate::error::Result;

pub const MASK_ENUM_NAME: &str = "SubscribedCallbacksMask";
pub const MASK_FIELD_NAME: &str = "subscribedCallbacks";
pub const SUBSCRIBE_METHOD_NAME: &str = "SubscribeToCallbacks";
pub const UNSUBSCRIBE_METHOD_NAME: &str = "UnsubscribeFromCallbacks";

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSource {
    pub hint_name: String,
    pub text: String,
}

pub fn hint_name(hierarchy: &HierarchyInfo, extension: &str) -> String {
    format!("{}.g.{}", hierarchy.generated_file_name, extension)
}

/// Render the generated file for one type.
///
/// Output depends only on `input` and the formatting options of `config`.
pub fn emit(input: &TypeGenerationInput, config: &GeneratorConfig) -> Result<GeneratedSource> {
    let mask_type = naming::mask_backing_type(input.callbacks.len())?;
    let hierarchy = &input.hierarchy;

    let mut w = IndentedTextWriter::new(config.indent.unit());
    w.line("// <auto-generated/>");
    w.line("#nullable enable");
    w.blank_line();
    if !hierarchy.usings.is_empty() {
        for using in &hierarchy.usings {
            w.line(using);
        }
        w.blank_line();
    }

    match &hierarchy.namespace {
        Some(namespace) => {
            w.line(&format!("namespace {namespace}"));
            let mut body = w.block();
            write_containing_types(&mut body, input, config, mask_type, 0);
        }
        None => write_containing_types(&mut w, input, config, mask_type, 0),
    }

    Ok(GeneratedSource {
        hint_name: hint_name(hierarchy, &config.file_extension),
        text: w.finish(),
    })
}

fn write_containing_types(
    w: &mut IndentedTextWriter,
    input: &TypeGenerationInput,
    config: &GeneratorConfig,
    mask_type: MaskBackingType,
    depth: usize,
) {
    match input.hierarchy.containing_types.get(depth) {
        Some(containing) => {
            w.line(&format!("partial {} {}", containing.keyword, containing.display_name));
            let mut body = w.block();
            write_containing_types(&mut body, input, config, mask_type, depth + 1);
        }
        None => {
            let hierarchy = &input.hierarchy;
            w.line(&format!("partial {} {}", hierarchy.keyword, hierarchy.display_name));
            let mut body = w.block();
            write_type_body(&mut body, input, config, mask_type);
        }
    }
}

fn write_type_body(
    w: &mut IndentedTextWriter,
    input: &TypeGenerationInput,
    config: &GeneratorConfig,
    mask_type: MaskBackingType,
) {
    let hierarchy = &input.hierarchy;
    let callbacks = &input.callbacks;

    write_mask_enum(w, callbacks, mask_type);
    w.blank_line();

    if hierarchy.is_value_type {
        w.line(&format!("private {MASK_ENUM_NAME} {MASK_FIELD_NAME};"));
    } else {
        w.line(&format!(
            "private {MASK_ENUM_NAME} {MASK_FIELD_NAME} = {MASK_ENUM_NAME}.None;"
        ));
    }

    for callback in callbacks {
        for hook in &callback.hooks {
            w.blank_line();
            write_cached_delegate(w, hierarchy, callback, hook, &config.runtime_namespace);
        }
    }

    let accessibility = method_accessibility(hierarchy);
    let chain = hierarchy.should_emit_inheritance_hooks;

    w.blank_line();
    w.line(&format!("{accessibility} void {SUBSCRIBE_METHOD_NAME}()"));
    {
        let mut body = w.block();
        if chain {
            body.line(&format!("base.{SUBSCRIBE_METHOD_NAME}();"));
        }
        for callback in callbacks {
            write_subscribe(&mut body, callback);
        }
    }

    w.blank_line();
    w.line(&format!("{accessibility} void {UNSUBSCRIBE_METHOD_NAME}()"));
    {
        let mut body = w.block();
        for callback in callbacks {
            write_unsubscribe(&mut body, callback);
        }
        if chain {
            body.line(&format!("base.{UNSUBSCRIBE_METHOD_NAME}();"));
        }
    }

    for callback in callbacks {
        for hook in &callback.hooks {
            w.blank_line();
            write_partial_declaration(w, callback, hook, &config.runtime_namespace);
        }
    }
}

fn method_accessibility(hierarchy: &HierarchyInfo) -> &'static str {
    if hierarchy.should_emit_inheritance_hooks {
        "protected override"
    } else if hierarchy.is_sealed || hierarchy.is_value_type {
        "private"
    } else {
        "protected virtual"
    }
}

fn write_mask_enum(w: &mut IndentedTextWriter, callbacks: &[CallbackData], mask_type: MaskBackingType) {
    w.line("[global::System.Flags]");
    w.line(&format!("private enum {MASK_ENUM_NAME} : {}", mask_type.keyword()));
    let mut body = w.block();
    let one = mask_type.one_literal();
    let last = callbacks.len();
    body.line(if last == 0 { "None = 0" } else { "None = 0," });
    for (index, callback) in callbacks.iter().enumerate() {
        let separator = if index + 1 == last { "" } else { "," };
        body.line(&format!("{} = {one} << {index}{separator}", callback.mask_flag_name));
    }
}

fn parameters(callback: &CallbackData, runtime_namespace: &str) -> Vec<Parameter> {
    naming::callback_parameters(callback.kind, callback.element_type.as_deref(), runtime_namespace)
}

fn write_cached_delegate(
    w: &mut IndentedTextWriter,
    hierarchy: &HierarchyInfo,
    callback: &CallbackData,
    hook: &CallbackHook,
    runtime_namespace: &str,
) {
    let params = parameters(callback, runtime_namespace);
    let type_arguments: Vec<&str> = params
        .iter()
        .map(|p| p.type_name.as_str())
        .chain(std::iter::once(hierarchy.display_name.as_str()))
        .collect();
    let lambda_parameters: Vec<&str> = params
        .iter()
        .map(|p| p.name)
        .chain(std::iter::once("context"))
        .collect();
    let arguments: Vec<&str> = params.iter().map(|p| p.name).collect();

    w.line(&format!(
        "private static readonly global::System.Action<{}> {} = ({}) =>",
        type_arguments.join(", "),
        hook.cached_delegate_field_name,
        lambda_parameters.join(", "),
    ));
    let mut body = w.block_with_closing("};");
    body.line(&format!("context.{}({});", hook.callback_name, arguments.join(", ")));
}

fn mask_flag(callback: &CallbackData) -> String {
    format!("{MASK_ENUM_NAME}.{}", callback.mask_flag_name)
}

fn write_subscribe(w: &mut IndentedTextWriter, callback: &CallbackData) {
    let flag = mask_flag(callback);
    w.line(&format!("if (({MASK_FIELD_NAME} & {flag}) == 0)"));
    let mut body = w.block();
    for hook in &callback.hooks {
        body.line(&format!(
            "{}.{}({}, this);",
            callback.name, hook.register_method_name, hook.cached_delegate_field_name
        ));
    }
    body.line(&format!("{MASK_FIELD_NAME} |= {flag};"));
}

fn write_unsubscribe(w: &mut IndentedTextWriter, callback: &CallbackData) {
    let flag = mask_flag(callback);
    w.line(&format!("if (({MASK_FIELD_NAME} & {flag}) != 0)"));
    let mut body = w.block();
    for hook in &callback.hooks {
        body.line(&format!(
            "{}.{}({});",
            callback.name, hook.unregister_method_name, hook.cached_delegate_field_name
        ));
    }
    body.line(&format!("{MASK_FIELD_NAME} &= ~{flag};"));
}

fn write_partial_declaration(
    w: &mut IndentedTextWriter,
    callback: &CallbackData,
    hook: &CallbackHook,
    runtime_namespace: &str,
) {
    let params: Vec<String> = parameters(callback, runtime_namespace)
        .iter()
        .map(|p| format!("{} {}", p.type_name, p.name))
        .collect();
    w.line(&format!(
        "/// <summary>Called when <see cref=\"{}\"/> raises {}.</summary>",
        callback.name, hook.source_event_name
    ));
    w.line(&format!("private partial void {}({});", hook.callback_name, params.join(", ")));
}

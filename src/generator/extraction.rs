//! Turns merged type symbols into [`TypeGenerationInput`]s and diagnostics.

use crate::csharp::symbols::{with_type_parameters, Compilation, TypeSymbol};
use crate::csharp::syntax::{AttributeSyntax, Location, MemberSyntax, TypeKind};

use super::config::{DiagnosticPolicy, GeneratorConfig};
use super::diagnostics::Diagnostic;
use super::emitter::{MASK_ENUM_NAME, MASK_FIELD_NAME};
use super::model::{
    CallbackData, CallbackKind, CallbackPhase, ContainingTypeInfo, GenerateTypeArguments, HierarchyInfo,
    TypeGenerationInput,
};

/// Most descriptors a single type may carry (width of the widest mask).
pub const MAX_CALLBACKS: usize = 64;

/// Which member-level attribute requested the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeRole {
    Value,
    Event,
    Collection,
    Pool,
}

impl AttributeRole {
    fn accepts(self, kind: CallbackKind) -> bool {
        match self {
            AttributeRole::Value => kind == CallbackKind::Value,
            AttributeRole::Event => kind.is_event(),
            AttributeRole::Collection => matches!(kind, CallbackKind::Collection(_)),
            AttributeRole::Pool => kind == CallbackKind::Pool,
        }
    }
}

/// A field variable or property carrying a callback attribute.
struct AnnotatedMember<'a> {
    name: &'a str,
    type_name: &'a str,
    attribute: &'a AttributeSyntax,
    role: AttributeRole,
    location: &'a Location,
}

/// Result of extracting one type.
#[derive(Debug, Default)]
pub struct TypeExtraction {
    pub input: Option<TypeGenerationInput>,
    pub diagnostics: Vec<Diagnostic>,
}

fn attribute_role(attribute: &AttributeSyntax, config: &GeneratorConfig) -> Option<AttributeRole> {
    if attribute.matches(&config.value_callback_attribute) {
        Some(AttributeRole::Value)
    } else if attribute.matches(&config.event_callback_attribute) {
        Some(AttributeRole::Event)
    } else if attribute.matches(&config.collection_callback_attribute) {
        Some(AttributeRole::Collection)
    } else if attribute.matches(&config.pool_callback_attribute) {
        Some(AttributeRole::Pool)
    } else {
        None
    }
}

fn first_callback_attribute<'a>(
    attributes: &'a [AttributeSyntax],
    config: &GeneratorConfig,
) -> Option<(&'a AttributeSyntax, AttributeRole)> {
    attributes
        .iter()
        .find_map(|a| attribute_role(a, config).map(|role| (a, role)))
}

fn annotated_members<'a>(ty: &'a TypeSymbol, config: &GeneratorConfig) -> Vec<AnnotatedMember<'a>> {
    let mut out = Vec::new();
    for member in &ty.members {
        match member {
            MemberSyntax::Field(field) => {
                let Some((attribute, role)) = first_callback_attribute(&field.attributes, config) else {
                    continue;
                };
                for variable in &field.variables {
                    out.push(AnnotatedMember {
                        name: &variable.name,
                        type_name: &field.type_name,
                        attribute,
                        role,
                        location: &variable.location,
                    });
                }
            }
            MemberSyntax::Property(property) => {
                if let Some((attribute, role)) = first_callback_attribute(&property.attributes, config) {
                    out.push(AnnotatedMember {
                        name: &property.name,
                        type_name: &property.type_name,
                        attribute,
                        role,
                        location: &property.location,
                    });
                }
            }
            MemberSyntax::Method(_) => {}
        }
    }
    out
}

/// Why a marked type is not generated. Reported at debug level only.
fn skip_reason(ty: &TypeSymbol) -> Option<&'static str> {
    if matches!(ty.kind, TypeKind::Interface | TypeKind::Enum) {
        Some("not a class, struct or record")
    } else if ty.is_static() {
        Some("static type")
    } else if ty.is_value_type() && ty.is_readonly() {
        Some("readonly struct")
    } else if ty.is_ref() {
        Some("ref struct")
    } else if !ty.is_partial {
        Some("not partial")
    } else if ty.containing_types.iter().any(|c| !c.is_partial) {
        Some("containing type is not partial")
    } else {
        None
    }
}

/// Parse `ValueCallbackFlags.Changing | ValueCallbackFlags.Changed` or a raw number.
fn parse_phases(text: &str) -> CallbackPhase {
    let mut phases = CallbackPhase::empty();
    for part in text.split('|') {
        let part = part.trim().trim_matches(|c: char| c == '(' || c == ')');
        if let Ok(raw) = part.parse::<u32>() {
            if let Ok(parsed) = CallbackPhase::try_from(raw) {
                phases |= parsed;
            }
            continue;
        }
        match part.rsplit('.').next().unwrap_or(part) {
            "Changing" => phases |= CallbackPhase::PRE_INVOKE,
            "Changed" => phases |= CallbackPhase::POST_INVOKE,
            "None" => {}
            other => log::warn!("unknown value callback flag '{other}'"),
        }
    }
    phases
}

/// `"Name"`, `@"Name"` or `nameof(Name)` to `Name`.
fn parse_callback_name(text: &str) -> Option<String> {
    let text = text.trim();
    let name = if let Some(inner) = text.strip_prefix("nameof(").and_then(|t| t.strip_suffix(')')) {
        inner.rsplit('.').next().unwrap_or(inner)
    } else {
        text.trim_start_matches('@').trim_matches('"')
    };
    (!name.is_empty()).then(|| name.to_string())
}

fn parse_arguments(attribute: &AttributeSyntax, role: AttributeRole) -> GenerateTypeArguments {
    let mut args = GenerateTypeArguments::default();
    if role == AttributeRole::Value {
        if let Some(flags) = attribute.positional_arguments().next() {
            args.phases = parse_phases(flags);
        }
    }
    args.callback_name = attribute
        .named_argument("CallbackName")
        .or_else(|| attribute.named_argument("callbackName"))
        .and_then(parse_callback_name);
    args
}

fn report(policy: DiagnosticPolicy, diagnostic: Diagnostic, diagnostics: &mut Vec<Diagnostic>) {
    match policy {
        DiagnosticPolicy::Ignore => {}
        DiagnosticPolicy::Warning => diagnostics.push(diagnostic.into_warning()),
        DiagnosticPolicy::Error => diagnostics.push(diagnostic),
    }
}

fn has_implementation(ty: &TypeSymbol, callback_name: &str) -> bool {
    ty.methods()
        .any(|m| m.name == callback_name && m.is_partial() && m.has_body)
}

/// Whether a member name clashes with the generated mask enum, its `None`
/// member or the mask field.
fn is_reserved_name(name: &str) -> bool {
    matches!(name.trim_start_matches('@'), "None" | MASK_ENUM_NAME | MASK_FIELD_NAME)
}

/// Valid descriptors of an eligible, marked type, in declaration order.
fn collect_callbacks(
    compilation: &Compilation,
    ty: &TypeSymbol,
    config: &GeneratorConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CallbackData> {
    let mut callbacks = Vec::new();
    for member in annotated_members(ty, config) {
        if is_reserved_name(member.name) {
            diagnostics.push(Diagnostic::reserved_member_name(member.location, member.name));
            continue;
        }
        let resolved = compilation
            .resolve_scriptable(member.type_name, ty)
            .filter(|r| member.role.accepts(r.kind));
        let Some(resolved) = resolved else {
            diagnostics.push(Diagnostic::unsupported_callback_type(
                member.location,
                member.name,
                member.type_name,
                member.attribute.short_name(),
            ));
            continue;
        };

        let args = parse_arguments(member.attribute, member.role);
        if resolved.kind == CallbackKind::Value
            && args.callback_name.is_some()
            && args.phases.contains(CallbackPhase::all())
        {
            diagnostics.push(Diagnostic::ambiguous_callback_name(member.location, member.name));
            continue;
        }

        let callback = CallbackData::new(
            member.name,
            resolved.kind,
            args.phases,
            resolved.element_type,
            args.callback_name,
        );
        for hook in &callback.hooks {
            if !has_implementation(ty, &hook.callback_name) {
                report(
                    config.missing_implementation,
                    Diagnostic::no_callback_implementation(member.location, member.name, &hook.callback_name),
                    diagnostics,
                );
            }
        }
        callbacks.push(callback);
    }
    callbacks
}

/// Whether a type gets a generated file, ignoring its diagnostics.
fn is_generating_type(compilation: &Compilation, ty: &TypeSymbol, config: &GeneratorConfig) -> bool {
    if !ty.has_attribute(&config.type_marker_attribute) || skip_reason(ty).is_some() {
        return false;
    }
    let count = collect_callbacks(compilation, ty, config, &mut Vec::new()).len();
    (1..=MAX_CALLBACKS).contains(&count)
}

fn generated_file_name(ty: &TypeSymbol) -> String {
    let segment = |name: &str, arity: usize| {
        if arity == 0 {
            name.to_string()
        } else {
            format!("{name}_{arity}")
        }
    };
    let mut parts: Vec<String> = Vec::new();
    if let Some(ns) = &ty.namespace {
        parts.push(ns.clone());
    }
    for containing in &ty.containing_types {
        parts.push(segment(&containing.name, containing.type_parameters.len()));
    }
    parts.push(segment(&ty.name, ty.type_parameters.len()));
    parts.join(".")
}

/// Chaining to a base is emitted only when some class ancestor in the
/// compilation produces a file of its own.
fn hierarchy_info(compilation: &Compilation, ty: &TypeSymbol, config: &GeneratorConfig) -> HierarchyInfo {
    let should_emit_inheritance_hooks = compilation
        .ancestors(ty)
        .into_iter()
        .any(|ancestor| is_generating_type(compilation, ancestor, config));

    HierarchyInfo {
        generated_file_name: generated_file_name(ty),
        display_name: ty.display_name(),
        namespace: ty.namespace.clone(),
        keyword: ty.kind.keyword(),
        is_sealed: ty.is_sealed(),
        is_value_type: ty.is_value_type(),
        should_emit_inheritance_hooks,
        containing_types: ty
            .containing_types
            .iter()
            .map(|c| ContainingTypeInfo {
                keyword: c.kind.keyword(),
                display_name: with_type_parameters(&c.name, &c.type_parameters),
            })
            .collect(),
        usings: ty.usings.clone(),
    }
}

/// Classify one type and build its generation input.
pub fn extract_type(compilation: &Compilation, ty: &TypeSymbol, config: &GeneratorConfig) -> TypeExtraction {
    let mut result = TypeExtraction::default();

    if !ty.has_attribute(&config.type_marker_attribute) {
        if config.missing_marker != DiagnosticPolicy::Ignore {
            for member in annotated_members(ty, config) {
                report(
                    config.missing_marker,
                    Diagnostic::missing_type_marker(
                        member.location,
                        member.name,
                        &ty.display_name(),
                        &config.type_marker_attribute,
                    ),
                    &mut result.diagnostics,
                );
            }
        }
        return result;
    }

    if let Some(reason) = skip_reason(ty) {
        log::debug!("skipping {}: {reason}", ty.metadata_name());
        return result;
    }

    let callbacks = collect_callbacks(compilation, ty, config, &mut result.diagnostics);
    if callbacks.is_empty() {
        log::debug!("skipping {}: no valid callbacks", ty.metadata_name());
        return result;
    }
    if callbacks.len() > MAX_CALLBACKS {
        result.diagnostics.push(Diagnostic::too_many_callbacks(
            &ty.location,
            &ty.display_name(),
            callbacks.len(),
        ));
        return result;
    }

    log::trace!("{}: {} callbacks", ty.metadata_name(), callbacks.len());
    result.input = Some(TypeGenerationInput {
        hierarchy: hierarchy_info(compilation, ty, config),
        callbacks,
    });
    result
}

//! Canonical names for generated members.
//!
//! Everything here is a pure function of its arguments. Consumers implement the
//! partial callback methods by these names, so any change is a breaking change
//! for user code.

use super::model::{CallbackKind, CollectionKind, InvokePhase};
use crate::error::GeneratorError;

/// Turn a field or property identifier into the PascalCase stem of its callback.
///
/// Strips a verbatim `@`, a leading `m_` and any leading underscores, then
/// upper-cases the first remaining character.
pub fn format_variable_name(name: &str) -> String {
    let name = name.trim_start_matches('@');
    let name = name.strip_prefix("m_").unwrap_or(name);
    let name = name.trim_start_matches('_');

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the user-implemented partial callback method.
pub fn callback_name(kind: CallbackKind, phase: Option<InvokePhase>, name: &str) -> String {
    let stem = format_variable_name(name);
    let suffix = match kind {
        CallbackKind::Value => match phase {
            Some(InvokePhase::Pre) => "Changing",
            Some(InvokePhase::Post) | None => "Changed",
        },
        CallbackKind::Event | CallbackKind::GenericEvent => "Invoked",
        CallbackKind::Collection(_) | CallbackKind::Pool => "Changed",
    };
    format!("On{stem}{suffix}")
}

/// Callback name from raw kind/phase values as received over FFI.
pub fn callback_name_from_raw(kind: u32, phase: u32, name: &str) -> Result<String, GeneratorError> {
    let kind = CallbackKind::try_from(kind)?;
    let phase = if kind == CallbackKind::Value {
        Some(InvokePhase::from_raw(phase)?)
    } else {
        None
    };
    Ok(callback_name(kind, phase, name))
}

/// Mask enum member for a descriptor: the raw identifier, unchanged.
pub fn mask_flag_name(name: &str) -> String {
    name.to_string()
}

pub fn kind_word(kind: CallbackKind) -> &'static str {
    match kind {
        CallbackKind::Value => "Value",
        CallbackKind::Event | CallbackKind::GenericEvent => "Event",
        CallbackKind::Collection(_) => "Collection",
        CallbackKind::Pool => "Pool",
    }
}

pub fn phase_word(kind: CallbackKind, phase: Option<InvokePhase>) -> Option<&'static str> {
    match (kind, phase) {
        (CallbackKind::Value, Some(InvokePhase::Pre)) => Some("Changing"),
        (CallbackKind::Value, _) => Some("Changed"),
        _ => None,
    }
}

/// Static field caching the forwarding delegate of one hook.
///
/// A verbatim `@` is dropped since the name is no longer a keyword once prefixed.
pub fn cached_delegate_field_name(name: &str, kind: CallbackKind, phase: Option<InvokePhase>) -> String {
    let name = name.trim_start_matches('@');
    let kind_word = kind_word(kind);
    let phase_word = phase_word(kind, phase).unwrap_or("");
    let mut out = String::with_capacity(2 + name.len() + 23 + kind_word.len() + phase_word.len());
    out.push_str("__");
    out.push_str(name);
    out.push_str("ScriptableValueCallback");
    out.push_str(kind_word);
    out.push_str(phase_word);
    out
}

/// Runtime event a hook listens to.
pub fn source_event_name(kind: CallbackKind, phase: Option<InvokePhase>) -> &'static str {
    match (kind, phase) {
        (CallbackKind::Value, Some(InvokePhase::Pre)) => "OnValueChanging",
        (CallbackKind::Value, _) => "OnValueChanged",
        (CallbackKind::Event | CallbackKind::GenericEvent, _) => "OnInvoked",
        (CallbackKind::Collection(_), _) => "OnCollectionChanged",
        (CallbackKind::Pool, _) => "OnPoolChanged",
    }
}

pub fn register_method_name(kind: CallbackKind, phase: Option<InvokePhase>) -> &'static str {
    match (kind, phase) {
        (CallbackKind::Value, Some(InvokePhase::Pre)) => "RegisterValueChangingListener",
        (CallbackKind::Value, _) => "RegisterValueChangedListener",
        (CallbackKind::Event | CallbackKind::GenericEvent, _) => "RegisterInvokedListener",
        (CallbackKind::Collection(_) | CallbackKind::Pool, _) => "RegisterChangedListener",
    }
}

pub fn unregister_method_name(kind: CallbackKind, phase: Option<InvokePhase>) -> &'static str {
    match (kind, phase) {
        (CallbackKind::Value, Some(InvokePhase::Pre)) => "UnregisterValueChangingListener",
        (CallbackKind::Value, _) => "UnregisterValueChangedListener",
        (CallbackKind::Event | CallbackKind::GenericEvent, _) => "UnregisterInvokedListener",
        (CallbackKind::Collection(_) | CallbackKind::Pool, _) => "UnregisterChangedListener",
    }
}

/// Underlying integer type of the subscription mask enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskBackingType {
    Byte,
    UShort,
    UInt,
    ULong,
}

impl MaskBackingType {
    pub fn keyword(self) -> &'static str {
        match self {
            MaskBackingType::Byte => "byte",
            MaskBackingType::UShort => "ushort",
            MaskBackingType::UInt => "uint",
            MaskBackingType::ULong => "ulong",
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            MaskBackingType::Byte => 8,
            MaskBackingType::UShort => 16,
            MaskBackingType::UInt => 32,
            MaskBackingType::ULong => 64,
        }
    }

    /// The literal `1` typed so that `ONE << (bits - 1)` is a valid constant.
    pub fn one_literal(self) -> &'static str {
        match self {
            MaskBackingType::Byte | MaskBackingType::UShort => "1",
            MaskBackingType::UInt => "1u",
            MaskBackingType::ULong => "1UL",
        }
    }
}

/// Smallest mask type holding `count` flag bits.
pub fn mask_backing_type(count: usize) -> Result<MaskBackingType, GeneratorError> {
    match count {
        0..=8 => Ok(MaskBackingType::Byte),
        9..=16 => Ok(MaskBackingType::UShort),
        17..=32 => Ok(MaskBackingType::UInt),
        33..=64 => Ok(MaskBackingType::ULong),
        _ => Err(GeneratorError::TooManyFlags(count)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub type_name: String,
    pub name: &'static str,
}

impl Parameter {
    fn new(type_name: impl Into<String>, name: &'static str) -> Self {
        Parameter {
            type_name: type_name.into(),
            name,
        }
    }
}

/// Parameters of the partial callback method for a kind.
///
/// `runtime_namespace` qualifies the runtime's argument types
/// (`CollectionChangedArgs<T>`, `PoolAction`).
pub fn callback_parameters(
    kind: CallbackKind,
    element_type: Option<&str>,
    runtime_namespace: &str,
) -> Vec<Parameter> {
    let element = element_type.unwrap_or("object");
    match kind {
        CallbackKind::Value => vec![
            Parameter::new(element, "oldValue"),
            Parameter::new(element, "newValue"),
        ],
        CallbackKind::Event => vec![
            Parameter::new("object", "sender"),
            Parameter::new("global::System.EventArgs", "args"),
        ],
        CallbackKind::GenericEvent => vec![
            Parameter::new("object", "sender"),
            Parameter::new(element, "args"),
        ],
        CallbackKind::Collection(_) => vec![Parameter::new(
            format!("global::{runtime_namespace}.CollectionChangedArgs<{element}>"),
            "args",
        )],
        CallbackKind::Pool => vec![
            Parameter::new(format!("global::{runtime_namespace}.PoolAction"), "action"),
            Parameter::new(element, "item"),
        ],
    }
}

/// Element type of a dictionary collection.
pub fn key_value_pair(key: &str, value: &str) -> String {
    format!("global::System.Collections.Generic.KeyValuePair<{key}, {value}>")
}

use bitflags::bitflags;
use serde::Serialize;

use super::naming;
use crate::error::GeneratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CollectionKind {
    List,
    Dictionary,
}

/// Runtime container category of an annotated member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CallbackKind {
    Value,
    Event,
    GenericEvent,
    Collection(CollectionKind),
    Pool,
}

impl CallbackKind {
    pub fn as_u32(self) -> u32 {
        match self {
            CallbackKind::Value => 0,
            CallbackKind::Event => 1,
            CallbackKind::GenericEvent => 2,
            CallbackKind::Collection(CollectionKind::List) => 3,
            CallbackKind::Collection(CollectionKind::Dictionary) => 4,
            CallbackKind::Pool => 5,
        }
    }

    pub fn is_event(self) -> bool {
        matches!(self, CallbackKind::Event | CallbackKind::GenericEvent)
    }
}

impl TryFrom<u32> for CallbackKind {
    type Error = GeneratorError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CallbackKind::Value),
            1 => Ok(CallbackKind::Event),
            2 => Ok(CallbackKind::GenericEvent),
            3 => Ok(CallbackKind::Collection(CollectionKind::List)),
            4 => Ok(CallbackKind::Collection(CollectionKind::Dictionary)),
            5 => Ok(CallbackKind::Pool),
            other => Err(GeneratorError::KindOutOfRange(other)),
        }
    }
}

bitflags! {
    /// Phases requested by a value callback attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CallbackPhase: u8 {
        /// `ValueCallbackFlags.Changing`
        const PRE_INVOKE = 1 << 0;
        /// `ValueCallbackFlags.Changed`
        const POST_INVOKE = 1 << 1;
    }
}

impl TryFrom<u32> for CallbackPhase {
    type Error = GeneratorError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(CallbackPhase::from_bits)
            .ok_or(GeneratorError::PhaseOutOfRange(value))
    }
}

/// A single invocation phase of a value hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InvokePhase {
    Pre,
    Post,
}

impl InvokePhase {
    /// Phases contained in `phases`, pre-invoke first.
    pub fn split(phases: CallbackPhase) -> Vec<InvokePhase> {
        let mut out = Vec::with_capacity(2);
        if phases.contains(CallbackPhase::PRE_INVOKE) {
            out.push(InvokePhase::Pre);
        }
        if phases.contains(CallbackPhase::POST_INVOKE) {
            out.push(InvokePhase::Post);
        }
        out
    }

    /// Map a raw single-phase mask; combined or empty masks are rejected.
    pub fn from_raw(value: u32) -> Result<Self, GeneratorError> {
        let phases = CallbackPhase::try_from(value)?;
        if phases == CallbackPhase::PRE_INVOKE {
            Ok(InvokePhase::Pre)
        } else if phases == CallbackPhase::POST_INVOKE {
            Ok(InvokePhase::Post)
        } else {
            Err(GeneratorError::PhaseOutOfRange(value))
        }
    }
}

/// Arguments carried by a member-level callback attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerateTypeArguments {
    pub phases: CallbackPhase,
    pub callback_name: Option<String>,
}

impl Default for GenerateTypeArguments {
    fn default() -> Self {
        GenerateTypeArguments {
            phases: CallbackPhase::POST_INVOKE,
            callback_name: None,
        }
    }
}

/// Names derived for one registered listener.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackHook {
    /// `None` for kinds without phases.
    pub phase: Option<InvokePhase>,
    pub callback_name: String,
    pub cached_delegate_field_name: String,
    pub source_event_name: &'static str,
    pub register_method_name: &'static str,
    pub unregister_method_name: &'static str,
}

/// The unit of code generation: one annotated field variable or property.
///
/// Every derived name is computed in [`CallbackData::new`] from the other
/// fields, so structural equality is exactly "would emit the same code".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackData {
    pub name: String,
    pub kind: CallbackKind,
    pub phases: CallbackPhase,
    pub element_type: Option<String>,
    pub custom_callback_name: Option<String>,
    pub mask_flag_name: String,
    pub hooks: Vec<CallbackHook>,
}

impl CallbackData {
    pub fn new(
        name: impl Into<String>,
        kind: CallbackKind,
        phases: CallbackPhase,
        element_type: Option<String>,
        custom_callback_name: Option<String>,
    ) -> Self {
        let name = name.into();
        let phases = if kind == CallbackKind::Value {
            if phases.is_empty() {
                CallbackPhase::POST_INVOKE
            } else {
                phases
            }
        } else {
            CallbackPhase::empty()
        };

        let hook_phases: Vec<Option<InvokePhase>> = if kind == CallbackKind::Value {
            InvokePhase::split(phases).into_iter().map(Some).collect()
        } else {
            vec![None]
        };

        let hooks = hook_phases
            .into_iter()
            .map(|phase| CallbackHook {
                phase,
                callback_name: custom_callback_name
                    .clone()
                    .unwrap_or_else(|| naming::callback_name(kind, phase, &name)),
                cached_delegate_field_name: naming::cached_delegate_field_name(&name, kind, phase),
                source_event_name: naming::source_event_name(kind, phase),
                register_method_name: naming::register_method_name(kind, phase),
                unregister_method_name: naming::unregister_method_name(kind, phase),
            })
            .collect();

        CallbackData {
            mask_flag_name: naming::mask_flag_name(&name),
            name,
            kind,
            phases,
            element_type,
            custom_callback_name,
            hooks,
        }
    }
}

/// A type that encloses the generated type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainingTypeInfo {
    /// `class`, `struct`, `record`, `record struct`.
    pub keyword: &'static str,
    /// Name with type parameters, e.g. `Outer<T>`.
    pub display_name: String,
}

/// Everything about the annotated type that affects its generated file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyInfo {
    pub generated_file_name: String,
    /// Name with type parameters, e.g. `Inventory<T>`.
    pub display_name: String,
    pub namespace: Option<String>,
    pub keyword: &'static str,
    pub is_sealed: bool,
    pub is_value_type: bool,
    pub should_emit_inheritance_hooks: bool,
    pub containing_types: Vec<ContainingTypeInfo>,
    pub usings: Vec<String>,
}

/// Incremental cache key: the complete input of one generated file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeGenerationInput {
    pub hierarchy: HierarchyInfo,
    pub callbacks: Vec<CallbackData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_raw_values() {
        for raw in 0..6 {
            let kind = CallbackKind::try_from(raw).unwrap();
            assert_eq!(kind.as_u32(), raw);
        }
    }

    #[test]
    fn test_kind_out_of_range() {
        let err = CallbackKind::try_from(99).unwrap_err();
        assert!(matches!(err, GeneratorError::KindOutOfRange(99)));
    }

    #[test]
    fn test_phase_from_raw() {
        assert_eq!(InvokePhase::from_raw(1).unwrap(), InvokePhase::Pre);
        assert_eq!(InvokePhase::from_raw(2).unwrap(), InvokePhase::Post);
        assert!(matches!(InvokePhase::from_raw(3), Err(GeneratorError::PhaseOutOfRange(3))));
        assert!(matches!(InvokePhase::from_raw(0), Err(GeneratorError::PhaseOutOfRange(0))));
        assert!(matches!(CallbackPhase::try_from(300), Err(GeneratorError::PhaseOutOfRange(300))));
    }

    #[test]
    fn test_value_descriptor_derives_names() {
        let data = CallbackData::new(
            "health",
            CallbackKind::Value,
            CallbackPhase::POST_INVOKE,
            Some("int".to_string()),
            None,
        );
        assert_eq!(data.mask_flag_name, "health");
        assert_eq!(data.hooks.len(), 1);
        let hook = &data.hooks[0];
        assert_eq!(hook.callback_name, "OnHealthChanged");
        assert_eq!(hook.cached_delegate_field_name, "__healthScriptableValueCallbackValueChanged");
        assert_eq!(hook.register_method_name, "RegisterValueChangedListener");
        assert_eq!(hook.unregister_method_name, "UnregisterValueChangedListener");
        assert_eq!(hook.source_event_name, "OnValueChanged");
    }

    #[test]
    fn test_both_phases_produce_two_hooks_in_order() {
        let data = CallbackData::new(
            "m_health",
            CallbackKind::Value,
            CallbackPhase::all(),
            Some("int".to_string()),
            None,
        );
        let names: Vec<&str> = data.hooks.iter().map(|h| h.callback_name.as_str()).collect();
        assert_eq!(names, vec!["OnHealthChanging", "OnHealthChanged"]);
    }

    #[test]
    fn test_empty_value_phase_defaults_to_post_invoke() {
        let data = CallbackData::new("v", CallbackKind::Value, CallbackPhase::empty(), None, None);
        assert_eq!(data.phases, CallbackPhase::POST_INVOKE);
    }

    #[test]
    fn test_non_value_kinds_ignore_phase() {
        let data = CallbackData::new("e", CallbackKind::Event, CallbackPhase::all(), None, None);
        assert!(data.phases.is_empty());
        assert_eq!(data.hooks.len(), 1);
        assert_eq!(data.hooks[0].phase, None);
    }

    #[test]
    fn test_custom_callback_name_overrides_generated_name() {
        let data = CallbackData::new(
            "pool",
            CallbackKind::Pool,
            CallbackPhase::empty(),
            Some("Bullet".to_string()),
            Some("HandleBullets".to_string()),
        );
        assert_eq!(data.hooks[0].callback_name, "HandleBullets");
        assert_eq!(data.hooks[0].cached_delegate_field_name, "__poolScriptableValueCallbackPool");
    }

    #[test]
    fn test_equality_tracks_every_field() {
        let a = CallbackData::new("a", CallbackKind::Value, CallbackPhase::POST_INVOKE, Some("int".into()), None);
        let b = CallbackData::new("a", CallbackKind::Value, CallbackPhase::POST_INVOKE, Some("int".into()), None);
        let c = CallbackData::new("a", CallbackKind::Value, CallbackPhase::PRE_INVOKE, Some("int".into()), None);
        let d = CallbackData::new("a", CallbackKind::Value, CallbackPhase::POST_INVOKE, Some("float".into()), None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;

use super::syntax::{
    self, AttributeSyntax, ContainingTypeSyntax, Location, MemberSyntax, MethodSyntax, SyntaxTree,
    TypeKind,
};
use crate::generator::model::{CallbackKind, CollectionKind};
use crate::generator::naming;

/// A type with all of its partial declarations merged.
#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    pub kind: TypeKind,
    pub namespace: Option<String>,
    pub containing_types: Vec<ContainingTypeSyntax>,
    pub type_parameters: Vec<String>,
    /// Union of the modifiers of every declaration.
    pub modifiers: Vec<String>,
    /// Every declaration carries `partial`.
    pub is_partial: bool,
    pub attributes: Vec<AttributeSyntax>,
    /// Base list of the first declaration that has one.
    pub base_types: Vec<String>,
    /// Members of every declaration, in (file, position) order.
    pub members: Vec<MemberSyntax>,
    /// Compilation-unit using directives of every declaring file, first-seen order.
    pub usings: Vec<String>,
    /// Namespace-scoped using directives of every declaring file.
    pub namespace_usings: Vec<String>,
    /// Location of the first declaration.
    pub location: Location,
}

impl TypeSymbol {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier("static")
    }

    pub fn is_sealed(&self) -> bool {
        self.has_modifier("sealed")
    }

    pub fn is_readonly(&self) -> bool {
        self.has_modifier("readonly")
    }

    pub fn is_ref(&self) -> bool {
        self.has_modifier("ref")
    }

    pub fn is_value_type(&self) -> bool {
        self.kind.is_value_type()
    }

    pub fn has_attribute(&self, configured_name: &str) -> bool {
        self.attributes.iter().any(|a| a.matches(configured_name))
    }

    /// Name with type parameters, e.g. `Inventory<T>`.
    pub fn display_name(&self) -> String {
        with_type_parameters(&self.name, &self.type_parameters)
    }

    /// `Namespace.Outer.Name`, without type parameters.
    pub fn qualified_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(ns) = &self.namespace {
            parts.push(ns);
        }
        for containing in &self.containing_types {
            parts.push(&containing.name);
        }
        parts.push(&self.name);
        parts.join(".")
    }

    /// Identity of the type across partial declarations (arity included).
    pub fn metadata_name(&self) -> String {
        let mut out = String::new();
        if let Some(ns) = &self.namespace {
            out.push_str(ns);
            out.push('.');
        }
        for containing in &self.containing_types {
            out.push_str(&arity_name(&containing.name, containing.type_parameters.len()));
            out.push('+');
        }
        out.push_str(&arity_name(&self.name, self.type_parameters.len()));
        out
    }

    /// Namespace plus containing types: the prefix a qualified reference would use.
    fn qualifier(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(ns) = &self.namespace {
            parts.push(ns);
        }
        for containing in &self.containing_types {
            parts.push(&containing.name);
        }
        parts.join(".")
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSyntax> {
        self.members.iter().filter_map(|m| match m {
            MemberSyntax::Method(method) => Some(method),
            _ => None,
        })
    }
}

pub fn with_type_parameters(name: &str, parameters: &[String]) -> String {
    if parameters.is_empty() {
        name.to_string()
    } else {
        format!("{name}<{}>", parameters.join(", "))
    }
}

fn arity_name(name: &str, arity: usize) -> String {
    if arity == 0 {
        name.to_string()
    } else {
        format!("{name}`{arity}")
    }
}

/// A parsed type reference such as `global::Game.ScriptableList<int>?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    pub qualifier: Option<String>,
    pub name: String,
    pub arguments: Vec<String>,
}

static TYPE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:global::)?(?:(?P<qual>[\w.]+)\.)?(?P<name>\w+)(?:<(?P<args>.*)>)?\??$").unwrap()
});

static TYPE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:global::)?[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*").unwrap());

impl TypeReference {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = TYPE_REF_RE.captures(text.trim())?;
        let arguments = caps
            .name("args")
            .map(|m| split_type_arguments(m.as_str()))
            .unwrap_or_default();
        Some(TypeReference {
            qualifier: caps.name("qual").map(|m| m.as_str().to_string()),
            name: caps["name"].to_string(),
            arguments,
        })
    }

    fn arity(&self) -> usize {
        self.arguments.len()
    }

    fn key(&self) -> String {
        arity_name(&self.name, self.arity())
    }
}

/// Split `int, Dictionary<int, string>` at top-level commas.
pub fn split_type_arguments(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

/// Resolved scriptable container type of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptableType {
    pub kind: CallbackKind,
    /// Generic argument; `None` for non-generic events.
    pub element_type: Option<String>,
}

enum GenericRoot {
    Value,
    Event,
    List,
    Dictionary,
    Pool,
}

/// Open generic runtime types, keyed by `Name`arity`.
fn generic_root(reference: &TypeReference) -> Option<ScriptableType> {
    let root = match reference.key().as_str() {
        "ScriptableValue`1" => GenericRoot::Value,
        "ScriptableEvent`1" => GenericRoot::Event,
        "ScriptableList`1" => GenericRoot::List,
        "ScriptableDictionary`2" => GenericRoot::Dictionary,
        "ScriptablePool`1" | "ScriptableObjectPool`1" => GenericRoot::Pool,
        "ScriptableEvent" => {
            return Some(ScriptableType {
                kind: CallbackKind::Event,
                element_type: None,
            })
        }
        _ => return None,
    };
    let args = &reference.arguments;
    let (kind, element) = match root {
        GenericRoot::Value => (CallbackKind::Value, args[0].clone()),
        GenericRoot::Event => (CallbackKind::GenericEvent, args[0].clone()),
        GenericRoot::List => (CallbackKind::Collection(CollectionKind::List), args[0].clone()),
        GenericRoot::Dictionary => (
            CallbackKind::Collection(CollectionKind::Dictionary),
            naming::key_value_pair(&args[0], &args[1]),
        ),
        GenericRoot::Pool => (CallbackKind::Pool, args[0].clone()),
    };
    Some(ScriptableType {
        kind,
        element_type: Some(element),
    })
}

/// Closed runtime types shipped with Scriptable Values: `(suffix, element type)`.
const BUILTIN_ELEMENTS: &[(&str, &str)] = &[
    ("Bool", "bool"),
    ("Byte", "byte"),
    ("SByte", "sbyte"),
    ("Short", "short"),
    ("UShort", "ushort"),
    ("Int", "int"),
    ("UInt", "uint"),
    ("Long", "long"),
    ("ULong", "ulong"),
    ("Float", "float"),
    ("Double", "double"),
    ("Decimal", "decimal"),
    ("Char", "char"),
    ("String", "string"),
    ("Vector2", "global::UnityEngine.Vector2"),
    ("Vector3", "global::UnityEngine.Vector3"),
    ("Vector4", "global::UnityEngine.Vector4"),
    ("Vector2Int", "global::UnityEngine.Vector2Int"),
    ("Vector3Int", "global::UnityEngine.Vector3Int"),
    ("Quaternion", "global::UnityEngine.Quaternion"),
    ("Color", "global::UnityEngine.Color"),
    ("Color32", "global::UnityEngine.Color32"),
    ("Rect", "global::UnityEngine.Rect"),
    ("RectInt", "global::UnityEngine.RectInt"),
    ("Bounds", "global::UnityEngine.Bounds"),
    ("BoundsInt", "global::UnityEngine.BoundsInt"),
];

fn builtin_closed(reference: &TypeReference) -> Option<ScriptableType> {
    if !reference.arguments.is_empty() {
        return None;
    }
    if reference.name == "ScriptableGameObjectPool" {
        return Some(ScriptableType {
            kind: CallbackKind::Pool,
            element_type: Some("global::UnityEngine.GameObject".to_string()),
        });
    }
    let rest = reference.name.strip_prefix("Scriptable")?;
    let (suffix, kind) = match rest.strip_suffix("Event") {
        Some(suffix) => (suffix, CallbackKind::GenericEvent),
        None => (rest, CallbackKind::Value),
    };
    BUILTIN_ELEMENTS
        .iter()
        .find(|(name, _)| *name == suffix)
        .map(|(_, element)| ScriptableType {
            kind,
            element_type: Some(element.to_string()),
        })
}

const CSHARP_KEYWORD_TYPES: &[&str] = &[
    "bool", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float", "double",
    "decimal", "char", "string", "object", "void", "dynamic", "nint", "nuint",
];

/// The merged type table of one generation pass.
#[derive(Debug, Clone)]
pub struct Compilation {
    types: Vec<TypeSymbol>,
    by_name: HashMap<String, Vec<usize>>,
}

impl Compilation {
    /// Parse `(path, text)` sources in parallel and merge their declarations.
    pub fn from_sources<P, T>(sources: &[(P, T)]) -> Self
    where
        P: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        let trees: Vec<SyntaxTree> = sources
            .par_iter()
            .map(|(path, text)| syntax::parse(path.as_ref(), text.as_ref()))
            .collect();
        Self::from_trees(trees)
    }

    pub fn from_trees(mut trees: Vec<SyntaxTree>) -> Self {
        trees.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let mut merged: BTreeMap<String, TypeSymbol> = BTreeMap::new();
        for tree in &trees {
            for decl in &tree.types {
                let symbol = TypeSymbol {
                    name: decl.name.clone(),
                    kind: decl.kind,
                    namespace: decl.namespace.clone(),
                    containing_types: decl.containing_types.clone(),
                    type_parameters: decl.type_parameters.clone(),
                    modifiers: decl.modifiers.clone(),
                    is_partial: decl.has_modifier("partial"),
                    attributes: decl.attributes.clone(),
                    base_types: decl.base_types.clone(),
                    members: decl.members.clone(),
                    usings: tree.usings.clone(),
                    namespace_usings: tree.namespace_usings.clone(),
                    location: decl.location.clone(),
                };
                let key = symbol.metadata_name();
                match merged.get_mut(&key) {
                    Some(existing) => merge_into(existing, symbol),
                    None => {
                        merged.insert(key, symbol);
                    }
                }
            }
        }

        let types: Vec<TypeSymbol> = merged.into_values().collect();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, ty) in types.iter().enumerate() {
            by_name
                .entry(arity_name(&ty.name, ty.type_parameters.len()))
                .or_default()
                .push(index);
        }

        log::debug!("compilation: {} files, {} types", trees.len(), types.len());
        Compilation { types, by_name }
    }

    /// Types ordered by metadata name.
    pub fn types(&self) -> &[TypeSymbol] {
        &self.types
    }

    /// Find the compilation type a reference names, as seen from `context`.
    pub fn lookup(&self, reference: &TypeReference, context: &TypeSymbol) -> Option<&TypeSymbol> {
        let candidates = self.by_name.get(&reference.key())?;

        if let Some(qualifier) = &reference.qualifier {
            return candidates
                .iter()
                .map(|&i| &self.types[i])
                .find(|c| {
                    let q = c.qualifier();
                    q == *qualifier || q.ends_with(&format!(".{qualifier}"))
                });
        }

        let context_ns = context.namespace.as_deref().unwrap_or("");
        let mut imported: HashSet<String> = context
            .usings
            .iter()
            .map(String::as_str)
            .filter_map(using_target)
            .map(str::to_string)
            .collect();
        // Namespace-scoped usings may name a namespace relative to any enclosing one.
        for target in context.namespace_usings.iter().map(String::as_str).filter_map(using_target) {
            imported.insert(target.to_string());
            let mut scope = context_ns;
            while !scope.is_empty() {
                imported.insert(format!("{scope}.{target}"));
                scope = scope.rsplit_once('.').map_or("", |(outer, _)| outer);
            }
        }

        candidates
            .iter()
            .map(|&i| &self.types[i])
            .min_by_key(|c| {
                let ns = c.namespace.as_deref().unwrap_or("");
                if ns == context_ns {
                    0
                } else if ns.is_empty() || context_ns.starts_with(&format!("{ns}.")) {
                    1
                } else if imported.contains(ns) {
                    2
                } else {
                    3
                }
            })
    }

    /// Direct base class of a type, when it is declared in this compilation.
    pub fn base_class(&self, ty: &TypeSymbol) -> Option<(&TypeSymbol, TypeReference)> {
        if !matches!(ty.kind, TypeKind::Class | TypeKind::Record) {
            return None;
        }
        let reference = TypeReference::parse(ty.base_types.first()?)?;
        let base = self.lookup(&reference, ty)?;
        matches!(base.kind, TypeKind::Class | TypeKind::Record).then_some((base, reference))
    }

    /// Base classes declared in this compilation, nearest first.
    ///
    /// Stops at the first base that is not part of the compilation. Cycles in
    /// malformed input end the walk.
    pub fn ancestors<'a>(&'a self, ty: &'a TypeSymbol) -> Vec<&'a TypeSymbol> {
        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(ty.metadata_name());
        let mut current = ty;
        while let Some((base, _)) = self.base_class(current) {
            if !seen.insert(base.metadata_name()) {
                break;
            }
            out.push(base);
            current = base;
        }
        out
    }

    /// Classify a member's declared type as a scriptable container.
    ///
    /// Open runtime generics win first, then types declared in the
    /// compilation (following their base class with type arguments
    /// substituted), then the closed runtime types.
    pub fn resolve_scriptable(&self, type_text: &str, context: &TypeSymbol) -> Option<ScriptableType> {
        let mut reference = TypeReference::parse(type_text)?;
        let mut scope = context;
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            if let Some(found) = generic_root(&reference) {
                return Some(ScriptableType {
                    element_type: found.element_type.map(|e| self.qualify_type(&e, scope)),
                    ..found
                });
            }

            if let Some(symbol) = self.lookup(&reference, scope) {
                if !seen.insert(symbol.metadata_name()) {
                    return None;
                }
                let base = symbol.base_types.first()?;
                let substituted = substitute_type_parameters(base, &symbol.type_parameters, &reference.arguments);
                reference = TypeReference::parse(&substituted)?;
                scope = symbol;
                continue;
            }

            return builtin_closed(&reference);
        }
    }

    /// Rewrite names in `type_text` that refer to compilation types as
    /// `global::`-qualified names, so generated files need no extra usings.
    pub fn qualify_type(&self, type_text: &str, context: &TypeSymbol) -> String {
        let mut out = String::with_capacity(type_text.len());
        let mut last = 0;
        for m in TYPE_NAME_RE.find_iter(type_text) {
            out.push_str(&type_text[last..m.start()]);
            last = m.end();

            let text = m.as_str();
            if text.starts_with("global::") || CSHARP_KEYWORD_TYPES.contains(&text) {
                out.push_str(text);
                continue;
            }

            let (qualifier, name) = match text.rsplit_once('.') {
                Some((q, n)) => (Some(q.to_string()), n.to_string()),
                None => (None, text.to_string()),
            };
            let arity = generic_arity_after(&type_text[m.end()..]);
            let reference = TypeReference {
                qualifier,
                name,
                arguments: vec![String::new(); arity],
            };
            match self.lookup(&reference, context) {
                Some(symbol) => {
                    out.push_str("global::");
                    out.push_str(&symbol.qualified_name());
                }
                None => out.push_str(text),
            }
        }
        out.push_str(&type_text[last..]);
        out
    }
}

fn merge_into(existing: &mut TypeSymbol, other: TypeSymbol) {
    existing.is_partial &= other.is_partial;
    for modifier in other.modifiers {
        if !existing.modifiers.contains(&modifier) {
            existing.modifiers.push(modifier);
        }
    }
    existing.attributes.extend(other.attributes);
    if existing.base_types.is_empty() {
        existing.base_types = other.base_types;
    }
    existing.members.extend(other.members);
    for using in other.usings {
        if !existing.usings.contains(&using) {
            existing.usings.push(using);
        }
    }
    for using in other.namespace_usings {
        if !existing.namespace_usings.contains(&using) {
            existing.namespace_usings.push(using);
        }
    }
}

/// Target of a plain `using X;` directive.
fn using_target(using: &str) -> Option<&str> {
    let target = using.strip_prefix("using ")?.strip_suffix(';')?;
    (!target.contains('=') && !target.starts_with("static ")).then_some(target)
}

/// Number of type arguments in a `<...>` list at the start of `rest`.
fn generic_arity_after(rest: &str) -> usize {
    if !rest.starts_with('<') {
        return 0;
    }
    let mut depth = 0i32;
    let mut commas = 0;
    for c in rest.chars() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return commas + 1;
                }
            }
            ',' if depth == 1 => commas += 1,
            _ => {}
        }
    }
    commas + 1
}

/// Replace whole-word type parameter names with the given arguments.
fn substitute_type_parameters(text: &str, parameters: &[String], arguments: &[String]) -> String {
    if parameters.is_empty() || parameters.len() != arguments.len() {
        return text.to_string();
    }
    let map: HashMap<&str, &str> = parameters
        .iter()
        .map(String::as_str)
        .zip(arguments.iter().map(String::as_str))
        .collect();
    static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());
    WORD_RE
        .replace_all(text, |caps: &regex::Captures| {
            let word = &caps[0];
            map.get(word).copied().unwrap_or(word).to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(sources: &[(&str, &str)]) -> Compilation {
        Compilation::from_sources(sources)
    }

    fn find<'a>(compilation: &'a Compilation, name: &str) -> &'a TypeSymbol {
        compilation.types().iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn test_type_reference_parse() {
        let r = TypeReference::parse("global::Game.Data.ScriptableList<Dictionary<int, string>>?").unwrap();
        assert_eq!(r.qualifier.as_deref(), Some("Game.Data"));
        assert_eq!(r.name, "ScriptableList");
        assert_eq!(r.arguments, vec!["Dictionary<int, string>"]);

        let r = TypeReference::parse("ScriptableDictionary<int, string>").unwrap();
        assert!(r.qualifier.is_none());
        assert_eq!(r.arguments, vec!["int", "string"]);

        assert!(TypeReference::parse("int[]").is_none());
    }

    #[test]
    fn test_partial_declarations_merge() {
        let c = compile(&[
            ("B.cs", "using UnityEngine;\nnamespace G { [Marker] public partial class P : MonoBehaviour { int b; } }"),
            ("A.cs", "using System;\nnamespace G { public sealed partial class P { int a; } }"),
        ]);
        assert_eq!(c.types().len(), 1);
        let p = &c.types()[0];
        assert!(p.is_partial);
        assert!(p.is_sealed());
        assert!(p.has_attribute("Marker"));
        assert_eq!(p.base_types, vec!["MonoBehaviour"]);
        assert_eq!(p.usings, vec!["using System;", "using UnityEngine;"]);
        // A.cs sorts first, so its member comes first.
        let names: Vec<&str> = p
            .members
            .iter()
            .filter_map(|m| match m {
                MemberSyntax::Field(f) => Some(f.variables[0].name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(p.location.file_path, "A.cs");
    }

    #[test]
    fn test_partial_flag_requires_every_declaration() {
        let c = compile(&[("A.cs", "partial class P { } class P { }")]);
        assert!(!c.types()[0].is_partial);
    }

    #[test]
    fn test_generic_arity_distinguishes_types() {
        let c = compile(&[("A.cs", "class Box { } class Box<T> { }")]);
        assert_eq!(c.types().len(), 2);
        let generic = c.types().iter().find(|t| !t.type_parameters.is_empty()).unwrap();
        assert_eq!(generic.display_name(), "Box<T>");
        assert_eq!(generic.metadata_name(), "Box`1");
    }

    #[test]
    fn test_resolve_builtin_types() {
        let c = compile(&[("A.cs", "class Host { }")]);
        let host = find(&c, "Host");
        let cases = [
            ("ScriptableBool", CallbackKind::Value, Some("bool")),
            ("ScriptableString", CallbackKind::Value, Some("string")),
            ("ScriptableVector3", CallbackKind::Value, Some("global::UnityEngine.Vector3")),
            ("ScriptableValue<int>", CallbackKind::Value, Some("int")),
            ("ScriptableEvent", CallbackKind::Event, None),
            ("ScriptableEvent<float>", CallbackKind::GenericEvent, Some("float")),
            ("ScriptableIntEvent", CallbackKind::GenericEvent, Some("int")),
            ("ScriptableList<int>", CallbackKind::Collection(CollectionKind::List), Some("int")),
            (
                "ScriptableDictionary<string, int>",
                CallbackKind::Collection(CollectionKind::Dictionary),
                Some("global::System.Collections.Generic.KeyValuePair<string, int>"),
            ),
            ("ScriptablePool<Bullet>", CallbackKind::Pool, Some("Bullet")),
            ("ScriptableGameObjectPool", CallbackKind::Pool, Some("global::UnityEngine.GameObject")),
            ("Hertzole.ScriptableValues.ScriptableInt", CallbackKind::Value, Some("int")),
        ];
        for (text, kind, element) in cases {
            let resolved = c.resolve_scriptable(text, host).unwrap_or_else(|| panic!("{text} should resolve"));
            assert_eq!(resolved.kind, kind, "{text}");
            assert_eq!(resolved.element_type.as_deref(), element, "{text}");
        }
    }

    #[test]
    fn test_resolve_unsupported_types() {
        let c = compile(&[("A.cs", "class Host { }")]);
        let host = find(&c, "Host");
        for text in ["int", "GameObject", "ScriptableThing", "List<int>", "int[]"] {
            assert!(c.resolve_scriptable(text, host).is_none(), "{text}");
        }
    }

    #[test]
    fn test_resolve_user_types_through_base_chain() {
        let c = compile(&[(
            "A.cs",
            r#"
namespace Game.Data
{
    public struct EnemyData { }
    public class ScriptableEnemy : ScriptableValue<EnemyData> { }
    public class BossValue : ScriptableEnemy { }
    public class Inventory<TItem> : ScriptableList<TItem> { }
}
namespace Game.UI
{
    using Game.Data;
    public class Host { }
}
"#,
        )]);
        let host = find(&c, "Host");

        let enemy = c.resolve_scriptable("BossValue", host).unwrap();
        assert_eq!(enemy.kind, CallbackKind::Value);
        assert_eq!(enemy.element_type.as_deref(), Some("global::Game.Data.EnemyData"));

        let inventory = c.resolve_scriptable("Inventory<string>", host).unwrap();
        assert_eq!(inventory.kind, CallbackKind::Collection(CollectionKind::List));
        assert_eq!(inventory.element_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_resolve_terminates_on_cycles() {
        let c = compile(&[("A.cs", "class A : B { } class B : A { } class Host { }")]);
        let host = find(&c, "Host");
        assert!(c.resolve_scriptable("A", host).is_none());
        let a = find(&c, "A");
        assert_eq!(c.ancestors(a).len(), 1);
    }

    #[test]
    fn test_ancestors_stop_at_external_base() {
        let c = compile(&[(
            "A.cs",
            "class Root : MonoBehaviour { } class Mid : Root { } class Leaf : Mid, IDisposable { }",
        )]);
        let leaf = find(&c, "Leaf");
        let names: Vec<&str> = c.ancestors(leaf).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Root"]);
    }

    #[test]
    fn test_interface_first_base_is_not_a_class() {
        let c = compile(&[("A.cs", "interface IThing { } class Impl : IThing { }")]);
        let implementation = find(&c, "Impl");
        assert!(c.base_class(implementation).is_none());
    }

    #[test]
    fn test_lookup_prefers_same_namespace() {
        let c = compile(&[(
            "A.cs",
            "namespace A { class Shared { } class Host { } } namespace B { class Shared { } }",
        )]);
        let host = find(&c, "Host");
        let reference = TypeReference::parse("Shared").unwrap();
        assert_eq!(c.lookup(&reference, host).unwrap().namespace.as_deref(), Some("A"));

        let qualified = TypeReference::parse("B.Shared").unwrap();
        assert_eq!(c.lookup(&qualified, host).unwrap().namespace.as_deref(), Some("B"));
    }

    #[test]
    fn test_lookup_through_namespace_scoped_using() {
        let c = compile(&[(
            "A.cs",
            "namespace Other { class Item { } } \
             namespace Game { using Data; class Host { } } \
             namespace Game.Data { class Item { } }",
        )]);
        let host = find(&c, "Host");
        assert!(host.usings.is_empty());
        assert_eq!(host.namespace_usings, vec!["using Data;"]);
        let reference = TypeReference::parse("Item").unwrap();
        assert_eq!(c.lookup(&reference, host).unwrap().namespace.as_deref(), Some("Game.Data"));
    }

    #[test]
    fn test_qualify_type_rewrites_known_names_only() {
        let c = compile(&[("A.cs", "namespace Game { class Item { } class Host { } }")]);
        let host = find(&c, "Host");
        assert_eq!(
            c.qualify_type("Dictionary<string, Item>", host),
            "Dictionary<string, global::Game.Item>"
        );
        assert_eq!(c.qualify_type("int", host), "int");
        assert_eq!(c.qualify_type("global::Game.Item", host), "global::Game.Item");
    }

    #[test]
    fn test_split_type_arguments() {
        assert_eq!(
            split_type_arguments("int, Dictionary<int, string>, (int, int)"),
            vec!["int", "Dictionary<int, string>", "(int, int)"]
        );
        assert!(split_type_arguments("").is_empty());
    }

    #[test]
    fn test_substitute_type_parameters() {
        assert_eq!(
            substitute_type_parameters("ScriptableDictionary<TKey, List<TKey>>", &["TKey".to_string()], &["int".to_string()]),
            "ScriptableDictionary<int, List<int>>"
        );
        assert_eq!(
            substitute_type_parameters("ScriptableList<T>", &["T".to_string()], &[]),
            "ScriptableList<T>"
        );
    }
}

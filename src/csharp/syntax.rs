use serde::Serialize;

use super::lexer::{tokenize, Token, TokenKind};

/// Source position of a declaration, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeArgument {
    /// Set for `Name = value` and `name: value` arguments.
    pub name: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSyntax {
    /// Name as written, e.g. `Hertzole.ScriptableValues.GenerateValueCallback`.
    pub name: String,
    /// `field`, `property`, `assembly`... when an explicit target is given.
    pub target: Option<String>,
    pub arguments: Vec<AttributeArgument>,
    pub location: Location,
}

impl AttributeSyntax {
    /// The attribute name without qualifier, generic arguments or `Attribute` suffix.
    pub fn short_name(&self) -> &str {
        let name = self.name.split('<').next().unwrap_or(&self.name);
        let name = name.rsplit(['.', ':']).next().unwrap_or(name);
        name.strip_suffix("Attribute").filter(|s| !s.is_empty()).unwrap_or(name)
    }

    /// Compare against a configured attribute name, which may itself carry the suffix.
    pub fn matches(&self, configured: &str) -> bool {
        let configured = configured
            .strip_suffix("Attribute")
            .filter(|s| !s.is_empty())
            .unwrap_or(configured);
        self.short_name() == configured
    }

    pub fn positional_arguments(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .filter(|a| a.name.is_none())
            .map(|a| a.value.as_str())
    }

    pub fn named_argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    RecordStruct,
}

impl TypeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::RecordStruct => "record struct",
        }
    }

    pub fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::RecordStruct | TypeKind::Enum)
    }
}

/// One level of nesting above a type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainingTypeSyntax {
    pub name: String,
    pub kind: TypeKind,
    pub type_parameters: Vec<String>,
    pub is_partial: bool,
}

#[derive(Debug, Clone)]
pub struct VariableSyntax {
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct FieldSyntax {
    pub attributes: Vec<AttributeSyntax>,
    pub modifiers: Vec<String>,
    pub type_name: String,
    pub variables: Vec<VariableSyntax>,
}

#[derive(Debug, Clone)]
pub struct PropertySyntax {
    pub attributes: Vec<AttributeSyntax>,
    pub modifiers: Vec<String>,
    pub type_name: String,
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct MethodSyntax {
    pub modifiers: Vec<String>,
    pub return_type: String,
    pub name: String,
    /// Parameter list text without the parentheses.
    pub parameters: String,
    pub has_body: bool,
    pub location: Location,
}

impl MethodSyntax {
    pub fn is_partial(&self) -> bool {
        self.modifiers.iter().any(|m| m == "partial")
    }
}

#[derive(Debug, Clone)]
pub enum MemberSyntax {
    Field(FieldSyntax),
    Property(PropertySyntax),
    Method(MethodSyntax),
}

#[derive(Debug, Clone)]
pub struct TypeDeclarationSyntax {
    pub name: String,
    pub kind: TypeKind,
    pub modifiers: Vec<String>,
    pub attributes: Vec<AttributeSyntax>,
    pub type_parameters: Vec<String>,
    pub base_types: Vec<String>,
    pub namespace: Option<String>,
    pub containing_types: Vec<ContainingTypeSyntax>,
    pub members: Vec<MemberSyntax>,
    pub location: Location,
}

impl TypeDeclarationSyntax {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// Declarations found in one source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub file_path: String,
    /// Non-global compilation-unit using directives in file order, normalized.
    pub usings: Vec<String>,
    /// Using directives declared inside a namespace. They resolve relative
    /// to that namespace, so they only feed type lookup.
    pub namespace_usings: Vec<String>,
    /// Type declarations ordered by position, nested types included.
    pub types: Vec<TypeDeclarationSyntax>,
}

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "readonly", "partial", "sealed",
    "abstract", "virtual", "override", "new", "extern", "unsafe", "volatile", "const", "async",
    "required", "file", "fixed", "ref", "scoped",
];

/// Parse the declarations of a C# file.
///
/// Only declaration structure is recovered: bodies, initializers and
/// expressions are skipped by balanced-token matching. Unrecognized input is
/// skipped to the next `;` or block, so this never fails.
pub fn parse(file_path: &str, source: &str) -> SyntaxTree {
    let mut parser = Parser {
        source,
        file_path,
        tokens: tokenize(source),
        pos: 0,
        usings: Vec::new(),
        namespace_usings: Vec::new(),
        types: Vec::new(),
    };
    parser.parse_namespace_body(None, false);

    let mut types = parser.types;
    types.sort_by(|a, b| (a.location.line, a.location.column).cmp(&(b.location.line, b.location.column)));

    SyntaxTree {
        file_path: file_path.to_string(),
        usings: parser.usings,
        namespace_usings: parser.namespace_usings,
        types,
    }
}

struct Parser<'a> {
    source: &'a str,
    file_path: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    usings: Vec<String>,
    namespace_usings: Vec<String>,
    types: Vec<TypeDeclarationSyntax>,
}

impl<'a> Parser<'a> {
    fn peek(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn peek_text(&self, n: usize) -> Option<&'a str> {
        let source = self.source;
        self.peek(n).map(|t| t.text(source))
    }

    fn is_punct(&self, n: usize, c: char) -> bool {
        self.peek(n).is_some_and(|t| t.is_punct(c))
    }

    fn is_ident(&self, n: usize) -> bool {
        self.peek(n).is_some_and(|t| t.kind == TokenKind::Ident)
    }

    fn is_keyword(&self, n: usize, keyword: &str) -> bool {
        self.is_ident(n) && self.peek_text(n) == Some(keyword)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn location(&self, token: &Token) -> Location {
        Location {
            file_path: self.file_path.to_string(),
            line: token.line,
            column: token.column,
        }
    }

    /// Normalized text of tokens `[start, end)`.
    fn text(&self, start: usize, end: usize) -> String {
        let mut out = String::new();
        let mut previous: Option<&Token> = None;
        let end = end.min(self.tokens.len());
        let start = start.min(end);
        for token in &self.tokens[start..end] {
            if let Some(prev) = previous {
                if needs_space(prev, token) {
                    out.push(' ');
                }
            }
            out.push_str(token.text(self.source));
            previous = Some(token);
        }
        out
    }

    /// Consume a balanced `open ... close` group starting at the cursor.
    fn skip_balanced(&mut self, open: char, close: char) -> bool {
        let mut depth = 0usize;
        while let Some(token) = self.bump() {
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Skip to the end of the current statement or block.
    ///
    /// Stops after a top-level `;` or a top-level `{...}` group, and before a
    /// top-level `}` that closes the enclosing body.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek(0).copied() {
            match token.kind {
                TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
                TokenKind::Punct(')') | TokenKind::Punct(']') => depth = depth.saturating_sub(1),
                TokenKind::Punct(';') if depth == 0 => {
                    self.bump();
                    return;
                }
                TokenKind::Punct('{') if depth == 0 => {
                    self.skip_balanced('{', '}');
                    if self.is_punct(0, ';') {
                        self.bump();
                    }
                    return;
                }
                TokenKind::Punct('{') => {
                    self.skip_balanced('{', '}');
                    continue;
                }
                TokenKind::Punct('}') if depth == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }

    fn parse_namespace_body(&mut self, namespace: Option<String>, braced: bool) {
        let mut namespace = namespace;
        while let Some(token) = self.peek(0).copied() {
            if token.is_punct('}') {
                self.bump();
                if braced {
                    return;
                }
                continue;
            }
            if token.is_punct(';') {
                self.bump();
                continue;
            }

            if self.is_keyword(0, "using") && !self.is_punct(1, '(') {
                self.parse_using(false, namespace.is_some());
                continue;
            }
            if self.is_keyword(0, "global") && self.is_keyword(1, "using") {
                self.parse_using(true, namespace.is_some());
                continue;
            }
            if self.is_keyword(0, "extern") && self.is_keyword(1, "alias") {
                self.skip_statement();
                continue;
            }
            if self.is_keyword(0, "namespace") {
                self.bump();
                let start = self.pos;
                while self.is_ident(0) || self.is_punct(0, '.') {
                    self.bump();
                }
                let name = self.text(start, self.pos).replace(' ', "");
                let full = match &namespace {
                    Some(outer) => format!("{outer}.{name}"),
                    None => name,
                };
                if self.is_punct(0, ';') {
                    self.bump();
                    namespace = Some(full);
                } else if self.is_punct(0, '{') {
                    self.bump();
                    self.parse_namespace_body(Some(full), true);
                } else {
                    self.skip_statement();
                }
                continue;
            }

            let attributes = self.parse_attribute_lists();
            let modifiers = self.parse_modifiers();
            if self.at_type_keyword() {
                self.parse_type_declaration(attributes, modifiers, namespace.clone(), &[]);
            } else if !self.is_punct(0, '}') {
                self.skip_statement();
            }
        }
    }

    fn parse_using(&mut self, global: bool, in_namespace: bool) {
        let start = self.pos;
        self.skip_statement();
        if global {
            return;
        }
        let text = self.text(start, self.pos);
        let usings = if in_namespace {
            &mut self.namespace_usings
        } else {
            &mut self.usings
        };
        if !usings.contains(&text) {
            usings.push(text);
        }
    }

    fn at_type_keyword(&self) -> bool {
        self.is_ident(0)
            && matches!(
                self.peek_text(0),
                Some("class" | "struct" | "interface" | "enum" | "record")
            )
    }

    fn parse_modifiers(&mut self) -> Vec<String> {
        let mut modifiers = Vec::new();
        while self.is_ident(0) {
            let Some(text) = self.peek_text(0) else { break };
            if !MODIFIERS.contains(&text) {
                break;
            }
            // `ref` before a type name is part of the type, not a modifier.
            if text == "ref" && !(self.is_keyword(1, "struct") || self.is_keyword(1, "partial") || self.is_keyword(1, "readonly")) {
                break;
            }
            modifiers.push(text.to_string());
            self.bump();
        }
        modifiers
    }

    fn parse_attribute_lists(&mut self) -> Vec<AttributeSyntax> {
        let mut attributes = Vec::new();
        while self.is_punct(0, '[') {
            self.bump();

            let mut target = None;
            if self.is_ident(0) && self.is_punct(1, ':') && !self.is_punct(2, ':') {
                target = self.peek_text(0).map(str::to_string);
                self.bump();
                self.bump();
            }

            loop {
                let Some(name_token) = self.peek(0).copied() else { return attributes };
                if name_token.kind != TokenKind::Ident {
                    self.skip_to_bracket_end();
                    break;
                }
                let start = self.pos;
                self.skip_qualified_name();
                let name = self.text(start, self.pos);

                let arguments = if self.is_punct(0, '(') {
                    self.parse_attribute_arguments()
                } else {
                    Vec::new()
                };

                attributes.push(AttributeSyntax {
                    name,
                    target: target.clone(),
                    arguments,
                    location: self.location(&name_token),
                });

                if self.is_punct(0, ',') {
                    self.bump();
                    continue;
                }
                if self.is_punct(0, ']') {
                    self.bump();
                } else {
                    self.skip_to_bracket_end();
                }
                break;
            }
        }
        attributes
    }

    fn skip_to_bracket_end(&mut self) {
        let mut depth = 1usize;
        while let Some(token) = self.bump() {
            if token.is_punct('[') {
                depth += 1;
            } else if token.is_punct(']') {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// `A.B::C<D>` style names used by attributes and namespaces.
    fn skip_qualified_name(&mut self) {
        loop {
            if !self.is_ident(0) {
                return;
            }
            self.bump();
            if self.is_punct(0, '<') {
                self.skip_generic_arguments();
            }
            if self.is_punct(0, '.') && self.is_ident(1) {
                self.bump();
            } else if self.is_punct(0, ':') && self.is_punct(1, ':') {
                self.bump();
                self.bump();
            } else {
                return;
            }
        }
    }

    fn parse_attribute_arguments(&mut self) -> Vec<AttributeArgument> {
        // Cursor on '('.
        self.bump();
        let mut arguments = Vec::new();
        let mut depth = 0usize;
        let mut start = self.pos;

        while let Some(token) = self.peek(0).copied() {
            match token.kind {
                TokenKind::Punct('(') | TokenKind::Punct('[') | TokenKind::Punct('{') => depth += 1,
                TokenKind::Punct(']') | TokenKind::Punct('}') => depth = depth.saturating_sub(1),
                TokenKind::Punct(')') if depth > 0 => depth -= 1,
                TokenKind::Punct(')') | TokenKind::Punct(',') if depth == 0 => {
                    if self.pos > start {
                        arguments.push(self.attribute_argument(start, self.pos));
                    }
                    self.bump();
                    if token.is_punct(')') {
                        return arguments;
                    }
                    start = self.pos;
                    continue;
                }
                _ => {}
            }
            self.bump();
        }
        arguments
    }

    fn attribute_argument(&self, start: usize, end: usize) -> AttributeArgument {
        let named = end - start >= 3
            && self.tokens[start].kind == TokenKind::Ident
            && match self.tokens[start + 1].kind {
                TokenKind::Punct('=') => !self.tokens[start + 2].is_punct('='),
                TokenKind::Punct(':') => !self.tokens[start + 2].is_punct(':'),
                _ => false,
            };
        if named {
            AttributeArgument {
                name: Some(self.tokens[start].text(self.source).to_string()),
                value: self.text(start + 2, end),
            }
        } else {
            AttributeArgument {
                name: None,
                value: self.text(start, end),
            }
        }
    }

    fn skip_generic_arguments(&mut self) {
        // Cursor on '<'.
        let mut depth = 0usize;
        while let Some(token) = self.peek(0).copied() {
            match token.kind {
                TokenKind::Punct('<') => depth += 1,
                TokenKind::Punct('>') => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                TokenKind::Punct('(') => {
                    self.skip_balanced('(', ')');
                    continue;
                }
                TokenKind::Punct(';') | TokenKind::Punct('{') | TokenKind::Punct('}') => return,
                _ => {}
            }
            self.bump();
        }
    }

    /// Consume a type reference. Returns false when the cursor is not on one.
    fn parse_type(&mut self) -> bool {
        if self.is_punct(0, '(') {
            self.skip_balanced('(', ')');
        } else if self.is_ident(0) {
            self.skip_qualified_name();
        } else {
            return false;
        }

        loop {
            if self.is_punct(0, '?') || self.is_punct(0, '*') {
                self.bump();
            } else if self.is_punct(0, '[') && (self.is_punct(1, ']') || self.is_punct(1, ',')) {
                self.skip_balanced('[', ']');
            } else {
                return true;
            }
        }
    }

    fn parse_type_declaration(
        &mut self,
        attributes: Vec<AttributeSyntax>,
        modifiers: Vec<String>,
        namespace: Option<String>,
        containing: &[ContainingTypeSyntax],
    ) {
        let keyword = self.bump().map(|t| t.text(self.source)).unwrap_or_default();
        let kind = match keyword {
            "class" => TypeKind::Class,
            "struct" => TypeKind::Struct,
            "interface" => TypeKind::Interface,
            "enum" => TypeKind::Enum,
            _ => {
                if self.is_keyword(0, "struct") {
                    self.bump();
                    TypeKind::RecordStruct
                } else {
                    if self.is_keyword(0, "class") {
                        self.bump();
                    }
                    TypeKind::Record
                }
            }
        };

        let Some(name_token) = self.peek(0).copied().filter(|t| t.kind == TokenKind::Ident) else {
            self.skip_statement();
            return;
        };
        self.bump();
        let name = name_token.text(self.source).to_string();
        let location = self.location(&name_token);

        let type_parameters = if self.is_punct(0, '<') {
            self.parse_type_parameters()
        } else {
            Vec::new()
        };

        // Primary constructor parameters.
        if self.is_punct(0, '(') {
            self.skip_balanced('(', ')');
        }

        let mut base_types = Vec::new();
        if self.is_punct(0, ':') {
            self.bump();
            loop {
                let start = self.pos;
                if !self.parse_type() {
                    break;
                }
                base_types.push(self.text(start, self.pos));
                if self.is_punct(0, '(') {
                    self.skip_balanced('(', ')');
                }
                if self.is_punct(0, ',') {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        // Constraint clauses.
        while let Some(token) = self.peek(0) {
            if token.is_punct('{') || token.is_punct(';') || token.is_punct('}') {
                break;
            }
            self.bump();
        }

        let mut members = Vec::new();
        if self.is_punct(0, '{') {
            if matches!(kind, TypeKind::Enum | TypeKind::Interface) {
                self.skip_balanced('{', '}');
            } else {
                self.bump();
                let mut chain = containing.to_vec();
                chain.push(ContainingTypeSyntax {
                    name: name.clone(),
                    kind,
                    type_parameters: type_parameters.clone(),
                    is_partial: modifiers.iter().any(|m| m == "partial"),
                });
                members = self.parse_members(&namespace, &chain);
                if self.is_punct(0, '}') {
                    self.bump();
                }
            }
            if self.is_punct(0, ';') {
                self.bump();
            }
        } else if self.is_punct(0, ';') {
            self.bump();
        }

        self.types.push(TypeDeclarationSyntax {
            name,
            kind,
            modifiers,
            attributes,
            type_parameters,
            base_types,
            namespace,
            containing_types: containing.to_vec(),
            members,
            location,
        });
    }

    fn parse_type_parameters(&mut self) -> Vec<String> {
        // Cursor on '<'.
        self.bump();
        let mut parameters = Vec::new();
        while let Some(token) = self.peek(0).copied() {
            match token.kind {
                TokenKind::Punct('>') => {
                    self.bump();
                    break;
                }
                TokenKind::Punct('[') => {
                    self.skip_balanced('[', ']');
                }
                TokenKind::Ident => {
                    let text = token.text(self.source);
                    if text != "in" && text != "out" {
                        parameters.push(text.to_string());
                    }
                    self.bump();
                }
                TokenKind::Punct('{') | TokenKind::Punct(';') => break,
                _ => {
                    self.bump();
                }
            }
        }
        parameters
    }

    fn parse_members(
        &mut self,
        namespace: &Option<String>,
        containing: &[ContainingTypeSyntax],
    ) -> Vec<MemberSyntax> {
        let mut members = Vec::new();

        while let Some(token) = self.peek(0).copied() {
            if token.is_punct('}') {
                break;
            }
            if token.is_punct(';') {
                self.bump();
                continue;
            }

            let attributes = self.parse_attribute_lists();
            let modifiers = self.parse_modifiers();
            let Some(token) = self.peek(0).copied() else { break };
            if token.is_punct('}') {
                break;
            }

            if self.at_type_keyword() {
                self.parse_type_declaration(attributes, modifiers, namespace.clone(), containing);
                continue;
            }

            let skip = if token.kind == TokenKind::Ident {
                matches!(
                    token.text(self.source),
                    "delegate" | "event" | "operator" | "implicit" | "explicit"
                ) || self.is_punct(1, '(')
            } else {
                !token.is_punct('(')
            };
            if skip {
                // Destructors, delegates, events, operators and constructors.
                self.skip_statement();
                continue;
            }

            let type_start = self.pos;
            if !self.parse_type() {
                self.skip_statement();
                continue;
            }
            let type_name = self.text(type_start, self.pos);

            if !self.is_ident(0) || self.is_keyword(0, "this") || self.is_keyword(0, "operator") {
                self.skip_statement();
                continue;
            }

            // Explicit interface implementations keep only the final segment.
            let mut name_token = self.peek(0).copied();
            self.bump();
            loop {
                if self.is_punct(0, '<') && !self.generic_list_opens_parameters() {
                    self.skip_generic_arguments();
                }
                if self.is_punct(0, '.') && self.is_ident(1) {
                    self.bump();
                    name_token = self.peek(0).copied();
                    self.bump();
                } else {
                    break;
                }
            }
            let Some(name_token) = name_token else { break };
            let name = name_token.text(self.source).to_string();
            let location = self.location(&name_token);

            if self.is_punct(0, '(') || self.is_punct(0, '<') {
                members.push(MemberSyntax::Method(self.parse_method_rest(
                    modifiers, type_name, name, location,
                )));
            } else if self.is_punct(0, '{') {
                self.skip_balanced('{', '}');
                if self.is_punct(0, '=') {
                    self.skip_statement();
                }
                members.push(MemberSyntax::Property(PropertySyntax {
                    attributes,
                    modifiers,
                    type_name,
                    name,
                    location,
                }));
            } else if self.is_punct(0, '=') && self.is_punct(1, '>') {
                self.skip_statement();
                members.push(MemberSyntax::Property(PropertySyntax {
                    attributes,
                    modifiers,
                    type_name,
                    name,
                    location,
                }));
            } else if self.is_punct(0, '=') || self.is_punct(0, ',') || self.is_punct(0, ';') || self.is_punct(0, '[') {
                let variables = self.parse_declarators(VariableSyntax { name, location });
                members.push(MemberSyntax::Field(FieldSyntax {
                    attributes,
                    modifiers,
                    type_name,
                    variables,
                }));
            } else {
                self.skip_statement();
            }
        }

        members
    }

    /// Whether a `<` at the cursor opens a method's type parameter list.
    fn generic_list_opens_parameters(&self) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        while let Some(token) = self.peek(n) {
            if token.is_punct('<') {
                depth += 1;
            } else if token.is_punct('>') {
                depth -= 1;
                if depth == 0 {
                    return self.is_punct(n + 1, '(');
                }
            } else if token.is_punct(';') || token.is_punct('{') {
                return false;
            }
            n += 1;
        }
        false
    }

    fn parse_method_rest(
        &mut self,
        modifiers: Vec<String>,
        return_type: String,
        name: String,
        location: Location,
    ) -> MethodSyntax {
        if self.is_punct(0, '<') {
            self.skip_generic_arguments();
        }

        let mut parameters = String::new();
        if self.is_punct(0, '(') {
            let start = self.pos + 1;
            if self.skip_balanced('(', ')') {
                parameters = self.text(start, self.pos - 1);
            }
        }

        let mut has_body = false;
        while let Some(token) = self.peek(0).copied() {
            if token.is_punct('{') {
                self.skip_balanced('{', '}');
                has_body = true;
                break;
            }
            if token.is_punct('=') && self.is_punct(1, '>') {
                self.skip_statement();
                has_body = true;
                break;
            }
            if token.is_punct(';') {
                self.bump();
                break;
            }
            if token.is_punct('}') {
                break;
            }
            self.bump();
        }

        MethodSyntax {
            modifiers,
            return_type,
            name,
            parameters,
            has_body,
            location,
        }
    }

    fn parse_declarators(&mut self, first: VariableSyntax) -> Vec<VariableSyntax> {
        let mut variables = vec![first];
        loop {
            let Some(token) = self.peek(0).copied() else { break };
            match token.kind {
                TokenKind::Punct(';') => {
                    self.bump();
                    break;
                }
                TokenKind::Punct('[') => {
                    self.skip_balanced('[', ']');
                }
                TokenKind::Punct('=') => {
                    self.bump();
                    self.skip_initializer();
                }
                TokenKind::Punct(',') => {
                    self.bump();
                    match self.peek(0).copied() {
                        Some(next) if next.kind == TokenKind::Ident => {
                            self.bump();
                            variables.push(VariableSyntax {
                                name: next.text(self.source).to_string(),
                                location: self.location(&next),
                            });
                        }
                        _ => {
                            self.skip_statement();
                            break;
                        }
                    }
                }
                TokenKind::Punct('}') => break,
                _ => {
                    self.skip_statement();
                    break;
                }
            }
        }
        variables
    }

    /// Skip a field initializer, stopping before the `,` of the next declarator
    /// or the terminating `;`.
    fn skip_initializer(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek(0).copied() {
            match token.kind {
                TokenKind::Punct('(') | TokenKind::Punct('[') | TokenKind::Punct('{') => depth += 1,
                TokenKind::Punct(')') | TokenKind::Punct(']') => depth = depth.saturating_sub(1),
                TokenKind::Punct('}') if depth == 0 => return,
                TokenKind::Punct('}') => depth -= 1,
                TokenKind::Punct(';') if depth == 0 => return,
                TokenKind::Punct(',') if depth == 0 => {
                    // `new Dictionary<int, string>()` also has a top-level comma.
                    let starts_declarator = self.is_ident(1)
                        && (self.is_punct(2, '=') || self.is_punct(2, ',') || self.is_punct(2, ';'));
                    if starts_declarator {
                        return;
                    }
                }
                _ => {}
            }
            self.bump();
        }
    }
}

fn needs_space(prev: &Token, next: &Token) -> bool {
    let word = |t: &Token| matches!(t.kind, TokenKind::Ident | TokenKind::Number | TokenKind::Str | TokenKind::Char);
    (word(prev) && word(next))
        || prev.is_punct(',')
        || (prev.is_punct('=') && !next.is_punct('='))
        || (next.is_punct('=') && !prev.is_punct('='))
}

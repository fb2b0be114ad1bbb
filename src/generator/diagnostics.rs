use std::fmt;

use serde::Serialize;

use crate::csharp::syntax::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Stable diagnostic ids reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticId {
    NoCallbackImplementation,
    UnsupportedCallbackType,
    MissingTypeMarker,
    AmbiguousCallbackName,
    TooManyCallbacks,
    ReservedMemberName,
}

impl DiagnosticId {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticId::NoCallbackImplementation => "HSV0001",
            DiagnosticId::UnsupportedCallbackType => "HSV0002",
            DiagnosticId::MissingTypeMarker => "HSV0003",
            DiagnosticId::AmbiguousCallbackName => "HSV0004",
            DiagnosticId::TooManyCallbacks => "HSV0005",
            DiagnosticId::ReservedMemberName => "HSV0006",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DiagnosticId::NoCallbackImplementation => "No callback implementation",
            DiagnosticId::UnsupportedCallbackType => "Unsupported callback type",
            DiagnosticId::MissingTypeMarker => "Missing type marker",
            DiagnosticId::AmbiguousCallbackName => "Ambiguous callback name",
            DiagnosticId::TooManyCallbacks => "Too many callbacks",
            DiagnosticId::ReservedMemberName => "Reserved member name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn error(id: DiagnosticId, location: &Location, message: impl Into<String>) -> Self {
        Diagnostic {
            id,
            severity: Severity::Error,
            message: message.into(),
            location: location.clone(),
        }
    }

    /// The same diagnostic reported as a warning.
    pub fn into_warning(self) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..self
        }
    }

    pub fn no_callback_implementation(location: &Location, member: &str, callback: &str) -> Self {
        Self::error(
            DiagnosticId::NoCallbackImplementation,
            location,
            format!("'{member}' has a callback attribute but no implementation of 'partial void {callback}(...)' was found"),
        )
    }

    pub fn unsupported_callback_type(location: &Location, member: &str, type_name: &str, attribute: &str) -> Self {
        Self::error(
            DiagnosticId::UnsupportedCallbackType,
            location,
            format!("'{member}' of type '{type_name}' is not supported by [{attribute}]"),
        )
    }

    pub fn ambiguous_callback_name(location: &Location, member: &str) -> Self {
        Self::error(
            DiagnosticId::AmbiguousCallbackName,
            location,
            format!("'{member}' sets CallbackName while requesting both Changing and Changed callbacks"),
        )
    }

    pub fn too_many_callbacks(location: &Location, type_name: &str, count: usize) -> Self {
        Self::error(
            DiagnosticId::TooManyCallbacks,
            location,
            format!("'{type_name}' declares {count} callbacks; at most 64 are supported"),
        )
    }

    pub fn reserved_member_name(location: &Location, member: &str) -> Self {
        Self::error(
            DiagnosticId::ReservedMemberName,
            location,
            format!("'{member}' collides with a generated name and gets no callback"),
        )
    }

    pub fn missing_type_marker(location: &Location, member: &str, type_name: &str, marker: &str) -> Self {
        Self::error(
            DiagnosticId::MissingTypeMarker,
            location,
            format!("'{member}' has a callback attribute but '{type_name}' is not marked with [{marker}]"),
        )
    }

    /// Ordering used for reported diagnostics: file, line, column, id.
    pub fn sort_key(&self) -> (&str, u32, u32, DiagnosticId) {
        (
            &self.location.file_path,
            self.location.line,
            self.location.column,
            self.id,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}): {} {}: {}",
            self.location.file_path,
            self.location.line,
            self.location.column,
            self.severity.as_str(),
            self.id.code(),
            self.message
        )
    }
}

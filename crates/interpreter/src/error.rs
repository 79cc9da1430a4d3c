//! Error types for compilation, materialization and page loading.

use crate::control::NodeId;
use crate::security::SecurityViolation;
use thiserror::Error;
use xpages_traits::{ComponentError, ExpressionError, LoaderError};

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

impl From<(usize, usize)> for Location {
    fn from((line, col): (usize, usize)) -> Self {
        Location { line, col }
    }
}

/// The broad class an [`InterpreterError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    TypeCoercion,
    Security,
    Reflection,
    BindingResolution,
    ResourceUnreachable,
    Parse,
}

#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("Unknown tag '{tag}' in namespace '{namespace}'")]
    UnknownTag { namespace: String, tag: String },

    #[error("Unknown property '{property}' on tag '{tag}'")]
    UnknownProperty { tag: String, property: String },

    #[error("Unsupported property '{property}' on tag '{tag}': {message}")]
    UnsupportedProperty {
        tag: String,
        property: String,
        message: String,
    },

    #[error("Duplicate facet '{name}' on tag '{tag}'")]
    DuplicateFacet { tag: String, name: String },

    #[error("Node {} does not belong to this tree", .0.index())]
    ForeignNode(NodeId),

    #[error("Cannot convert '{literal}' to {expected} for property '{property}'")]
    TypeCoercion {
        property: String,
        literal: String,
        expected: String,
    },

    #[error(transparent)]
    Security(#[from] SecurityViolation),

    #[error("Failed to apply property '{property}' on {target}: {source}")]
    Reflection {
        property: String,
        target: String,
        #[source]
        source: ComponentError,
    },

    #[error("Cannot resolve binding '{expression}' for property '{property}': {message}")]
    BindingResolution {
        property: String,
        expression: String,
        message: String,
    },

    #[error("Resource not reachable: {uri}{}", .reason.as_ref().map(|r| format!(" ({})", r)).unwrap_or_default())]
    ResourceUnreachable {
        uri: String,
        #[source]
        reason: Option<LoaderError>,
    },

    #[error("Markup parse error: {message}{}", .location.as_ref().map(|l| format!(" at {}", l)).unwrap_or_default())]
    Parse {
        message: String,
        location: Option<Location>,
    },
}

impl InterpreterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InterpreterError::UnknownTag { .. }
            | InterpreterError::UnknownProperty { .. }
            | InterpreterError::UnsupportedProperty { .. }
            | InterpreterError::DuplicateFacet { .. }
            | InterpreterError::ForeignNode(_) => ErrorKind::Configuration,
            InterpreterError::TypeCoercion { .. } => ErrorKind::TypeCoercion,
            InterpreterError::Security(_) => ErrorKind::Security,
            InterpreterError::Reflection { .. } => ErrorKind::Reflection,
            InterpreterError::BindingResolution { .. } => ErrorKind::BindingResolution,
            InterpreterError::ResourceUnreachable { .. } => ErrorKind::ResourceUnreachable,
            InterpreterError::Parse { .. } => ErrorKind::Parse,
        }
    }

    pub(crate) fn coercion(
        property: &str,
        literal: impl Into<String>,
        expected: impl std::fmt::Display,
    ) -> Self {
        InterpreterError::TypeCoercion {
            property: property.to_string(),
            literal: literal.into(),
            expected: expected.to_string(),
        }
    }

    pub(crate) fn binding(property: &str, expression: &str, err: ExpressionError) -> Self {
        InterpreterError::BindingResolution {
            property: property.to_string(),
            expression: expression.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn reflection(property: &str, target: &str, source: ComponentError) -> Self {
        InterpreterError::Reflection {
            property: property.to_string(),
            target: target.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurityCheck;
    use xpages_traits::ValueType;

    #[test]
    fn test_error_kinds() {
        let err = InterpreterError::UnknownProperty {
            tag: "text".to_string(),
            property: "colour".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("colour"));
        assert!(err.to_string().contains("text"));

        let err = InterpreterError::coercion("escape", "yes", ValueType::Boolean);
        assert_eq!(err.kind(), ErrorKind::TypeCoercion);
        assert_eq!(err.to_string(), "Cannot convert 'yes' to boolean for property 'escape'");

        let err: InterpreterError =
            SecurityViolation::new(SecurityCheck::SetProperty, "text", "value").into();
        assert_eq!(err.kind(), ErrorKind::Security);
    }

    #[test]
    fn test_resource_unreachable_display() {
        let err = InterpreterError::ResourceUnreachable {
            uri: "/home.xsp".to_string(),
            reason: None,
        };
        assert_eq!(err.to_string(), "Resource not reachable: /home.xsp");

        let err = InterpreterError::ResourceUnreachable {
            uri: "/home.xsp".to_string(),
            reason: Some(LoaderError::NotFound("/home.xsp".to_string())),
        };
        assert!(err.to_string().contains("Page not found"));
        assert_eq!(err.kind(), ErrorKind::ResourceUnreachable);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Page not found: /home.xsp");
    }

    #[test]
    fn test_parse_error_location() {
        let err = InterpreterError::Parse {
            message: "unexpected end".to_string(),
            location: Some((3, 7).into()),
        };
        assert_eq!(err.to_string(), "Markup parse error: unexpected end at line 3, column 7");
    }
}

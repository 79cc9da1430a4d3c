//! Dynamic values written into components.

use crate::component::Component;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The declared scalar type of a simple property.
///
/// Definitions declare types with Java-ish names (`int`, `java.lang.String`, ...);
/// [`ValueType::from_declared`] maps those onto the five supported kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Object,
    String,
    Int,
    Double,
    Boolean,
}

impl ValueType {
    /// Maps a declared type name onto a supported value type.
    ///
    /// Returns `None` for anything that has no generic setter.
    pub fn from_declared(name: &str) -> Option<ValueType> {
        match name {
            "Object" | "java.lang.Object" => Some(ValueType::Object),
            "String" | "java.lang.String" => Some(ValueType::String),
            "int" | "java.lang.Integer" => Some(ValueType::Int),
            "double" | "java.lang.Double" => Some(ValueType::Double),
            "boolean" | "java.lang.Boolean" => Some(ValueType::Boolean),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Object => "Object",
            ValueType::String => "String",
            ValueType::Int => "int",
            ValueType::Double => "double",
            ValueType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A shared, fully built component used as a property value.
#[derive(Clone)]
pub struct ObjectHandle(Arc<dyn Component>);

impl ObjectHandle {
    pub fn new(component: Box<dyn Component>) -> Self {
        Self(Arc::from(component))
    }

    pub fn component(&self) -> &dyn Component {
        self.0.as_ref()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectHandle")
            .field(&self.0.type_name())
            .finish()
    }
}

/// A value produced by literal coercion or expression evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<Value>),
    Object(ObjectHandle),
}

impl Value {
    /// A short name for the variant, used in diagnostics.
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "String",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(handle) => write!(f, "<{}>", handle.component().type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::PropertyBag;

    #[test]
    fn test_declared_type_names() {
        assert_eq!(ValueType::from_declared("int"), Some(ValueType::Int));
        assert_eq!(ValueType::from_declared("java.lang.String"), Some(ValueType::String));
        assert_eq!(ValueType::from_declared("boolean"), Some(ValueType::Boolean));
        assert_eq!(ValueType::from_declared("double"), Some(ValueType::Double));
        assert_eq!(ValueType::from_declared("java.lang.Object"), Some(ValueType::Object));
        assert_eq!(ValueType::from_declared("java.util.Date"), None);
    }

    #[test]
    fn test_value_display() {
        let list = Value::List(vec![Value::Int(1), Value::from("a"), Value::Bool(true)]);
        assert_eq!(list.to_string(), "[1, a, true]");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_object_handle_identity() {
        let a = ObjectHandle::new(Box::new(PropertyBag::new("Converter")));
        let b = ObjectHandle::new(Box::new(PropertyBag::new("Converter")));
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a.clone()), Value::Object(b));
        assert!(a.downcast_ref::<PropertyBag>().is_some());
        assert_eq!(Value::Object(a).to_string(), "<Converter>");
    }
}

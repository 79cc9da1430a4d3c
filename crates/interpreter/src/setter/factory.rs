//! Setter factories: one per `(definition, property)`, chosen by declared kind.

use super::{CollectionItem, MethodSource, PropertySetter};
use crate::error::InterpreterError;
use crate::object::XPagesObject;
use std::sync::Arc;
use xpages_traits::{Definition, PropertyKind, Value, ValueType};

pub(crate) const ID: &str = "id";
pub(crate) const RENDERED: &str = "rendered";

/// How a factory turns values into setters.
#[derive(Debug, Clone, PartialEq)]
pub enum FactoryKind {
    /// Fast path for `id`.
    Id,
    /// Fast path for `rendered`.
    Rendered,
    /// A nested object built from its own definition.
    Complex,
    /// Repeated `add_method` calls. `item_type` is `None` when items must be objects.
    Collection {
        add_method: String,
        item_type: Option<ValueType>,
    },
    MethodBinding,
    /// Scalar written through the declared type.
    Generic(ValueType),
}

/// Compiles values for one property of one definition into setters.
#[derive(Debug, Clone, PartialEq)]
pub struct SetterFactory {
    property: String,
    declared_type: String,
    allow_runtime_binding: bool,
    kind: FactoryKind,
}

impl SetterFactory {
    /// Selects the factory for `name` on `definition`.
    pub fn for_property(definition: &Definition, name: &str) -> Result<Self, InterpreterError> {
        let declared = definition.property(name);
        match name {
            ID => {
                return Ok(Self {
                    property: ID.to_string(),
                    declared_type: "java.lang.String".to_string(),
                    allow_runtime_binding: false,
                    kind: FactoryKind::Id,
                });
            }
            RENDERED => {
                return Ok(Self {
                    property: RENDERED.to_string(),
                    declared_type: "boolean".to_string(),
                    allow_runtime_binding: declared.is_none_or(|p| p.allow_run_time_binding),
                    kind: FactoryKind::Rendered,
                });
            }
            _ => {}
        }

        let property = declared.ok_or_else(|| InterpreterError::UnknownProperty {
            tag: definition.tag_name().to_string(),
            property: name.to_string(),
        })?;

        let kind = match &property.kind {
            PropertyKind::Complex => FactoryKind::Complex,
            PropertyKind::Collection {
                add_method,
                item_type,
            } => FactoryKind::Collection {
                add_method: add_method.clone(),
                item_type: ValueType::from_declared(item_type),
            },
            PropertyKind::MethodBinding => FactoryKind::MethodBinding,
            PropertyKind::Simple => match ValueType::from_declared(&property.java_type) {
                Some(value_type) => FactoryKind::Generic(value_type),
                None => {
                    return Err(InterpreterError::UnsupportedProperty {
                        tag: definition.tag_name().to_string(),
                        property: name.to_string(),
                        message: format!("no setter for declared type '{}'", property.java_type),
                    });
                }
            },
        };

        log::trace!(
            "Compiled setter factory {:?} for '{}.{}'",
            kind,
            definition.tag_name(),
            name
        );

        Ok(Self {
            property: name.to_string(),
            declared_type: property.java_type.clone(),
            allow_runtime_binding: property.allow_run_time_binding,
            kind,
        })
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn kind(&self) -> &FactoryKind {
        &self.kind
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn allows_runtime_binding(&self) -> bool {
        self.allow_runtime_binding
    }

    /// The type a value binding for this property should produce.
    pub fn binding_type(&self) -> ValueType {
        match &self.kind {
            FactoryKind::Generic(value_type) => *value_type,
            FactoryKind::Rendered => ValueType::Boolean,
            FactoryKind::Id => ValueType::String,
            _ => ValueType::Object,
        }
    }

    /// Parses a plain literal.
    pub fn from_literal(&self, text: &str) -> Result<PropertySetter, InterpreterError> {
        let name = &self.property;
        match &self.kind {
            FactoryKind::Id => Ok(PropertySetter::Id(text.to_string())),
            FactoryKind::Rendered => Ok(PropertySetter::Rendered(parse_bool(name, text)?)),
            FactoryKind::Generic(value_type) => Ok(PropertySetter::Generic {
                name: name.clone(),
                value: coerce_text(name, text, *value_type)?,
                value_type: *value_type,
            }),
            FactoryKind::Complex => Err(InterpreterError::coercion(name, text, "a nested object")),
            FactoryKind::Collection {
                add_method,
                item_type: Some(item_type),
            } => Ok(PropertySetter::Collection {
                name: name.clone(),
                add_method: add_method.clone(),
                items: vec![CollectionItem::Value(coerce_text(name, text, *item_type)?)],
            }),
            FactoryKind::Collection { .. } => {
                Err(InterpreterError::coercion(name, text, "a list of nested objects"))
            }
            FactoryKind::MethodBinding => Ok(PropertySetter::MethodBinding {
                name: name.clone(),
                source: MethodSource::Expression(text.to_string()),
            }),
        }
    }

    /// Converts an already typed value, e.g. one resolved from a load-time expression.
    pub fn from_value(&self, value: Value) -> Result<PropertySetter, InterpreterError> {
        let name = &self.property;
        match &self.kind {
            FactoryKind::Id => match value {
                Value::String(s) => Ok(PropertySetter::Id(s)),
                Value::Int(_) | Value::Double(_) | Value::Bool(_) => {
                    Ok(PropertySetter::Id(value.to_string()))
                }
                other => Err(InterpreterError::coercion(name, other.to_string(), ValueType::String)),
            },
            FactoryKind::Rendered => {
                match coerce_value(name, value, ValueType::Boolean)? {
                    Value::Bool(b) => Ok(PropertySetter::Rendered(b)),
                    other => Err(InterpreterError::coercion(name, other.to_string(), ValueType::Boolean)),
                }
            }
            FactoryKind::Generic(value_type) => Ok(PropertySetter::Generic {
                name: name.clone(),
                value: coerce_value(name, value, *value_type)?,
                value_type: *value_type,
            }),
            FactoryKind::Complex => match value {
                Value::Object(_) => Ok(PropertySetter::Generic {
                    name: name.clone(),
                    value,
                    value_type: ValueType::Object,
                }),
                other => Err(InterpreterError::coercion(name, other.to_string(), "a nested object")),
            },
            FactoryKind::Collection {
                add_method,
                item_type,
            } => {
                let values = match value {
                    Value::List(items) => items,
                    single => vec![single],
                };
                let items = values
                    .into_iter()
                    .map(|item| match (item, item_type) {
                        (Value::Object(handle), _) => Ok(CollectionItem::Value(Value::Object(handle))),
                        (item, Some(item_type)) => {
                            coerce_value(name, item, *item_type).map(CollectionItem::Value)
                        }
                        (item, None) => Err(InterpreterError::coercion(
                            name,
                            item.to_string(),
                            "a nested object",
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PropertySetter::Collection {
                    name: name.clone(),
                    add_method: add_method.clone(),
                    items,
                })
            }
            FactoryKind::MethodBinding => match value {
                Value::String(expression) => Ok(PropertySetter::MethodBinding {
                    name: name.clone(),
                    source: MethodSource::Expression(expression),
                }),
                Value::Object(handle) => match handle.component().method_binding() {
                    Some(binding) => Ok(PropertySetter::MethodBinding {
                        name: name.clone(),
                        source: MethodSource::Callable(binding),
                    }),
                    None => Err(InterpreterError::coercion(
                        name,
                        handle.component().type_name(),
                        "a callable",
                    )),
                },
                other => Err(InterpreterError::coercion(name, other.to_string(), "a callable")),
            },
        }
    }

    /// Wraps nested object templates declared in a property element.
    pub fn from_objects(
        &self,
        mut objects: Vec<XPagesObject>,
    ) -> Result<PropertySetter, InterpreterError> {
        let name = &self.property;
        let single = |objects: &mut Vec<XPagesObject>| match objects.len() {
            1 => objects.pop().map(Arc::new).ok_or_else(|| {
                InterpreterError::coercion(name, "0 objects", "exactly one nested object")
            }),
            n => Err(InterpreterError::coercion(
                name,
                format!("{} objects", n),
                "exactly one nested object",
            )),
        };
        match &self.kind {
            FactoryKind::Complex | FactoryKind::Generic(ValueType::Object) => {
                Ok(PropertySetter::Complex {
                    name: name.clone(),
                    template: single(&mut objects)?,
                })
            }
            FactoryKind::Collection { add_method, .. } => Ok(PropertySetter::Collection {
                name: name.clone(),
                add_method: add_method.clone(),
                items: objects
                    .into_iter()
                    .map(|o| CollectionItem::Object(Arc::new(o)))
                    .collect(),
            }),
            FactoryKind::MethodBinding => Ok(PropertySetter::MethodBinding {
                name: name.clone(),
                source: MethodSource::Complex(single(&mut objects)?),
            }),
            FactoryKind::Id | FactoryKind::Rendered | FactoryKind::Generic(_) => Err(
                InterpreterError::coercion(name, "nested object", self.binding_type()),
            ),
        }
    }
}

/// Accepts exactly `true` or `false`.
pub(crate) fn parse_bool(property: &str, text: &str) -> Result<bool, InterpreterError> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(InterpreterError::coercion(property, text, ValueType::Boolean)),
    }
}

pub(crate) fn coerce_text(
    property: &str,
    text: &str,
    value_type: ValueType,
) -> Result<Value, InterpreterError> {
    match value_type {
        ValueType::Object | ValueType::String => Ok(Value::String(text.to_string())),
        ValueType::Int => text
            .parse::<i32>()
            .map(|i| Value::Int(i64::from(i)))
            .map_err(|_| InterpreterError::coercion(property, text, value_type)),
        ValueType::Double => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| InterpreterError::coercion(property, text, value_type)),
        ValueType::Boolean => parse_bool(property, text).map(Value::Bool),
    }
}

pub(crate) fn coerce_value(
    property: &str,
    value: Value,
    value_type: ValueType,
) -> Result<Value, InterpreterError> {
    match (value_type, value) {
        (ValueType::Object, value) => Ok(value),
        (_, Value::String(text)) => coerce_text(property, &text, value_type),
        (ValueType::String, Value::Null) => Ok(Value::Null),
        (ValueType::String, value @ (Value::Bool(_) | Value::Int(_) | Value::Double(_))) => {
            Ok(Value::String(value.to_string()))
        }
        (ValueType::Int, Value::Int(i)) if i32::try_from(i).is_ok() => Ok(Value::Int(i)),
        (ValueType::Double, Value::Double(d)) => Ok(Value::Double(d)),
        (ValueType::Double, Value::Int(i)) => Ok(Value::Double(i as f64)),
        (ValueType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
        (value_type, other) => Err(InterpreterError::coercion(
            property,
            other.to_string(),
            value_type,
        )),
    }
}

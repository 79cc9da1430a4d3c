//! Compiled property setters.
//!
//! A [`PropertySetter`] is an immutable mutation strategy for one property,
//! carrying whatever literal, expression or nested template was supplied. The
//! variants are closed; [`PropertySetter::apply`] dispatches with a `match`
//! and consults the [`SecurityManager`](crate::security::SecurityManager)
//! before every write.

mod cache;
mod factory;

pub use cache::SetterCache;
pub use factory::{FactoryKind, SetterFactory};

pub(crate) use factory::{RENDERED, ID, parse_bool};

use crate::context::Context;
use crate::error::InterpreterError;
use crate::object::XPagesObject;
use crate::security::CheckTarget;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use xpages_traits::{BindingOwner, Component, MethodBinding, ObjectHandle, Value, ValueType};

/// Name of the pseudo-property controlling whether a node is built at all.
pub const LOADED: &str = "loaded";

/// Input to [`XPagesObject::create_setter`].
#[derive(Debug)]
pub enum RawValue {
    /// Attribute text; classified for expressions before coercion.
    Text(String),
    /// An already typed value; never classified.
    Value(Value),
    /// Nested object templates from a property element.
    Objects(Vec<XPagesObject>),
}

/// One element added by a collection setter.
#[derive(Debug, Clone)]
pub enum CollectionItem {
    Value(Value),
    Object(Arc<XPagesObject>),
}

/// Where a method-binding setter gets its callable from.
#[derive(Debug, Clone)]
pub enum MethodSource {
    /// Compiled by the evaluator when applied.
    Expression(String),
    /// A nested object whose component yields the callable.
    Complex(Arc<XPagesObject>),
    /// A callable that already exists.
    Callable(Arc<dyn MethodBinding>),
}

/// The `loaded` pseudo-setter's payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedFlag {
    Literal(bool),
    /// A load-time expression, evaluated on every check.
    Expression(String),
}

#[derive(Debug, Clone)]
pub enum PropertySetter {
    /// A scalar coerced to its declared type.
    Generic {
        name: String,
        value: Value,
        value_type: ValueType,
    },
    Id(String),
    Rendered(bool),
    /// A nested object built fresh on every apply.
    Complex {
        name: String,
        template: Arc<XPagesObject>,
    },
    Collection {
        name: String,
        add_method: String,
        items: Vec<CollectionItem>,
    },
    MethodBinding {
        name: String,
        source: MethodSource,
    },
    /// Resolve once, then apply the concrete setter compiled from the result.
    LoadTime {
        name: String,
        expression: String,
        factory: Arc<SetterFactory>,
    },
    /// Install a live binding.
    RunTime {
        name: String,
        expression: String,
        value_type: ValueType,
    },
    /// Inspected by the owning object, never applied.
    Loaded(LoadedFlag),
}

impl PropertySetter {
    pub fn name(&self) -> &str {
        match self {
            PropertySetter::Generic { name, .. }
            | PropertySetter::Complex { name, .. }
            | PropertySetter::Collection { name, .. }
            | PropertySetter::MethodBinding { name, .. }
            | PropertySetter::LoadTime { name, .. }
            | PropertySetter::RunTime { name, .. } => name,
            PropertySetter::Id(_) => ID,
            PropertySetter::Rendered(_) => RENDERED,
            PropertySetter::Loaded(_) => LOADED,
        }
    }

    /// Applies this setter to `target`, which is being built for `owner`.
    pub fn apply(
        &self,
        owner: &XPagesObject,
        target: &mut dyn Component,
        ctx: &Context,
    ) -> Result<(), InterpreterError> {
        let tag = owner.definition().tag_name();
        match self {
            PropertySetter::Generic { name, value, .. } => {
                write_value(tag, target, ctx, name, value.clone())
            }
            PropertySetter::Id(id) => {
                check_set(tag, target, ctx, ID, &Value::String(id.clone()))?;
                target
                    .set_id(id)
                    .map_err(|e| InterpreterError::reflection(ID, target.type_name(), e))
            }
            PropertySetter::Rendered(rendered) => {
                check_set(tag, target, ctx, RENDERED, &Value::Bool(*rendered))?;
                target
                    .set_rendered(*rendered)
                    .map_err(|e| InterpreterError::reflection(RENDERED, target.type_name(), e))
            }
            PropertySetter::Complex { name, template } => {
                let object = template.new_object(ctx)?;
                write_value(tag, target, ctx, name, Value::Object(ObjectHandle::new(object)))
            }
            PropertySetter::Collection {
                name,
                add_method,
                items,
            } => {
                for item in items {
                    let value = match item {
                        CollectionItem::Value(value) => value.clone(),
                        CollectionItem::Object(template) => {
                            Value::Object(ObjectHandle::new(template.new_object(ctx)?))
                        }
                    };
                    check_set(tag, target, ctx, name, &value)?;
                    target.add_item(add_method, value).map_err(|e| {
                        InterpreterError::reflection(name, target.type_name(), e)
                    })?;
                }
                Ok(())
            }
            PropertySetter::MethodBinding { name, source } => {
                let binding = resolve_callable(name, source, ctx)?;
                let owner_info = BindingOwner {
                    tag: tag.to_string(),
                    id: owner.id().map(str::to_string),
                };
                let wired = binding
                    .with_owner(&owner_info)
                    .map_err(|e| InterpreterError::binding(name, binding.expression(), e))?;
                let binding = wired.unwrap_or(binding);
                let wired = binding
                    .with_component(&*target)
                    .map_err(|e| InterpreterError::binding(name, binding.expression(), e))?;
                let binding = wired.unwrap_or(binding);
                ctx.security()
                    .check_method_binding(&check_target(tag, target), name, binding.as_ref())?;
                target
                    .set_method_binding(name, binding)
                    .map_err(|e| InterpreterError::reflection(name, target.type_name(), e))
            }
            PropertySetter::LoadTime {
                name,
                expression,
                factory,
            } => {
                ctx.security()
                    .check_loadtime_binding(&check_target(tag, target), name, expression)?;
                let resolved = ctx
                    .evaluator()
                    .evaluate(expression, ctx.scope())
                    .map_err(|e| InterpreterError::binding(name, expression, e))?;
                log::trace!("Load-time '{}' for '{}' resolved to {}", expression, name, resolved);
                let concrete = factory.from_value(resolved).map_err(|e| {
                    InterpreterError::BindingResolution {
                        property: name.clone(),
                        expression: expression.clone(),
                        message: e.to_string(),
                    }
                })?;
                concrete.apply(owner, target, ctx)
            }
            PropertySetter::RunTime {
                name,
                expression,
                value_type,
            } => {
                let binding = ctx
                    .evaluator()
                    .create_value_binding(expression, *value_type)
                    .map_err(|e| InterpreterError::binding(name, expression, e))?;
                ctx.security()
                    .check_runtime_binding(&check_target(tag, target), name, binding.as_ref())?;
                target
                    .set_value_binding(name, binding)
                    .map_err(|e| InterpreterError::reflection(name, target.type_name(), e))
            }
            PropertySetter::Loaded(_) => {
                log::warn!("Ignoring 'loaded' pseudo-setter on '{}'", tag);
                Ok(())
            }
        }
    }

    /// A serializable description used by tree snapshots.
    pub fn snapshot(&self) -> SetterSnapshot {
        let (kind, value) = match self {
            PropertySetter::Generic {
                value, value_type, ..
            } => (format!("generic:{}", value_type), value.to_string()),
            PropertySetter::Id(id) => ("id".to_string(), id.clone()),
            PropertySetter::Rendered(r) => ("rendered".to_string(), r.to_string()),
            PropertySetter::Complex { template, .. } => {
                ("complex".to_string(), template.definition().tag_name().to_string())
            }
            PropertySetter::Collection {
                add_method, items, ..
            } => {
                let labels: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        CollectionItem::Value(v) => v.to_string(),
                        CollectionItem::Object(o) => o.definition().tag_name().to_string(),
                    })
                    .collect();
                (format!("collection:{}", add_method), labels.join(", "))
            }
            PropertySetter::MethodBinding { source, .. } => {
                let value = match source {
                    MethodSource::Expression(e) => e.clone(),
                    MethodSource::Complex(o) => o.definition().tag_name().to_string(),
                    MethodSource::Callable(b) => b.expression().to_string(),
                };
                ("method-binding".to_string(), value)
            }
            PropertySetter::LoadTime { expression, .. } => ("load-time".to_string(), expression.clone()),
            PropertySetter::RunTime { expression, .. } => ("run-time".to_string(), expression.clone()),
            PropertySetter::Loaded(LoadedFlag::Literal(b)) => ("loaded".to_string(), b.to_string()),
            PropertySetter::Loaded(LoadedFlag::Expression(e)) => ("loaded".to_string(), e.clone()),
        };
        SetterSnapshot {
            name: self.name().to_string(),
            kind,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetterSnapshot {
    pub name: String,
    pub kind: String,
    pub value: String,
}

fn check_target<'a>(tag: &'a str, target: &'a dyn Component) -> CheckTarget<'a> {
    CheckTarget {
        tag,
        component: Some(target),
    }
}

fn check_set(
    tag: &str,
    target: &dyn Component,
    ctx: &Context,
    name: &str,
    value: &Value,
) -> Result<(), InterpreterError> {
    ctx.security()
        .check_set_property(&check_target(tag, target), name, value)
        .map_err(|violation| {
            log::debug!("Vetoed write of '{}' on '{}'", name, tag);
            violation.into()
        })
}

fn write_value(
    tag: &str,
    target: &mut dyn Component,
    ctx: &Context,
    name: &str,
    value: Value,
) -> Result<(), InterpreterError> {
    check_set(tag, target, ctx, name, &value)?;
    target
        .set_property(name, value)
        .map_err(|e| InterpreterError::reflection(name, target.type_name(), e))
}

fn resolve_callable(
    name: &str,
    source: &MethodSource,
    ctx: &Context,
) -> Result<Arc<dyn MethodBinding>, InterpreterError> {
    match source {
        MethodSource::Expression(expression) => ctx
            .evaluator()
            .create_method_binding(expression)
            .map_err(|e| InterpreterError::binding(name, expression, e)),
        MethodSource::Complex(template) => {
            let object = template.new_object(ctx)?;
            object
                .method_binding()
                .ok_or_else(|| InterpreterError::BindingResolution {
                    property: name.to_string(),
                    expression: template.definition().tag_name().to_string(),
                    message: format!("{} does not yield a callable", object.type_name()),
                })
        }
        MethodSource::Callable(binding) => Ok(Arc::clone(binding)),
    }
}

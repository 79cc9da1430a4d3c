//! The per-node template: a definition plus its compiled setters.
//!
//! An `XPagesObject` never changes once parsing is done. Each call to
//! [`XPagesObject::new_object`] builds a brand-new component from it, so one
//! template can be materialized any number of times, from any number of threads.

use crate::context::Context;
use crate::error::InterpreterError;
use crate::expression::ExpressionKind;
use crate::security::CheckTarget;
use crate::setter::{
    FactoryKind, LOADED, LoadedFlag, PropertySetter, RawValue, SetterCache, parse_bool,
};
use std::sync::Arc;
use xpages_traits::{Component, Definition, Value};

#[derive(Debug, Clone)]
pub struct XPagesObject {
    definition: Arc<Definition>,
    setters: Vec<PropertySetter>,
    loaded: Option<LoadedFlag>,
    factories: Arc<SetterCache>,
}

impl XPagesObject {
    pub fn new(definition: Arc<Definition>, factories: Arc<SetterCache>) -> Self {
        Self {
            definition,
            setters: Vec::new(),
            loaded: None,
            factories,
        }
    }

    pub fn definition(&self) -> &Arc<Definition> {
        &self.definition
    }

    /// Compiled setters, in the order they were attached.
    pub fn setters(&self) -> &[PropertySetter] {
        &self.setters
    }

    pub fn loaded_flag(&self) -> Option<&LoadedFlag> {
        self.loaded.as_ref()
    }

    /// The literal id, taken from the id fast-path setter.
    pub fn id(&self) -> Option<&str> {
        self.setters.iter().find_map(|s| match s {
            PropertySetter::Id(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Compiles attribute text into a setter without attaching it.
    pub fn create_setter_from_string(
        &self,
        name: &str,
        text: &str,
    ) -> Result<PropertySetter, InterpreterError> {
        if name == LOADED {
            return self.compile_loaded(text);
        }
        let factory = self.factories.factory_for(&self.definition, name)?;
        let kind = ExpressionKind::classify(text);
        match kind {
            ExpressionKind::LoadTime => Ok(PropertySetter::LoadTime {
                name: name.to_string(),
                expression: text.trim().to_string(),
                factory,
            }),
            ExpressionKind::RunTime if factory.kind() != &FactoryKind::MethodBinding => {
                if !factory.allows_runtime_binding() {
                    return Err(InterpreterError::BindingResolution {
                        property: name.to_string(),
                        expression: text.to_string(),
                        message: format!(
                            "'{}' on '{}' does not accept runtime bindings",
                            name,
                            self.definition.tag_name()
                        ),
                    });
                }
                Ok(PropertySetter::RunTime {
                    name: name.to_string(),
                    expression: text.to_string(),
                    value_type: factory.binding_type(),
                })
            }
            _ => factory.from_literal(text),
        }
    }

    /// Compiles any raw value into a setter without attaching it.
    pub fn create_setter(
        &self,
        name: &str,
        value: RawValue,
    ) -> Result<PropertySetter, InterpreterError> {
        match value {
            RawValue::Text(text) => self.create_setter_from_string(name, &text),
            RawValue::Value(value) if name == LOADED => match value {
                Value::Bool(b) => Ok(PropertySetter::Loaded(LoadedFlag::Literal(b))),
                Value::String(text) => self.compile_loaded(&text),
                other => Err(InterpreterError::coercion(LOADED, other.to_string(), "boolean")),
            },
            RawValue::Value(value) => self
                .factories
                .factory_for(&self.definition, name)?
                .from_value(value),
            RawValue::Objects(_) if name == LOADED => Err(InterpreterError::coercion(
                LOADED,
                "nested object",
                "boolean",
            )),
            RawValue::Objects(objects) => self
                .factories
                .factory_for(&self.definition, name)?
                .from_objects(objects),
        }
    }

    /// Compiles and attaches in one step.
    pub fn add_property_from_string(&mut self, name: &str, text: &str) -> Result<(), InterpreterError> {
        let setter = self.create_setter_from_string(name, text)?;
        self.add_setter(setter);
        Ok(())
    }

    pub fn add_property(&mut self, name: &str, value: RawValue) -> Result<(), InterpreterError> {
        let setter = self.create_setter(name, value)?;
        self.add_setter(setter);
        Ok(())
    }

    /// Attaches a compiled setter.
    ///
    /// The `loaded` pseudo-setter is kept apart from the ordinary list; any other
    /// setter replaces an earlier one for the same property in place.
    pub fn add_setter(&mut self, setter: PropertySetter) {
        if let PropertySetter::Loaded(flag) = setter {
            self.loaded = Some(flag);
            return;
        }
        match self.setters.iter().position(|s| s.name() == setter.name()) {
            Some(index) => {
                log::debug!(
                    "Replacing setter for '{}' on '{}'",
                    setter.name(),
                    self.definition.tag_name()
                );
                self.setters[index] = setter;
            }
            None => self.setters.push(setter),
        }
    }

    /// Whether this node should be built at all.
    ///
    /// Without a `loaded` setter the answer is `true`. A load-time expression is
    /// evaluated on every call and must produce a boolean.
    pub fn is_loaded(&self, ctx: &Context) -> Result<bool, InterpreterError> {
        match &self.loaded {
            None => Ok(true),
            Some(LoadedFlag::Literal(loaded)) => Ok(*loaded),
            Some(LoadedFlag::Expression(expression)) => {
                let target = CheckTarget {
                    tag: self.definition.tag_name(),
                    component: None,
                };
                ctx.security()
                    .check_loadtime_binding(&target, LOADED, expression)?;
                let value = ctx
                    .evaluator()
                    .evaluate(expression, ctx.scope())
                    .map_err(|e| InterpreterError::binding(LOADED, expression, e))?;
                value
                    .as_bool()
                    .ok_or_else(|| InterpreterError::BindingResolution {
                        property: LOADED.to_string(),
                        expression: expression.clone(),
                        message: format!("expected a boolean, got {}", value.type_label()),
                    })
            }
        }
    }

    /// Builds a new component, or `None` when the node is not loaded.
    pub fn get_component(
        &self,
        ctx: &Context,
    ) -> Result<Option<Box<dyn Component>>, InterpreterError> {
        if !self.is_loaded(ctx)? {
            log::trace!("'{}' not loaded", self.definition.tag_name());
            return Ok(None);
        }
        self.new_object(ctx).map(Some)
    }

    /// Instantiates the definition's type and applies every setter.
    ///
    /// A failing setter aborts the build; the half-built component is dropped.
    pub fn new_object(&self, ctx: &Context) -> Result<Box<dyn Component>, InterpreterError> {
        let mut object = self.definition.new_instance();
        self.init_properties(object.as_mut(), ctx)?;

        if let Some(page) = self.definition.include_page()
            && let Some(include) = object.as_include()
        {
            include.set_page_name(page);
            match ctx.page_driver() {
                Some(driver) => include.set_page_driver(Arc::clone(driver)),
                None => log::warn!(
                    "No page driver in context; '{}' will not be able to load '{}'",
                    self.definition.tag_name(),
                    page
                ),
            }
        }
        Ok(object)
    }

    /// Applies every compiled setter to `target`, in attachment order.
    pub fn init_properties(
        &self,
        target: &mut dyn Component,
        ctx: &Context,
    ) -> Result<(), InterpreterError> {
        for setter in &self.setters {
            setter.apply(self, target, ctx)?;
        }
        Ok(())
    }

    fn compile_loaded(&self, text: &str) -> Result<PropertySetter, InterpreterError> {
        match ExpressionKind::classify(text) {
            ExpressionKind::LoadTime => Ok(PropertySetter::Loaded(LoadedFlag::Expression(
                text.trim().to_string(),
            ))),
            ExpressionKind::RunTime => Err(InterpreterError::BindingResolution {
                property: LOADED.to_string(),
                expression: text.to_string(),
                message: "'loaded' only accepts literals or load-time expressions".to_string(),
            }),
            ExpressionKind::Literal => {
                parse_bool(LOADED, text).map(|b| PropertySetter::Loaded(LoadedFlag::Literal(b)))
            }
        }
    }
}

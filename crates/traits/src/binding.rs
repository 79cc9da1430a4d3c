//! Expression evaluation as seen by the interpreter.
//!
//! The expression language itself lives outside this workspace. The interpreter only
//! needs three things from it: evaluate a string once, create a live value binding,
//! and create a callable. All three receive the evaluation [`Scope`] explicitly.

use crate::component::Component;
use crate::value::{Value, ValueType};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Invalid expression '{expression}': {message}")]
    Syntax { expression: String, message: String },

    #[error("Cannot resolve '{expression}'")]
    Unresolvable { expression: String },

    #[error("Expression '{expression}' produced a {found}, expected {expected}")]
    Type {
        expression: String,
        expected: ValueType,
        found: String,
    },
}

/// The variables visible to an evaluation: the request context, made explicit.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }
}

/// Identifies the node a callable is being installed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOwner {
    pub tag: String,
    pub id: Option<String>,
}

/// A live expression the host re-evaluates whenever it needs the value.
pub trait ValueBinding: Send + Sync + Debug {
    fn expression(&self) -> &str;

    fn expected_type(&self) -> ValueType;

    fn get_value(&self, scope: &Scope) -> Result<Value, ExpressionError>;
}

/// A callable installed on a component (actions, listeners, validators).
pub trait MethodBinding: Send + Sync + Debug {
    fn expression(&self) -> &str;

    fn invoke(&self, scope: &Scope, args: &[Value]) -> Result<Value, ExpressionError>;

    /// Callables that need to know which node owns them return a wired copy.
    ///
    /// `Ok(None)` means the callable does not track its owner.
    fn with_owner(
        &self,
        owner: &BindingOwner,
    ) -> Result<Option<Arc<dyn MethodBinding>>, ExpressionError> {
        let _ = owner;
        Ok(None)
    }

    /// Callables that need the component they are installed on return a wired copy.
    fn with_component(
        &self,
        component: &dyn Component,
    ) -> Result<Option<Arc<dyn MethodBinding>>, ExpressionError> {
        let _ = component;
        Ok(None)
    }

    fn owner(&self) -> Option<&BindingOwner> {
        None
    }

    /// Type name of the component this callable was wired to, if any.
    fn component_type(&self) -> Option<&str> {
        None
    }
}

/// The expression language, as an opaque capability.
pub trait ExpressionEvaluator: Send + Sync + Debug {
    /// Evaluates `expression` once against `scope`.
    fn evaluate(&self, expression: &str, scope: &Scope) -> Result<Value, ExpressionError>;

    fn create_value_binding(
        &self,
        expression: &str,
        expected: ValueType,
    ) -> Result<Arc<dyn ValueBinding>, ExpressionError>;

    fn create_method_binding(
        &self,
        expression: &str,
    ) -> Result<Arc<dyn MethodBinding>, ExpressionError>;
}

/// Resolves bare references against the scope.
///
/// `${name}` and `#{name}` look up `name`; quoted strings, numbers and
/// `true`/`false` evaluate to themselves. Anything else is unresolvable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeEvaluator;

impl ScopeEvaluator {
    fn body(expression: &str) -> Result<&str, ExpressionError> {
        let trimmed = expression.trim();
        let inner = trimmed
            .strip_prefix("${")
            .or_else(|| trimmed.strip_prefix("#{"))
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| ExpressionError::Syntax {
                expression: expression.to_string(),
                message: "expected ${...} or #{...}".to_string(),
            })?;
        Ok(inner.trim())
    }

    fn resolve(expression: &str, body: &str, scope: &Scope) -> Result<Value, ExpressionError> {
        if let Some(text) = body
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return Ok(Value::String(text.to_string()));
        }
        match body {
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            "null" => return Ok(Value::Null),
            _ => {}
        }
        if let Ok(i) = body.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        if let Ok(d) = body.parse::<f64>() {
            return Ok(Value::Double(d));
        }
        scope
            .get(body)
            .cloned()
            .ok_or_else(|| ExpressionError::Unresolvable {
                expression: expression.to_string(),
            })
    }
}

impl ExpressionEvaluator for ScopeEvaluator {
    fn evaluate(&self, expression: &str, scope: &Scope) -> Result<Value, ExpressionError> {
        let body = Self::body(expression)?;
        Self::resolve(expression, body, scope)
    }

    fn create_value_binding(
        &self,
        expression: &str,
        expected: ValueType,
    ) -> Result<Arc<dyn ValueBinding>, ExpressionError> {
        Self::body(expression)?;
        Ok(Arc::new(ScopeValueBinding {
            expression: expression.to_string(),
            expected,
        }))
    }

    fn create_method_binding(
        &self,
        expression: &str,
    ) -> Result<Arc<dyn MethodBinding>, ExpressionError> {
        Self::body(expression)?;
        Ok(Arc::new(ScopeMethodBinding {
            expression: expression.to_string(),
            owner: None,
            component_type: None,
        }))
    }
}

#[derive(Debug)]
struct ScopeValueBinding {
    expression: String,
    expected: ValueType,
}

impl ValueBinding for ScopeValueBinding {
    fn expression(&self) -> &str {
        &self.expression
    }

    fn expected_type(&self) -> ValueType {
        self.expected
    }

    fn get_value(&self, scope: &Scope) -> Result<Value, ExpressionError> {
        ScopeEvaluator.evaluate(&self.expression, scope)
    }
}

#[derive(Debug, Clone)]
struct ScopeMethodBinding {
    expression: String,
    owner: Option<BindingOwner>,
    component_type: Option<String>,
}

impl MethodBinding for ScopeMethodBinding {
    fn expression(&self) -> &str {
        &self.expression
    }

    fn invoke(&self, scope: &Scope, _args: &[Value]) -> Result<Value, ExpressionError> {
        ScopeEvaluator.evaluate(&self.expression, scope)
    }

    fn with_owner(
        &self,
        owner: &BindingOwner,
    ) -> Result<Option<Arc<dyn MethodBinding>>, ExpressionError> {
        Ok(Some(Arc::new(ScopeMethodBinding {
            owner: Some(owner.clone()),
            ..self.clone()
        })))
    }

    fn with_component(
        &self,
        component: &dyn Component,
    ) -> Result<Option<Arc<dyn MethodBinding>>, ExpressionError> {
        Ok(Some(Arc::new(ScopeMethodBinding {
            component_type: Some(component.type_name().to_string()),
            ..self.clone()
        })))
    }

    fn owner(&self) -> Option<&BindingOwner> {
        self.owner.as_ref()
    }

    fn component_type(&self) -> Option<&str> {
        self.component_type.as_deref()
    }
}

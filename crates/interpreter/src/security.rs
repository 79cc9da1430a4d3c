//! Capability checks consulted at every mutation and binding point.
//!
//! A check that returns `Err` vetoes the operation: the interpreter returns the
//! violation before touching the target, so a vetoed write never reaches the
//! component's setter.

use std::collections::HashSet;
use std::fmt;
use std::fmt::Debug;
use thiserror::Error;
use xpages_traits::{Component, MethodBinding, PageUri, Value, ValueBinding};

/// Which checkpoint raised a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityCheck {
    CreateControl,
    SetProperty,
    LoadtimeBinding,
    RuntimeBinding,
    MethodBinding,
}

impl fmt::Display for SecurityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityCheck::CreateControl => "create control",
            SecurityCheck::SetProperty => "set property",
            SecurityCheck::LoadtimeBinding => "load-time binding",
            SecurityCheck::RuntimeBinding => "runtime binding",
            SecurityCheck::MethodBinding => "method binding",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Security violation ({check}) on '{tag}'{}: {}", .property.as_ref().map(|p| format!(" property '{}'", p)).unwrap_or_default(), .reason.as_deref().unwrap_or("denied"))]
pub struct SecurityViolation {
    pub check: SecurityCheck,
    pub tag: String,
    pub property: Option<String>,
    pub reason: Option<String>,
}

impl SecurityViolation {
    pub fn new(check: SecurityCheck, tag: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            check,
            tag: tag.into(),
            property: Some(property.into()),
            reason: None,
        }
    }

    pub fn for_tag(check: SecurityCheck, tag: impl Into<String>) -> Self {
        Self {
            check,
            tag: tag.into(),
            property: None,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// The object a check is about.
///
/// `component` is `None` when nothing has been built yet (the `loaded`
/// expression is checked before instantiation).
#[derive(Clone, Copy)]
pub struct CheckTarget<'a> {
    pub tag: &'a str,
    pub component: Option<&'a dyn Component>,
}

impl Debug for CheckTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckTarget")
            .field("tag", &self.tag)
            .field("component", &self.component.map(|c| c.type_name()))
            .finish()
    }
}

/// The capability gate. Every method defaults to allowing the operation.
pub trait SecurityManager: Send + Sync + Debug {
    /// Called before any node of `tag` is instantiated.
    fn check_create_control(
        &self,
        uri: Option<&PageUri>,
        namespace_uri: &str,
        tag: &str,
    ) -> Result<(), SecurityViolation> {
        let _ = (uri, namespace_uri, tag);
        Ok(())
    }

    /// Called immediately before a concrete value is written.
    fn check_set_property(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        value: &Value,
    ) -> Result<(), SecurityViolation> {
        let _ = (target, name, value);
        Ok(())
    }

    /// Called before a load-time expression is evaluated.
    fn check_loadtime_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        expression: &str,
    ) -> Result<(), SecurityViolation> {
        let _ = (target, name, expression);
        Ok(())
    }

    /// Called before a live binding is installed.
    fn check_runtime_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        binding: &dyn ValueBinding,
    ) -> Result<(), SecurityViolation> {
        let _ = (target, name, binding);
        Ok(())
    }

    /// Called before a callable is installed.
    fn check_method_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        binding: &dyn MethodBinding,
    ) -> Result<(), SecurityViolation> {
        let _ = (target, name, binding);
        Ok(())
    }
}

/// Allows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveSecurityManager;

impl SecurityManager for PermissiveSecurityManager {}

/// A deny-list policy.
///
/// Tags and properties are matched by local name; properties may also be
/// given as `tag.property` to deny them on one tag only.
#[derive(Debug, Clone)]
pub struct PolicySecurityManager {
    denied_tags: HashSet<String>,
    denied_properties: HashSet<String>,
    allow_loadtime: bool,
    allow_runtime: bool,
    allow_method: bool,
}

impl Default for PolicySecurityManager {
    fn default() -> Self {
        Self {
            denied_tags: HashSet::new(),
            denied_properties: HashSet::new(),
            allow_loadtime: true,
            allow_runtime: true,
            allow_method: true,
        }
    }
}

impl PolicySecurityManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_tag(mut self, tag: impl Into<String>) -> Self {
        self.denied_tags.insert(tag.into());
        self
    }

    pub fn deny_property(mut self, property: impl Into<String>) -> Self {
        self.denied_properties.insert(property.into());
        self
    }

    pub fn allow_loadtime_bindings(mut self, allow: bool) -> Self {
        self.allow_loadtime = allow;
        self
    }

    pub fn allow_runtime_bindings(mut self, allow: bool) -> Self {
        self.allow_runtime = allow;
        self
    }

    pub fn allow_method_bindings(mut self, allow: bool) -> Self {
        self.allow_method = allow;
        self
    }

    fn check_property(
        &self,
        check: SecurityCheck,
        target: &CheckTarget<'_>,
        name: &str,
    ) -> Result<(), SecurityViolation> {
        if self.denied_properties.contains(name)
            || self
                .denied_properties
                .contains(&format!("{}.{}", target.tag, name))
        {
            log::warn!("Denied {} of '{}' on '{}'", check, name, target.tag);
            return Err(SecurityViolation::new(check, target.tag, name)
                .with_reason("property is not permitted"));
        }
        Ok(())
    }

    fn check_binding(
        &self,
        allowed: bool,
        check: SecurityCheck,
        target: &CheckTarget<'_>,
        name: &str,
    ) -> Result<(), SecurityViolation> {
        if !allowed {
            log::warn!("Denied {} for '{}' on '{}'", check, name, target.tag);
            return Err(SecurityViolation::new(check, target.tag, name)
                .with_reason("bindings of this kind are disabled"));
        }
        self.check_property(check, target, name)
    }
}

impl SecurityManager for PolicySecurityManager {
    fn check_create_control(
        &self,
        _uri: Option<&PageUri>,
        _namespace_uri: &str,
        tag: &str,
    ) -> Result<(), SecurityViolation> {
        if self.denied_tags.contains(tag) {
            log::warn!("Denied creation of '{}'", tag);
            return Err(SecurityViolation::for_tag(SecurityCheck::CreateControl, tag)
                .with_reason("tag is not permitted"));
        }
        Ok(())
    }

    fn check_set_property(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _value: &Value,
    ) -> Result<(), SecurityViolation> {
        self.check_property(SecurityCheck::SetProperty, target, name)
    }

    fn check_loadtime_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _expression: &str,
    ) -> Result<(), SecurityViolation> {
        self.check_binding(self.allow_loadtime, SecurityCheck::LoadtimeBinding, target, name)
    }

    fn check_runtime_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _binding: &dyn ValueBinding,
    ) -> Result<(), SecurityViolation> {
        self.check_binding(self.allow_runtime, SecurityCheck::RuntimeBinding, target, name)
    }

    fn check_method_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _binding: &dyn MethodBinding,
    ) -> Result<(), SecurityViolation> {
        self.check_binding(self.allow_method, SecurityCheck::MethodBinding, target, name)
    }
}

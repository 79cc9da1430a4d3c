#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use xpages::traits::{LoadedPage, LoaderError, MethodBinding, ValueBinding};
use xpages::{
    CacheInfo, CheckTarget, Component, ComponentError, Definition, ExpressionEvaluator,
    InMemoryPageLoader, InMemoryRegistry, PageLoader, PageUri, Property, PropertyBag, Scope,
    ScopeEvaluator, SecurityCheck, SecurityManager, SecurityViolation, Value, ValueType,
};

pub const XP: &str = "http://www.ibm.com/xsp/core";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bag(name: &'static str) -> impl Fn() -> Box<dyn Component> + Send + Sync + 'static {
    move || Box::new(PropertyBag::new(name))
}

/// Records the name of every property written to it.
#[derive(Debug)]
pub struct SpyComponent {
    writes: Arc<Mutex<Vec<String>>>,
}

impl Component for SpyComponent {
    fn type_name(&self) -> &str {
        "Spy"
    }

    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), ComponentError> {
        self.writes.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The core tags used across the tests. `xp:spy` writes into `spy_log`.
pub fn registry(spy_log: Arc<Mutex<Vec<String>>>) -> Arc<InMemoryRegistry> {
    let registry = InMemoryRegistry::new();
    registry.register(Definition::builder(XP, "view", bag("View")).build());
    registry.register(
        Definition::builder(XP, "panel", bag("Panel"))
            .property(Property::simple("styleClass", "java.lang.String"))
            .build(),
    );
    registry.register(
        Definition::builder(XP, "text", bag("Text"))
            .property(Property::simple("value", "java.lang.Object"))
            .property(Property::simple("escape", "boolean"))
            .property(Property::simple("size", "int"))
            .build(),
    );
    registry.register(
        Definition::builder(XP, "inputText", bag("Input"))
            .property(Property::simple("value", "java.lang.Object"))
            .property(Property::complex("converter", "javax.faces.convert.Converter"))
            .property(Property::collection(
                "validators",
                "addValidator",
                "javax.faces.validator.Validator",
            ))
            .build(),
    );
    registry.register(
        Definition::builder(XP, "convertNumber", bag("NumberConverter"))
            .property(Property::simple("pattern", "java.lang.String"))
            .build(),
    );
    registry.register(
        Definition::builder(XP, "validateRequired", bag("RequiredValidator"))
            .property(Property::simple("message", "java.lang.String"))
            .build(),
    );
    registry.register(
        Definition::builder(XP, "button", bag("Button"))
            .property(Property::simple("value", "java.lang.String"))
            .property(Property::method_binding("action"))
            .build(),
    );
    registry.register(
        Definition::builder(XP, "banner", || Box::new(PropertyBag::include("Banner")))
            .include_page("/banner.xsp")
            .build(),
    );
    registry.register(
        Definition::builder(XP, "spy", move || {
            Box::new(SpyComponent {
                writes: Arc::clone(&spy_log),
            })
        })
        .property(Property::simple("value", "java.lang.String"))
        .build(),
    );
    Arc::new(registry)
}

pub fn default_registry() -> Arc<InMemoryRegistry> {
    registry(Arc::new(Mutex::new(Vec::new())))
}

/// Wraps an in-memory loader, counting loads and answering staleness from a switch.
#[derive(Debug, Default)]
pub struct CountingLoader {
    pub pages: InMemoryPageLoader,
    pub loads: AtomicUsize,
    pub expired: AtomicBool,
}

impl CountingLoader {
    pub fn with_page(uri: &str, content: &str) -> Self {
        let loader = Self::default();
        loader.pages.add(uri, content).unwrap();
        loader
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn set_expired(&self, expired: bool) {
        self.expired.store(expired, Ordering::SeqCst);
    }
}

impl PageLoader for CountingLoader {
    fn load(&self, uri: &PageUri) -> Result<LoadedPage, LoaderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.pages.load(uri)
    }

    fn is_cache_expired(&self, _uri: &PageUri, _cache_info: &CacheInfo) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    fn name(&self) -> &'static str {
        "CountingLoader"
    }
}

/// Delegates to `ScopeEvaluator`, counting immediate evaluations.
#[derive(Debug, Default)]
pub struct CountingEvaluator {
    pub evaluations: AtomicUsize,
}

impl CountingEvaluator {
    pub fn count(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl ExpressionEvaluator for CountingEvaluator {
    fn evaluate(&self, expression: &str, scope: &Scope) -> Result<Value, xpages::traits::ExpressionError> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        ScopeEvaluator.evaluate(expression, scope)
    }

    fn create_value_binding(
        &self,
        expression: &str,
        expected: ValueType,
    ) -> Result<Arc<dyn ValueBinding>, xpages::traits::ExpressionError> {
        ScopeEvaluator.create_value_binding(expression, expected)
    }

    fn create_method_binding(
        &self,
        expression: &str,
    ) -> Result<Arc<dyn MethodBinding>, xpages::traits::ExpressionError> {
        ScopeEvaluator.create_method_binding(expression)
    }
}

/// Records every checkpoint as `"<check>:<tag>.<property>"`, optionally vetoing writes.
#[derive(Debug, Default)]
pub struct RecordingSecurity {
    pub calls: Mutex<Vec<String>>,
    pub veto_writes: bool,
}

impl RecordingSecurity {
    pub fn vetoing() -> Self {
        Self {
            veto_writes: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, check: &str, target: &CheckTarget<'_>, name: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}.{}", check, target.tag, name));
    }
}

impl SecurityManager for RecordingSecurity {
    fn check_set_property(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _value: &Value,
    ) -> Result<(), SecurityViolation> {
        self.record("set", target, name);
        if self.veto_writes {
            return Err(SecurityViolation::new(SecurityCheck::SetProperty, target.tag, name));
        }
        Ok(())
    }

    fn check_loadtime_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _expression: &str,
    ) -> Result<(), SecurityViolation> {
        self.record("loadtime", target, name);
        Ok(())
    }

    fn check_runtime_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _binding: &dyn ValueBinding,
    ) -> Result<(), SecurityViolation> {
        self.record("runtime", target, name);
        Ok(())
    }

    fn check_method_binding(
        &self,
        target: &CheckTarget<'_>,
        name: &str,
        _binding: &dyn MethodBinding,
    ) -> Result<(), SecurityViolation> {
        self.record("method", target, name);
        Ok(())
    }
}

pub fn page(body: &str) -> String {
    format!(r#"<xp:view xmlns:xp="{}">{}</xp:view>"#, XP, body)
}

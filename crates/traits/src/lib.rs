//! Host-side contracts for the XPages interpreter.
//!
//! Everything the interpreter consumes but does not implement lives here:
//! - **value**: the dynamic `Value` written into components and the declared `ValueType`
//! - **component**: the `Component` trait live objects implement, plus `PropertyBag`
//! - **binding**: the expression-language capability (`ExpressionEvaluator`) and its bindings
//! - **registry**: tag/property metadata (`Definition`, `Property`, `Registry`)
//! - **loader**: the `PageLoader` trait and an in-memory implementation
//! - **ids**: newtypes for page URIs and cache tokens

pub mod binding;
pub mod component;
pub mod ids;
pub mod loader;
pub mod registry;
pub mod value;

pub use binding::{
    BindingOwner, ExpressionError, ExpressionEvaluator, MethodBinding, Scope, ScopeEvaluator,
    ValueBinding,
};
pub use component::{
    Component, ComponentError, ComponentNode, IncludeComponent, PageDriver, PropertyBag,
};
pub use ids::{CacheInfo, PageUri};
pub use loader::{InMemoryPageLoader, LoadedPage, LoaderError, PageLoader};
pub use registry::{Definition, DefinitionBuilder, InMemoryRegistry, Property, PropertyKind, Registry};
pub use value::{ObjectHandle, Value, ValueType};

//! The XPages markup-to-object interpreter.
//!
//! A markup parser walks a page and asks a [`ControlFactory`] for one
//! [`XPagesObject`] per element, compiling every attribute into a
//! [`PropertySetter`] as it goes. The result is a [`ControlTree`] of reusable
//! templates. Materializing a node builds a brand-new component, applying each
//! setter through the [`SecurityManager`] in the order it was attached.
//!
//! [`XPagesInterpreter`] ties this to a [`PageLoader`](xpages_traits::PageLoader)
//! and a [`PageCache`], re-parsing a page only when its loader reports the
//! cached copy as stale.

pub mod cache;
pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod expression;
pub mod factory;
pub mod interpreter;
pub mod object;
pub mod security;
pub mod setter;

pub use cache::{CachedPage, InMemoryPageCache, PageCache};
pub use config::{InterpreterConfig, XC_NAMESPACE, XE_NAMESPACE, XP_NAMESPACE};
pub use context::Context;
pub use control::{Control, ControlSnapshot, ControlTree, NodeId};
pub use error::{ErrorKind, InterpreterError, Location};
pub use expression::ExpressionKind;
pub use factory::{ControlFactory, DefaultControlFactory, MarkupParser};
pub use interpreter::{InterpreterBuilder, InterpreterPageDriver, XPagesInterpreter};
pub use object::XPagesObject;
pub use security::{
    CheckTarget, PermissiveSecurityManager, PolicySecurityManager, SecurityCheck, SecurityManager,
    SecurityViolation,
};
pub use setter::{
    CollectionItem, FactoryKind, LOADED, LoadedFlag, MethodSource, PropertySetter, RawValue,
    SetterCache, SetterFactory, SetterSnapshot,
};

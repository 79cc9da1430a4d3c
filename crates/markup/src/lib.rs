//! XML front end for the XPages interpreter.
//!
//! [`XmlMarkupParser`] reads page markup with `roxmltree` and builds a
//! `ControlTree`, asking the interpreter's `ControlFactory` for every element.

mod error;
mod parser;

pub use error::MarkupError;
pub use parser::XmlMarkupParser;

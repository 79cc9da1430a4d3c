use thiserror::Error;
use xpages_interpreter::{InterpreterError, Location};

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("Facet <{tag}> has no '{attribute}' attribute")]
    MissingFacetKey {
        tag: String,
        attribute: String,
        location: Location,
    },

    #[error("Unexpected <{tag}> inside <{parent}>")]
    UnexpectedElement {
        tag: String,
        parent: String,
        location: Location,
    },
}

impl MarkupError {
    pub fn location(&self) -> Option<Location> {
        match self {
            MarkupError::XmlParse(e) => {
                let pos = e.pos();
                Some(Location::from((pos.row as usize, pos.col as usize)))
            }
            MarkupError::MissingFacetKey { location, .. }
            | MarkupError::UnexpectedElement { location, .. } => Some(location.clone()),
        }
    }
}

impl From<MarkupError> for InterpreterError {
    fn from(err: MarkupError) -> Self {
        InterpreterError::Parse {
            location: err.location(),
            message: err.to_string(),
        }
    }
}

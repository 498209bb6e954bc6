//! Errors raised while reading documents

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Error that can occur when loading a NAF or FoLiA document
#[derive(Debug, Error)]
pub enum ModelError {
    /// The input is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The root element does not belong to the expected dialect
    #[error("expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// A required attribute is absent
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// An attribute is present but can not be interpreted
    #[error("<{element}> has invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    /// A FoLiA word reference points at a word that does not exist
    #[error("word reference '{id}' in <{element}> does not resolve to a word")]
    UnknownWordReference { element: String, id: String },
}

impl ModelError {
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        ModelError::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    pub fn invalid_attribute(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        ModelError::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

//! Fatal conversion errors
//!
//! Anything that makes the output meaningless ends up here and aborts the run. Problems with a
//! single item (a dangling reference, an odd confidence value, ...) are not errors, they are
//! reported through [`crate::diagnostics::Diagnostics`] and the item is skipped.

use crate::stage::Stage;
use nafolia_model::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Debug, Error)]
pub enum ConversionError {
    /// A NAF entity with more than one `references` block
    #[error("entity '{entity}' has {count} references blocks, only one can be converted")]
    MultipleReferences { entity: String, count: usize },

    /// A sentence-scoped span whose first and last word live in different sentences
    #[error("span of '{element}' crosses sentences: starts in '{first}', ends in '{last}'")]
    CrossSentenceSpan {
        element: String,
        first: String,
        last: String,
    },

    #[error("no document id given and none can be derived from the input name")]
    MissingDocumentId,

    #[error("document id '{id}' is not valid ({reason}), please set one explicitly")]
    InvalidDocumentId { id: String, reason: String },

    /// A source identifier registered twice with different targets
    #[error("{kind} identifier '{id}' is already bound to a different target")]
    DuplicateIdentifier { kind: &'static str, id: String },

    #[error("{kind} identifier '{id}' is not registered")]
    UnknownIdentifier { kind: &'static str, id: String },

    #[error("span of '{0}' does not contain any word")]
    EmptySpan(String),

    #[error("conversion step requires stage {expected:?}, document is at {found:?}")]
    StageOrder { expected: Stage, found: Stage },

    #[error("no conversion from {from} to {to}")]
    ConversionNotFound { from: String, to: String },

    #[error("can not detect the input format, expected a <NAF> or <FoLiA> root element")]
    UnknownFormat,

    #[error(transparent)]
    Input(#[from] ModelError),
}

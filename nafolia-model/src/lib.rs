//! Document models for the two annotation dialects handled by nafolia
//!
//!     This crate owns the in-memory shape of NAF and FoLiA documents and the code that moves
//!     them in and out of XML. It knows nothing about converting one into the other, that is the
//!     job of nafolia-babel.
//!
//!     The file structure :
//!     .
//!     ├── error.rs        # ModelError, shared by both readers
//!     ├── xml.rs          # element tree + serializer, roxmltree reading helpers
//!     ├── naf
//!     │   ├── mod.rs      # flat layers: tokens, terms, entities, ...
//!     │   ├── reader.rs
//!     │   └── writer.rs
//!     ├── folia
//!     │   ├── mod.rs      # nested structure: text → p → s → w, with arenas and typed handles
//!     │   ├── reader.rs
//!     │   └── writer.rs
//!     └── lib.rs
//!
//! NAF
//!
//!     NAF is flat: every layer is a list, and layers point at each other through identifiers
//!     (terms span tokens, entities span terms, ...). The model keeps those identifiers as plain
//!     strings; nothing is resolved at load time. External references nest without a bound, so
//!     they live in an arena ([`naf::ExternalRefs`]) and elements hold [`naf::ExternalRefId`]s.
//!
//! FoLiA
//!
//!     FoLiA is nested. Paragraphs, sentences and words are stored in arenas inside the text
//!     body and addressed by copyable handles ([`folia::ParagraphIdx`], [`folia::SentenceIdx`],
//!     [`folia::WordIdx`]). Span annotations refer to words by handle, so a FoLiA document in
//!     this model can not contain a dangling word reference.

pub mod error;
pub mod folia;
pub mod naf;
pub mod xml;

pub use error::{ModelError, Result};

//! Conversion between NAF and FoLiA linguistic annotation documents
//!
//!     NAF stores annotations as flat layers cross-referencing each other by identifier, FoLiA
//!     nests them inside the text structure. This crate maps one onto the other, in both
//!     directions, on top of the document models of nafolia-model.
//!
//! Architecture
//!
//!     - Conversion trait: one uniform interface per direction (source format, target format,
//!       convert a document string).
//!     - ConversionRegistry: discovery and selection of conversions by name or by format pair.
//!     - Mappings: the two directions, each a fixed sequence of layer converters.
//!
//!     This is a pure lib: no printing, no environment lookups. Problems that do not stop a
//!     conversion are collected as [`Diagnostic`]s and handed back with the output (and logged
//!     through `tracing`); the caller decides what to show.
//!
//!     The file structure :
//!     .
//!     ├── error.rs            # ConversionError, fatal problems
//!     ├── diagnostics.rs      # Diagnostics, the per-item warnings sink
//!     ├── options.rs          # ConvertOptions, SenseMode
//!     ├── conversion.rs       # Conversion trait, FormatKind
//!     ├── registry.rs         # ConversionRegistry
//!     ├── stage.rs            # run state machine
//!     ├── ids.rs              # identifier registries, FoLiA id scheme
//!     ├── docid.rs            # document id derivation and IdPolicy
//!     ├── offsets.rs          # token offsets: derive (→ NAF) and validate (→ FoLiA)
//!     ├── span.rs             # Span, SpanSource, SpanResolver
//!     ├── containers.rs       # keyed caches for layers, paragraphs and sentences
//!     ├── exref.rs            # external references: senses and alignments
//!     ├── provenance.rs       # ProvenanceLog → NAF linguisticProcessors
//!     ├── mappings
//!     │   ├── naf_to_folia
//!     │   │   ├── mod.rs      # Context, LayerConverter, NafToFolia
//!     │   │   ├── text.rs
//!     │   │   ├── terms.rs
//!     │   │   └── layers.rs   # entities, chunks, coreference, srl, ...
//!     │   └── folia_to_naf.rs # FoliaToNaf
//!     └── lib.rs
//!
//! Testing
//!     tests
//!     ├── naf_to_folia.rs
//!     ├── folia_to_naf.rs
//!     ├── roundtrip.rs
//!     └── fixtures
//!         ├── boeing.naf
//!         └── boeing.folia.xml
//!
//! Lossiness
//!
//!     Neither direction is lossless. NAF → FoLiA drops multi-token term annotations, layers
//!     FoLiA has no element for (temporal and causal relations, constituency, factuality,
//!     attribution) and anything that does not resolve to words. FoLiA → NAF keeps text, pos,
//!     lemma, dependencies, chunks and entities only. What survives a round trip is the token
//!     sequence and the text.

pub mod containers;
pub mod conversion;
pub mod diagnostics;
pub mod docid;
pub mod error;
pub mod exref;
pub mod ids;
pub mod mappings;
pub mod offsets;
pub mod options;
pub mod provenance;
pub mod registry;
pub mod span;
pub mod stage;

pub use conversion::{Conversion, ConversionOutput, FormatKind};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{ConversionError, Result};
pub use mappings::folia_to_naf::FoliaToNaf;
pub use mappings::naf_to_folia::NafToFolia;
pub use options::{ConvertOptions, SenseMode};
pub use registry::ConversionRegistry;

//! External references: flattening, classification, senses and alignments
//!
//! # The High-Level Concept
//!
//!     NAF elements carry `externalRef`s to outside resources (WordNet, ODWN, FrameNet, ESO, or
//!     plain URLs), nested without bound. FoLiA has two places for them: senses on words, and
//!     alignments on span annotations. This module decides which reference goes where and
//!     builds the FoLiA side.
//!
//! # The Algorithm
//!
//!     1. Flatten: a pre-order walk over the arena with a visited set, so every node is emitted
//!        once and a reference cycle terminates.
//!     2. Classify each reference by resource family and by what it is anchored on (a word or a
//!        span annotation).
//!     3. Senses: WordNet identifiers `LLL-VV-<id>-P` are split into features and a short class,
//!        ODWN senses collect their nested references as features. Senses are grouped per
//!        resource and ranked by confidence.
//!     4. Alignments: URL references become plain links, known ontologies get their fixed
//!        format and reference namespace.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::options::SenseMode;
use nafolia_model::folia::{AlignReference, Alignment, Feature};
use nafolia_model::naf::{ExternalRef, ExternalRefId, ExternalRefs};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const FRAMENET_NAMESPACE: &str = "http://www.newsreader-project.eu/framenet#";
pub const ESO_ONTOLOGY: &str = "https://raw.githubusercontent.com/newsreader/eso/master/ESO_Version2.owl";
pub const ESO_NAMESPACE: &str = "http://www.newsreader-project.eu/domain-ontology#";

/// Pre-order walk from `root`, each reachable node exactly once, `root` first
pub fn flatten(refs: &ExternalRefs, root: ExternalRefId) -> Vec<ExternalRefId> {
    flatten_all(refs, &[root])
}

/// Flatten several roots into one list, sharing the visited set
pub fn flatten_all(refs: &ExternalRefs, roots: &[ExternalRefId]) -> Vec<ExternalRefId> {
    let mut visited = HashSet::new();
    let mut result = Vec::new();
    let mut stack: Vec<ExternalRefId> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        result.push(id);
        for child in refs.get(id).children.iter().rev() {
            if !visited.contains(child) {
                stack.push(*child);
            }
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFamily {
    WordNet,
    Odwn,
    FrameNet,
    Eso,
    Other,
}

impl ResourceFamily {
    pub fn of(resource: &str) -> Self {
        let lower = resource.to_lowercase();
        if lower.contains("wordnet") || lower.starts_with("wn") {
            ResourceFamily::WordNet
        } else if lower.contains("odwn") {
            ResourceFamily::Odwn
        } else if lower.contains("framenet") {
            ResourceFamily::FrameNet
        } else if lower == "eso" {
            ResourceFamily::Eso
        } else {
            ResourceFamily::Other
        }
    }
}

/// What a reference is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Word,
    Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Sense,
    Alignment,
    Unrecognized,
}

pub fn classify(exref: &ExternalRef, anchor: Anchor) -> ResourceKind {
    let family = ResourceFamily::of(&exref.resource);
    match anchor {
        Anchor::Word => match family {
            ResourceFamily::WordNet | ResourceFamily::Odwn | ResourceFamily::FrameNet => {
                ResourceKind::Sense
            }
            ResourceFamily::Eso | ResourceFamily::Other => ResourceKind::Unrecognized,
        },
        Anchor::Span => {
            if is_url(&exref.reference) || family != ResourceFamily::Other {
                ResourceKind::Alignment
            } else {
                ResourceKind::Unrecognized
            }
        }
    }
}

fn is_url(reference: &str) -> bool {
    reference.contains("://")
}

static WORDNET_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.{3})-(.{2})-(.{2,})-(.)$").expect("WordNet pattern is valid"));

/// Split `LLL-VV-<id>-P` into the short reference `<id>` and its version, language and pos
pub fn decompose_wordnet(reference: &str) -> Option<(String, Vec<Feature>)> {
    let captures = WORDNET_ID.captures(reference)?;
    let features = vec![
        Feature::new("version", &captures[2]),
        Feature::new("language", &captures[1]),
        Feature::new("pos", &captures[4]),
    ];
    Some((captures[3].to_string(), features))
}

/// Clamp into [0, 1]; the flag tells whether clamping happened
pub fn clamp_confidence(value: f64) -> (f64, bool) {
    if value < 0.0 {
        (0.0, true)
    } else if value > 1.0 {
        (1.0, true)
    } else {
        (value, false)
    }
}

/// Parse a raw confidence attribute, clamping and reporting on the way
pub fn parse_confidence(
    raw: Option<&str>,
    element: &str,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Option<f64> {
    let raw = raw?;
    let value = match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_nan() => value,
        _ => {
            diagnostics.report(
                DiagnosticKind::MalformedConfidence,
                element,
                context,
                format!("confidence '{raw}' is not a number, dropping it"),
            );
            return None;
        }
    };
    let (clamped, changed) = clamp_confidence(value);
    if changed {
        diagnostics.report(
            DiagnosticKind::ConfidenceOutOfRange,
            element,
            context,
            format!("confidence {value} is not in range, forcing to {clamped}"),
        );
    }
    Some(clamped)
}

/// A sense extracted from an external reference, before placement
#[derive(Debug, Clone, PartialEq)]
pub struct SenseCandidate {
    pub resource: String,
    pub class: String,
    pub confidence: Option<f64>,
    pub features: Vec<Feature>,
}

/// All senses of one resource on one word
#[derive(Debug, Clone, PartialEq)]
pub struct SenseGroup {
    pub resource: String,
    pub senses: Vec<SenseCandidate>,
}

/// How a group ends up on the word
#[derive(Debug, Clone, PartialEq)]
pub struct SensePlacement {
    pub primary: Vec<SenseCandidate>,
    /// Each goes into an alternative of its own
    pub alternatives: Vec<SenseCandidate>,
}

/// Turn the top-level references of a word into sense candidates
///
/// References that are not senses, or whose identifier does not follow the resource
/// convention, are reported and skipped.
pub fn collect_senses(
    refs: &ExternalRefs,
    roots: &[ExternalRefId],
    element: &str,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<SenseCandidate> {
    let mut senses = Vec::new();
    for root in roots {
        let exref = refs.get(*root);
        if classify(exref, Anchor::Word) != ResourceKind::Sense {
            diagnostics.report(
                DiagnosticKind::UnknownResource,
                element,
                context,
                format!(
                    "external reference with resource '{}' can not be converted (reference={}), skipping",
                    exref.resource, exref.reference
                ),
            );
            continue;
        }
        let confidence = parse_confidence(exref.confidence.as_deref(), element, context, diagnostics);
        let (class, features) = match ResourceFamily::of(&exref.resource) {
            ResourceFamily::WordNet => match decompose_wordnet(&exref.reference) {
                Some(decomposed) => decomposed,
                None => {
                    diagnostics.report(
                        DiagnosticKind::MalformedResourceIdentifier,
                        element,
                        context,
                        format!(
                            "WordNet reference '{}' does not follow the LLL-VV-<id>-P convention, skipping",
                            exref.reference
                        ),
                    );
                    continue;
                }
            },
            ResourceFamily::Odwn => (exref.reference.clone(), odwn_features(refs, *root)),
            _ => (exref.reference.clone(), Vec::new()),
        };
        senses.push(SenseCandidate {
            resource: exref.resource.clone(),
            class,
            confidence,
            features,
        });
    }
    senses
}

/// Nested references as `resource = reference` features, then `pos` from the last character
fn odwn_features(refs: &ExternalRefs, root: ExternalRefId) -> Vec<Feature> {
    let mut features: Vec<Feature> = Vec::new();
    let mut set = |subset: &str, class: &str| match features.iter_mut().find(|f| f.subset == subset) {
        Some(feature) => feature.class = class.to_string(),
        None => features.push(Feature::new(subset, class)),
    };
    for id in flatten(refs, root).into_iter().skip(1) {
        let nested = refs.get(id);
        set(&nested.resource, &nested.reference);
    }
    let reference = &refs.get(root).reference;
    if let Some(pos) = reference.chars().last() {
        set("pos", &pos.to_string());
    }
    features
}

/// Group candidates per resource, keeping the first-seen order of resources and of senses
pub fn group_senses(candidates: Vec<SenseCandidate>) -> Vec<SenseGroup> {
    let mut groups: Vec<SenseGroup> = Vec::new();
    for candidate in candidates {
        match groups.iter_mut().find(|g| g.resource == candidate.resource) {
            Some(group) => group.senses.push(candidate),
            None => groups.push(SenseGroup {
                resource: candidate.resource.clone(),
                senses: vec![candidate],
            }),
        }
    }
    groups
}

/// Decide which senses are primary
///
/// Ranked: stable sort by descending confidence (absent counts as 0), the first is primary.
/// Flat: everything is primary, in encounter order.
pub fn place_senses(group: SenseGroup, mode: SenseMode) -> SensePlacement {
    match mode {
        SenseMode::Flat => SensePlacement {
            primary: group.senses,
            alternatives: Vec::new(),
        },
        SenseMode::Ranked => {
            let mut senses = group.senses;
            senses.sort_by(|a, b| {
                let a = a.confidence.unwrap_or(0.0);
                let b = b.confidence.unwrap_or(0.0);
                b.total_cmp(&a)
            });
            let mut senses = senses.into_iter();
            SensePlacement {
                primary: senses.next().into_iter().collect(),
                alternatives: senses.collect(),
            }
        }
    }
}

/// Alignments and features produced for one span annotation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedReferences {
    pub alignments: Vec<Alignment>,
    pub features: Vec<Feature>,
}

impl ResolvedReferences {
    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty() && self.features.is_empty()
    }
}

/// Convert all references (nested ones included) of a span annotation
pub fn resolve_alignments(
    refs: &ExternalRefs,
    roots: &[ExternalRefId],
    element: &str,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> ResolvedReferences {
    let mut resolved = ResolvedReferences::default();
    for id in flatten_all(refs, roots) {
        let exref = refs.get(id);
        if classify(exref, Anchor::Span) == ResourceKind::Unrecognized {
            diagnostics.report(
                DiagnosticKind::UnknownResource,
                element,
                context,
                format!(
                    "external reference '{}' for resource '{}' is not a URL, skipping",
                    exref.reference, exref.resource
                ),
            );
            continue;
        }
        let confidence = parse_confidence(exref.confidence.as_deref(), element, context, diagnostics);
        let class = Some(exref.resource.clone());

        if is_url(&exref.reference) {
            resolved.alignments.push(Alignment {
                class,
                href: Some(exref.reference.clone()),
                format: Some("text/html".to_string()),
                confidence,
                references: Vec::new(),
            });
            continue;
        }

        match ResourceFamily::of(&exref.resource) {
            ResourceFamily::WordNet | ResourceFamily::Odwn => {
                if exref.source.as_deref() == Some("dominant_sense") {
                    resolved
                        .features
                        .push(Feature::new("ODWN_dominant_sense", exref.reference.as_str()));
                } else {
                    resolved.alignments.push(Alignment {
                        class,
                        href: None,
                        format: Some("application/unknown".to_string()),
                        confidence,
                        references: vec![AlignReference {
                            id: exref.reference.clone(),
                            kind: "unknown".to_string(),
                        }],
                    });
                }
            }
            ResourceFamily::FrameNet => resolved.alignments.push(Alignment {
                class,
                href: None,
                format: Some("application/rdf+xml".to_string()),
                confidence,
                references: vec![AlignReference {
                    id: format!("{FRAMENET_NAMESPACE}{}", exref.reference),
                    kind: "rdf:description".to_string(),
                }],
            }),
            ResourceFamily::Eso => resolved.alignments.push(Alignment {
                class,
                href: Some(ESO_ONTOLOGY.to_string()),
                format: Some("application/rdf+xml".to_string()),
                confidence,
                references: vec![AlignReference {
                    id: format!("{ESO_NAMESPACE}{}", exref.reference),
                    kind: "rdf:description".to_string(),
                }],
            }),
            ResourceFamily::Other => {}
        }
    }
    resolved
}

//! Span layers
//!
//! Everything after terms: each converter resolves the spans of its items, picks the layer
//! through the container cache and attaches one FoLiA span annotation per item. The order in
//! [`converters`] is the order of the generated layers inside each sentence.

use super::{Context, LayerConverter};
use crate::diagnostics::DiagnosticKind;
use crate::error::{ConversionError, Result};
use crate::exref::parse_confidence;
use crate::span::{Span, SpanRef, SpanScope};
use nafolia_model::folia::{
    AnnotationType, Feature, LayerKind, LayerParent, SpanAnnotation, SpanKind, WordIdx,
};
use nafolia_model::naf::ExternalRefId;
use std::slice;

pub fn converters() -> Vec<Box<dyn LayerConverter>> {
    vec![
        Box::new(EntitiesConverter),
        Box::new(MarkablesConverter),
        Box::new(ChunksConverter),
        Box::new(CoreferenceConverter),
        Box::new(SemanticRolesConverter),
        Box::new(DependenciesConverter),
        Box::new(TimeExpressionsConverter),
        Box::new(UnsupportedLayersConverter),
        Box::new(OpinionsConverter),
    ]
}

/// A span annotation with id, set, class and words filled in
fn annotation(
    ctx: &Context<'_>,
    kind: SpanKind,
    id: &str,
    set: &str,
    class: Option<&String>,
    span: &Span,
) -> SpanAnnotation {
    let mut annotation = SpanAnnotation::new(kind);
    annotation.id = Some(ctx.ids.local(id));
    annotation.set = Some(set.to_string());
    annotation.class = class.cloned();
    annotation.span = span.words().to_vec();
    annotation
}

fn add_references(
    ctx: &mut Context<'_>,
    annotation: &mut SpanAnnotation,
    refs: &[ExternalRefId],
    element: &str,
) {
    if refs.is_empty() {
        return;
    }
    let resolved = ctx.references(refs, element);
    annotation.alignments.extend(resolved.alignments);
    annotation.features.extend(resolved.features);
}

fn missing_span(ctx: &mut Context<'_>, element: &str, message: &str) {
    let context = ctx.document_id().to_string();
    ctx.diagnostics
        .report(DiagnosticKind::MissingSpan, element, &context, message);
}

fn sentence_of(ctx: &Context<'_>, span: &Span) -> LayerParent {
    LayerParent::Sentence(span.sentence(&ctx.doc.text))
}

pub struct EntitiesConverter;

impl LayerConverter for EntitiesConverter {
    fn name(&self) -> &'static str {
        "entities"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for entity in &naf.entities {
            let references = match entity.references.as_slice() {
                [] => {
                    missing_span(ctx, &entity.id, "entity has no references, skipping");
                    continue;
                }
                [references] => references,
                blocks => {
                    return Err(ConversionError::MultipleReferences {
                        entity: entity.id.clone(),
                        count: blocks.len(),
                    })
                }
            };
            let source = SpanRef {
                owner: &entity.id,
                ids: references,
            };
            let Some(span) = ctx.resolve(&source, SpanScope::Sentence)? else {
                continue;
            };
            let set = ctx.declare(AnnotationType::Entity, "entities");
            let mut entity_annotation = annotation(
                ctx,
                SpanKind::Entity,
                &entity.id,
                &set,
                entity.entity_type.as_ref(),
                &span,
            );
            add_references(ctx, &mut entity_annotation, &entity.external_refs, &entity.id);
            let parent = sentence_of(ctx, &span);
            ctx.attach(parent, LayerKind::Entities, &set, entity_annotation);
        }
        Ok(())
    }
}

pub struct MarkablesConverter;

impl LayerConverter for MarkablesConverter {
    fn name(&self) -> &'static str {
        "markables"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for markable in &naf.markables {
            let Some(span) = ctx.resolve(markable, SpanScope::Sentence)? else {
                continue;
            };
            let set = ctx.declare(AnnotationType::Entity, "markables");
            let mut mark = annotation(ctx, SpanKind::Entity, &markable.id, &set, None, &span);
            if let Some(lemma) = &markable.lemma {
                mark.features.push(Feature::new("lemma", lemma.as_str()));
            }
            if let Some(source) = &markable.source {
                mark.features.push(Feature::new("source", source.as_str()));
            }
            add_references(ctx, &mut mark, &markable.external_refs, &markable.id);
            let parent = sentence_of(ctx, &span);
            ctx.attach(parent, LayerKind::Entities, &set, mark);
        }
        Ok(())
    }
}

pub struct ChunksConverter;

impl LayerConverter for ChunksConverter {
    fn name(&self) -> &'static str {
        "chunks"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for chunk in &naf.chunks {
            let Some(span) = ctx.resolve(chunk, SpanScope::Sentence)? else {
                continue;
            };
            let set = ctx.declare(AnnotationType::Chunking, "chunks");
            let folia_chunk = annotation(
                ctx,
                SpanKind::Chunk,
                &chunk.id,
                &set,
                chunk.phrase.as_ref(),
                &span,
            );
            let parent = sentence_of(ctx, &span);
            ctx.attach(parent, LayerKind::Chunking, &set, folia_chunk);
        }
        Ok(())
    }
}

pub struct CoreferenceConverter;

/// Set name for a coreference type; `entity` when the type is absent
fn coreference_set_name(coref_type: Option<&str>) -> String {
    match coref_type.filter(|t| !t.is_empty()).unwrap_or("entity") {
        "entity" => "coreference".to_string(),
        "event" => "events".to_string(),
        other => format!("coreference_{other}"),
    }
}

impl LayerConverter for CoreferenceConverter {
    fn name(&self) -> &'static str {
        "coreferences"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for coref in &naf.coreferences {
            let mut links: Vec<Vec<WordIdx>> = Vec::new();
            for ids in &coref.spans {
                let source = SpanRef {
                    owner: &coref.id,
                    ids,
                };
                if let Some(span) = ctx.resolve(&source, SpanScope::Text)? {
                    links.push(span.into_words());
                }
            }
            if links.is_empty() {
                if coref.spans.is_empty() {
                    missing_span(ctx, &coref.id, "coreference has no spans, skipping");
                }
                continue;
            }

            let set = ctx.declare(
                AnnotationType::Coreference,
                &coreference_set_name(coref.coref_type.as_deref()),
            );
            let mut chain = SpanAnnotation::new(SpanKind::CoreferenceChain { links });
            chain.id = Some(ctx.ids.local(&coref.id));
            chain.set = Some(set.clone());
            add_references(ctx, &mut chain, &coref.external_refs, &coref.id);
            ctx.attach(LayerParent::Text, LayerKind::Coreferences, &set, chain);
        }
        Ok(())
    }
}

pub struct SemanticRolesConverter;

impl LayerConverter for SemanticRolesConverter {
    fn name(&self) -> &'static str {
        "srl"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for predicate in &naf.predicates {
            let Some(span) = ctx.resolve(predicate, SpanScope::Sentence)? else {
                continue;
            };
            let semrole_set = ctx.declare(AnnotationType::SemanticRole, "semroles");
            let predicate_set = ctx.declare(AnnotationType::Predicate, "predicates");

            let mut roles = Vec::new();
            for role in &predicate.roles {
                let Some(role_span) = ctx.resolve(role, SpanScope::Sentence)? else {
                    continue;
                };
                let mut semrole = annotation(
                    ctx,
                    SpanKind::SemanticRole,
                    &role.id,
                    &semrole_set,
                    role.sem_role.as_ref(),
                    &role_span,
                );
                add_references(ctx, &mut semrole, &role.external_refs, &role.id);
                roles.push(semrole);
            }

            let mut folia_predicate = annotation(
                ctx,
                SpanKind::Predicate { roles },
                &predicate.id,
                &predicate_set,
                predicate.uri.as_ref(),
                &span,
            );
            let context = ctx.document_id().to_string();
            folia_predicate.confidence = parse_confidence(
                predicate.confidence.as_deref(),
                &predicate.id,
                &context,
                &mut ctx.diagnostics,
            );
            add_references(ctx, &mut folia_predicate, &predicate.external_refs, &predicate.id);
            let parent = sentence_of(ctx, &span);
            ctx.attach(parent, LayerKind::SemanticRoles, &semrole_set, folia_predicate);
        }
        Ok(())
    }
}

pub struct DependenciesConverter;

impl LayerConverter for DependenciesConverter {
    fn name(&self) -> &'static str {
        "deps"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for dep in &naf.dependencies {
            let owner = format!("{}->{}", dep.from, dep.to);
            let head = SpanRef {
                owner: &owner,
                ids: slice::from_ref(&dep.from),
            };
            let dependent = SpanRef {
                owner: &owner,
                ids: slice::from_ref(&dep.to),
            };
            let Some(head) = ctx.resolve(&head, SpanScope::Sentence)? else {
                continue;
            };
            let Some(dependent) = ctx.resolve(&dependent, SpanScope::Sentence)? else {
                continue;
            };
            let sentence = head.sentence(&ctx.doc.text);
            let dependent_sentence = dependent.sentence(&ctx.doc.text);
            if sentence != dependent_sentence {
                return Err(ConversionError::CrossSentenceSpan {
                    element: owner,
                    first: ctx.doc.text.sentence(sentence).id.clone(),
                    last: ctx.doc.text.sentence(dependent_sentence).id.clone(),
                });
            }

            let set = ctx.declare(AnnotationType::Dependency, "dependencies");
            let mut dependency = SpanAnnotation::new(SpanKind::Dependency {
                head: head.into_words(),
                dependent: dependent.into_words(),
            });
            dependency.set = Some(set.clone());
            dependency.class = dep.function.clone();
            ctx.attach(
                LayerParent::Sentence(sentence),
                LayerKind::Dependencies,
                &set,
                dependency,
            );
        }
        Ok(())
    }
}

pub struct TimeExpressionsConverter;

impl LayerConverter for TimeExpressionsConverter {
    fn name(&self) -> &'static str {
        "timeExpressions"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for timex in &naf.time_expressions {
            if timex.span.is_empty() {
                missing_span(
                    ctx,
                    &timex.id,
                    "time expression has no span and does not refer to the text, skipping",
                );
                continue;
            }
            let Some(span) = ctx.resolve(timex, SpanScope::Sentence)? else {
                continue;
            };
            let set = ctx.declare(AnnotationType::Entity, "timex3");
            let mut entity = annotation(
                ctx,
                SpanKind::Entity,
                &timex.id,
                &set,
                timex.timex_type.as_ref(),
                &span,
            );
            entity.features.extend(
                timex
                    .features()
                    .into_iter()
                    .map(|(subset, class)| Feature::new(subset, class)),
            );
            entity.comments.extend(timex.comment.clone());
            let parent = sentence_of(ctx, &span);
            ctx.attach(parent, LayerKind::Entities, &set, entity);
        }
        Ok(())
    }
}

/// Reports layers that are present but have no FoLiA counterpart
pub struct UnsupportedLayersConverter;

impl LayerConverter for UnsupportedLayersConverter {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        let context = ctx.document_id().to_string();
        for layer in &naf.unsupported {
            ctx.diagnostics.report(
                DiagnosticKind::UnsupportedLayer,
                layer.element_name(),
                &context,
                format!(
                    "{} can not be converted to FoLiA yet, skipping",
                    layer.title()
                ),
            );
        }
        Ok(())
    }
}

pub struct OpinionsConverter;

impl LayerConverter for OpinionsConverter {
    fn name(&self) -> &'static str {
        "opinions"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        for opinion in &naf.opinions {
            let Some(expression) = &opinion.expression else {
                missing_span(ctx, &opinion.id, "opinion has no expression, skipping");
                continue;
            };
            let head = SpanRef {
                owner: &opinion.id,
                ids: &expression.span,
            };
            let Some(span) = ctx.resolve(&head, SpanScope::Sentence)? else {
                continue;
            };
            let mut part = |ids: Option<&Vec<String>>| -> Result<Vec<WordIdx>> {
                let Some(ids) = ids else {
                    return Ok(Vec::new());
                };
                let source = SpanRef {
                    owner: &opinion.id,
                    ids,
                };
                Ok(ctx
                    .resolve(&source, SpanScope::Text)?
                    .map(Span::into_words)
                    .unwrap_or_default())
            };
            let source = part(opinion.holder.as_ref().map(|holder| &holder.span))?;
            let target = part(opinion.target.as_ref().map(|target| &target.span))?;

            let set = ctx.declare(AnnotationType::Sentiment, "sentiment");
            let mut sentiment = annotation(
                ctx,
                SpanKind::Sentiment { source, target },
                &opinion.id,
                &set,
                None,
                &span,
            );
            sentiment.features.extend(
                expression
                    .features()
                    .into_iter()
                    .map(|(subset, class)| Feature::new(subset, class)),
            );
            let parent = sentence_of(ctx, &span);
            ctx.attach(parent, LayerKind::Sentiments, &set, sentiment);
        }
        Ok(())
    }
}

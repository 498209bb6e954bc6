//! Token layer → words, sentences and paragraphs

use super::{Context, LayerConverter};
use crate::error::Result;
use crate::offsets::{infer_spaces, validate_offsets};
use nafolia_model::folia::AnnotationType;

const UNDEFINED_SET: &str = "undefined";

pub struct TextConverter;

impl LayerConverter for TextConverter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn convert(&self, ctx: &mut Context<'_>) -> Result<()> {
        let naf = ctx.naf;
        let offsets = validate_offsets(
            naf.raw.as_deref(),
            &naf.tokens,
            ctx.ids.document(),
            &mut ctx.diagnostics,
        );
        let spaces = infer_spaces(&naf.tokens);

        ctx.doc.text.content = naf.raw.clone();
        ctx.doc.declare(AnnotationType::Token, UNDEFINED_SET);
        ctx.doc.declare(AnnotationType::Sentence, UNDEFINED_SET);

        for ((token, offset), space) in naf.tokens.iter().zip(offsets).zip(spaces) {
            let sentence = ctx.structure.place(
                &mut ctx.doc.text,
                &ctx.ids,
                token.para.as_deref(),
                &token.sent,
            );
            let word = ctx
                .doc
                .text
                .add_word(sentence, ctx.ids.local(&token.id), token.text.as_str());
            let entry = ctx.doc.text.word_mut(word);
            entry.offset = offset;
            entry.space = space;
            ctx.tokens.register(token.id.as_str(), word)?;
        }

        if ctx.structure.paragraph_count() > 0 {
            ctx.doc.declare(AnnotationType::Paragraph, UNDEFINED_SET);
        }
        tracing::debug!(
            words = ctx.doc.text.words.len(),
            sentences = ctx.doc.text.sentences.len(),
            "text layer converted"
        );
        Ok(())
    }
}

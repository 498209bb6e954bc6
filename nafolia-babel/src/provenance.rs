//! Linguistic processor bookkeeping for generated NAF headers
//!
//! While FoLiA annotations are converted, every tool that produced them (the `annotator` of a
//! word, pos, lemma, dependency, ...) is recorded against the NAF layer the annotation ends up
//! in. After the body is complete the log becomes the `linguisticProcessors` blocks of the
//! header: for each layer that received output, the converter itself first, then every tool in
//! first-seen order.

use crate::options::ConvertOptions;
use chrono::{SecondsFormat, Utc};
use nafolia_model::folia::Provenance;
use nafolia_model::naf::{NafDocument, Processor};

/// Layers in the order their processor blocks are written
pub const LAYER_ORDER: [&str; 5] = ["text", "terms", "deps", "chunks", "entities"];

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
struct Tool {
    name: String,
    datetime: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct LayerLog {
    touched: bool,
    tools: Vec<Tool>,
}

#[derive(Debug, Clone, Default)]
pub struct ProvenanceLog {
    layers: Vec<(String, LayerLog)>,
}

impl ProvenanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn layer_mut(&mut self, layer: &str) -> &mut LayerLog {
        let position = match self.layers.iter().position(|(name, _)| name == layer) {
            Some(position) => position,
            None => {
                self.layers.push((layer.to_string(), LayerLog::default()));
                self.layers.len() - 1
            }
        };
        &mut self.layers[position].1
    }

    /// Mark `layer` as having received output
    pub fn touch(&mut self, layer: &str) {
        self.layer_mut(layer).touched = true;
    }

    /// Touch `layer` and remember the tool behind an annotation. Annotations without an
    /// annotator only touch; the first datetime seen for a tool is the one kept.
    pub fn record(&mut self, layer: &str, provenance: &Provenance) {
        let log = self.layer_mut(layer);
        log.touched = true;
        let Some(name) = provenance.annotator.as_deref() else {
            return;
        };
        if !log.tools.iter().any(|tool| tool.name == name) {
            log.tools.push(Tool {
                name: name.to_string(),
                datetime: provenance.datetime.clone(),
            });
        }
    }

    pub fn is_touched(&self, layer: &str) -> bool {
        self.layers
            .iter()
            .any(|(name, log)| name == layer && log.touched)
    }

    /// Names of the tools recorded for `layer`
    pub fn tools(&self, layer: &str) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|(name, _)| name == layer)
            .flat_map(|(_, log)| log.tools.iter().map(|tool| tool.name.as_str()))
            .collect()
    }

    /// Write the processor blocks into `doc`'s header
    ///
    /// Layers in [`LAYER_ORDER`] come first, any other touched layer after them in the order it
    /// was first touched.
    pub fn apply(&self, doc: &mut NafDocument, options: &ConvertOptions) {
        let now = options
            .timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let mut ordered: Vec<&(String, LayerLog)> = LAYER_ORDER
            .iter()
            .filter_map(|layer| self.layers.iter().find(|(name, _)| name == layer))
            .collect();
        ordered.extend(
            self.layers
                .iter()
                .filter(|(name, _)| !LAYER_ORDER.contains(&name.as_str())),
        );

        for (layer, log) in ordered {
            if !log.touched {
                continue;
            }
            doc.add_processor(
                layer,
                Processor {
                    name: options.processor_name.clone(),
                    version: Some(options.processor_version.clone()),
                    timestamp: Some(now.clone()),
                    begin_timestamp: Some(now.clone()),
                    ..Processor::default()
                },
            );
            for tool in &log.tools {
                let time = tool.datetime.clone().unwrap_or_else(|| UNKNOWN.to_string());
                doc.add_processor(
                    layer,
                    Processor {
                        name: tool.name.clone(),
                        version: None,
                        timestamp: Some(time.clone()),
                        begin_timestamp: Some(time.clone()),
                        end_timestamp: Some(time),
                        hostname: Some(UNKNOWN.to_string()),
                    },
                );
            }
        }
    }
}

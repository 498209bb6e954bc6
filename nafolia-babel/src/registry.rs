//! Conversion registry for conversion discovery and selection
//!
//! Conversions are registered by name and can be looked up either by that name or by the pair
//! of formats they connect.

use crate::conversion::{Conversion, ConversionOutput, FormatKind};
use crate::error::{ConversionError, Result};
use crate::options::ConvertOptions;
use std::collections::HashMap;

/// Registry of conversions
///
/// # Examples
///
/// ```ignore
/// let registry = ConversionRegistry::with_defaults();
/// let output = registry.convert(&source, FormatKind::Naf, FormatKind::Folia, &options)?;
/// ```
pub struct ConversionRegistry {
    conversions: HashMap<String, Box<dyn Conversion>>,
}

impl ConversionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ConversionRegistry {
            conversions: HashMap::new(),
        }
    }

    /// Register a conversion
    ///
    /// A conversion with the same name is replaced.
    pub fn register<C: Conversion + 'static>(&mut self, conversion: C) {
        self.conversions
            .insert(conversion.name().to_string(), Box::new(conversion));
    }

    /// Get a conversion by name
    pub fn get(&self, name: &str) -> Option<&dyn Conversion> {
        self.conversions.get(name).map(|c| c.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.conversions.contains_key(name)
    }

    /// All conversion names (sorted)
    pub fn list_conversions(&self) -> Vec<String> {
        let mut names: Vec<_> = self.conversions.keys().cloned().collect();
        names.sort();
        names
    }

    /// The conversion from `from` to `to`; the alphabetically first one when several qualify
    pub fn find(&self, from: FormatKind, to: FormatKind) -> Result<&dyn Conversion> {
        self.list_conversions()
            .iter()
            .filter_map(|name| self.get(name))
            .find(|c| c.source() == from && c.target() == to)
            .ok_or_else(|| ConversionError::ConversionNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Convert `source` from one format to another
    pub fn convert(
        &self,
        source: &str,
        from: FormatKind,
        to: FormatKind,
        options: &ConvertOptions,
    ) -> Result<ConversionOutput> {
        let conversion = self.find(from, to)?;
        tracing::info!(conversion = conversion.name(), "converting");
        conversion.convert(source, options)
    }

    /// Create a registry with both built-in directions
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::mappings::naf_to_folia::NafToFolia::new());
        registry.register(crate::mappings::folia_to_naf::FoliaToNaf::new());
        registry
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

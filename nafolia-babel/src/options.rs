//! Conversion options
//!
//! Plain values with sensible defaults. nafolia-config fills these from layered configuration
//! files; library users can build them directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the set definitions referenced by generated FoLiA documents live
pub const DEFAULT_SET_BASE_URL: &str =
    "https://raw.githubusercontent.com/proycon/folia/master/setdefinitions/";

/// FoLiA versions the FoLiA → NAF direction has been checked against
pub const DEFAULT_TESTED_VERSIONS: &[&str] = &["1.2.0"];

/// How competing senses of one resource on one word are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenseMode {
    /// Highest confidence first as the primary sense, every other one in its own alternative
    #[default]
    Ranked,
    /// Every sense as a primary annotation, in encounter order
    Flat,
}

impl FromStr for SenseMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "ranked" => Ok(SenseMode::Ranked),
            "flat" => Ok(SenseMode::Flat),
            other => Err(format!("unknown sense mode '{other}', expected 'ranked' or 'flat'")),
        }
    }
}

impl fmt::Display for SenseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenseMode::Ranked => write!(f, "ranked"),
            SenseMode::Flat => write!(f, "flat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Explicit id for the generated FoLiA document
    pub document_id: Option<String>,
    /// Name of the input (usually its path), used to derive a document id
    pub source_name: Option<String>,
    pub sense_mode: SenseMode,
    pub set_base_url: String,
    pub tested_versions: Vec<String>,
    /// Name recorded for this converter in the NAF header
    pub processor_name: String,
    pub processor_version: String,
    /// Fixed timestamp for the NAF header, the current time when unset
    pub timestamp: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            document_id: None,
            source_name: None,
            sense_mode: SenseMode::default(),
            set_base_url: DEFAULT_SET_BASE_URL.to_string(),
            tested_versions: DEFAULT_TESTED_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            processor_name: "nafolia".to_string(),
            processor_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: None,
        }
    }
}

impl ConvertOptions {
    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_sense_mode(mut self, mode: SenseMode) -> Self {
        self.sense_mode = mode;
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// URL of the set definition `naf_<name>.foliaset.xml`
    pub fn set_url(&self, name: &str) -> String {
        format!("{}naf_{}.foliaset.xml", self.set_base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_url() {
        let options = ConvertOptions::default();
        assert_eq!(
            options.set_url("pos"),
            "https://raw.githubusercontent.com/proycon/folia/master/setdefinitions/naf_pos.foliaset.xml"
        );
    }

    #[test]
    fn test_sense_mode_parsing() {
        assert_eq!("Flat".parse::<SenseMode>(), Ok(SenseMode::Flat));
        assert_eq!("ranked".parse::<SenseMode>(), Ok(SenseMode::Ranked));
        assert!("best".parse::<SenseMode>().is_err());
    }
}

//! Conversion stages
//!
//! A run moves through the stages strictly in order. Text must be converted before terms (terms
//! resolve their tokens through the identifier registry), terms before the other layers (spans
//! resolve through terms). Layers after terms do not depend on each other.

use crate::error::{ConversionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Initialized,
    TextConverted,
    TermsConverted,
    LayersConverted,
    Finalized,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Initialized => Some(Stage::TextConverted),
            Stage::TextConverted => Some(Stage::TermsConverted),
            Stage::TermsConverted => Some(Stage::LayersConverted),
            Stage::LayersConverted => Some(Stage::Finalized),
            Stage::Finalized => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageTracker {
    current: Stage,
}

impl Default for StageTracker {
    fn default() -> Self {
        StageTracker {
            current: Stage::Initialized,
        }
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Fail unless the run is exactly at `stage`
    pub fn require(&self, stage: Stage) -> Result<()> {
        if self.current == stage {
            Ok(())
        } else {
            Err(ConversionError::StageOrder {
                expected: stage,
                found: self.current,
            })
        }
    }

    /// Move to `stage`, which must directly follow the current one
    pub fn advance(&mut self, stage: Stage) -> Result<()> {
        if self.current.next() == Some(stage) {
            tracing::debug!(from = ?self.current, to = ?stage, "conversion stage");
            self.current = stage;
            Ok(())
        } else {
            Err(ConversionError::StageOrder {
                expected: stage,
                found: self.current,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_advance_in_order() {
        let mut tracker = StageTracker::new();
        for stage in [
            Stage::TextConverted,
            Stage::TermsConverted,
            Stage::LayersConverted,
            Stage::Finalized,
        ] {
            tracker.advance(stage).expect("in order");
        }
        assert_eq!(tracker.current(), Stage::Finalized);
    }

    #[test]
    fn test_skipping_a_stage_fails() {
        let mut tracker = StageTracker::new();
        let err = tracker.advance(Stage::TermsConverted).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::StageOrder {
                expected: Stage::TermsConverted,
                found: Stage::Initialized
            }
        ));
    }

    #[test]
    fn test_require_checks_current_stage() {
        let mut tracker = StageTracker::new();
        assert!(tracker.require(Stage::TextConverted).is_err());
        tracker.advance(Stage::TextConverted).expect("in order");
        assert!(tracker.require(Stage::TextConverted).is_ok());
    }
}

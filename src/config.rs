use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Largest reference-index gap a single match may jump past the cursor.
    pub lookahead_window: usize,
    /// Following edited words checked before a forward jump is accepted.
    /// Zero accepts the nearest in-window candidate unconditionally.
    pub resync_probe: usize,
    /// Extrapolation rate used when anchors cannot provide one.
    pub default_words_per_second: f64,
    pub insert_turn_separators: bool,
    /// Copy a matched reference word's speaker onto an unlabeled edited word.
    pub carry_speaker_labels: bool,
}

impl AlignmentConfig {
    pub const DEFAULT_LOOKAHEAD_WINDOW: usize = 32;
    pub const DEFAULT_RESYNC_PROBE: usize = 0;
    pub const DEFAULT_WORDS_PER_SECOND: f64 = 2.5;

    pub fn load(path: &Path) -> Result<Self, TranscriptError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| TranscriptError::io("read alignment config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| TranscriptError::json("parse alignment config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TranscriptError> {
        if self.lookahead_window == 0 {
            return Err(TranscriptError::malformed(
                "alignment config",
                "lookahead_window must be at least 1",
            ));
        }
        if !self.default_words_per_second.is_finite() || self.default_words_per_second <= 0.0 {
            return Err(TranscriptError::malformed(
                "alignment config",
                format!(
                    "default_words_per_second must be positive, got {}",
                    self.default_words_per_second
                ),
            ));
        }
        Ok(())
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            lookahead_window: Self::DEFAULT_LOOKAHEAD_WINDOW,
            resync_probe: Self::DEFAULT_RESYNC_PROBE,
            default_words_per_second: Self::DEFAULT_WORDS_PER_SECOND,
            insert_turn_separators: false,
            carry_speaker_labels: true,
        }
    }
}

use crate::config::AlignmentConfig;
use crate::error::TranscriptError;
use crate::pipeline::defaults::{LinearGapFiller, OverlapSpeakerAssigner, WindowedSequenceMatcher};
use crate::pipeline::runtime::{Reconciler, ReconcilerParts};
use crate::pipeline::traits::{GapFiller, SequenceMatcher, SpeakerAssigner};

pub struct ReconcilerBuilder {
    config: AlignmentConfig,
    sequence_matcher: Option<Box<dyn SequenceMatcher>>,
    gap_filler: Option<Box<dyn GapFiller>>,
    speaker_assigner: Option<Box<dyn SpeakerAssigner>>,
}

impl ReconcilerBuilder {
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            config,
            sequence_matcher: None,
            gap_filler: None,
            speaker_assigner: None,
        }
    }

    pub fn with_config(mut self, config: AlignmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sequence_matcher(mut self, sequence_matcher: Box<dyn SequenceMatcher>) -> Self {
        self.sequence_matcher = Some(sequence_matcher);
        self
    }

    pub fn with_gap_filler(mut self, gap_filler: Box<dyn GapFiller>) -> Self {
        self.gap_filler = Some(gap_filler);
        self
    }

    pub fn with_speaker_assigner(mut self, speaker_assigner: Box<dyn SpeakerAssigner>) -> Self {
        self.speaker_assigner = Some(speaker_assigner);
        self
    }

    pub fn build(self) -> Result<Reconciler, TranscriptError> {
        self.config.validate()?;
        Ok(Reconciler::from_parts(ReconcilerParts {
            config: self.config,
            sequence_matcher: self
                .sequence_matcher
                .unwrap_or_else(|| Box::new(WindowedSequenceMatcher)),
            gap_filler: self.gap_filler.unwrap_or_else(|| Box::new(LinearGapFiller)),
            speaker_assigner: self
                .speaker_assigner
                .unwrap_or_else(|| Box::new(OverlapSpeakerAssigner)),
        }))
    }
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new(AlignmentConfig::default())
    }
}

use crate::alignment::matcher::AlignmentOutcome;
use crate::alignment::report::InterpolationStats;
use crate::config::AlignmentConfig;
use crate::types::{Diarization, TimedWord, Word};

pub trait SequenceMatcher: Send + Sync {
    fn match_sequence(
        &self,
        edited: &[Word],
        reference: &[TimedWord],
        config: &AlignmentConfig,
    ) -> AlignmentOutcome;
}

pub trait GapFiller: Send + Sync {
    fn fill_gaps(&self, words: &[Word], words_per_second: f64) -> (Vec<Word>, InterpolationStats);
}

/// Returns the labeled words together with the number of words it labeled.
pub trait SpeakerAssigner: Send + Sync {
    fn assign(&self, words: &[Word], diarization: &Diarization) -> (Vec<Word>, usize);
}

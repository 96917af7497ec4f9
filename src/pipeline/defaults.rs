use crate::alignment::diarization_overlay::assign_speakers;
use crate::alignment::interpolation::interpolate_with_rate;
use crate::alignment::matcher::{align_with_stats, AlignmentOutcome};
use crate::alignment::report::InterpolationStats;
use crate::config::AlignmentConfig;
use crate::pipeline::traits::{GapFiller, SequenceMatcher, SpeakerAssigner};
use crate::types::{Diarization, TimedWord, Word};

pub struct WindowedSequenceMatcher;

impl SequenceMatcher for WindowedSequenceMatcher {
    fn match_sequence(
        &self,
        edited: &[Word],
        reference: &[TimedWord],
        config: &AlignmentConfig,
    ) -> AlignmentOutcome {
        align_with_stats(edited, reference, config)
    }
}

pub struct LinearGapFiller;

impl GapFiller for LinearGapFiller {
    fn fill_gaps(&self, words: &[Word], words_per_second: f64) -> (Vec<Word>, InterpolationStats) {
        interpolate_with_rate(words, words_per_second)
    }
}

/// Labels words from diarization turns using the session's display labels.
pub struct OverlapSpeakerAssigner;

impl SpeakerAssigner for OverlapSpeakerAssigner {
    fn assign(&self, words: &[Word], diarization: &Diarization) -> (Vec<Word>, usize) {
        assign_speakers(words, &diarization.segments, Some(&diarization.speakers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::matcher::align;
    use crate::types::{words_from_plain_text, DiarizationSegment, SpeakerMap};

    #[test]
    fn windowed_matcher_delegates_to_align() {
        let reference = TimedWord::from_timed_words(&[
            Word::new(1, "hello").with_times(0.0, 0.4),
            Word::new(2, "world").with_times(0.5, 0.9),
        ]);
        let edited = words_from_plain_text("hello there world");
        let outcome =
            WindowedSequenceMatcher.match_sequence(&edited, &reference, &AlignmentConfig::default());
        assert_eq!(outcome.words, align(&edited, &reference));
        assert_eq!(outcome.stats.inserted, 1);
    }

    #[test]
    fn linear_gap_filler_uses_given_rate() {
        let words = vec![Word::new(1, "a").with_times(1.0, 1.5), Word::new(2, "b")];
        let (filled, stats) = LinearGapFiller.fill_gaps(&words, 4.0);
        assert_eq!(filled[1].start_time, Some(1.5));
        assert_eq!(filled[1].end_time, Some(1.75));
        assert_eq!(stats.extrapolated, 1);
    }

    #[test]
    fn overlap_assigner_applies_display_labels() {
        let mut speakers = SpeakerMap::identity(["0"]);
        speakers.rename("0", "Interviewer");
        let diarization = Diarization {
            segments: vec![DiarizationSegment {
                start_time: 0.0,
                end_time: 2.0,
                raw_speaker_id: "0".into(),
            }],
            speakers,
        };
        let words = vec![Word::new(1, "hi").with_times(0.1, 0.3)];
        let (labeled, count) = OverlapSpeakerAssigner.assign(&words, &diarization);
        assert_eq!(labeled[0].speaker_label.as_deref(), Some("Interviewer"));
        assert_eq!(count, 1);
    }
}

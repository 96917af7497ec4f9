use crate::alignment::diarization_overlay::segment_paragraphs;
use crate::alignment::report::ReconcileReport;
use crate::alignment::tags::{label_tags_from_neighbors, reconstruct, strip};
use crate::config::AlignmentConfig;
use crate::pipeline::traits::{GapFiller, SequenceMatcher, SpeakerAssigner};
use crate::types::{Diarization, SpeakerTagInfo, TimedWord, Word};

pub struct Reconciler {
    config: AlignmentConfig,
    sequence_matcher: Box<dyn SequenceMatcher>,
    gap_filler: Box<dyn GapFiller>,
    speaker_assigner: Box<dyn SpeakerAssigner>,
}

pub(crate) struct ReconcilerParts {
    pub config: AlignmentConfig,
    pub sequence_matcher: Box<dyn SequenceMatcher>,
    pub gap_filler: Box<dyn GapFiller>,
    pub speaker_assigner: Box<dyn SpeakerAssigner>,
}

/// Result of one full reconciliation pass.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub words: Vec<Word>,
    /// Inline tags that were stripped before alignment and put back after.
    pub tags: Vec<SpeakerTagInfo>,
    pub report: ReconcileReport,
}

impl Reconciler {
    pub(crate) fn from_parts(parts: ReconcilerParts) -> Self {
        Self {
            config: parts.config,
            sequence_matcher: parts.sequence_matcher,
            gap_filler: parts.gap_filler,
            speaker_assigner: parts.speaker_assigner,
        }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Recovers timing and speakers for an edited sequence.
    ///
    /// Inline tags are stripped, the content is aligned against `reference`,
    /// gaps are interpolated, diarization (when given) labels the remaining
    /// words, the tags are reinserted and paragraphs are re-derived from
    /// speaker turns.
    pub fn reconcile(
        &self,
        edited: &[Word],
        reference: &[TimedWord],
        diarization: Option<&Diarization>,
    ) -> Reconciliation {
        let (content, tags) = strip_untimed_tags(edited);
        let aligned = self
            .sequence_matcher
            .match_sequence(&content, reference, &self.config);
        let (timed, interpolation) = self
            .gap_filler
            .fill_gaps(&aligned.words, self.config.default_words_per_second);

        let (labeled, labeled_words) = match diarization {
            Some(diarization) if !diarization.segments.is_empty() => {
                self.speaker_assigner.assign(&timed, diarization)
            }
            _ => (timed, 0),
        };

        let rebuilt = label_tags_from_neighbors(&reconstruct(&labeled, &tags));
        let words = segment_paragraphs(&rebuilt, self.config.insert_turn_separators);
        let paragraphs = words
            .iter()
            .filter(|w| w.is_paragraph_start && !w.is_separator())
            .count();

        let report = ReconcileReport::new(
            aligned.stats,
            interpolation,
            labeled_words,
            tags.len(),
            paragraphs,
        );
        tracing::info!(
            words = words.len(),
            tags = tags.len(),
            labeled_words,
            paragraphs,
            "reconcile: pass complete"
        );
        Reconciliation { words, tags, report }
    }

    /// Carries timing from a stored sequence onto freshly edited words without
    /// interpolating or relabeling. Unmatched words stay untimed.
    pub fn carry_over(&self, edited: &[Word], reference: &[TimedWord]) -> Vec<Word> {
        let (content, tags) = strip_untimed_tags(edited);
        let aligned = self
            .sequence_matcher
            .match_sequence(&content, reference, &self.config);
        reconstruct(&aligned.words, &tags)
    }
}

/// Tag pseudo-words never carry timing out of a pass.
fn strip_untimed_tags(edited: &[Word]) -> (Vec<Word>, Vec<SpeakerTagInfo>) {
    let (content, mut tags) = strip(edited);
    for word in tags.iter_mut().flat_map(|tag| tag.tag_words.iter_mut()) {
        word.clear_times();
    }
    (content, tags)
}

use crate::types::{renumber, DiarizationSegment, SpeakerMap, Word};

/// Labels timed, unlabeled words with the raw speaker id of the segment
/// covering their start time.
pub fn overlay_diarization(words: &[Word], segments: &[DiarizationSegment]) -> Vec<Word> {
    assign_speakers(words, segments, None).0
}

/// Same as [`overlay_diarization`] but writes the mapped display label.
pub fn overlay_diarization_with_map(
    words: &[Word],
    segments: &[DiarizationSegment],
    speakers: &SpeakerMap,
) -> Vec<Word> {
    assign_speakers(words, segments, Some(speakers)).0
}

/// Returns the labeled words and how many words received a label.
///
/// Words that already carry a label, have no start time, or are separators
/// are left as they are. Every other word gets a label whenever `segments` is
/// non-empty.
pub fn assign_speakers(
    words: &[Word],
    segments: &[DiarizationSegment],
    speakers: Option<&SpeakerMap>,
) -> (Vec<Word>, usize) {
    let mut out = words.to_vec();
    let mut labeled = 0;
    if segments.is_empty() {
        return (out, labeled);
    }

    for word in out.iter_mut() {
        if word.is_separator() || word.speaker_label.is_some() {
            continue;
        }
        let Some(start) = word.start_time else {
            continue;
        };
        if let Some(segment) = speaker_at(start, segments) {
            let raw = segment.raw_speaker_id.as_str();
            let label = speakers.map_or(raw, |map| map.display_label(raw));
            word.speaker_label = Some(label.to_string());
            labeled += 1;
        }
    }

    tracing::debug!(labeled, segments = segments.len(), "diarization: speakers assigned");
    (out, labeled)
}

/// Segment responsible for `time`.
///
/// Containment uses half-open `[start, end)` intervals; when several segments
/// contain the time the one starting latest wins. Otherwise the segment with
/// the smallest boundary distance wins, preferring one that ends before
/// `time` on a tie. Remaining ties go to the earlier segment in `segments`.
pub fn speaker_at(time: f64, segments: &[DiarizationSegment]) -> Option<&DiarizationSegment> {
    let mut containing: Option<&DiarizationSegment> = None;
    for segment in segments.iter().filter(|s| s.contains(time)) {
        if containing.is_none_or(|best| segment.start_time > best.start_time) {
            containing = Some(segment);
        }
    }
    if containing.is_some() {
        return containing;
    }

    let mut nearest: Option<(&DiarizationSegment, f64)> = None;
    for segment in segments {
        let distance = segment.boundary_distance(time);
        let better = match nearest {
            None => true,
            Some((best, best_distance)) => {
                distance < best_distance
                    || (distance == best_distance
                        && segment.ends_before(time)
                        && !best.ends_before(time))
            }
        };
        if better {
            nearest = Some((segment, distance));
        }
    }
    nearest.map(|(segment, _)| segment)
}

/// Marks the first word of every speaker turn as a paragraph start.
///
/// Existing separator words are dropped and, when `insert_separators` is set,
/// a fresh separator goes before each turn after the first. Unlabeled words
/// continue the current turn. Paragraph starts already present (for example
/// from blank lines in free text) are kept.
pub fn segment_paragraphs(words: &[Word], insert_separators: bool) -> Vec<Word> {
    let mut out: Vec<Word> = Vec::with_capacity(words.len());
    let mut current: Option<&str> = None;
    let mut turns = 0usize;

    for source in words.iter().filter(|w| !w.is_separator()) {
        let label = source.speaker_label.as_deref();
        let new_turn = match (current, label) {
            (_, None) => out.is_empty(),
            (None, Some(_)) => true,
            (Some(prev), Some(label)) => prev != label,
        };
        let mut word = source.clone();
        if new_turn {
            if insert_separators && !out.is_empty() {
                out.push(Word::separator(0));
            }
            word.is_paragraph_start = true;
            turns += 1;
        }
        if label.is_some() {
            current = label;
        }
        out.push(word);
    }

    renumber(&mut out);
    tracing::debug!(turns, words = out.len(), "diarization: paragraphs segmented");
    out
}

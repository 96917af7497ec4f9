use std::collections::HashMap;

use crate::alignment::report::AlignmentStats;
use crate::config::AlignmentConfig;
use crate::types::{TimedWord, Word};

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentOutcome {
    pub words: Vec<Word>,
    pub stats: AlignmentStats,
}

/// Reference positions grouped by normalized text, ascending.
struct ReferenceIndex<'a> {
    positions: HashMap<&'a str, Vec<usize>>,
}

impl<'a> ReferenceIndex<'a> {
    fn build(reference: &'a [TimedWord]) -> Self {
        let mut positions: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, word) in reference.iter().enumerate() {
            if word.normalized_text.is_empty() {
                continue;
            }
            positions
                .entry(word.normalized_text.as_str())
                .or_default()
                .push(idx);
        }
        Self { positions }
    }

    /// Nearest candidate at or after `cursor`; being the first such position
    /// it is also the one with the smallest gap.
    fn next_at_or_after(&self, text: &str, cursor: usize) -> Option<usize> {
        let candidates = self.positions.get(text)?;
        let at = candidates.partition_point(|&pos| pos < cursor);
        candidates.get(at).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Match(usize),
    Insertion,
    /// A candidate exists but jumping to it would exceed the look-ahead window.
    WindowExceeded(usize),
    /// A later edited word matches inside the gap; this word is an insertion.
    Resync(usize),
}

/// Aligns `edited` against `reference` with the default configuration.
pub fn align(edited: &[Word], reference: &[TimedWord]) -> Vec<Word> {
    align_with_stats(edited, reference, &AlignmentConfig::default()).words
}

/// Copies timing from `reference` onto `edited` while keeping the edited text,
/// order and length.
///
/// The walk is left to right with a reference cursor that only moves forward.
/// Each matchable edited word takes the first reference occurrence of its
/// normalized text at or after the cursor, provided the jump stays within
/// `lookahead_window`. With a non-zero `resync_probe`, the jump is refused
/// when one of the next `resync_probe` edited words matches inside the
/// skipped range and the edited word after it matches the reference word
/// right after that in-gap position. Every match consumes exactly one reference word;
/// reference words the cursor passes without matching are deletions and emit
/// nothing. Unmatched edited words have no times.
pub fn align_with_stats(
    edited: &[Word],
    reference: &[TimedWord],
    config: &AlignmentConfig,
) -> AlignmentOutcome {
    let mut stats = AlignmentStats {
        edited_words: edited.len(),
        reference_words: reference.len(),
        ..AlignmentStats::default()
    };
    let mut words: Vec<Word> = edited
        .iter()
        .enumerate()
        .map(|(idx, word)| {
            let mut word = word.clone();
            word.sequence_number = idx + 1;
            word.clear_times();
            word
        })
        .collect();

    if reference.is_empty() {
        stats.no_reference = true;
        stats.inserted = edited.iter().filter(|w| w.is_matchable()).count();
        tracing::info!(
            edited_words = edited.len(),
            "alignment: no reference data, all words left unmatched"
        );
        return AlignmentOutcome { words, stats };
    }

    let index = ReferenceIndex::build(reference);
    let mut cursor = 0usize;

    for idx in 0..edited.len() {
        if !edited[idx].is_matchable() {
            continue;
        }
        match decide(edited, idx, reference, &index, cursor, config) {
            Decision::Match(pos) => {
                let source = &reference[pos];
                let word = &mut words[idx];
                word.start_time = Some(source.start_time);
                word.end_time = Some(source.end_time);
                if config.carry_speaker_labels && word.speaker_label.is_none() {
                    word.speaker_label = source.speaker_label.clone();
                }
                cursor = pos + 1;
                stats.matched += 1;
            }
            Decision::Insertion => {
                stats.inserted += 1;
            }
            Decision::WindowExceeded(pos) => {
                tracing::debug!(
                    word = edited[idx].display_text.as_str(),
                    cursor,
                    candidate = pos,
                    window = config.lookahead_window,
                    "alignment: candidate beyond look-ahead window"
                );
                stats.inserted += 1;
                stats.window_exceeded += 1;
            }
            Decision::Resync(pos) => {
                tracing::debug!(
                    word = edited[idx].display_text.as_str(),
                    cursor,
                    candidate = pos,
                    "alignment: later word matches inside the gap, treating as insertion"
                );
                stats.inserted += 1;
            }
        }
    }
    stats.deleted = reference.len() - stats.matched;

    if stats.window_exceeded > 0 {
        tracing::warn!(
            window_exceeded = stats.window_exceeded,
            window = config.lookahead_window,
            "alignment: words left unmatched by the look-ahead window"
        );
    }
    tracing::info!(
        matched = stats.matched,
        inserted = stats.inserted,
        deleted = stats.deleted,
        "alignment: pass complete"
    );
    AlignmentOutcome { words, stats }
}

fn decide(
    edited: &[Word],
    idx: usize,
    reference: &[TimedWord],
    index: &ReferenceIndex<'_>,
    cursor: usize,
    config: &AlignmentConfig,
) -> Decision {
    let Some(pos) = index.next_at_or_after(&edited[idx].normalized_text, cursor) else {
        return Decision::Insertion;
    };
    let gap = pos - cursor;
    if gap > config.lookahead_window {
        return Decision::WindowExceeded(pos);
    }
    if gap > 0
        && config.resync_probe > 0
        && gap_holds_agreeing_run(edited, idx, reference, index, cursor, pos, config.resync_probe)
    {
        return Decision::Resync(pos);
    }
    Decision::Match(pos)
}

/// Whether one of the next `lookahead` matchable edited words has a candidate `q`
/// in `[cursor, limit)` and the matchable edited word after it equals
/// `reference[q + 1]`. A lone common word inside the gap is not enough.
fn gap_holds_agreeing_run(
    edited: &[Word],
    idx: usize,
    reference: &[TimedWord],
    index: &ReferenceIndex<'_>,
    cursor: usize,
    limit: usize,
    lookahead: usize,
) -> bool {
    let later: Vec<&Word> = edited[idx + 1..]
        .iter()
        .filter(|w| w.is_matchable())
        .take(lookahead + 1)
        .collect();
    later.iter().take(lookahead).enumerate().any(|(k, word)| {
        let Some(q) = index
            .next_at_or_after(&word.normalized_text, cursor)
            .filter(|&q| q < limit)
        else {
            return false;
        };
        later
            .get(k + 1)
            .zip(reference.get(q + 1))
            .is_some_and(|(next, after)| next.normalized_text == after.normalized_text)
    })
}

#[cfg(test)]
mod tests;

use crate::alignment::report::InterpolationStats;
use crate::config::AlignmentConfig;
use crate::types::{renumber, Word};

/// Fills missing times with the default speaking rate for extrapolation.
pub fn interpolate(words: &[Word]) -> Vec<Word> {
    interpolate_with_rate(words, AlignmentConfig::DEFAULT_WORDS_PER_SECOND).0
}

/// Assigns times to every untimed word from the surrounding anchors (words
/// that already carry a `start_time`).
///
/// Runs between two anchors are spread evenly over the gap between the
/// previous anchor's end and the next anchor's start. Leading and trailing
/// runs are extrapolated at the per-word duration measured between the two
/// nearest anchors, falling back to `words_per_second` when fewer than two
/// anchors exist or their spacing is degenerate. Separator words are skipped
/// and stay untimed. A last pass raises any start time that falls below its
/// predecessor's so start times never decrease.
pub fn interpolate_with_rate(words: &[Word], words_per_second: f64) -> (Vec<Word>, InterpolationStats) {
    let mut out = words.to_vec();
    renumber(&mut out);
    let mut stats = InterpolationStats::default();

    // Positions in `out` of every non-separator word.
    let slots: Vec<usize> = out
        .iter()
        .enumerate()
        .filter(|(_, w)| !w.is_separator())
        .map(|(idx, _)| idx)
        .collect();
    let anchors: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, &idx)| out[idx].start_time.is_some())
        .map(|(slot, _)| slot)
        .collect();
    stats.anchors = anchors.len();

    let (Some(&first), Some(&last)) = (anchors.first(), anchors.last()) else {
        tracing::debug!(words = out.len(), "interpolation: no anchors, sequence left untimed");
        return (out, stats);
    };
    let fallback = fallback_duration(words_per_second);

    // Leading run.
    if first > 0 {
        let duration = if anchors.len() >= 2 {
            anchor_duration(&out, &slots, anchors[0], anchors[1]).unwrap_or(fallback)
        } else {
            fallback
        };
        let t0 = start_of(&out[slots[first]]);
        for slot in 0..first {
            let start = (t0 - (first - slot) as f64 * duration).max(0.0);
            let end = (start + duration).min(t0).max(start);
            set_times(&mut out[slots[slot]], start, end);
        }
        stats.extrapolated += first;
        tracing::debug!(words = first, duration, "interpolation: leading run extrapolated");
    }

    // Internal runs.
    for pair in anchors.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let run = next - prev - 1;
        if run == 0 {
            continue;
        }
        let prev_word = &out[slots[prev]];
        let prev_start = start_of(prev_word);
        let hi = start_of(&out[slots[next]]);
        let lo = prev_word.end_time.unwrap_or(prev_start).min(hi).max(prev_start);
        let step = (hi - lo) / (run + 1) as f64;
        for j in 1..=run {
            let start = lo + step * j as f64;
            set_times(&mut out[slots[prev + j]], start, start + step);
        }
        stats.interpolated += run;
        tracing::debug!(words = run, from = lo, to = hi, "interpolation: internal run filled");
    }

    // Trailing run.
    let trailing = slots.len() - last - 1;
    if trailing > 0 {
        let duration = if anchors.len() >= 2 {
            let n = anchors.len();
            anchor_duration(&out, &slots, anchors[n - 2], anchors[n - 1]).unwrap_or(fallback)
        } else {
            fallback
        };
        let last_word = &out[slots[last]];
        let base = last_word.end_time.unwrap_or_else(|| start_of(last_word));
        for k in 1..=trailing {
            let start = base + (k - 1) as f64 * duration;
            set_times(&mut out[slots[last + k]], start, start + duration);
        }
        stats.extrapolated += trailing;
        tracing::debug!(words = trailing, duration, "interpolation: trailing run extrapolated");
    }

    stats.clamped = enforce_monotone_starts(&mut out, &slots);
    tracing::info!(
        anchors = stats.anchors,
        interpolated = stats.interpolated,
        extrapolated = stats.extrapolated,
        clamped = stats.clamped,
        "interpolation: pass complete"
    );
    (out, stats)
}

fn fallback_duration(words_per_second: f64) -> f64 {
    if words_per_second.is_finite() && words_per_second > 0.0 {
        1.0 / words_per_second
    } else {
        1.0 / AlignmentConfig::DEFAULT_WORDS_PER_SECOND
    }
}

/// Seconds per word between two anchors, `None` when the spacing is not
/// positive.
fn anchor_duration(out: &[Word], slots: &[usize], a: usize, b: usize) -> Option<f64> {
    let dt = start_of(&out[slots[b]]) - start_of(&out[slots[a]]);
    let duration = dt / (b - a) as f64;
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

fn start_of(word: &Word) -> f64 {
    word.start_time.unwrap_or(0.0)
}

fn set_times(word: &mut Word, start: f64, end: f64) {
    word.start_time = Some(start);
    word.end_time = Some(end);
}

fn enforce_monotone_starts(out: &mut [Word], slots: &[usize]) -> usize {
    let mut clamped = 0;
    let mut floor = f64::NEG_INFINITY;
    for &idx in slots {
        let word = &mut out[idx];
        let Some(start) = word.start_time else {
            continue;
        };
        if start < floor {
            tracing::warn!(
                word = word.display_text.as_str(),
                start,
                floor,
                "interpolation: start time raised to keep timing monotone"
            );
            word.start_time = Some(floor);
            clamped += 1;
        }
        floor = floor.max(start);
        if let (Some(start), Some(end)) = (word.start_time, word.end_time) {
            if end < start {
                word.end_time = Some(start);
            }
        }
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(words: &[Word]) -> Vec<f64> {
        words.iter().filter_map(|w| w.start_time).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn inserted_word_lands_between_neighbours() {
        let words = vec![
            Word::new(1, "Hello").with_times(0.0, 0.4),
            Word::new(2, "there"),
            Word::new(3, "world").with_times(0.5, 0.9),
        ];
        let (out, stats) = interpolate_with_rate(&words, 2.5);
        let there = out[1].start_time.unwrap();
        assert!(there > 0.4 && there < 0.5);
        assert!(close(there, 0.45));
        assert_eq!(stats.interpolated, 1);
        assert_eq!(stats.anchors, 2);
        assert_eq!(out[0], words[0]);
    }

    #[test]
    fn internal_run_is_evenly_spaced() {
        let words = vec![
            Word::new(1, "a").with_times(1.0, 1.0),
            Word::new(2, "b"),
            Word::new(3, "c"),
            Word::new(4, "d"),
            Word::new(5, "e").with_times(2.0, 2.5),
        ];
        let out = interpolate(&words);
        let got = starts(&out);
        for (actual, expected) in got.iter().zip([1.0, 1.25, 1.5, 1.75, 2.0]) {
            assert!(close(*actual, expected), "{got:?}");
        }
    }

    #[test]
    fn leading_run_extrapolates_backwards_at_anchor_rate() {
        let words = vec![
            Word::new(1, "x"),
            Word::new(2, "y"),
            Word::new(3, "a").with_times(4.0, 4.5),
            Word::new(4, "b").with_times(5.0, 5.5),
        ];
        let (out, stats) = interpolate_with_rate(&words, 2.5);
        assert!(close(out[0].start_time.unwrap(), 2.0));
        assert!(close(out[1].start_time.unwrap(), 3.0));
        assert!(close(out[1].end_time.unwrap(), 4.0));
        assert_eq!(stats.extrapolated, 2);
    }

    #[test]
    fn leading_run_never_goes_negative() {
        let words = vec![Word::new(1, "x"), Word::new(2, "y"), Word::new(3, "a").with_times(0.2, 0.5)];
        let out = interpolate(&words);
        assert!(out.iter().all(|w| w.start_time.unwrap() >= 0.0));
        assert!(out.iter().all(Word::has_consistent_timing));
    }

    #[test]
    fn single_anchor_uses_default_rate_forward() {
        let words = vec![
            Word::new(1, "a").with_times(1.0, 1.5),
            Word::new(2, "b"),
            Word::new(3, "c"),
        ];
        let (out, stats) = interpolate_with_rate(&words, 2.0);
        assert!(close(out[1].start_time.unwrap(), 1.5));
        assert!(close(out[2].start_time.unwrap(), 2.0));
        assert!(close(out[2].end_time.unwrap(), 2.5));
        assert_eq!(stats.extrapolated, 2);
    }

    #[test]
    fn no_anchors_leaves_sequence_untimed() {
        let words = vec![Word::new(1, "a"), Word::new(2, "b")];
        let (out, stats) = interpolate_with_rate(&words, 2.5);
        assert_eq!(out, words);
        assert_eq!(stats, InterpolationStats::default());
        assert!(interpolate(&[]).is_empty());
    }

    #[test]
    fn separators_stay_untimed_and_are_not_counted() {
        let words = vec![
            Word::new(1, "a").with_times(0.0, 0.5),
            Word::separator(2),
            Word::new(3, "b"),
            Word::new(4, "c").with_times(1.0, 1.5),
        ];
        let (out, stats) = interpolate_with_rate(&words, 2.5);
        assert_eq!(out[1].start_time, None);
        assert!(close(out[2].start_time.unwrap(), 0.75));
        assert_eq!(stats.interpolated, 1);
    }

    #[test]
    fn out_of_order_anchors_are_clamped_monotone() {
        let words = vec![
            Word::new(1, "a").with_times(3.0, 3.5),
            Word::new(2, "b"),
            Word::new(3, "c").with_times(1.0, 1.5),
            Word::new(4, "d"),
        ];
        let (out, stats) = interpolate_with_rate(&words, 2.5);
        let got = starts(&out);
        assert!(got.windows(2).all(|p| p[0] <= p[1]), "{got:?}");
        assert!(stats.clamped >= 1);
        assert!(out.iter().all(Word::has_consistent_timing));
    }
}

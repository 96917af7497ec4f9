use super::*;
use crate::types::words_from_plain_text;

fn reference(text: &str) -> Vec<TimedWord> {
    text.split_whitespace()
        .enumerate()
        .map(|(idx, token)| {
            let start = idx as f64 * 0.5;
            TimedWord::new(idx + 1, token, start, start + 0.4)
        })
        .collect()
}

fn times(words: &[Word]) -> Vec<Option<f64>> {
    words.iter().map(|w| w.start_time).collect()
}

fn texts(words: &[Word]) -> Vec<&str> {
    words.iter().map(|w| w.display_text.as_str()).collect()
}

#[test]
fn exact_match_copies_every_time() {
    let edited = words_from_plain_text("Hello, world.");
    let reference = reference("hello world");
    let aligned = align(&edited, &reference);
    assert_eq!(times(&aligned), [Some(0.0), Some(0.5)]);
    assert_eq!(aligned[1].end_time, Some(reference[1].end_time));
    assert_eq!(texts(&aligned), ["Hello,", "world."]);
}

#[test]
fn inserted_word_is_left_unmatched() {
    let edited = words_from_plain_text("hello big world");
    let outcome = align_with_stats(&edited, &reference("hello world"), &AlignmentConfig::default());
    assert_eq!(times(&outcome.words), [Some(0.0), None, Some(0.5)]);
    assert_eq!(outcome.stats.matched, 2);
    assert_eq!(outcome.stats.inserted, 1);
    assert_eq!(outcome.stats.deleted, 0);
}

#[test]
fn deleted_reference_word_emits_nothing() {
    let edited = words_from_plain_text("hello world");
    let outcome = align_with_stats(
        &edited,
        &reference("hello there world"),
        &AlignmentConfig::default(),
    );
    assert_eq!(outcome.words.len(), 2);
    assert_eq!(times(&outcome.words), [Some(0.0), Some(1.0)]);
    assert_eq!(outcome.stats.deleted, 1);
}

#[test]
fn repeated_words_each_consume_one_reference_word() {
    let edited = words_from_plain_text("the the cat");
    let aligned = align(&edited, &reference("the cat"));
    assert_eq!(times(&aligned), [Some(0.0), None, Some(0.5)]);

    let edited = words_from_plain_text("the the cat");
    let aligned = align(&edited, &reference("the the cat"));
    assert_eq!(times(&aligned), [Some(0.0), Some(0.5), Some(1.0)]);
}

fn with_resync(resync_probe: usize) -> AlignmentConfig {
    AlignmentConfig {
        resync_probe,
        ..AlignmentConfig::default()
    }
}

#[test]
fn local_reorder_takes_nearest_candidate() {
    let edited = words_from_plain_text("b a c");
    for config in [AlignmentConfig::default(), with_resync(2)] {
        let outcome = align_with_stats(&edited, &reference("a b c"), &config);
        assert_eq!(times(&outcome.words), [Some(0.5), None, Some(1.0)]);
        assert_eq!(outcome.stats.matched, 2);
        assert_eq!(outcome.stats.deleted, 1);
    }
}

#[test]
fn deleted_run_containing_a_later_word_keeps_real_matches() {
    let edited = words_from_plain_text("Hello barked the end");
    let reference = reference("Hello the big dog barked the end");
    for config in [AlignmentConfig::default(), with_resync(2)] {
        let outcome = align_with_stats(&edited, &reference, &config);
        assert_eq!(
            times(&outcome.words),
            [Some(0.0), Some(2.0), Some(2.5), Some(3.0)],
            "resync_probe = {}",
            config.resync_probe
        );
        assert_eq!(outcome.stats.matched, 4);
        assert_eq!(outcome.stats.deleted, 3);
    }
}

#[test]
fn resync_refuses_jump_past_agreeing_run() {
    let edited = words_from_plain_text("so the cat sat");
    let aligned = align_with_stats(&edited, &reference("the cat sat so"), &with_resync(2)).words;
    assert_eq!(times(&aligned), [None, Some(0.0), Some(0.5), Some(1.0)]);

    let aligned = align(&edited, &reference("the cat sat so"));
    assert_eq!(times(&aligned), [Some(1.5), None, None, None]);
}

#[test]
fn resync_disabled_accepts_forward_jump() {
    let edited = words_from_plain_text("so the cat");
    let outcome = align_with_stats(&edited, &reference("the cat so"), &with_resync(0));
    assert_eq!(times(&outcome.words), [Some(1.0), None, None]);
}

#[test]
fn candidate_beyond_window_is_soft_unmatched() {
    let config = AlignmentConfig {
        lookahead_window: 2,
        ..AlignmentConfig::default()
    };
    let edited = words_from_plain_text("target");
    let outcome = align_with_stats(&edited, &reference("a b c d target"), &config);
    assert_eq!(times(&outcome.words), [None]);
    assert_eq!(outcome.stats.window_exceeded, 1);
    assert_eq!(outcome.stats.inserted, 1);

    let within = align_with_stats(&edited, &reference("a b target"), &config);
    assert_eq!(times(&within.words), [Some(1.0)]);
}

#[test]
fn empty_inputs() {
    assert!(align(&[], &reference("a b")).is_empty());

    let edited = words_from_plain_text("a b");
    let outcome = align_with_stats(&edited, &[], &AlignmentConfig::default());
    assert!(outcome.stats.no_reference);
    assert_eq!(outcome.stats.inserted, 2);
    assert_eq!(times(&outcome.words), [None, None]);
}

#[test]
fn stale_times_are_discarded_and_fields_preserved() {
    let edited = vec![
        Word::new(7, "hello")
            .with_times(9.0, 9.5)
            .with_speaker("Host")
            .with_paragraph_start(true),
        Word::new(9, "gone").with_times(10.0, 10.5),
    ];
    let aligned = align(&edited, &reference("hello"));
    assert_eq!(aligned[0].start_time, Some(0.0));
    assert_eq!(aligned[0].speaker_label.as_deref(), Some("Host"));
    assert!(aligned[0].is_paragraph_start);
    assert_eq!(aligned[1].start_time, None);
    assert_eq!(aligned[1].end_time, None);
    let numbers: Vec<_> = aligned.iter().map(|w| w.sequence_number).collect();
    assert_eq!(numbers, [1, 2]);
}

#[test]
fn reference_speaker_is_carried_onto_unlabeled_words() {
    let mut reference = reference("hi there");
    for word in &mut reference {
        word.speaker_label = Some("SPEAKER_01".into());
    }
    let edited = vec![Word::new(1, "hi"), Word::new(2, "there").with_speaker("Ann")];
    let aligned = align(&edited, &reference);
    assert_eq!(aligned[0].speaker_label.as_deref(), Some("SPEAKER_01"));
    assert_eq!(aligned[1].speaker_label.as_deref(), Some("Ann"));

    let config = AlignmentConfig {
        carry_speaker_labels: false,
        ..AlignmentConfig::default()
    };
    let outcome = align_with_stats(&edited, &reference, &config);
    assert_eq!(outcome.words[0].speaker_label, None);
}

#[test]
fn separators_and_punctuation_pass_through() {
    let edited = vec![
        Word::new(1, "hello"),
        Word::separator(2),
        Word::new(3, "--"),
        Word::new(4, "world"),
    ];
    let outcome = align_with_stats(&edited, &reference("hello world"), &AlignmentConfig::default());
    assert_eq!(times(&outcome.words), [Some(0.0), None, None, Some(0.5)]);
    assert!(outcome.words[1].is_separator());
    assert_eq!(outcome.stats.inserted, 0);
}

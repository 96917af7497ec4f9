use serde::Deserialize;
use serde_json::Value;

use crate::error::TranscriptError;
use crate::types::TimedWord;

const MFA_CONTEXT: &str = "MFA-style timed words";
const ASR_CONTEXT: &str = "ASR-style timed words";

/// Markers forced aligners emit for non-speech intervals.
const SILENCE_MARKERS: [&str; 4] = ["<eps>", "<sil>", "sil", "sp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedWordFormat {
    /// Flat word list: `[{word, start_time, end_time}]` or `{words: [...]}`.
    Mfa,
    /// Segmented recognizer output: `{segments: [{words: [{word, start, end}]}]}`
    /// or a bare segment array.
    Asr,
}

impl TimedWordFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mfa => "mfa",
            Self::Asr => "asr",
        }
    }
}

#[derive(Debug, Deserialize)]
struct MfaWord {
    word: Option<String>,
    start_time: Option<f64>,
    end_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AsrSegment {
    words: Option<Vec<AsrWord>>,
}

#[derive(Debug, Deserialize)]
struct AsrWord {
    word: Option<String>,
    start: Option<f64>,
    end: Option<f64>,
    /// Present when the recognizer ran its own diarization.
    speaker: Option<String>,
}

/// Tool-neutral token before validation.
#[derive(Debug)]
struct RawToken {
    text: Option<String>,
    start: Option<f64>,
    end: Option<f64>,
    speaker: Option<String>,
}

pub fn ingest_timed_words(
    source: &str,
    format: TimedWordFormat,
) -> Result<Vec<TimedWord>, TranscriptError> {
    let (context, tokens) = match format {
        TimedWordFormat::Mfa => (MFA_CONTEXT, decode_mfa(source)?),
        TimedWordFormat::Asr => (ASR_CONTEXT, decode_asr(source)?),
    };
    let words = build_timed_words(tokens, context)?;
    tracing::debug!(
        format = format.as_str(),
        words = words.len(),
        "ingest: timed words decoded"
    );
    Ok(words)
}

fn decode_mfa(source: &str) -> Result<Vec<RawToken>, TranscriptError> {
    let doc: Value =
        serde_json::from_str(source).map_err(|e| TranscriptError::json("parse MFA-style JSON", e))?;
    let list = match doc {
        Value::Array(_) => doc,
        Value::Object(mut obj) => obj.remove("words").ok_or_else(|| {
            TranscriptError::malformed(MFA_CONTEXT, "expected an array or an object with `words`")
        })?,
        _ => {
            return Err(TranscriptError::malformed(
                MFA_CONTEXT,
                "expected an array or an object with `words`",
            ))
        }
    };
    let words: Vec<MfaWord> = serde_json::from_value(list)
        .map_err(|e| TranscriptError::json("decode MFA-style words", e))?;
    Ok(words
        .into_iter()
        .map(|w| RawToken {
            text: w.word,
            start: w.start_time,
            end: w.end_time,
            speaker: None,
        })
        .collect())
}

fn decode_asr(source: &str) -> Result<Vec<RawToken>, TranscriptError> {
    let doc: Value =
        serde_json::from_str(source).map_err(|e| TranscriptError::json("parse ASR-style JSON", e))?;
    let list = match doc {
        Value::Array(_) => doc,
        Value::Object(mut obj) => obj.remove("segments").ok_or_else(|| {
            TranscriptError::malformed(
                ASR_CONTEXT,
                "expected an array or an object with `segments`",
            )
        })?,
        _ => {
            return Err(TranscriptError::malformed(
                ASR_CONTEXT,
                "expected an array or an object with `segments`",
            ))
        }
    };
    let segments: Vec<AsrSegment> = serde_json::from_value(list)
        .map_err(|e| TranscriptError::json("decode ASR-style segments", e))?;

    let mut tokens = Vec::new();
    for (seg_idx, segment) in segments.into_iter().enumerate() {
        let words = segment.words.ok_or_else(|| {
            TranscriptError::malformed(
                ASR_CONTEXT,
                format!("segment {} has no word-level `words` array", seg_idx + 1),
            )
        })?;
        tokens.extend(words.into_iter().map(|w| RawToken {
            text: w.word,
            start: w.start,
            end: w.end,
            speaker: w.speaker.filter(|s| !s.trim().is_empty()),
        }));
    }
    Ok(tokens)
}

fn build_timed_words(
    tokens: Vec<RawToken>,
    context: &'static str,
) -> Result<Vec<TimedWord>, TranscriptError> {
    let mut out: Vec<TimedWord> = Vec::with_capacity(tokens.len());
    let mut prev_start: Option<f64> = None;

    for (idx, token) in tokens.into_iter().enumerate() {
        let position = idx + 1;
        let text = token
            .text
            .ok_or_else(|| TranscriptError::malformed(context, format!("word {position} has no text")))?;
        let text = text.trim();
        if text.is_empty() || is_silence_marker(text) {
            continue;
        }

        let start = token.start.ok_or_else(|| {
            TranscriptError::malformed(context, format!("word {position} ('{text}') has no start time"))
        })?;
        let end = token.end.ok_or_else(|| {
            TranscriptError::malformed(context, format!("word {position} ('{text}') has no end time"))
        })?;
        if !start.is_finite() || !end.is_finite() {
            return Err(TranscriptError::malformed(
                context,
                format!("word {position} ('{text}') has a non-finite time"),
            ));
        }
        if start < 0.0 {
            return Err(TranscriptError::malformed(
                context,
                format!("word {position} ('{text}') starts at negative time {start}"),
            ));
        }
        if end < start {
            return Err(TranscriptError::malformed(
                context,
                format!("word {position} ('{text}') ends at {end} before it starts at {start}"),
            ));
        }
        if let Some(prev) = prev_start {
            if start < prev {
                return Err(TranscriptError::malformed(
                    context,
                    format!(
                        "word {position} ('{text}') starts at {start}, before the previous word at {prev}"
                    ),
                ));
            }
        }
        prev_start = Some(start);

        for (piece, piece_start, piece_end) in split_multiword(text, start, end) {
            let mut word = TimedWord::new(out.len() + 1, piece, piece_start, piece_end);
            word.speaker_label = token.speaker.clone();
            out.push(word);
        }
    }
    Ok(out)
}

fn is_silence_marker(text: &str) -> bool {
    SILENCE_MARKERS
        .iter()
        .any(|marker| text.eq_ignore_ascii_case(marker))
}

/// Some recognizers emit multi-word tokens ("New York"); split them and share
/// the interval in proportion to character length.
fn split_multiword(text: &str, start: f64, end: f64) -> Vec<(&str, f64, f64)> {
    let pieces: Vec<&str> = text.split_whitespace().collect();
    if pieces.len() <= 1 {
        return vec![(text, start, end)];
    }
    let total_chars: usize = pieces.iter().map(|p| p.chars().count()).sum();
    let span = end - start;
    let mut cursor = start;
    let mut consumed = 0usize;
    pieces
        .into_iter()
        .map(|piece| {
            consumed += piece.chars().count();
            let piece_end = start + span * consumed as f64 / total_chars as f64;
            let piece_start = cursor;
            cursor = piece_end;
            (piece, piece_start, piece_end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mfa_array_is_ingested_densely() {
        let json = r#"[
            {"word": "Hello", "start_time": 0.0, "end_time": 0.4},
            {"word": "", "start_time": 0.4, "end_time": 0.5},
            {"word": "world.", "start_time": 0.5, "end_time": 0.9}
        ]"#;
        let words = ingest_timed_words(json, TimedWordFormat::Mfa).expect("valid MFA json");
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].sequence_number(), 1);
        assert_eq!(words[1].sequence_number(), 2);
        assert_eq!(words[1].display_text(), "world.");
        assert_eq!(words[1].normalized_text(), "world");
        assert_eq!(words[1].start_time(), 0.5);
    }

    #[test]
    fn mfa_wrapped_object_and_silence_markers() {
        let json = r#"{"words": [
            {"word": "sil", "start_time": 0.0, "end_time": 0.3},
            {"word": "Yes", "start_time": 0.3, "end_time": 0.6, "confidence": 0.91}
        ]}"#;
        let words = ingest_timed_words(json, TimedWordFormat::Mfa).expect("valid MFA json");
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].display_text(), "Yes");
    }

    #[test]
    fn unknown_word_marker_stays_a_timed_word() {
        let json = r#"[
            {"word": "<unk>", "start_time": 0.0, "end_time": 0.3},
            {"word": "sp", "start_time": 0.3, "end_time": 0.4},
            {"word": "Yes", "start_time": 0.4, "end_time": 0.6}
        ]"#;
        let words = ingest_timed_words(json, TimedWordFormat::Mfa).expect("valid MFA json");
        let texts: Vec<_> = words.iter().map(|w| w.display_text()).collect();
        assert_eq!(texts, ["<unk>", "Yes"]);
        assert_eq!(words[0].end_time(), 0.3);
    }

    #[test]
    fn asr_segments_are_flattened_and_trimmed() {
        let json = r#"{"text": "Hi there. Bye", "segments": [
            {"id": 0, "words": [{"word": " Hi", "start": 0.0, "end": 0.2, "probability": 0.9},
                                {"word": " there.", "start": 0.25, "end": 0.5}]},
            {"id": 1, "words": [{"word": " Bye", "start": 1.0, "end": 1.3}]}
        ]}"#;
        let words = ingest_timed_words(json, TimedWordFormat::Asr).expect("valid ASR json");
        let texts: Vec<_> = words.iter().map(|w| w.display_text()).collect();
        assert_eq!(texts, ["Hi", "there.", "Bye"]);
        assert_eq!(words[2].sequence_number(), 3);
    }

    #[test]
    fn asr_word_speakers_are_kept() {
        let json = r#"[{"words": [
            {"word": "hi", "start": 0.0, "end": 0.2, "speaker": "SPEAKER_01"},
            {"word": "yo", "start": 0.3, "end": 0.5, "speaker": ""}
        ]}]"#;
        let words = ingest_timed_words(json, TimedWordFormat::Asr).expect("valid ASR json");
        assert_eq!(words[0].speaker_label(), Some("SPEAKER_01"));
        assert_eq!(words[1].speaker_label(), None);
    }

    #[test]
    fn asr_bare_segment_array_is_accepted() {
        let json = r#"[{"words": [{"word": "ok", "start": 1.0, "end": 1.5}]}]"#;
        let words = ingest_timed_words(json, TimedWordFormat::Asr).expect("valid ASR json");
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn missing_time_is_malformed() {
        let json = r#"[{"word": "Hello", "start_time": 0.0}]"#;
        let err = ingest_timed_words(json, TimedWordFormat::Mfa).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("no end time"));
    }

    #[test]
    fn non_numeric_time_is_malformed() {
        let json = r#"[{"word": "Hello", "start_time": "zero", "end_time": 0.4}]"#;
        let err = ingest_timed_words(json, TimedWordFormat::Mfa).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn reversed_or_regressing_times_are_malformed() {
        let reversed = r#"[{"word": "a", "start_time": 0.5, "end_time": 0.4}]"#;
        assert!(ingest_timed_words(reversed, TimedWordFormat::Mfa)
            .unwrap_err()
            .is_malformed_input());

        let regressing = r#"[
            {"word": "a", "start_time": 1.0, "end_time": 1.2},
            {"word": "b", "start_time": 0.5, "end_time": 0.7}
        ]"#;
        let err = ingest_timed_words(regressing, TimedWordFormat::Mfa).unwrap_err();
        assert!(err.to_string().contains("before the previous word"));
    }

    #[test]
    fn negative_time_is_malformed() {
        let json = r#"[{"word": "a", "start_time": -0.1, "end_time": 0.4}]"#;
        assert!(ingest_timed_words(json, TimedWordFormat::Mfa)
            .unwrap_err()
            .is_malformed_input());
    }

    #[test]
    fn asr_segment_without_words_is_malformed() {
        let json = r#"{"segments": [{"text": "no word timing", "start": 0.0, "end": 1.0}]}"#;
        let err = ingest_timed_words(json, TimedWordFormat::Asr).unwrap_err();
        assert!(err.to_string().contains("segment 1"));
    }

    #[test]
    fn wrong_shape_fails_closed() {
        assert!(ingest_timed_words(r#"{"items": []}"#, TimedWordFormat::Mfa)
            .unwrap_err()
            .is_malformed_input());
        assert!(ingest_timed_words("42", TimedWordFormat::Asr)
            .unwrap_err()
            .is_malformed_input());
        assert!(ingest_timed_words("not json", TimedWordFormat::Asr)
            .unwrap_err()
            .is_malformed_input());
    }

    #[test]
    fn multiword_token_is_split_proportionally() {
        let json = r#"[{"word": "New York", "start_time": 1.0, "end_time": 1.7}]"#;
        let words = ingest_timed_words(json, TimedWordFormat::Mfa).expect("valid MFA json");
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].display_text(), "New");
        assert!((words[0].end_time() - 1.3).abs() < 1e-9);
        assert_eq!(words[1].start_time(), words[0].end_time());
        assert!((words[1].end_time() - 1.7).abs() < 1e-9);
    }
}

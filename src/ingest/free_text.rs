use std::sync::LazyLock;

use regex::Regex;

use crate::ingest::timestamp::{format_timestamp, is_timestamp_tag, parse_timestamp};
use crate::types::{SpeakerTagInfo, TagKind, Word};

/// A single capitalized token ending in a colon: `Alice:`, `S2:`, `SPEAKER_00:`.
static SPEAKER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{Lu}[\p{L}\p{N}_'.\-]*:$").expect("invalid speaker token regex")
});

static SPEAKER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:$").expect("invalid speaker number regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum LineToken {
    Timestamp { text: String, seconds: f64 },
    Speaker { text: String, label: String },
    Word(String),
}

/// Splits one line into an optional leading timestamp, an optional leading
/// speaker tag and the remaining words.
///
/// Speaker tags are only recognized at the start of the line and only when the
/// colon is the last character of the token, so `Note:this` stays prose while
/// `Note: this` is read as a speaker turn.
pub fn tokenize_line(line: &str) -> Vec<LineToken> {
    let raw: Vec<&str> = line.split_whitespace().collect();
    let mut tokens = Vec::with_capacity(raw.len());
    let mut idx = 0;

    if let Some(seconds) = raw
        .first()
        .filter(|first| is_timestamp_tag(first))
        .and_then(|first| parse_timestamp(first))
    {
        tokens.push(LineToken::Timestamp {
            text: raw[0].to_string(),
            seconds,
        });
        idx = 1;
    }

    if let Some((consumed, label)) = leading_speaker(&raw[idx..]) {
        tokens.push(LineToken::Speaker {
            text: raw[idx..idx + consumed].join(" "),
            label,
        });
        idx += consumed;
    }

    tokens.extend(raw[idx..].iter().map(|w| LineToken::Word(w.to_string())));
    tokens
}

/// Returns how many raw tokens form the speaker tag and the label it names.
pub(crate) fn leading_speaker(raw: &[&str]) -> Option<(usize, String)> {
    let first = *raw.first()?;
    if first.eq_ignore_ascii_case("speaker") {
        if let Some(number) = raw.get(1).filter(|n| SPEAKER_NUMBER.is_match(n)) {
            let number = number.trim_end_matches(':');
            return Some((2, format!("{first} {number}")));
        }
    }
    if SPEAKER_TOKEN.is_match(first) {
        return Some((1, first.trim_end_matches(':').to_string()));
    }
    None
}

/// Parses pasted or typed transcript text.
///
/// Speaker labels persist across lines until the next speaker tag. The first
/// word of the text, of every speaker turn and of every paragraph following a
/// blank line is a paragraph start. A leading timestamp becomes the start time
/// of the next word.
pub fn ingest_free_text(text: &str) -> (Vec<Word>, Vec<SpeakerTagInfo>) {
    let mut words: Vec<Word> = Vec::new();
    let mut tags: Vec<SpeakerTagInfo> = Vec::new();
    let mut current_speaker: Option<String> = None;
    let mut pending_time: Option<f64> = None;
    let mut paragraph_pending = true;

    for line in text.lines() {
        let tokens = tokenize_line(line);
        if tokens.is_empty() {
            paragraph_pending = true;
            continue;
        }

        let word_index_before_tag = words.len().checked_sub(1);
        let mut tag_parts: Vec<String> = Vec::new();
        let mut tag_kind: Option<TagKind> = None;

        for token in tokens {
            match token {
                LineToken::Timestamp { text, seconds } => {
                    pending_time = Some(seconds);
                    tag_parts.push(text);
                    tag_kind = Some(tag_kind.map_or(TagKind::Timestamp, |k| k.combine(TagKind::Timestamp)));
                }
                LineToken::Speaker { text, label } => {
                    current_speaker = Some(label);
                    paragraph_pending = true;
                    tag_parts.push(text);
                    tag_kind = Some(tag_kind.map_or(TagKind::Speaker, |k| k.combine(TagKind::Speaker)));
                }
                LineToken::Word(text) => {
                    let mut word = Word::new(words.len() + 1, text);
                    word.speaker_label = current_speaker.clone();
                    word.start_time = pending_time.take();
                    word.is_paragraph_start = std::mem::take(&mut paragraph_pending);
                    words.push(word);
                }
            }
        }

        if let Some(kind) = tag_kind {
            tags.push(SpeakerTagInfo {
                word_index_before_tag,
                tag_text: tag_parts.join(" "),
                kind,
                relative_position: 0.0,
                anchor_text: None,
                is_paragraph_start: false,
                speaker_label: current_speaker.clone(),
                tag_words: Vec::new(),
            });
        }
    }

    let len = words.len();
    for tag in &mut tags {
        let anchor = tag.anchor_index();
        tag.anchor_text = words.get(anchor).map(|w| w.normalized_text.clone());
        tag.relative_position = if len == 0 { 0.0 } else { anchor as f64 / len as f64 };
    }

    tracing::debug!(words = words.len(), tags = tags.len(), "ingest: free text parsed");
    (words, tags)
}

/// Renders words as editable text that `ingest_free_text` reads back: one
/// paragraph per line group, each opened by its start time when known and by
/// the speaker label when it changes. Separator words are skipped.
pub fn render_free_text(words: &[Word]) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut prev_speaker: Option<&str> = None;
    let mut first = true;

    for word in words.iter().filter(|w| !w.is_separator()) {
        let speaker = word.speaker_label.as_deref();
        let speaker_changed = speaker != prev_speaker;
        if first || word.is_paragraph_start || speaker_changed {
            if !line.is_empty() {
                paragraphs.push(std::mem::take(&mut line));
            }
            if let Some(start) = word.start_time {
                line.push_str(&format_timestamp(start));
                line.push(' ');
            }
            if let Some(label) = speaker.filter(|_| speaker_changed) {
                line.push_str(label);
                line.push_str(": ");
            }
        } else {
            line.push(' ');
        }
        line.push_str(&word.display_text);
        prev_speaker = speaker;
        first = false;
    }
    if !line.is_empty() {
        paragraphs.push(line);
    }
    paragraphs.join("\n\n")
}

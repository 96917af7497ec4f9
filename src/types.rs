use serde::{Deserialize, Serialize};

/// Matching key for a word: lower-cased with trailing punctuation removed.
pub fn normalize_word(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Dense, 1-based position within its sequence.
    pub sequence_number: usize,
    pub display_text: String,
    /// Derived from `display_text`; used for matching, never for display.
    pub normalized_text: String,
    /// Seconds. When `end_time` is set, `start_time` is set and not after it.
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub speaker_label: Option<String>,
    pub is_paragraph_start: bool,
}

impl Word {
    pub fn new(sequence_number: usize, display_text: impl Into<String>) -> Self {
        let display_text = display_text.into();
        let normalized_text = normalize_word(&display_text);
        Self {
            sequence_number,
            display_text,
            normalized_text,
            start_time: None,
            end_time: None,
            speaker_label: None,
            is_paragraph_start: false,
        }
    }

    /// Empty-text word placed between speaker turns for visual spacing.
    pub fn separator(sequence_number: usize) -> Self {
        Self::new(sequence_number, "")
    }

    pub fn with_times(mut self, start_time: f64, end_time: f64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    pub fn with_speaker(mut self, label: impl Into<String>) -> Self {
        self.speaker_label = Some(label.into());
        self
    }

    pub fn with_paragraph_start(mut self, is_paragraph_start: bool) -> Self {
        self.is_paragraph_start = is_paragraph_start;
        self
    }

    pub fn is_separator(&self) -> bool {
        self.display_text.is_empty()
    }

    /// Separators and pure-punctuation words can never be matched.
    pub fn is_matchable(&self) -> bool {
        !self.is_separator() && !self.normalized_text.is_empty()
    }

    pub fn is_timed(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn clear_times(&mut self) {
        self.start_time = None;
        self.end_time = None;
    }

    pub fn has_consistent_timing(&self) -> bool {
        match (self.start_time, self.end_time) {
            (_, None) => true,
            (Some(start), Some(end)) => start <= end,
            (None, Some(_)) => false,
        }
    }
}

/// Rewrites sequence numbers so they are dense and 1-based.
pub fn renumber(words: &mut [Word]) {
    for (idx, word) in words.iter_mut().enumerate() {
        word.sequence_number = idx + 1;
    }
}

/// Whitespace tokenization with no markup recognition. Inline tags survive as
/// ordinary words; see `alignment::tags::strip`.
pub fn words_from_plain_text(text: &str) -> Vec<Word> {
    text.split_whitespace()
        .enumerate()
        .map(|(idx, token)| Word::new(idx + 1, token))
        .collect()
}

/// A word whose timing came from an alignment or recognition tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedWord {
    pub(crate) sequence_number: usize,
    pub(crate) display_text: String,
    pub(crate) normalized_text: String,
    pub(crate) start_time: f64,
    pub(crate) end_time: f64,
    pub(crate) speaker_label: Option<String>,
}

impl TimedWord {
    pub(crate) fn new(sequence_number: usize, display_text: &str, start_time: f64, end_time: f64) -> Self {
        Self {
            sequence_number,
            display_text: display_text.to_string(),
            normalized_text: normalize_word(display_text),
            start_time,
            end_time,
            speaker_label: None,
        }
    }

    /// Uses the fully timed words of a stored sequence as a reference.
    /// Words missing either time, and separators, are skipped.
    pub fn from_timed_words(words: &[Word]) -> Vec<TimedWord> {
        words
            .iter()
            .filter(|w| !w.is_separator())
            .filter_map(|w| match (w.start_time, w.end_time) {
                (Some(start), Some(end)) if start <= end => Some((w, start, end)),
                _ => None,
            })
            .enumerate()
            .map(|(idx, (w, start, end))| TimedWord {
                sequence_number: idx + 1,
                display_text: w.display_text.clone(),
                normalized_text: w.normalized_text.clone(),
                start_time: start,
                end_time: end,
                speaker_label: w.speaker_label.clone(),
            })
            .collect()
    }

    pub fn sequence_number(&self) -> usize {
        self.sequence_number
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn speaker_label(&self) -> Option<&str> {
        self.speaker_label.as_deref()
    }

    pub fn to_word(&self) -> Word {
        Word {
            sequence_number: self.sequence_number,
            display_text: self.display_text.clone(),
            normalized_text: self.normalized_text.clone(),
            start_time: Some(self.start_time),
            end_time: Some(self.end_time),
            speaker_label: self.speaker_label.clone(),
            is_paragraph_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizationSegment {
    pub start_time: f64,
    /// Exclusive: the interval is `[start_time, end_time)`.
    pub end_time: f64,
    pub raw_speaker_id: String,
}

impl DiarizationSegment {
    pub fn contains(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Distance from `time` to the nearest boundary; zero when contained.
    pub fn boundary_distance(&self, time: f64) -> f64 {
        if time < self.start_time {
            self.start_time - time
        } else if time >= self.end_time {
            time - self.end_time
        } else {
            0.0
        }
    }

    pub fn ends_before(&self, time: f64) -> bool {
        self.end_time <= time
    }
}

/// Raw diarization speaker id to user-facing label. Only explicit rename and
/// merge operations change it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakerMap {
    entries: Vec<(String, String)>,
}

impl SpeakerMap {
    /// Identity mapping, in order of first appearance.
    pub fn identity<'a>(raw_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Self::default();
        for raw in raw_ids {
            if !map.contains(raw) {
                map.entries.push((raw.to_string(), raw.to_string()));
            }
        }
        map
    }

    pub fn contains(&self, raw_id: &str) -> bool {
        self.entries.iter().any(|(raw, _)| raw == raw_id)
    }

    /// Unknown ids map to themselves.
    pub fn display_label<'a>(&'a self, raw_id: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(raw, _)| raw == raw_id)
            .map(|(_, label)| label.as_str())
            .unwrap_or(raw_id)
    }

    pub fn raw_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(raw, _)| raw.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns false when `raw_id` is not part of the map.
    pub fn rename(&mut self, raw_id: &str, label: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|(raw, _)| raw == raw_id) {
            Some(entry) => {
                entry.1 = label.into();
                true
            }
            None => {
                tracing::warn!(raw_id, "speaker map: rename of unknown speaker ignored");
                false
            }
        }
    }

    /// `from_raw` adopts the current label of `into_raw`.
    pub fn merge(&mut self, from_raw: &str, into_raw: &str) -> bool {
        if !self.contains(from_raw) || !self.contains(into_raw) {
            tracing::warn!(from_raw, into_raw, "speaker map: merge of unknown speaker ignored");
            return false;
        }
        let label = self.display_label(into_raw).to_string();
        self.rename(from_raw, label)
    }
}

/// Decoded diarization: speaker turns sorted by start plus the label map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diarization {
    pub segments: Vec<DiarizationSegment>,
    pub speakers: SpeakerMap,
}

impl From<(Vec<DiarizationSegment>, SpeakerMap)> for Diarization {
    fn from((segments, speakers): (Vec<DiarizationSegment>, SpeakerMap)) -> Self {
        Self { segments, speakers }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Timestamp,
    Speaker,
    Both,
}

impl TagKind {
    pub(crate) fn combine(self, other: TagKind) -> TagKind {
        if self == other {
            self
        } else {
            TagKind::Both
        }
    }
}

/// Inline markup removed from a word sequence, with enough position data to
/// put it back after the sequence has been re-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerTagInfo {
    /// Index (0-based) of the content word preceding the tag; `None` when the
    /// tag came before every content word.
    pub word_index_before_tag: Option<usize>,
    pub tag_text: String,
    pub kind: TagKind,
    /// Anchor index divided by the content length at capture time.
    pub relative_position: f64,
    /// Normalized text of the content word the tag preceded.
    pub anchor_text: Option<String>,
    pub is_paragraph_start: bool,
    pub speaker_label: Option<String>,
    /// The removed pseudo-words exactly as they were, timing and labels
    /// included. Empty for tags recovered from free text.
    #[serde(default)]
    pub tag_words: Vec<Word>,
}

impl SpeakerTagInfo {
    /// Index of the content word the tag was placed before.
    pub fn anchor_index(&self) -> usize {
        self.word_index_before_tag.map_or(0, |idx| idx + 1)
    }
}

use crate::ingest::free_text::leading_speaker;
use crate::ingest::timestamp::is_timestamp_tag;
use crate::types::{renumber, SpeakerTagInfo, TagKind, Word};

/// Removes inline timestamp and speaker pseudo-words from `words`.
///
/// Returns the renumbered content words and one `SpeakerTagInfo` per removed
/// tag. A timestamp immediately followed by a speaker tag is recorded as a
/// single `Both` tag.
pub fn strip(words: &[Word]) -> (Vec<Word>, Vec<SpeakerTagInfo>) {
    let mut content: Vec<Word> = Vec::with_capacity(words.len());
    let mut tags: Vec<SpeakerTagInfo> = Vec::new();
    let mut idx = 0;

    while idx < words.len() {
        let Some((mut consumed, mut kind)) = tag_at(words, idx) else {
            content.push(words[idx].clone());
            idx += 1;
            continue;
        };
        if kind == TagKind::Timestamp {
            if let Some(speaker_len) = speaker_tag_len(words, idx + consumed) {
                consumed += speaker_len;
                kind = TagKind::Both;
            }
        }

        let tag_words = &words[idx..idx + consumed];
        tags.push(SpeakerTagInfo {
            word_index_before_tag: content.len().checked_sub(1),
            tag_text: tag_words
                .iter()
                .map(|w| w.display_text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            kind,
            relative_position: 0.0,
            anchor_text: None,
            is_paragraph_start: tag_words[0].is_paragraph_start,
            speaker_label: tag_words[0].speaker_label.clone(),
            tag_words: tag_words.to_vec(),
        });
        idx += consumed;
    }

    let len = content.len();
    for tag in &mut tags {
        let anchor = tag.anchor_index();
        tag.anchor_text = content.get(anchor).map(|w| w.normalized_text.clone());
        tag.relative_position = if len == 0 { 0.0 } else { anchor as f64 / len as f64 };
    }
    renumber(&mut content);

    if !tags.is_empty() {
        tracing::debug!(tags = tags.len(), content = content.len(), "tags: stripped inline markup");
    }
    (content, tags)
}

/// Reinserts stripped tags into a (possibly re-aligned) content sequence.
///
/// Each tag goes immediately before the first word, at or after the previous
/// tag's position, whose normalized text equals the tag's anchor and which sits
/// nearest the anchor's scaled relative position. When the anchor word no
/// longer exists the scaled position itself is used. Positions never move
/// backwards, so tag order is preserved.
pub fn reconstruct(words: &[Word], tags: &[SpeakerTagInfo]) -> Vec<Word> {
    if tags.is_empty() {
        let mut out = words.to_vec();
        renumber(&mut out);
        return out;
    }

    let len = words.len();
    let mut cursor = 0usize;
    let mut positions = Vec::with_capacity(tags.len());
    for tag in tags {
        let expected = ((tag.relative_position * len as f64).round().max(0.0) as usize).clamp(cursor, len);
        let position = tag
            .anchor_text
            .as_deref()
            .and_then(|anchor| nearest_anchor(words, anchor, cursor, expected))
            .unwrap_or(expected);
        positions.push(position);
        cursor = position;
    }

    let mut out: Vec<Word> = Vec::with_capacity(len + tags.len() * 2);
    let mut next_tag = 0;
    for (idx, word) in words.iter().enumerate() {
        while next_tag < tags.len() && positions[next_tag] == idx {
            push_tag_words(&mut out, &tags[next_tag]);
            next_tag += 1;
        }
        out.push(word.clone());
    }
    for tag in &tags[next_tag..] {
        push_tag_words(&mut out, tag);
    }

    renumber(&mut out);
    out
}

fn nearest_anchor(words: &[Word], anchor: &str, from: usize, expected: usize) -> Option<usize> {
    words
        .iter()
        .enumerate()
        .skip(from)
        .filter(|(_, w)| w.normalized_text == anchor)
        .map(|(idx, _)| idx)
        .min_by_key(|&idx| (idx.abs_diff(expected), idx))
}

fn push_tag_words(out: &mut Vec<Word>, tag: &SpeakerTagInfo) {
    if !tag.tag_words.is_empty() {
        out.extend(tag.tag_words.iter().cloned());
        return;
    }
    for (piece_idx, piece) in tag.tag_text.split_whitespace().enumerate() {
        let mut word = Word::new(0, piece);
        word.speaker_label = tag.speaker_label.clone();
        word.is_paragraph_start = piece_idx == 0 && tag.is_paragraph_start;
        out.push(word);
    }
}

/// Gives every unlabeled tag pseudo-word the speaker of the content word it
/// introduces, or of the preceding content word when nothing follows.
pub fn label_tags_from_neighbors(words: &[Word]) -> Vec<Word> {
    let mut out = words.to_vec();
    let mut is_tag = vec![false; out.len()];
    let mut idx = 0;
    while idx < out.len() {
        match tag_at(&out, idx) {
            Some((len, _)) => {
                is_tag[idx..idx + len].fill(true);
                idx += len;
            }
            None => idx += 1,
        }
    }

    let mut following: Vec<Option<String>> = vec![None; out.len()];
    let mut next_label: Option<String> = None;
    for idx in (0..out.len()).rev() {
        if is_tag[idx] {
            following[idx] = next_label.clone();
        } else if !out[idx].is_separator() {
            next_label = out[idx].speaker_label.clone();
        }
    }

    let mut prev_label: Option<String> = None;
    for (idx, word) in out.iter_mut().enumerate() {
        if !is_tag[idx] {
            if !word.is_separator() {
                prev_label = word.speaker_label.clone();
            }
            continue;
        }
        if word.speaker_label.is_none() {
            word.speaker_label = following[idx].take().or_else(|| prev_label.clone());
        }
    }
    out
}

fn tag_at(words: &[Word], idx: usize) -> Option<(usize, TagKind)> {
    let word = words.get(idx)?;
    if is_timestamp_tag(&word.display_text) {
        return Some((1, TagKind::Timestamp));
    }
    speaker_tag_len(words, idx).map(|len| (len, TagKind::Speaker))
}

fn speaker_tag_len(words: &[Word], idx: usize) -> Option<usize> {
    let texts: Vec<&str> = words
        .iter()
        .skip(idx)
        .take(2)
        .map(|w| w.display_text.as_str())
        .collect();
    leading_speaker(&texts).map(|(len, _)| len)
}

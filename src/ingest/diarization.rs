use serde::Deserialize;
use serde_json::Value;

use crate::error::TranscriptError;
use crate::types::{DiarizationSegment, SpeakerMap};

const CONTEXT: &str = "diarization segments";

#[derive(Debug, Deserialize)]
struct RawTurn {
    start: Option<f64>,
    end: Option<f64>,
    speaker: Option<RawSpeakerId>,
}

/// Diarizers disagree on whether speaker ids are strings or integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSpeakerId {
    Text(String),
    Number(i64),
}

impl RawSpeakerId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Decodes `[{start, end, speaker}]` (or `{segments: [...]}`) into segments
/// sorted by start time, ties kept in input order, plus an identity speaker map.
pub fn ingest_diarization(
    source: &str,
) -> Result<(Vec<DiarizationSegment>, SpeakerMap), TranscriptError> {
    let doc: Value = serde_json::from_str(source)
        .map_err(|e| TranscriptError::json("parse diarization JSON", e))?;
    let list = match doc {
        Value::Array(_) => doc,
        Value::Object(mut obj) => obj.remove("segments").ok_or_else(|| {
            TranscriptError::malformed(CONTEXT, "expected an array or an object with `segments`")
        })?,
        _ => {
            return Err(TranscriptError::malformed(
                CONTEXT,
                "expected an array or an object with `segments`",
            ))
        }
    };
    let turns: Vec<RawTurn> = serde_json::from_value(list)
        .map_err(|e| TranscriptError::json("decode diarization turns", e))?;

    let mut segments = Vec::with_capacity(turns.len());
    for (idx, turn) in turns.into_iter().enumerate() {
        segments.push(validate_turn(idx + 1, turn)?);
    }
    // `sort_by` is stable, so equal starts keep input order.
    segments.sort_by(|a: &DiarizationSegment, b| a.start_time.total_cmp(&b.start_time));

    let speakers = SpeakerMap::identity(segments.iter().map(|s| s.raw_speaker_id.as_str()));
    tracing::debug!(
        segments = segments.len(),
        speakers = speakers.len(),
        "ingest: diarization decoded"
    );
    Ok((segments, speakers))
}

fn validate_turn(position: usize, turn: RawTurn) -> Result<DiarizationSegment, TranscriptError> {
    let start = turn.start.ok_or_else(|| {
        TranscriptError::malformed(CONTEXT, format!("turn {position} has no start"))
    })?;
    let end = turn
        .end
        .ok_or_else(|| TranscriptError::malformed(CONTEXT, format!("turn {position} has no end")))?;
    let speaker = turn.speaker.ok_or_else(|| {
        TranscriptError::malformed(CONTEXT, format!("turn {position} has no speaker"))
    })?;

    if !start.is_finite() || !end.is_finite() {
        return Err(TranscriptError::malformed(
            CONTEXT,
            format!("turn {position} has a non-finite time"),
        ));
    }
    if start < 0.0 {
        return Err(TranscriptError::malformed(
            CONTEXT,
            format!("turn {position} starts at negative time {start}"),
        ));
    }
    if end <= start {
        return Err(TranscriptError::malformed(
            CONTEXT,
            format!("turn {position} has non-positive duration ({start}..{end})"),
        ));
    }

    let raw_speaker_id = speaker.into_string();
    if raw_speaker_id.trim().is_empty() {
        return Err(TranscriptError::malformed(
            CONTEXT,
            format!("turn {position} has an empty speaker id"),
        ));
    }

    Ok(DiarizationSegment {
        start_time: start,
        end_time: end,
        raw_speaker_id,
    })
}

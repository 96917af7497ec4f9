use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed input in {context}: {message}")]
    MalformedInput {
        context: &'static str,
        message: String,
    },
    #[error("an alignment request is already pending; complete or cancel it first")]
    AlignmentPending,
    #[error("alignment request {request_id} is not the pending request")]
    StaleAlignmentRequest { request_id: u64 },
}

impl TranscriptError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn malformed(context: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            context,
            message: message.into(),
        }
    }

    /// True for every failure caused by structurally invalid import data,
    /// including JSON that could not be decoded at all.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput { .. } | Self::Json { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_count_as_malformed_input() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = TranscriptError::json("parse diarization", source);
        assert!(err.is_malformed_input());
        assert!(err.to_string().starts_with("JSON parse error while parse diarization"));
    }

    #[test]
    fn precondition_errors_are_not_malformed_input() {
        assert!(!TranscriptError::AlignmentPending.is_malformed_input());
        let io = TranscriptError::io(
            "read history",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!io.is_malformed_input());
    }

    #[test]
    fn malformed_message_includes_context() {
        let err = TranscriptError::malformed("timed words", "word 3 is missing start_time");
        assert_eq!(
            err.to_string(),
            "malformed input in timed words: word 3 is missing start_time"
        );
    }
}

pub mod alignment;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod pipeline;
pub mod types;

pub use alignment::diarization_overlay::{
    overlay_diarization, overlay_diarization_with_map, segment_paragraphs,
};
pub use alignment::interpolation::{interpolate, interpolate_with_rate};
pub use alignment::matcher::{align, align_with_stats, AlignmentOutcome};
pub use alignment::report::{AlignmentStats, InterpolationStats, ReconcileReport};
pub use alignment::tags::{reconstruct, strip};
pub use config::AlignmentConfig;
pub use error::TranscriptError;
pub use history::{
    AlignmentRequest, HistoryStore, JsonFileStore, MemoryStore, TranscriptSession,
    TranscriptVersion, VersionHistory,
};
pub use ingest::diarization::ingest_diarization;
pub use ingest::free_text::{ingest_free_text, render_free_text};
pub use ingest::timed_words::{ingest_timed_words, TimedWordFormat};
pub use pipeline::builder::ReconcilerBuilder;
pub use pipeline::runtime::{Reconciler, Reconciliation};
pub use pipeline::traits::{GapFiller, SequenceMatcher, SpeakerAssigner};
pub use types::{
    Diarization, DiarizationSegment, SpeakerMap, SpeakerTagInfo, TagKind, TimedWord, Word,
};

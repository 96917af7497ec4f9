pub mod diarization;
pub mod free_text;
pub mod timed_words;
pub mod timestamp;

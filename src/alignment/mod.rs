pub mod diarization_overlay;
pub mod interpolation;
pub mod matcher;
pub mod report;
pub mod tags;

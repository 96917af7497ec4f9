use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::alignment::report::ReconcileReport;
use crate::error::TranscriptError;
use crate::ingest::free_text::ingest_free_text;
use crate::pipeline::runtime::Reconciler;
use crate::types::{renumber, Diarization, TimedWord, Word};

/// A named, immutable snapshot of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptVersion {
    name: String,
    words: Vec<Word>,
}

impl TranscriptVersion {
    pub fn new(name: impl Into<String>, mut words: Vec<Word>) -> Self {
        renumber(&mut words);
        Self {
            name: name.into(),
            words,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Editable copy of the words.
    pub fn to_buffer(&self) -> Vec<Word> {
        self.words.clone()
    }

    /// The version's fully timed words, usable as an alignment reference.
    pub fn timed_reference(&self) -> Vec<TimedWord> {
        TimedWord::from_timed_words(&self.words)
    }
}

/// Linear undo/redo stack of versions plus a cursor on the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHistory {
    versions: Vec<TranscriptVersion>,
    current: usize,
}

impl VersionHistory {
    pub fn new(initial: TranscriptVersion) -> Self {
        Self {
            versions: vec![initial],
            current: 0,
        }
    }

    pub fn current(&self) -> &TranscriptVersion {
        &self.versions[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Drops every redo version, then appends `version` and makes it current.
    pub fn commit(&mut self, version: TranscriptVersion) {
        let dropped = self.versions.len() - self.current - 1;
        self.versions.truncate(self.current + 1);
        self.versions.push(version);
        self.current = self.versions.len() - 1;
        tracing::debug!(
            name = self.current().name(),
            index = self.current,
            dropped,
            "history: version committed"
        );
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.versions.len()
    }

    pub fn versions(&self) -> &[TranscriptVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Only a history decoded from bad data can be empty; see [`Self::validate`].
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn validate(&self) -> Result<(), TranscriptError> {
        if self.versions.is_empty() {
            return Err(TranscriptError::malformed(
                "version history",
                "history has no versions",
            ));
        }
        if self.current >= self.versions.len() {
            return Err(TranscriptError::malformed(
                "version history",
                format!(
                    "cursor {} out of range for {} versions",
                    self.current,
                    self.versions.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Persistence port for version history.
pub trait HistoryStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<VersionHistory>, TranscriptError>;
    fn save(&self, history: &VersionHistory) -> Result<(), TranscriptError>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<Option<VersionHistory>, TranscriptError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TranscriptError::io("read version history", e)),
        };
        let history: VersionHistory = serde_json::from_str(&data)
            .map_err(|e| TranscriptError::json("parse version history", e))?;
        history.validate()?;
        Ok(Some(history))
    }

    fn save(&self, history: &VersionHistory) -> Result<(), TranscriptError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| TranscriptError::io("create version history directory", e))?;
        }
        let mut file = File::create(&self.path)
            .map_err(|e| TranscriptError::io("create version history file", e))?;
        serde_json::to_writer_pretty(&mut file, history)
            .map_err(|e| TranscriptError::json("serialize version history", e))?;
        file.write_all(b"\n")
            .map_err(|e| TranscriptError::io("finalize version history file", e))?;
        tracing::debug!(path = %self.path.display(), versions = history.len(), "history: saved");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<VersionHistory>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Option<VersionHistory>, TranscriptError> {
        let slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(slot.clone())
    }

    fn save(&self, history: &VersionHistory) -> Result<(), TranscriptError> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(history.clone());
        Ok(())
    }
}

/// Token for an outstanding alignment on a [`TranscriptSession`].
#[derive(Debug, PartialEq, Eq)]
pub struct AlignmentRequest {
    id: u64,
}

impl AlignmentRequest {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Version history plus the single-outstanding-alignment guard.
///
/// Only one alignment may be pending at a time; a second `begin_alignment`,
/// a text save, or an undo/redo while one is pending is refused so the result
/// always lands on the version it was computed from.
#[derive(Debug)]
pub struct TranscriptSession {
    history: VersionHistory,
    pending: Option<u64>,
    next_request: u64,
}

impl TranscriptSession {
    pub fn new(history: VersionHistory) -> Self {
        Self {
            history,
            pending: None,
            next_request: 1,
        }
    }

    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    pub fn current(&self) -> &TranscriptVersion {
        self.history.current()
    }

    pub fn is_alignment_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin_alignment(&mut self) -> Result<AlignmentRequest, TranscriptError> {
        if self.pending.is_some() {
            return Err(TranscriptError::AlignmentPending);
        }
        let id = self.next_request;
        self.next_request += 1;
        self.pending = Some(id);
        tracing::debug!(request_id = id, "session: alignment started");
        Ok(AlignmentRequest { id })
    }

    /// Commits the aligned words as a new version and clears the pending flag.
    pub fn complete_alignment(
        &mut self,
        request: AlignmentRequest,
        name: impl Into<String>,
        words: Vec<Word>,
    ) -> Result<(), TranscriptError> {
        self.take_pending(&request)?;
        self.history.commit(TranscriptVersion::new(name, words));
        Ok(())
    }

    /// Discards an alignment; the history is left untouched.
    pub fn cancel_alignment(&mut self, request: AlignmentRequest) -> Result<(), TranscriptError> {
        self.take_pending(&request)?;
        tracing::debug!(request_id = request.id, "session: alignment cancelled");
        Ok(())
    }

    /// Reconciles the current version against fresh reference timing and
    /// commits the result as version `name`.
    pub fn apply_timestamps(
        &mut self,
        name: impl Into<String>,
        reference: &[TimedWord],
        diarization: Option<&Diarization>,
        reconciler: &Reconciler,
    ) -> Result<ReconcileReport, TranscriptError> {
        let request = self.begin_alignment()?;
        let result = reconciler.reconcile(self.current().words(), reference, diarization);
        self.complete_alignment(request, name, result.words)?;
        Ok(result.report)
    }

    /// Saves an edit of the rendered text as version `name`, carrying timing
    /// over from the current version for every word that still matches.
    pub fn save_text(
        &mut self,
        name: impl Into<String>,
        text: &str,
        reconciler: &Reconciler,
    ) -> Result<(), TranscriptError> {
        if self.pending.is_some() {
            return Err(TranscriptError::AlignmentPending);
        }
        let (edited, _) = ingest_free_text(text);
        let reference = self.current().timed_reference();
        let words = reconciler.carry_over(&edited, &reference);
        self.history.commit(TranscriptVersion::new(name, words));
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.pending.is_none() && self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.pending.is_none() && self.history.redo()
    }

    pub fn persist(&self, store: &dyn HistoryStore) -> Result<(), TranscriptError> {
        store.save(&self.history)
    }

    /// Loads the stored history, or starts a new one from `initial` when the
    /// store is empty.
    pub fn restore(
        store: &dyn HistoryStore,
        initial: TranscriptVersion,
    ) -> Result<Self, TranscriptError> {
        let history = match store.load()? {
            Some(history) => history,
            None => VersionHistory::new(initial),
        };
        Ok(Self::new(history))
    }

    fn take_pending(&mut self, request: &AlignmentRequest) -> Result<(), TranscriptError> {
        if self.pending != Some(request.id) {
            return Err(TranscriptError::StaleAlignmentRequest {
                request_id: request.id,
            });
        }
        self.pending = None;
        Ok(())
    }
}

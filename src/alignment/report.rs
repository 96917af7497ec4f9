use serde::Serialize;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Outcome counters for one alignment pass. `window_exceeded` and
/// `no_reference` are quality signals, never errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignmentStats {
    pub edited_words: usize,
    pub reference_words: usize,
    pub matched: usize,
    /// Matchable edited words left without timing.
    pub inserted: usize,
    /// Reference words no edited word consumed.
    pub deleted: usize,
    /// Unmatched words whose only candidate lay beyond the look-ahead window.
    pub window_exceeded: usize,
    pub no_reference: bool,
}

impl AlignmentStats {
    pub fn match_ratio(&self) -> f32 {
        let matchable = self.matched + self.inserted;
        if matchable == 0 {
            0.0
        } else {
            self.matched as f32 / matchable as f32
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterpolationStats {
    pub anchors: usize,
    pub interpolated: usize,
    pub extrapolated: usize,
    /// Words whose start time had to be raised to keep start times monotone.
    pub clamped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub schema_version: u32,
    pub generated_at: String,
    pub alignment: AlignmentStats,
    pub interpolation: InterpolationStats,
    pub labeled_words: usize,
    pub tags_reinserted: usize,
    pub paragraphs: usize,
    pub notes: Vec<String>,
}

impl ReconcileReport {
    pub(crate) fn new(
        alignment: AlignmentStats,
        interpolation: InterpolationStats,
        labeled_words: usize,
        tags_reinserted: usize,
        paragraphs: usize,
    ) -> Self {
        let notes = quality_notes(&alignment, &interpolation);
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            alignment,
            interpolation,
            labeled_words,
            tags_reinserted,
            paragraphs,
            notes,
        }
    }
}

fn quality_notes(alignment: &AlignmentStats, interpolation: &InterpolationStats) -> Vec<String> {
    let mut notes = Vec::new();
    if alignment.no_reference {
        notes.push("no reference timing supplied; every word is unmatched".to_string());
    }
    if alignment.window_exceeded > 0 {
        notes.push(format!(
            "{} word(s) had candidates only beyond the look-ahead window",
            alignment.window_exceeded
        ));
    }
    if alignment.edited_words > 0 && !alignment.no_reference && alignment.match_ratio() < 0.5 {
        notes.push(format!(
            "low match ratio {:.2}; the reference may belong to different audio",
            alignment.match_ratio()
        ));
    }
    if interpolation.clamped > 0 {
        notes.push(format!(
            "{} start time(s) clamped to keep timing monotone",
            interpolation.clamped
        ));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_ratio_ignores_unmatchable_words() {
        let stats = AlignmentStats {
            edited_words: 5,
            matched: 3,
            inserted: 1,
            ..AlignmentStats::default()
        };
        assert!((stats.match_ratio() - 0.75).abs() < 1e-6);
        assert_eq!(AlignmentStats::default().match_ratio(), 0.0);
    }

    #[test]
    fn report_collects_quality_notes() {
        let alignment = AlignmentStats {
            edited_words: 4,
            reference_words: 4,
            matched: 1,
            inserted: 3,
            window_exceeded: 2,
            ..AlignmentStats::default()
        };
        let interpolation = InterpolationStats {
            clamped: 1,
            ..InterpolationStats::default()
        };
        let report = ReconcileReport::new(alignment, interpolation, 0, 0, 1);
        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        assert_eq!(report.notes.len(), 3);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.generated_at).is_ok());

        let json = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(json["alignment"]["window_exceeded"], 2);
    }

    #[test]
    fn no_reference_note_replaces_ratio_note() {
        let alignment = AlignmentStats {
            edited_words: 2,
            inserted: 2,
            no_reference: true,
            ..AlignmentStats::default()
        };
        let report = ReconcileReport::new(alignment, InterpolationStats::default(), 0, 0, 0);
        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].contains("no reference"));
    }
}

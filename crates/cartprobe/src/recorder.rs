//! Append-only result recording.
//!
//! One row per attempted configuration combination, in iteration order. Rows
//! are created `Pending` (or `Skipped` for irrecoverable failures) and get
//! their final status exactly once, during the post-run comparison pass.

use serde::{Deserialize, Serialize};

/// Dimension name for the product shape
pub const DIM_SHAPE: &str = "Shape";
/// Dimension name for the size label
pub const DIM_SIZE: &str = "Size";
/// Dimension name for the finishing
pub const DIM_FINISHING: &str = "Finishing";
/// Dimension name for the quantity tier
pub const DIM_QUANTITY: &str = "Quantity";
/// Dimension name for individual packaging
pub const DIM_PACKAGING: &str = "IndividualPackaging";

/// One cartesian-product tuple of configuration choices, in dimension order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    entries: Vec<(String, String)>,
}

impl Combination {
    /// Create an empty combination
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dimension choice (builder form)
    #[must_use]
    pub fn with(mut self, dimension: impl Into<String>, label: impl Into<String>) -> Self {
        self.entries.push((dimension.into(), label.into()));
        self
    }

    /// Append a dimension choice
    pub fn push(&mut self, dimension: impl Into<String>, label: impl Into<String>) {
        self.entries.push((dimension.into(), label.into()));
    }

    /// Chosen label for a dimension
    #[must_use]
    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, label)| label.as_str())
    }

    /// Dimension/label pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, label)| (name.as_str(), label.as_str()))
    }

    /// Number of dimensions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no dimension has been chosen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for Combination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.entries.iter().map(|(_, l)| l.as_str()).collect();
        write!(f, "{}", labels.join(" / "))
    }
}

/// Final classification of a recorded row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowStatus {
    /// Awaiting the comparison pass
    Pending,
    /// Observed price within tolerance of the baseline
    Match,
    /// Observed price outside tolerance
    Mismatch {
        /// Baseline price
        expected: f64,
        /// Observed price
        actual: f64,
    },
    /// No baseline entry or quantity price for this combination
    NoBaseline,
    /// The combination failed irrecoverably and was abandoned
    Skipped,
}

impl RowStatus {
    /// Whether the status is final (set by iteration or comparison)
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Human-readable label, matching the exported Status column
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Pending => "Pending".to_string(),
            Self::Match => "Match".to_string(),
            Self::Mismatch { expected, actual } => {
                format!("Mismatch (Expected: {expected}, Got: {actual})")
            }
            Self::NoBaseline => "No baseline data".to_string(),
            Self::Skipped => "Skipped".to_string(),
        }
    }
}

/// One attempted configuration combination and what was observed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    /// The configuration tuple
    pub combination: Combination,
    /// Parsed price, when one was read
    pub observed_price: Option<f64>,
    /// Raw observed text (price string, or the skip reason)
    pub observed_text: String,
    /// Row status
    pub status: RowStatus,
}

/// Tally of row statuses after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowTally {
    /// Rows classified `Match`
    pub matches: usize,
    /// Rows classified `Mismatch`
    pub mismatches: usize,
    /// Rows with no baseline data
    pub no_baseline: usize,
    /// Rows skipped during iteration
    pub skipped: usize,
    /// Rows still pending (zero after a comparison pass)
    pub pending: usize,
}

/// Append-only, insertion-ordered result recorder
#[derive(Debug, Default)]
pub struct Recorder {
    rows: Vec<ResultRow>,
}

impl Recorder {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observed combination, pending comparison
    pub fn record_observed(
        &mut self,
        combination: Combination,
        observed_price: Option<f64>,
        observed_text: impl Into<String>,
    ) {
        self.rows.push(ResultRow {
            combination,
            observed_price,
            observed_text: observed_text.into(),
            status: RowStatus::Pending,
        });
    }

    /// Record a combination abandoned after an irrecoverable failure.
    /// Skipped combinations are never retried.
    pub fn record_skipped(&mut self, combination: Combination, reason: impl Into<String>) {
        self.rows.push(ResultRow {
            combination,
            observed_price: None,
            observed_text: reason.into(),
            status: RowStatus::Skipped,
        });
    }

    /// Recorded rows in insertion order
    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Mutable rows, for the comparison pass
    pub fn rows_mut(&mut self) -> &mut [ResultRow] {
        &mut self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tally the current statuses
    #[must_use]
    pub fn tally(&self) -> RowTally {
        let mut tally = RowTally::default();
        for row in &self.rows {
            match row.status {
                RowStatus::Match => tally.matches += 1,
                RowStatus::Mismatch { .. } => tally.mismatches += 1,
                RowStatus::NoBaseline => tally.no_baseline += 1,
                RowStatus::Skipped => tally.skipped += 1,
                RowStatus::Pending => tally.pending += 1,
            }
        }
        tally
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn combo(shape: &str, qty: &str) -> Combination {
        Combination::new()
            .with(DIM_SHAPE, shape)
            .with(DIM_SIZE, "32x32mm")
            .with(DIM_QUANTITY, qty)
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut recorder = Recorder::new();
        recorder.record_observed(combo("Circle", "5"), Some(4.5), "S$4.50");
        recorder.record_skipped(combo("Square", "10"), "upload modal never appeared");
        recorder.record_observed(combo("Heart", "20"), Some(12.0), "S$12.00");
        assert_eq!(recorder.len(), 3);
        assert_eq!(recorder.rows()[0].combination.get(DIM_SHAPE), Some("Circle"));
        assert_eq!(recorder.rows()[1].status, RowStatus::Skipped);
        assert_eq!(recorder.rows()[2].combination.get(DIM_SHAPE), Some("Heart"));
    }

    #[test]
    fn test_tally() {
        let mut recorder = Recorder::new();
        recorder.record_observed(combo("Circle", "5"), Some(4.5), "S$4.50");
        recorder.record_skipped(combo("Square", "10"), "stuck modal");
        let tally = recorder.tally();
        assert_eq!(tally.pending, 1);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.matches, 0);
    }

    #[test]
    fn test_mismatch_label_format() {
        let status = RowStatus::Mismatch {
            expected: 6.0,
            actual: 4.5,
        };
        assert_eq!(status.label(), "Mismatch (Expected: 6, Got: 4.5)");
    }

    #[test]
    fn test_combination_display() {
        let c = Combination::new()
            .with(DIM_SHAPE, "Circle")
            .with(DIM_SIZE, "32x32mm")
            .with(DIM_QUANTITY, "5");
        assert_eq!(c.to_string(), "Circle / 32x32mm / 5");
        assert_eq!(c.get(DIM_SIZE), Some("32x32mm"));
        assert_eq!(c.get("Nope"), None);
    }
}

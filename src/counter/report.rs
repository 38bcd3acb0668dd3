//! Class count report types and terminal formatting.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::FileFailure;
use crate::label::ClassId;
use crate::layout::Split;

/// Occurrence and file counts for one class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    /// Annotation lines with this class.
    pub occurrences: usize,
    /// Label files with at least one line of this class.
    pub files: usize,
}

/// Class counts for a single split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitCounts {
    pub split: Split,
    pub classes: BTreeMap<ClassId, ClassCount>,
    /// Label files read.
    pub label_files: usize,
    /// Lines carrying a class token.
    pub annotation_lines: usize,
    /// Token-less lines skipped during the scan.
    pub skipped_lines: usize,
    /// Empty or whitespace-only label files.
    pub null_files: usize,
    /// Label files that could not be read.
    pub failures: Vec<FileFailure>,
}

impl SplitCounts {
    /// Sum of occurrences over every class.
    pub fn total_occurrences(&self) -> usize {
        self.classes.values().map(|c| c.occurrences).sum()
    }
}

/// Per-split and dataset-wide class distribution.
#[derive(Clone, Debug, Serialize)]
pub struct CountReport {
    pub splits: Vec<SplitCounts>,
    pub skipped_splits: Vec<Split>,
    pub totals: BTreeMap<ClassId, ClassCount>,
}

impl CountReport {
    /// Counts for one split, if it was scanned.
    pub fn split(&self, split: Split) -> Option<&SplitCounts> {
        self.splits.iter().find(|s| s.split == split)
    }

    /// Sum of occurrences over every class and split.
    pub fn total_occurrences(&self) -> usize {
        self.totals.values().map(|c| c.occurrences).sum()
    }

    /// Total unreadable label files.
    pub fn failure_count(&self) -> usize {
        self.splits.iter().map(|s| s.failures.len()).sum()
    }
}

impl fmt::Display for CountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Annotation counts:")?;

        for split in &self.splits {
            writeln!(
                f,
                "  {} ({} label files, {} empty):",
                split.split, split.label_files, split.null_files
            )?;
            if split.classes.is_empty() {
                writeln!(f, "    (no annotations)")?;
            }
            for (class_id, count) in &split.classes {
                writeln!(
                    f,
                    "    class {}: {} annotations in {} files",
                    class_id, count.occurrences, count.files
                )?;
            }
        }

        writeln!(f, "  all splits:")?;
        for (class_id, count) in &self.totals {
            writeln!(
                f,
                "    class {}: {} annotations in {} files",
                class_id, count.occurrences, count.files
            )?;
        }
        writeln!(f, "  Total annotations: {}", self.total_occurrences())?;

        if !self.skipped_splits.is_empty() {
            let names: Vec<&str> = self.skipped_splits.iter().map(Split::name).collect();
            writeln!(f, "  Skipped splits (not found): {}", names.join(", "))?;
        }

        let skipped_lines: usize = self.splits.iter().map(|s| s.skipped_lines).sum();
        if skipped_lines > 0 {
            writeln!(f, "  Skipped lines without a class token: {}", skipped_lines)?;
        }

        let failures = self.failure_count();
        if failures > 0 {
            writeln!(f)?;
            writeln!(f, "Unreadable label files ({}):", failures)?;
            for failure in self.splits.iter().flat_map(|s| &s.failures) {
                writeln!(f, "  - {}", failure)?;
            }
        }

        Ok(())
    }
}

//! Remap report types and terminal formatting.

use serde::Serialize;
use std::fmt;

use crate::error::FileFailure;
use crate::layout::Split;

/// Remap outcome for one split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitRemap {
    pub split: Split,
    pub files_scanned: usize,
    /// Files whose content changed (and were rewritten unless dry run).
    pub files_changed: usize,
    pub lines_remapped: usize,
    /// Token-less lines removed while rewriting.
    pub lines_dropped: usize,
    pub failures: Vec<FileFailure>,
}

impl SplitRemap {
    pub fn new(split: Split) -> Self {
        Self {
            split,
            files_scanned: 0,
            files_changed: 0,
            lines_remapped: 0,
            lines_dropped: 0,
            failures: Vec::new(),
        }
    }
}

/// Remap outcome for a whole dataset.
#[derive(Clone, Debug, Serialize)]
pub struct RemapReport {
    pub dry_run: bool,
    /// The applied map as `(old, new)` pairs.
    pub class_map: Vec<(String, String)>,
    pub splits: Vec<SplitRemap>,
}

impl RemapReport {
    pub fn files_changed(&self) -> usize {
        self.splits.iter().map(|s| s.files_changed).sum()
    }

    pub fn lines_remapped(&self) -> usize {
        self.splits.iter().map(|s| s.lines_remapped).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.splits.iter().map(|s| s.failures.len()).sum()
    }
}

impl fmt::Display for RemapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mapping: Vec<String> = self
            .class_map
            .iter()
            .map(|(old, new)| format!("{old}->{new}"))
            .collect();
        writeln!(f, "Class map: {}", mapping.join(", "))?;

        for split in &self.splits {
            writeln!(
                f,
                "  {}: {} file(s) scanned, {} rewritten, {} line(s) remapped, {} blank line(s) dropped",
                split.split,
                split.files_scanned,
                split.files_changed,
                split.lines_remapped,
                split.lines_dropped
            )?;
        }

        let verb = if self.dry_run {
            "Would rewrite"
        } else {
            "Rewrote"
        };
        writeln!(
            f,
            "{} {} file(s), {} line(s) remapped",
            verb,
            self.files_changed(),
            self.lines_remapped()
        )?;

        writeln!(f, "Errors: {}", self.failure_count())?;
        for failure in self.splits.iter().flat_map(|s| &s.failures) {
            writeln!(f, "  - {}", failure)?;
        }

        Ok(())
    }
}

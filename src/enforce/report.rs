//! Reports for destructive and additive pair operations.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::FileFailure;
use crate::layout::Split;

/// A stem within a split.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StemRef {
    pub split: Split,
    pub stem: String,
}

impl StemRef {
    pub fn new(split: Split, stem: impl Into<String>) -> Self {
        Self {
            split,
            stem: stem.into(),
        }
    }
}

impl fmt::Display for StemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.split, self.stem)
    }
}

/// One stem whose files were removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemovedPair {
    pub split: Split,
    pub stem: String,
    pub label_removed: bool,
    pub images_removed: usize,
}

/// Outcome of removing stems from a dataset.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DeletionReport {
    /// True if nothing was actually deleted.
    pub dry_run: bool,
    pub removed: Vec<RemovedPair>,
    /// Stems whose label was removed although no image existed.
    pub missing_images: Vec<StemRef>,
    /// Stems that were requested but are not in the split.
    pub not_found: Vec<StemRef>,
    pub failures: Vec<FileFailure>,
}

impl DeletionReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Number of stems removed.
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Number of label files removed.
    pub fn labels_removed(&self) -> usize {
        self.removed.iter().filter(|r| r.label_removed).count()
    }

    /// Number of image files removed.
    pub fn images_removed(&self) -> usize {
        self.removed.iter().map(|r| r.images_removed).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: DeletionReport) {
        self.removed.extend(other.removed);
        self.missing_images.extend(other.missing_images);
        self.not_found.extend(other.not_found);
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for DeletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run {
            "Would delete"
        } else {
            "Deleted"
        };
        writeln!(
            f,
            "{} {} stem(s): {} label file(s), {} image file(s)",
            verb,
            self.removed_count(),
            self.labels_removed(),
            self.images_removed()
        )?;

        if !self.missing_images.is_empty() {
            writeln!(
                f,
                "Labels without a matching image ({}):",
                self.missing_images.len()
            )?;
            for stem in &self.missing_images {
                writeln!(f, "  - {}", stem)?;
            }
        }

        if !self.not_found.is_empty() {
            writeln!(f, "Stems not found ({}):", self.not_found.len())?;
            for stem in &self.not_found {
                writeln!(f, "  - {}", stem)?;
            }
        }

        writeln!(f, "Errors: {}", self.failure_count())?;
        for failure in &self.failures {
            writeln!(f, "  - {}", failure)?;
        }

        Ok(())
    }
}

/// A label file holding no annotations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NullLabel {
    pub split: Split,
    pub stem: String,
    pub label_path: PathBuf,
    /// Whether at least one image shares the stem.
    pub image_present: bool,
}

/// Read-only listing of null label files.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NullReport {
    pub labels: Vec<NullLabel>,
    /// Label files that could not be read and were not classified.
    pub failures: Vec<FileFailure>,
}

impl NullReport {
    pub fn count(&self) -> usize {
        self.labels.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

impl fmt::Display for NullReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            writeln!(f, "No empty label files detected.")?;
        } else {
            writeln!(f, "Empty label files found ({}):", self.labels.len())?;
            for label in &self.labels {
                let note = if label.image_present {
                    ""
                } else {
                    " (no image)"
                };
                writeln!(f, "  {}{}", label.label_path.display(), note)?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(f, "Errors: {}", self.failure_count())?;
            for failure in &self.failures {
                writeln!(f, "  - {}", failure)?;
            }
        }
        Ok(())
    }
}

/// Outcome of adding negative samples to a split.
#[derive(Clone, Debug, Serialize)]
pub struct InjectionReport {
    pub split: Split,
    pub source: PathBuf,
    pub dry_run: bool,
    pub limit: usize,
    /// Recognised images found in the source pool.
    pub pool_size: usize,
    /// Stems added as image + empty label pairs.
    pub added: Vec<String>,
    /// Pool stems already present in the split, left untouched.
    pub skipped_existing: Vec<String>,
    /// How far the pool fell short of `limit`.
    pub shortfall: usize,
    pub failures: Vec<FileFailure>,
}

impl InjectionReport {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

impl fmt::Display for InjectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "Would add" } else { "Added" };
        writeln!(
            f,
            "{} {} negative sample(s) to {} (limit {}, pool {})",
            verb,
            self.added.len(),
            self.split,
            self.limit,
            self.pool_size
        )?;
        if !self.skipped_existing.is_empty() {
            writeln!(
                f,
                "Skipped {} pool image(s) whose stem already exists in {}",
                self.skipped_existing.len(),
                self.split
            )?;
        }
        if self.shortfall > 0 {
            writeln!(f, "Pool ran short by {}", self.shortfall)?;
        }
        writeln!(f, "Errors: {}", self.failures.len())?;
        for failure in &self.failures {
            writeln!(f, "  - {}", failure)?;
        }
        Ok(())
    }
}

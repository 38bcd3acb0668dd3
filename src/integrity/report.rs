//! Integrity report types for structured issue reporting.
//!
//! Issues carry a severity, a stable code, and the split/stem they concern,
//! so they can be printed, serialized, or filtered programmatically.

use serde::Serialize;
use std::fmt;

use crate::layout::Split;

/// The result of checking a dataset's image/label pairing.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IntegrityReport {
    /// Stems checked, per split.
    pub checked: Vec<SplitChecked>,
    /// All issues found.
    pub issues: Vec<IntegrityIssue>,
}

/// Stem count for one checked split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitChecked {
    pub split: Split,
    pub stems: usize,
}

impl IntegrityReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: IntegrityIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Number of unpaired stems (label without image or image without label).
    pub fn violation_count(&self) -> usize {
        self.issues.iter().filter(|i| i.code.is_violation()).count()
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues with a given code.
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let checked: usize = self.checked.iter().map(|c| c.stems).sum();

        if self.issues.is_empty() {
            return writeln!(
                f,
                "Integrity check passed: {} stem(s) checked, no issues found",
                checked
            );
        }

        writeln!(
            f,
            "Integrity check of {} stem(s) found {} error(s) and {} warning(s):",
            checked,
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single integrity issue.
#[derive(Clone, Debug, Serialize)]
pub struct IntegrityIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub split: Split,
    pub stem: String,
}

impl IntegrityIssue {
    /// Creates a new issue.
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        split: Split,
        stem: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            split,
            stem: stem.into(),
        }
    }

    pub fn error(
        code: IssueCode,
        message: impl Into<String>,
        split: Split,
        stem: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, code, message, split, stem)
    }

    pub fn warning(
        code: IssueCode,
        message: impl Into<String>,
        split: Split,
        stem: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, message, split, stem)
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}/{}: {}",
            severity, self.code, self.split, self.stem, self.message
        )
    }
}

/// The severity of an integrity issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Worth a look, but the pair is usable.
    Warning,
    /// The stem is unpaired or unreadable.
    Error,
}

/// A stable code identifying the type of integrity issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    /// A label file has no image with the same stem.
    LabelWithoutImage,
    /// An image has no label file with the same stem.
    ImageWithoutLabel,
    /// Several images share one stem.
    DuplicateImageStem,
    /// A label file could not be read.
    UnreadableLabel,
}

impl IssueCode {
    /// True for the codes that break image/label pairing.
    pub fn is_violation(&self) -> bool {
        matches!(self, IssueCode::LabelWithoutImage | IssueCode::ImageWithoutLabel)
    }
}

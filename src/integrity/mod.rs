//! Image/label pairing checks.
//!
//! The check is read-only. It reports:
//! - label files with no image sharing their stem
//! - images with no label file
//! - stems carried by more than one image file
//! - label files that could not be read

mod report;

pub use report::{IntegrityIssue, IntegrityReport, IssueCode, Severity, SplitChecked};

use tracing::info;

use crate::index::SplitScan;
use crate::layout::stem_string;

/// Check every scanned split and collect the issues found.
pub fn check_integrity(scans: &[SplitScan]) -> IntegrityReport {
    let mut report = IntegrityReport::new();

    for scan in scans {
        let split = scan.split();
        report.checked.push(SplitChecked {
            split,
            stems: scan.stems.len(),
        });

        for (stem, entry) in scan.stems.entries() {
            match (&entry.label, entry.images.len()) {
                (Some(label), 0) => report.add(IntegrityIssue::error(
                    IssueCode::LabelWithoutImage,
                    format!("label {} has no matching image", label.display()),
                    split,
                    stem,
                )),
                (None, n) if n > 0 => report.add(IntegrityIssue::error(
                    IssueCode::ImageWithoutLabel,
                    format!("image {} has no label file", entry.images[0].display()),
                    split,
                    stem,
                )),
                _ => {}
            }

            if entry.images.len() > 1 {
                let names: Vec<String> = entry
                    .images
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                report.add(IntegrityIssue::warning(
                    IssueCode::DuplicateImageStem,
                    format!("{} images share this stem: {}", names.len(), names.join(", ")),
                    split,
                    stem,
                ));
            }
        }

        for failure in &scan.index.failures {
            report.add(IntegrityIssue::error(
                IssueCode::UnreadableLabel,
                failure.message.clone(),
                split,
                stem_string(&scan.stems.layout.labels_dir, &failure.path),
            ));
        }
    }

    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "integrity check finished"
    );

    report
}

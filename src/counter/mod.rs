//! Class distribution counting.
//!
//! Aggregates annotation indexes into per-split and dataset-wide class
//! counts. Pure aggregation: nothing here touches the filesystem.

mod report;

pub use report::{ClassCount, CountReport, SplitCounts};

use std::collections::BTreeMap;

use crate::index::AnnotationIndex;
use crate::label::ClassId;
use crate::layout::Split;

/// Aggregate one split's index.
pub fn count_split(index: &AnnotationIndex) -> SplitCounts {
    let classes: BTreeMap<ClassId, ClassCount> = index
        .occurrences
        .iter()
        .map(|(class_id, &occurrences)| {
            (
                class_id.clone(),
                ClassCount {
                    occurrences,
                    files: index.file_count(class_id),
                },
            )
        })
        .collect();

    SplitCounts {
        split: index.split,
        classes,
        label_files: index.files_scanned,
        annotation_lines: index.annotation_lines,
        skipped_lines: index.skipped_lines,
        null_files: index.null_stems.len(),
        failures: index.failures.clone(),
    }
}

/// Aggregate several split indexes into one report.
pub fn count_classes<'a, I>(indexes: I, skipped_splits: &[Split]) -> CountReport
where
    I: IntoIterator<Item = &'a AnnotationIndex>,
{
    let splits: Vec<SplitCounts> = indexes.into_iter().map(count_split).collect();

    let mut totals: BTreeMap<ClassId, ClassCount> = BTreeMap::new();
    for split in &splits {
        for (class_id, count) in &split.classes {
            let total = totals.entry(class_id.clone()).or_default();
            total.occurrences += count.occurrences;
            total.files += count.files;
        }
    }

    CountReport {
        splits,
        skipped_splits: skipped_splits.to_vec(),
        totals,
    }
}

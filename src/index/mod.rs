//! Annotation index: which label files carry which classes.
//!
//! Membership is per file (a file with three lines of class `4` is one member
//! of class `4`), because pruning removes whole files. Occurrence counts are
//! tracked alongside, one per annotation line.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use tracing::{debug, warn};

use crate::error::{CurateError, FileFailure};
use crate::label::{is_null_label, parse_label_line, ClassId};
use crate::layout::{scan_split, DatasetLayout, Split, StemIndex};

/// Per-class membership and occurrence counts for one split.
#[derive(Clone, Debug)]
pub struct AnnotationIndex {
    pub split: Split,
    /// Stems of the label files holding at least one line of each class.
    pub members: BTreeMap<ClassId, BTreeSet<String>>,
    /// Number of annotation lines per class.
    pub occurrences: BTreeMap<ClassId, usize>,
    /// Label files read successfully.
    pub files_scanned: usize,
    /// Lines with a class token.
    pub annotation_lines: usize,
    /// Lines with no token at all, skipped.
    pub skipped_lines: usize,
    /// Stems whose label file is empty or whitespace-only.
    pub null_stems: Vec<String>,
    /// Label files that could not be read.
    pub failures: Vec<FileFailure>,
}

impl AnnotationIndex {
    /// Creates an empty index for a split.
    pub fn new(split: Split) -> Self {
        Self {
            split,
            members: BTreeMap::new(),
            occurrences: BTreeMap::new(),
            files_scanned: 0,
            annotation_lines: 0,
            skipped_lines: 0,
            null_stems: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Fold one label file's text into the index.
    pub fn add_label_text(&mut self, stem: &str, text: &str) {
        self.files_scanned += 1;

        if is_null_label(text) {
            self.null_stems.push(stem.to_string());
        }

        for line in text.lines() {
            let Some(parsed) = parse_label_line(line) else {
                self.skipped_lines += 1;
                continue;
            };

            let class_id = ClassId::new(parsed.class_id);
            self.annotation_lines += 1;
            *self.occurrences.entry(class_id.clone()).or_insert(0) += 1;
            self.members
                .entry(class_id)
                .or_default()
                .insert(stem.to_string());
        }
    }

    /// Stems of files containing `class_id`.
    pub fn members_of(&self, class_id: &ClassId) -> Option<&BTreeSet<String>> {
        self.members.get(class_id)
    }

    /// Number of files containing `class_id`.
    pub fn file_count(&self, class_id: &ClassId) -> usize {
        self.members.get(class_id).map_or(0, BTreeSet::len)
    }

    /// Number of annotation lines of `class_id`.
    pub fn occurrence_count(&self, class_id: &ClassId) -> usize {
        self.occurrences.get(class_id).copied().unwrap_or(0)
    }

    /// Sum of occurrences over every class.
    pub fn total_occurrences(&self) -> usize {
        self.occurrences.values().sum()
    }
}

/// Build the annotation index for every label file of a scanned split.
///
/// An unreadable file is recorded once in `failures` and the scan moves on.
pub fn build_index(stems: &StemIndex) -> AnnotationIndex {
    let mut index = AnnotationIndex::new(stems.split());

    for (stem, path) in stems.labels() {
        match fs::read_to_string(path) {
            Ok(text) => index.add_label_text(stem, &text),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read label file");
                index.failures.push(FileFailure::new(path, err));
            }
        }
    }

    debug!(
        split = %index.split,
        files = index.files_scanned,
        classes = index.members.len(),
        "built annotation index"
    );

    index
}

/// A scanned split: its stem join plus its annotation index.
#[derive(Clone, Debug)]
pub struct SplitScan {
    pub stems: StemIndex,
    pub index: AnnotationIndex,
}

impl SplitScan {
    pub fn split(&self) -> Split {
        self.stems.split()
    }
}

/// Scan and index every discovered split of a dataset.
pub fn scan_dataset(layout: &DatasetLayout) -> Result<Vec<SplitScan>, CurateError> {
    layout
        .splits
        .iter()
        .map(|split_layout| {
            let stems = scan_split(split_layout)?;
            let index = build_index(&stems);
            Ok(SplitScan { stems, index })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::discover_split;

    #[test]
    fn membership_counts_a_file_once_per_class() {
        let mut index = AnnotationIndex::new(Split::Train);
        index.add_label_text("a", "4 0.1 0.1 0.1 0.1\n4 0.2 0.2 0.1 0.1\n5 0.3 0.3 0.1 0.1\n");
        index.add_label_text("b", "4 0.5 0.5 0.2 0.2\n");

        let four = ClassId::from("4");
        let five = ClassId::from("5");
        assert_eq!(index.file_count(&four), 2);
        assert_eq!(index.occurrence_count(&four), 3);
        assert_eq!(index.file_count(&five), 1);
        assert_eq!(index.total_occurrences(), 4);
        assert_eq!(index.annotation_lines, 4);
    }

    #[test]
    fn blank_lines_are_skipped_and_null_files_recorded() {
        let mut index = AnnotationIndex::new(Split::Valid);
        index.add_label_text("empty", "  \n\n");
        index.add_label_text("mixed", "0 0.5 0.5 0.1 0.1\n\n   \n1 0.5 0.5 0.1 0.1");

        assert_eq!(index.null_stems, vec!["empty".to_string()]);
        assert_eq!(index.skipped_lines, 4);
        assert_eq!(index.total_occurrences(), 2);
        assert_eq!(index.files_scanned, 2);
    }

    #[test]
    fn build_index_reads_every_label_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let split_dir = temp.path().join("train");
        fs::create_dir_all(split_dir.join("images")).expect("create images");
        fs::create_dir_all(split_dir.join("labels")).expect("create labels");
        fs::write(split_dir.join("labels/a.txt"), "1 0.5 0.5 0.1 0.1\n").expect("write");
        fs::write(split_dir.join("labels/b.txt"), "1 0.5 0.5 0.1 0.1\n2 0 0 1 1\n")
            .expect("write");

        let layout = discover_split(temp.path(), Split::Train)
            .expect("discover")
            .expect("present");
        let stems = scan_split(&layout).expect("scan");
        let index = build_index(&stems);

        assert!(index.failures.is_empty());
        let one: Vec<&String> = index
            .members_of(&ClassId::from("1"))
            .expect("class 1")
            .iter()
            .collect();
        assert_eq!(one, vec!["a", "b"]);
        assert_eq!(index.file_count(&ClassId::from("2")), 1);
    }
}

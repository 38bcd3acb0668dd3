//! Dataset directory layout.
//!
//! A dataset root owns up to three splits, each laid out as
//! `<root>/<split>/images/*` and `<root>/<split>/labels/*.txt`. Images and
//! labels are joined on their stem: the path relative to `images/` or
//! `labels/` with the extension removed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CurateError;
use crate::label::LABEL_EXTENSION;

/// Image extensions recognised when joining images to labels.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];

/// One of the dataset's fixed partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    #[serde(alias = "val", alias = "validation")]
    Valid,
    Test,
}

impl Split {
    /// All splits in processing order.
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    /// Canonical name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }

    /// Directory names tried, in order, when locating the split on disk.
    pub fn dir_candidates(&self) -> &'static [&'static str] {
        match self {
            Split::Train => &["train"],
            Split::Valid => &["valid", "val", "validation"],
            Split::Test => &["test"],
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Split {
    type Err = CurateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "valid" | "val" | "validation" => Ok(Split::Valid),
            "test" => Ok(Split::Test),
            _ => Err(CurateError::UnknownSplit(raw.to_string())),
        }
    }
}

/// Resolved directories of one split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitLayout {
    pub split: Split,
    pub dir: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl SplitLayout {
    /// Path a label file for `stem` has (or would have) in this split.
    pub fn label_path_for(&self, stem: &str) -> PathBuf {
        self.labels_dir.join(format!("{stem}.{LABEL_EXTENSION}"))
    }
}

/// The splits found under a dataset root.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    pub root: PathBuf,
    pub splits: Vec<SplitLayout>,
    /// Requested splits with no directory under the root.
    pub skipped: Vec<Split>,
}

impl DatasetLayout {
    /// Look up a discovered split.
    pub fn split(&self, split: Split) -> Option<&SplitLayout> {
        self.splits.iter().find(|layout| layout.split == split)
    }
}

/// Discover the requested splits under `root`.
///
/// A missing root is fatal. A split whose directory is absent is skipped; a
/// split directory without `images/` or `labels/` is fatal.
pub fn discover_dataset(root: &Path, requested: &[Split]) -> Result<DatasetLayout, CurateError> {
    if !root.is_dir() {
        return Err(CurateError::DatasetRootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut splits = Vec::new();
    let mut skipped = Vec::new();

    for &split in requested {
        if splits.iter().any(|s: &SplitLayout| s.split == split) || skipped.contains(&split) {
            continue;
        }
        match discover_split(root, split)? {
            Some(layout) => splits.push(layout),
            None => {
                warn!(split = %split, root = %root.display(), "split directory not found, skipping");
                skipped.push(split);
            }
        }
    }

    if splits.is_empty() {
        return Err(CurateError::NoSplitsFound {
            path: root.to_path_buf(),
        });
    }

    Ok(DatasetLayout {
        root: root.to_path_buf(),
        splits,
        skipped,
    })
}

/// Locate a single split under `root`. Returns `Ok(None)` if it is absent.
pub fn discover_split(root: &Path, split: Split) -> Result<Option<SplitLayout>, CurateError> {
    let Some(dir) = split
        .dir_candidates()
        .iter()
        .map(|name| root.join(name))
        .find(|candidate| candidate.is_dir())
    else {
        return Ok(None);
    };

    let images_dir = dir.join("images");
    if !images_dir.is_dir() {
        return Err(CurateError::SplitLayoutInvalid {
            path: images_dir,
            message: "missing images/ directory".to_string(),
        });
    }

    let labels_dir = dir.join("labels");
    if !labels_dir.is_dir() {
        return Err(CurateError::SplitLayoutInvalid {
            path: labels_dir,
            message: "missing labels/ directory".to_string(),
        });
    }

    Ok(Some(SplitLayout {
        split,
        dir,
        images_dir,
        labels_dir,
    }))
}

/// Files sharing one stem within a split.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StemEntry {
    pub label: Option<PathBuf>,
    /// Every image variant with this stem, in path order.
    pub images: Vec<PathBuf>,
}

impl StemEntry {
    /// True when the stem has both a label and at least one image.
    pub fn is_paired(&self) -> bool {
        self.label.is_some() && !self.images.is_empty()
    }
}

/// Stem-keyed join of a split's images and labels.
#[derive(Clone, Debug)]
pub struct StemIndex {
    pub layout: SplitLayout,
    entries: BTreeMap<String, StemEntry>,
}

impl StemIndex {
    /// Build an index from explicit entries.
    pub fn from_entries(layout: SplitLayout, entries: BTreeMap<String, StemEntry>) -> Self {
        Self { layout, entries }
    }

    pub fn split(&self) -> Split {
        self.layout.split
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, stem: &str) -> Option<&StemEntry> {
        self.entries.get(stem)
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.entries.contains_key(stem)
    }

    /// All stems with their files, in stem order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &StemEntry)> {
        self.entries.iter().map(|(stem, entry)| (stem.as_str(), entry))
    }

    /// All label files, in stem order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .filter_map(|(stem, entry)| entry.label.as_deref().map(|path| (stem.as_str(), path)))
    }

    /// Number of label files in the split.
    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    /// Stems with a label file but no image.
    pub fn labels_without_images(&self) -> impl Iterator<Item = (&str, &StemEntry)> {
        self.entries()
            .filter(|(_, entry)| entry.label.is_some() && entry.images.is_empty())
    }

    /// Stems with at least one image but no label file.
    pub fn images_without_labels(&self) -> impl Iterator<Item = (&str, &StemEntry)> {
        self.entries()
            .filter(|(_, entry)| entry.label.is_none() && !entry.images.is_empty())
    }
}

/// Walk a split's `images/` and `labels/` trees and join them by stem.
pub fn scan_split(layout: &SplitLayout) -> Result<StemIndex, CurateError> {
    let mut entries: BTreeMap<String, StemEntry> = BTreeMap::new();

    let mut label_files = collect_files_with_extensions(&layout.labels_dir, &[LABEL_EXTENSION])?;
    label_files.sort();
    for path in label_files {
        let stem = stem_string(&layout.labels_dir, &path);
        entries.entry(stem).or_default().label = Some(path);
    }

    let mut image_files = collect_files_with_extensions(&layout.images_dir, &IMAGE_EXTENSIONS)?;
    image_files.sort();
    for path in image_files {
        let stem = stem_string(&layout.images_dir, &path);
        entries.entry(stem).or_default().images.push(path);
    }

    debug!(
        split = %layout.split,
        stems = entries.len(),
        "scanned split"
    );

    Ok(StemIndex {
        layout: layout.clone(),
        entries,
    })
}

/// Recursively collect files under `root` whose extension is in `extensions`.
pub fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, CurateError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| CurateError::SplitLayoutInvalid {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// True if `path` carries a recognised image extension.
pub fn is_image_path(path: &Path) -> bool {
    has_extension(path, &IMAGE_EXTENSIONS)
}

/// Stem of `path` relative to `root`, with `/` separators.
pub fn stem_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path).with_extension("");
    rel.to_string_lossy().replace('\\', "/")
}

//! Pair-consistent dataset mutation.
//!
//! Every change made here keeps images and labels paired by stem: a stem is
//! removed by deleting its label and all of its images, and added by writing
//! an image together with its label. Filesystem failures are isolated to the
//! stem they hit and tallied in the returned report.

mod report;

pub use report::{
    DeletionReport, InjectionReport, NullLabel, NullReport, RemovedPair, StemRef,
};

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CurateError, FileFailure};
use crate::index::SplitScan;
use crate::layout::{is_image_path, StemIndex};
use crate::sample::select_stems;

/// Remove each stem's label file and every image sharing the stem.
///
/// The label goes first; if it cannot be removed the images are left alone so
/// the pair stays intact. A stem with no image still loses its label and is
/// reported in `missing_images`.
pub fn delete_pairs<'a, I>(stems: &StemIndex, targets: I, dry_run: bool) -> DeletionReport
where
    I: IntoIterator<Item = &'a str>,
{
    let split = stems.split();
    let mut report = DeletionReport::new(dry_run);

    for stem in targets {
        let Some(entry) = stems.get(stem) else {
            warn!(split = %split, stem, "stem selected for deletion is not in the split");
            report.not_found.push(StemRef::new(split, stem));
            continue;
        };

        let mut label_removed = false;
        if let Some(label) = &entry.label {
            if let Err(err) = remove_file(label, dry_run) {
                warn!(path = %label.display(), error = %err, "failed to delete label");
                report.failures.push(FileFailure::new(label, err));
                continue;
            }
            label_removed = true;
        }

        let mut images_removed = 0;
        for image in &entry.images {
            match remove_file(image, dry_run) {
                Ok(()) => images_removed += 1,
                Err(err) => {
                    warn!(path = %image.display(), error = %err, "failed to delete image");
                    report.failures.push(FileFailure::new(image, err));
                }
            }
        }

        if entry.images.is_empty() {
            warn!(split = %split, stem, "label had no matching image");
            report.missing_images.push(StemRef::new(split, stem));
        }

        report.removed.push(RemovedPair {
            split,
            stem: stem.to_string(),
            label_removed,
            images_removed,
        });
    }

    info!(
        split = %split,
        removed = report.removed_count(),
        failures = report.failure_count(),
        dry_run,
        "pair deletion finished"
    );

    report
}

fn remove_file(path: &Path, dry_run: bool) -> std::io::Result<()> {
    if dry_run {
        debug!(path = %path.display(), "dry run: would delete");
        return Ok(());
    }
    fs::remove_file(path)?;
    debug!(path = %path.display(), "deleted");
    Ok(())
}

/// List label files with no annotations. Read-only.
///
/// Label files that could not be read are carried over as failures, since
/// they may be null labels that went undetected.
pub fn detect_null_labels(scans: &[SplitScan]) -> NullReport {
    let mut labels = Vec::new();
    let mut failures = Vec::new();

    for scan in scans {
        failures.extend(scan.index.failures.iter().cloned());
        for stem in &scan.index.null_stems {
            let Some(entry) = scan.stems.get(stem) else {
                continue;
            };
            let Some(label_path) = entry.label.clone() else {
                continue;
            };
            labels.push(NullLabel {
                split: scan.split(),
                stem: stem.clone(),
                label_path,
                image_present: !entry.images.is_empty(),
            });
        }
    }

    NullReport { labels, failures }
}

/// Delete every null label together with its images.
pub fn remove_null_labels(scans: &[SplitScan], dry_run: bool) -> DeletionReport {
    let mut report = DeletionReport::new(dry_run);
    for scan in scans {
        let targets = scan.index.null_stems.iter().map(String::as_str);
        report.merge(delete_pairs(&scan.stems, targets, dry_run));
        report.failures.extend(scan.index.failures.iter().cloned());
    }
    report
}

/// Remove labels without images and images without labels.
pub fn remove_orphans(stems: &StemIndex, dry_run: bool) -> DeletionReport {
    let orphans: Vec<&str> = stems
        .labels_without_images()
        .chain(stems.images_without_labels())
        .map(|(stem, _)| stem)
        .collect();

    let mut report = delete_pairs(stems, orphans, dry_run);
    // an orphan label is the violation itself, not a gap to report again
    report.missing_images.clear();
    report
}

/// Copy up to `limit` background images into a split, each with an empty label.
///
/// Pool images are taken from the top level of `pool_dir`; stems that already
/// exist in the split are never overwritten. Which pool images are used is
/// decided by the seeded selector.
pub fn inject_negatives(
    pool_dir: &Path,
    stems: &StemIndex,
    limit: usize,
    seed: u64,
    dry_run: bool,
) -> Result<InjectionReport, CurateError> {
    let pool = read_pool(pool_dir)?;
    let split = stems.split();

    let mut skipped_existing = Vec::new();
    let mut candidates = Vec::new();
    for stem in pool.keys() {
        if stems.contains(stem) {
            skipped_existing.push(stem.clone());
        } else {
            candidates.push(stem.clone());
        }
    }

    let selection = select_stems(candidates, limit, seed);
    let mut report = InjectionReport {
        split,
        source: pool_dir.to_path_buf(),
        dry_run,
        limit,
        pool_size: pool.len(),
        added: Vec::new(),
        skipped_existing,
        shortfall: selection.shortfall,
        failures: Vec::new(),
    };

    for stem in selection.selected {
        let source = &pool[&stem];
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let image_dest = stems.layout.images_dir.join(file_name);
        let label_dest = stems.layout.label_path_for(&stem);

        if dry_run {
            debug!(image = %image_dest.display(), "dry run: would add negative sample");
            report.added.push(stem);
            continue;
        }

        match add_pair(source, &image_dest, &label_dest) {
            Ok(()) => {
                debug!(image = %image_dest.display(), "added negative sample");
                report.added.push(stem);
            }
            Err(failure) => {
                warn!(path = %failure.path.display(), error = %failure.message, "failed to add negative sample");
                report.failures.push(failure);
            }
        }
    }

    info!(
        split = %split,
        added = report.added_count(),
        failures = report.failure_count(),
        dry_run,
        "negative sample injection finished"
    );

    Ok(report)
}

/// Image files at the top level of the pool, keyed by stem. The first file in
/// name order wins when two images share a stem.
fn read_pool(pool_dir: &Path) -> Result<BTreeMap<String, PathBuf>, CurateError> {
    if !pool_dir.is_dir() {
        return Err(CurateError::BackgroundPoolInvalid {
            path: pool_dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files: Vec<PathBuf> = fs::read_dir(pool_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();
    files.sort();

    let mut pool = BTreeMap::new();
    for path in files {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        pool.entry(stem).or_insert(path);
    }
    Ok(pool)
}

/// Copy the image, then create its empty label. Undoes the copy if the label
/// cannot be created.
fn add_pair(source: &Path, image_dest: &Path, label_dest: &Path) -> Result<(), FileFailure> {
    if image_dest.exists() {
        return Err(FileFailure::new(image_dest, "destination image already exists"));
    }

    // the label directory must exist before any image lands
    if let Some(parent) = label_dest.parent() {
        fs::create_dir_all(parent).map_err(|err| FileFailure::new(parent, err))?;
    }

    fs::copy(source, image_dest).map_err(|err| FileFailure::new(image_dest, err))?;

    let created = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(label_dest);

    if let Err(err) = created {
        let message = if err.kind() == ErrorKind::AlreadyExists {
            "label file already exists".to_string()
        } else {
            err.to_string()
        };
        if let Err(cleanup) = fs::remove_file(image_dest) {
            warn!(path = %image_dest.display(), error = %cleanup, "failed to undo image copy");
        }
        return Err(FileFailure::new(label_dest, message));
    }

    Ok(())
}

//! Dataset-level curation operations.
//!
//! Each function discovers the dataset named by [`CurateOptions`], scans the
//! selected splits, and runs one operation over them. Structural problems
//! are returned as errors; per-file problems end up in the returned report.

mod report;

pub use report::{CheckOutcome, PruneOutcome};

use std::path::Path;

use tracing::{info, warn};

use crate::config::CurateOptions;
use crate::counter::{count_classes, CountReport};
use crate::enforce::{
    delete_pairs, detect_null_labels, inject_negatives, remove_null_labels, remove_orphans,
    DeletionReport, InjectionReport, NullReport,
};
use crate::error::CurateError;
use crate::index::{scan_dataset, AnnotationIndex, SplitScan};
use crate::integrity::check_integrity;
use crate::layout::{discover_dataset, scan_split, DatasetLayout, Split};
use crate::prune::{plan_prune, PrunePlan};
use crate::remap::{remap_split, RemapReport};
use crate::sample::select_for_plan;

fn scan(opts: &CurateOptions) -> Result<(DatasetLayout, Vec<SplitScan>), CurateError> {
    let layout = discover_dataset(&opts.dataset_root, &opts.splits)?;
    let scans = scan_dataset(&layout)?;
    Ok((layout, scans))
}

fn plan_scanned(
    opts: &CurateOptions,
    layout: &DatasetLayout,
    scans: &[SplitScan],
) -> Result<PrunePlan, CurateError> {
    let targets = opts.prune_targets()?;
    let counts = count_classes(scans.iter().map(|s| &s.index), &layout.skipped);
    plan_prune(&counts, opts.reference_split, &targets)
}

/// Count annotations and files per class for every selected split.
pub fn count(opts: &CurateOptions) -> Result<CountReport, CurateError> {
    let (layout, scans) = scan(opts)?;
    Ok(count_classes(scans.iter().map(|s| &s.index), &layout.skipped))
}

/// Compute prune quotas without selecting or deleting anything.
pub fn plan(opts: &CurateOptions) -> Result<PrunePlan, CurateError> {
    let (layout, scans) = scan(opts)?;
    plan_scanned(opts, &layout, &scans)
}

/// Plan, select, and delete stems so each target class keeps its ratio.
pub fn prune(opts: &CurateOptions) -> Result<PruneOutcome, CurateError> {
    let (layout, scans) = scan(opts)?;
    let plan = plan_scanned(opts, &layout, &scans)?;

    let indexes: Vec<&AnnotationIndex> = scans.iter().map(|s| &s.index).collect();
    let selection = select_for_plan(&plan, &indexes, opts.seed);

    let mut deletion = DeletionReport::new(opts.dry_run);
    let by_split = selection.stems_by_split();
    for scan in &scans {
        if let Some(stems) = by_split.get(&scan.split()) {
            deletion.merge(delete_pairs(
                &scan.stems,
                stems.iter().map(String::as_str),
                opts.dry_run,
            ));
        }
        deletion.failures.extend(scan.index.failures.iter().cloned());
    }

    info!(
        planned = plan.total_delete(),
        selected = selection.selected_count(),
        deleted = deletion.removed_count(),
        failures = deletion.failure_count(),
        dry_run = opts.dry_run,
        "prune finished"
    );

    Ok(PruneOutcome {
        plan,
        selection,
        deletion,
    })
}

/// Rewrite class ids in every label file of the selected splits.
pub fn remap(opts: &CurateOptions) -> Result<RemapReport, CurateError> {
    if opts.class_map.is_empty() {
        return Err(CurateError::InvalidClassMap {
            message: "class map is empty".to_string(),
        });
    }
    for chained in opts.class_map.chained_ids() {
        warn!(class_id = %chained, "class map target is also a source; applying the map twice changes labels again");
    }

    let layout = discover_dataset(&opts.dataset_root, &opts.splits)?;
    let mut splits = Vec::with_capacity(layout.splits.len());
    for split_layout in &layout.splits {
        let stems = scan_split(split_layout)?;
        splits.push(remap_split(&stems, &opts.class_map, opts.dry_run));
    }

    Ok(RemapReport {
        dry_run: opts.dry_run,
        class_map: opts
            .class_map
            .entries()
            .map(|(old, new)| (old.to_string(), new.to_string()))
            .collect(),
        splits,
    })
}

/// List empty label files. Never modifies the dataset.
pub fn detect_nulls(opts: &CurateOptions) -> Result<NullReport, CurateError> {
    let (_, scans) = scan(opts)?;
    Ok(detect_null_labels(&scans))
}

/// Delete empty label files together with their images.
pub fn delete_nulls(opts: &CurateOptions) -> Result<DeletionReport, CurateError> {
    let (_, scans) = scan(opts)?;
    Ok(remove_null_labels(&scans, opts.dry_run))
}

/// Copy up to `limit` background images from `pool_dir` into `split`, each
/// paired with an empty label.
pub fn add_negatives(
    opts: &CurateOptions,
    pool_dir: &Path,
    split: Split,
    limit: usize,
) -> Result<InjectionReport, CurateError> {
    let layout = discover_dataset(&opts.dataset_root, &[split])?;
    let split_layout = layout
        .split(split)
        .ok_or_else(|| CurateError::NoSplitsFound {
            path: opts.dataset_root.clone(),
        })?;
    let stems = scan_split(split_layout)?;
    inject_negatives(pool_dir, &stems, limit, opts.seed, opts.dry_run)
}

/// Check image/label pairing. With `fix`, orphaned files are removed
/// afterwards and the removal is reported alongside the check.
pub fn check(opts: &CurateOptions, fix: bool) -> Result<CheckOutcome, CurateError> {
    let (_, scans) = scan(opts)?;
    let report = check_integrity(&scans);

    let repairs = fix.then(|| {
        let mut repairs = DeletionReport::new(opts.dry_run);
        for scan in &scans {
            repairs.merge(remove_orphans(&scan.stems, opts.dry_run));
        }
        repairs
    });

    Ok(CheckOutcome { report, repairs })
}

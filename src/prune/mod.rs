//! Prune planning.
//!
//! Given a class, a target file count for it in a reference split, and
//! optionally a historical baseline count, compute how many files of that
//! class to remove from every split so that each split keeps the same
//! fraction of its examples.

mod report;

pub use report::{ClassPlan, PrunePlan, PruneQuota};

use std::collections::HashSet;

use serde::Deserialize;

use crate::counter::CountReport;
use crate::error::CurateError;
use crate::label::ClassId;
use crate::layout::Split;

/// A request to bring one class down to `target_count` files.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PruneTarget {
    pub class_id: String,
    pub target_count: usize,
    /// Reference-split count before any earlier pruning. When set, the keep
    /// ratio is `target_count / baseline_count` instead of using the current
    /// reference count.
    #[serde(default)]
    pub baseline_count: Option<usize>,
}

impl PruneTarget {
    pub fn new(class_id: impl Into<String>, target_count: usize) -> Self {
        Self {
            class_id: class_id.into(),
            target_count,
            baseline_count: None,
        }
    }

    pub fn with_baseline(mut self, baseline_count: usize) -> Self {
        self.baseline_count = Some(baseline_count);
        self
    }
}

/// Fraction of examples kept, clamped to `[0, 1]`. A zero denominator keeps everything.
pub fn keep_ratio(target_count: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 1.0;
    }
    (target_count as f64 / denominator as f64).min(1.0)
}

/// Files to delete from a split holding `current` files of the class.
///
/// Computes `floor(current * (1 - target / denominator))` in integer
/// arithmetic so the result never drifts from float rounding. Never
/// negative: a target at or above the denominator yields zero.
pub fn split_quota(current: usize, target_count: usize, denominator: usize) -> usize {
    if denominator == 0 || target_count >= denominator {
        return 0;
    }
    let removed_share = (denominator - target_count) as u128;
    ((current as u128 * removed_share) / denominator as u128) as usize
}

/// Plan the quotas for one class across every counted split.
pub fn plan_class(
    counts: &CountReport,
    reference: Split,
    target: &PruneTarget,
) -> Result<ClassPlan, CurateError> {
    let class_id = ClassId::new(target.class_id.trim());
    if class_id.as_str().is_empty() {
        return Err(CurateError::InvalidPruneParams {
            message: "class id must not be empty".to_string(),
        });
    }

    let files_in = |split: Split| {
        counts
            .split(split)
            .and_then(|s| s.classes.get(&class_id))
            .map_or(0, |c| c.files)
    };

    let reference_count = match counts.split(reference) {
        Some(_) => Some(files_in(reference)),
        None if target.baseline_count.is_some() => None,
        None => {
            return Err(CurateError::InvalidPruneParams {
                message: format!(
                    "reference split '{}' was not scanned; supply a baseline count or include it",
                    reference
                ),
            });
        }
    };

    let denominator = match target.baseline_count {
        Some(0) => {
            return Err(CurateError::InvalidPruneParams {
                message: "baseline count must be greater than 0".to_string(),
            });
        }
        Some(baseline) => baseline,
        None => reference_count.unwrap_or(0),
    };

    let quotas = counts
        .splits
        .iter()
        .map(|split_counts| {
            let current = files_in(split_counts.split);
            let delete = if split_counts.split == reference {
                current.saturating_sub(target.target_count)
            } else {
                split_quota(current, target.target_count, denominator)
            };
            PruneQuota {
                split: split_counts.split,
                class_id: class_id.clone(),
                current,
                delete,
            }
        })
        .collect();

    Ok(ClassPlan {
        class_id,
        reference_split: reference,
        reference_count,
        target_count: target.target_count,
        baseline_count: target.baseline_count,
        keep_ratio: keep_ratio(target.target_count, denominator),
        quotas,
    })
}

/// Plan quotas for several classes. Each class is planned independently.
pub fn plan_prune(
    counts: &CountReport,
    reference: Split,
    targets: &[PruneTarget],
) -> Result<PrunePlan, CurateError> {
    if targets.is_empty() {
        return Err(CurateError::InvalidPruneParams {
            message: "no prune target given (set a class id and target count)".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for target in targets {
        if !seen.insert(target.class_id.trim()) {
            return Err(CurateError::InvalidPruneParams {
                message: format!("class '{}' is targeted more than once", target.class_id),
            });
        }
    }

    let classes = targets
        .iter()
        .map(|target| plan_class(counts, reference, target))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PrunePlan { classes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::count_classes;
    use crate::index::AnnotationIndex;

    fn index_with_class(split: Split, class_id: &str, files: usize) -> AnnotationIndex {
        let mut index = AnnotationIndex::new(split);
        for i in 0..files {
            index.add_label_text(&format!("{split}_{i}"), &format!("{class_id} 0.5 0.5 0.1 0.1\n"));
        }
        index
    }

    #[test]
    fn split_quota_matches_worked_example() {
        // keep 2800 of 12000 in train; validation holds 1000
        assert_eq!(split_quota(1000, 2800, 12000), 766);
        assert!((keep_ratio(2800, 12000) - 0.2333).abs() < 1e-4);
    }

    #[test]
    fn split_quota_is_zero_when_target_reached() {
        assert_eq!(split_quota(500, 1000, 1000), 0);
        assert_eq!(split_quota(500, 2000, 1000), 0);
        assert_eq!(split_quota(500, 10, 0), 0);
    }

    #[test]
    fn reference_split_is_pruned_to_the_exact_target() {
        let train = index_with_class(Split::Train, "4", 40);
        let valid = index_with_class(Split::Valid, "4", 10);
        let counts = count_classes([&train, &valid], &[]);

        let plan = plan_class(&counts, Split::Train, &PruneTarget::new("4", 10)).expect("plan");
        assert_eq!(plan.quota(Split::Train).expect("train").delete, 30);
        // keep ratio 0.25 -> delete floor(10 * 0.75) = 7
        assert_eq!(plan.quota(Split::Valid).expect("valid").delete, 7);
        assert_eq!(plan.reference_count, Some(40));
    }

    #[test]
    fn no_op_when_reference_is_already_at_target() {
        let train = index_with_class(Split::Train, "4", 5);
        let valid = index_with_class(Split::Valid, "4", 5);
        let counts = count_classes([&train, &valid], &[]);

        let plan = plan_class(&counts, Split::Train, &PruneTarget::new("4", 8)).expect("plan");
        assert!(plan.quotas.iter().all(|q| q.delete == 0));
        assert_eq!(plan.total_delete(), 0);
    }

    #[test]
    fn baseline_drives_ratio_for_unscanned_reference() {
        let valid = index_with_class(Split::Valid, "A", 1000);
        let counts = count_classes([&valid], &[]);

        let target = PruneTarget::new("A", 2800).with_baseline(12000);
        let plan = plan_class(&counts, Split::Train, &target).expect("plan");

        let valid_quota = plan.quota(Split::Valid).expect("valid");
        assert_eq!(valid_quota.delete, 766);
        assert_eq!(valid_quota.keep(), 234);
        assert_eq!(plan.reference_count, None);
    }

    #[test]
    fn missing_reference_without_baseline_is_rejected() {
        let valid = index_with_class(Split::Valid, "A", 10);
        let counts = count_classes([&valid], &[]);
        let err = plan_class(&counts, Split::Train, &PruneTarget::new("A", 5)).unwrap_err();
        assert!(matches!(err, CurateError::InvalidPruneParams { .. }));
    }

    #[test]
    fn zero_baseline_is_rejected() {
        let train = index_with_class(Split::Train, "A", 10);
        let counts = count_classes([&train], &[]);
        let target = PruneTarget::new("A", 5).with_baseline(0);
        assert!(plan_class(&counts, Split::Train, &target).is_err());
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let train = index_with_class(Split::Train, "A", 10);
        let counts = count_classes([&train], &[]);
        let targets = vec![PruneTarget::new("A", 5), PruneTarget::new(" A", 3)];
        assert!(plan_prune(&counts, Split::Train, &targets).is_err());
        assert!(plan_prune(&counts, Split::Train, &[]).is_err());
    }
}

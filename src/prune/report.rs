//! Prune plan types and terminal formatting.

use serde::Serialize;
use std::fmt;

use crate::label::ClassId;
use crate::layout::Split;

/// Files of one class to remove from one split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PruneQuota {
    pub split: Split,
    pub class_id: ClassId,
    /// Files of the class currently in the split.
    pub current: usize,
    /// Files to remove.
    pub delete: usize,
}

impl PruneQuota {
    /// Files expected to remain after the quota is applied.
    pub fn keep(&self) -> usize {
        self.current - self.delete
    }
}

/// Quotas for one class across every split.
#[derive(Clone, Debug, Serialize)]
pub struct ClassPlan {
    pub class_id: ClassId,
    pub reference_split: Split,
    /// Current file count in the reference split, if it was scanned.
    pub reference_count: Option<usize>,
    pub target_count: usize,
    pub baseline_count: Option<usize>,
    pub keep_ratio: f64,
    pub quotas: Vec<PruneQuota>,
}

impl ClassPlan {
    /// Quota for a split, if it was counted.
    pub fn quota(&self, split: Split) -> Option<&PruneQuota> {
        self.quotas.iter().find(|q| q.split == split)
    }

    /// Files to remove across every split.
    pub fn total_delete(&self) -> usize {
        self.quotas.iter().map(|q| q.delete).sum()
    }
}

/// Quotas for every targeted class.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PrunePlan {
    pub classes: Vec<ClassPlan>,
}

impl PrunePlan {
    /// All quotas, class by class.
    pub fn quotas(&self) -> impl Iterator<Item = &PruneQuota> {
        self.classes.iter().flat_map(|c| &c.quotas)
    }

    pub fn total_delete(&self) -> usize {
        self.classes.iter().map(ClassPlan::total_delete).sum()
    }

    pub fn is_noop(&self) -> bool {
        self.total_delete() == 0
    }
}

impl fmt::Display for PrunePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, class) in self.classes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            let denominator = class.baseline_count.or(class.reference_count).unwrap_or(0);
            let basis = if class.baseline_count.is_some() {
                "baseline"
            } else {
                "current"
            };
            writeln!(
                f,
                "Class {}: keep ratio = {} / {} ({} {}) = {:.4}",
                class.class_id,
                class.target_count,
                denominator,
                basis,
                class.reference_split,
                class.keep_ratio
            )?;

            for quota in &class.quotas {
                writeln!(
                    f,
                    "  {:5}: current={:5}, keep={:5}, delete={:5}",
                    quota.split.name(),
                    quota.current,
                    quota.keep(),
                    quota.delete
                )?;
            }

            if class.total_delete() == 0 {
                writeln!(f, "  No pruning needed.")?;
            }
        }

        Ok(())
    }
}

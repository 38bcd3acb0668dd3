//! Seeded sampling of label files to remove.
//!
//! Selection is uniform and without replacement. Candidates are sorted before
//! shuffling so a given seed picks the same stems on every run regardless of
//! directory listing order.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::index::AnnotationIndex;
use crate::label::ClassId;
use crate::layout::Split;
use crate::prune::{PrunePlan, PruneQuota};

/// Default seed, shared by every seeded operation.
pub const DEFAULT_SEED: u64 = 42;

/// Outcome of selecting stems for one quota.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Stems chosen, in sorted order.
    pub selected: Vec<String>,
    /// How many stems were asked for.
    pub requested: usize,
    /// How many could not be supplied because the pool ran out.
    pub shortfall: usize,
}

/// Choose `min(k, candidates)` stems uniformly at random under `seed`.
///
/// When `k` covers the whole pool every candidate is returned and the missing
/// amount is reported as `shortfall`.
pub fn select_stems<I, S>(candidates: I, k: usize, seed: u64) -> Selection
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut pool: Vec<String> = candidates.into_iter().map(Into::into).collect();
    pool.sort();
    pool.dedup();

    if k >= pool.len() {
        let shortfall = k - pool.len();
        return Selection {
            selected: pool,
            requested: k,
            shortfall,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    pool.shuffle(&mut rng);
    pool.truncate(k);
    pool.sort();

    Selection {
        selected: pool,
        requested: k,
        shortfall: 0,
    }
}

/// Selection made for one quota of a prune plan.
#[derive(Clone, Debug, Serialize)]
pub struct QuotaSelection {
    pub split: Split,
    pub class_id: ClassId,
    pub quota: usize,
    /// Files of this class already chosen for an earlier class in the same
    /// split. They count toward the quota.
    pub already_selected: usize,
    /// Files the plan expects to keep.
    pub planned_keep: usize,
    /// Files left once every class of the split has been served. Above
    /// `planned_keep` when taking more would push another class below its own.
    pub kept: usize,
    pub selection: Selection,
}

/// Selections for a whole prune plan.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PlanSelection {
    pub selections: Vec<QuotaSelection>,
}

impl PlanSelection {
    /// Every stem to remove, grouped by split. A stem appears once per split.
    pub fn stems_by_split(&self) -> BTreeMap<Split, BTreeSet<String>> {
        let mut by_split: BTreeMap<Split, BTreeSet<String>> = BTreeMap::new();
        for sel in &self.selections {
            by_split
                .entry(sel.split)
                .or_default()
                .extend(sel.selection.selected.iter().cloned());
        }
        by_split
    }

    /// Total stems selected across all splits.
    pub fn selected_count(&self) -> usize {
        self.selections
            .iter()
            .map(|s| s.selection.selected.len())
            .sum()
    }

    /// Total shortfall across all quotas.
    pub fn shortfall(&self) -> usize {
        self.selections.iter().map(|s| s.selection.shortfall).sum()
    }
}

/// Select stems for every non-zero quota of `plan`.
///
/// Within a split, each planned class has a deletion budget equal to its
/// quota. Classes are served in plan order from one seeded shuffle of their
/// members; a file is taken only while every planned class it holds still has
/// budget left, and taking it spends budget from all of them. No planned class
/// therefore ends below its planned keep count; a class that cannot reach its
/// quota without breaking another class's target reports a shortfall.
pub fn select_for_plan(plan: &PrunePlan, indexes: &[&AnnotationIndex], seed: u64) -> PlanSelection {
    let mut by_split: BTreeMap<Split, Vec<&PruneQuota>> = BTreeMap::new();
    for quota in plan.quotas() {
        by_split.entry(quota.split).or_default().push(quota);
    }

    let mut selections = Vec::new();
    for (split, quotas) in by_split {
        let Some(index) = indexes.iter().find(|idx| idx.split == split) else {
            continue;
        };
        selections.extend(select_for_split(&quotas, index, seed));
    }

    PlanSelection { selections }
}

fn select_for_split(
    quotas: &[&PruneQuota],
    index: &AnnotationIndex,
    seed: u64,
) -> Vec<QuotaSelection> {
    let mut budgets: BTreeMap<&ClassId, usize> =
        quotas.iter().map(|q| (&q.class_id, q.delete)).collect();
    let mut taken: BTreeSet<String> = BTreeSet::new();
    let mut selections = Vec::new();

    for quota in quotas.iter().filter(|q| q.delete > 0) {
        let remaining = budgets.get(&quota.class_id).copied().unwrap_or(0);
        let already_selected = quota.delete - remaining;

        let mut candidates: Vec<&String> = index
            .members_of(&quota.class_id)
            .into_iter()
            .flatten()
            .filter(|stem| !taken.contains(*stem))
            .collect();
        let mut rng = StdRng::seed_from_u64(seed);
        candidates.shuffle(&mut rng);

        let mut selected = Vec::new();
        for stem in candidates {
            if budgets.get(&quota.class_id).copied().unwrap_or(0) == 0 {
                break;
            }
            let holders: Vec<&ClassId> = budgets
                .keys()
                .copied()
                .filter(|class_id| index.members_of(class_id).is_some_and(|m| m.contains(stem)))
                .collect();
            if holders.iter().any(|class_id| budgets[class_id] == 0) {
                continue;
            }
            for class_id in holders {
                if let Some(budget) = budgets.get_mut(class_id) {
                    *budget -= 1;
                }
            }
            taken.insert(stem.clone());
            selected.push(stem.clone());
        }
        selected.sort();

        let shortfall = budgets.get(&quota.class_id).copied().unwrap_or(0);
        selections.push(QuotaSelection {
            split: quota.split,
            class_id: quota.class_id.clone(),
            quota: quota.delete,
            already_selected,
            planned_keep: quota.keep(),
            kept: quota.keep(),
            selection: Selection {
                selected,
                requested: remaining,
                shortfall,
            },
        });
    }

    // budgets are final only once every class of the split has been served
    for selection in &mut selections {
        let unspent = budgets.get(&selection.class_id).copied().unwrap_or(0);
        selection.kept = selection.planned_keep + unspent;
    }

    selections
}

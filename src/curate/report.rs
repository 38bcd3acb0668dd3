use serde::Serialize;
use std::fmt;

use crate::enforce::DeletionReport;
use crate::integrity::IntegrityReport;
use crate::prune::PrunePlan;
use crate::sample::PlanSelection;

/// Everything a prune run decided and did.
#[derive(Clone, Debug, Serialize)]
pub struct PruneOutcome {
    pub plan: PrunePlan,
    pub selection: PlanSelection,
    pub deletion: DeletionReport,
}

impl fmt::Display for PruneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plan)?;
        writeln!(f)?;

        for quota in &self.selection.selections {
            writeln!(
                f,
                "{} class {}: keep {} (planned {})",
                quota.split, quota.class_id, quota.kept, quota.planned_keep
            )?;
            if quota.selection.shortfall > 0 {
                writeln!(
                    f,
                    "Warning: {} class {} keeps {} more file(s) than planned; the rest hold another class already at its target",
                    quota.split, quota.class_id, quota.selection.shortfall
                )?;
            }
        }

        write!(f, "{}", self.deletion)
    }
}

/// An integrity check, plus the orphan removal when it was requested.
#[derive(Clone, Debug, Serialize)]
pub struct CheckOutcome {
    pub report: IntegrityReport,
    pub repairs: Option<DeletionReport>,
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report)?;
        if let Some(repairs) = &self.repairs {
            writeln!(f)?;
            writeln!(f, "Orphan repair:")?;
            write!(f, "{}", repairs)?;
        }
        Ok(())
    }
}

//! Layer type resolution from build plan entries

use crate::plan::BuildpackPlanEntry;

/// Folds build plan requirement metadata into layer flags
pub trait Planner: Send + Sync {
    /// Returns `(launch, build)` for the entries named `name`
    fn merge_layer_types(&self, name: &str, entries: &[BuildpackPlanEntry]) -> (bool, bool);
}

/// Default planner: a flag is set if any matching entry sets it to `true`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanMerger;

impl PlanMerger {
    pub fn new() -> Self {
        Self
    }
}

impl Planner for PlanMerger {
    fn merge_layer_types(&self, name: &str, entries: &[BuildpackPlanEntry]) -> (bool, bool) {
        entries
            .iter()
            .filter(|entry| entry.name == name)
            .fold((false, false), |(launch, build), entry| {
                (launch || entry.flag("launch"), build || entry.flag("build"))
            })
    }
}

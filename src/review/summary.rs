// Budget totals across a plan

use serde::{Deserialize, Serialize};

use crate::enrichment::PlanTree;
use crate::models::ActivityBudget;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_required: f64,
    pub government: f64,
    pub partners: f64,
    pub sdg: f64,
    pub other: f64,
    pub total_available: f64,
    /// Sum of per-activity shortfalls; surplus on one activity never offsets another.
    pub total_gap: f64,
    pub budgeted_activities: usize,
}

impl BudgetSummary {
    pub fn from_budgets<'a>(budgets: impl IntoIterator<Item = &'a ActivityBudget>) -> Self {
        budgets.into_iter().fold(Self::default(), |mut s, b| {
            s.total_required += b.estimated_cost();
            s.government += b.government_treasury;
            s.partners += b.partners_funding;
            s.sdg += b.sdg_funding;
            s.other += b.other_funding;
            s.total_available += b.total_funding();
            s.total_gap += b.funding_gap();
            s.budgeted_activities += 1;
            s
        })
    }

    pub fn from_tree(tree: &PlanTree) -> Self {
        Self::from_budgets(tree.activities().filter_map(|a| a.budget.as_ref()))
    }

    /// Combine summaries of several plans.
    pub fn merge(mut self, other: &BudgetSummary) -> Self {
        self.total_required += other.total_required;
        self.government += other.government;
        self.partners += other.partners;
        self.sdg += other.sdg;
        self.other += other.other;
        self.total_available += other.total_available;
        self.total_gap += other.total_gap;
        self.budgeted_activities += other.budgeted_activities;
        self
    }
}

// Admin and evaluator dashboards over plan lists

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Organization, Plan, PlanStatus, PlanType, ReviewStatus};
use crate::review::BudgetSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub draft: usize,
    pub submitted: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn from_plans<'a>(plans: impl IntoIterator<Item = &'a Plan>) -> Self {
        let mut counts = Self::default();
        for plan in plans {
            counts.add(plan.status);
        }
        counts
    }

    pub fn add(&mut self, status: PlanStatus) {
        match status {
            PlanStatus::Draft => self.draft += 1,
            PlanStatus::Submitted => self.submitted += 1,
            PlanStatus::Approved => self.approved += 1,
            PlanStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn get(&self, status: PlanStatus) -> usize {
        match status {
            PlanStatus::Draft => self.draft,
            PlanStatus::Submitted => self.submitted,
            PlanStatus::Approved => self.approved,
            PlanStatus::Rejected => self.rejected,
        }
    }

    pub fn total(&self) -> usize {
        self.draft + self.submitted + self.approved + self.rejected
    }

    /// approved / (approved + rejected), None before any plan was reviewed.
    pub fn approval_rate(&self) -> Option<f64> {
        let reviewed = self.approved + self.rejected;
        (reviewed > 0).then(|| self.approved as f64 / reviewed as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationStats {
    pub organization: Option<u64>,
    pub name: String,
    pub counts: StatusCounts,
    pub budget: BudgetSummary,
    /// Plans whose budget summary was supplied; the rest are not counted in `budget`.
    pub budgeted_plans: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub totals: StatusCounts,
    pub budget: BudgetSummary,
    pub organizations: Vec<OrganizationStats>,
}

impl AdminDashboard {
    /// `budgets` maps plan id to the summary of that plan's enriched tree.
    pub fn build(
        plans: &[Plan],
        organizations: &[Organization],
        budgets: &HashMap<u64, BudgetSummary>,
    ) -> Self {
        let names: HashMap<u64, &str> = organizations
            .iter()
            .map(|o| (o.id, o.name.as_str()))
            .collect();

        let mut groups: BTreeMap<Option<u64>, OrganizationStats> = BTreeMap::new();
        for plan in plans {
            let stats = groups.entry(plan.organization).or_insert_with(|| OrganizationStats {
                organization: plan.organization,
                name: organization_name(plan, &names),
                counts: StatusCounts::default(),
                budget: BudgetSummary::default(),
                budgeted_plans: 0,
            });
            stats.counts.add(plan.status);
            if let Some(summary) = budgets.get(&plan.id) {
                stats.budget = stats.budget.merge(summary);
                stats.budgeted_plans += 1;
            }
        }

        let organizations: Vec<OrganizationStats> = groups.into_values().collect();
        let budget = organizations
            .iter()
            .fold(BudgetSummary::default(), |acc, o| acc.merge(&o.budget));

        Self {
            totals: StatusCounts::from_plans(plans),
            budget,
            organizations,
        }
    }
}

fn organization_name(plan: &Plan, names: &HashMap<u64, &str>) -> String {
    plan.organization
        .and_then(|id| names.get(&id).map(|n| n.to_string()))
        .or_else(|| plan.organization_name.clone())
        .unwrap_or_else(|| match plan.organization {
            Some(id) => format!("Organization {}", id),
            None => "Unassigned".to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingPlan {
    pub id: u64,
    pub organization_name: Option<String>,
    pub planner_name: String,
    pub plan_type: PlanType,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewedPlan {
    pub id: u64,
    pub organization_name: Option<String>,
    pub status: PlanStatus,
    pub feedback: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatorDashboard {
    pub pending: Vec<PendingPlan>,
    pub approved: usize,
    pub rejected: usize,
    /// Reviewed plans, most recent review first.
    pub recent: Vec<ReviewedPlan>,
}

/// Reviewed plans kept on the evaluator dashboard.
pub const RECENT_REVIEWS: usize = 10;

impl EvaluatorDashboard {
    /// Restrict to `evaluator_orgs`; an empty list means every organization.
    pub fn build(plans: &[Plan], evaluator_orgs: &[u64]) -> Self {
        let in_scope = plans.iter().filter(|p| {
            evaluator_orgs.is_empty() || p.organization.is_some_and(|o| evaluator_orgs.contains(&o))
        });

        let mut pending = Vec::new();
        let mut recent = Vec::new();
        let (mut approved, mut rejected) = (0, 0);

        for plan in in_scope {
            match plan.status {
                PlanStatus::Submitted => pending.push(PendingPlan {
                    id: plan.id,
                    organization_name: plan.organization_name.clone(),
                    planner_name: plan.planner_name.clone(),
                    plan_type: plan.plan_type,
                    submitted_at: plan.submitted_at,
                }),
                PlanStatus::Approved | PlanStatus::Rejected => {
                    if plan.status == PlanStatus::Approved {
                        approved += 1;
                    } else {
                        rejected += 1;
                    }
                    let review = plan.latest_review().filter(|r| {
                        matches!(
                            (r.status, plan.status),
                            (ReviewStatus::Approved, PlanStatus::Approved)
                                | (ReviewStatus::Rejected, PlanStatus::Rejected)
                        )
                    });
                    recent.push(ReviewedPlan {
                        id: plan.id,
                        organization_name: plan.organization_name.clone(),
                        status: plan.status,
                        feedback: review.and_then(|r| r.feedback.clone()),
                        reviewed_at: review.and_then(|r| r.reviewed_at),
                    });
                }
                PlanStatus::Draft => {}
            }
        }

        // oldest submission first
        pending.sort_by_key(|p| p.submitted_at);
        recent.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at));
        recent.truncate(RECENT_REVIEWS);

        Self {
            pending,
            approved,
            rejected,
            recent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrganizationType;

    fn plan(id: u64, organization: u64, status: &str, reviews: serde_json::Value) -> Plan {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "organization": organization,
            "organization_name": format!("Org {}", organization),
            "planner_name": "Planner",
            "type": "LEO/EO Plan",
            "from_date": "2025-07-08",
            "to_date": "2026-07-07",
            "status": status,
            "submitted_at": format!("2025-08-{:02}T09:00:00Z", id),
            "reviews": reviews,
        }))
        .unwrap()
    }

    fn plans() -> Vec<Plan> {
        vec![
            plan(1, 1, "SUBMITTED", serde_json::json!([])),
            plan(
                2,
                1,
                "APPROVED",
                serde_json::json!([{"status": "APPROVED", "feedback": "Good",
                                    "reviewed_at": "2025-09-01T10:00:00Z"}]),
            ),
            plan(
                3,
                2,
                "REJECTED",
                serde_json::json!([{"status": "REJECTED", "feedback": "Weights off",
                                    "reviewed_at": "2025-09-03T10:00:00Z"}]),
            ),
            plan(4, 2, "DRAFT", serde_json::json!(null)),
            plan(5, 2, "APPROVED", serde_json::json!([])),
        ]
    }

    fn organizations() -> Vec<Organization> {
        vec![Organization {
            id: 1,
            name: "Ministry of Health".to_string(),
            org_type: OrganizationType::Executive,
            parent: None,
            vision: None,
            mission: None,
            core_values: Vec::new(),
        }]
    }

    // ── status counts ──

    #[test]
    fn test_status_counts() {
        let counts = StatusCounts::from_plans(&plans());
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.get(PlanStatus::Approved), 2);
        assert_eq!(counts.approval_rate(), Some(2.0 / 3.0));
        assert_eq!(StatusCounts::default().approval_rate(), None);
    }

    // ── admin ──

    #[test]
    fn test_admin_groups_by_organization() {
        let mut budgets = HashMap::new();
        budgets.insert(
            2,
            BudgetSummary {
                total_required: 10000.0,
                total_available: 5000.0,
                total_gap: 5000.0,
                budgeted_activities: 1,
                ..BudgetSummary::default()
            },
        );
        let dashboard = AdminDashboard::build(&plans(), &organizations(), &budgets);

        assert_eq!(dashboard.organizations.len(), 2);
        let health = &dashboard.organizations[0];
        assert_eq!(health.name, "Ministry of Health");
        assert_eq!(health.counts.submitted, 1);
        assert_eq!(health.budgeted_plans, 1);
        assert_eq!(health.budget.total_gap, 5000.0);

        let other = &dashboard.organizations[1];
        assert_eq!(other.name, "Org 2");
        assert_eq!(other.budget, BudgetSummary::default());
        assert_eq!(dashboard.budget.total_required, 10000.0);
    }

    // ── evaluator ──

    #[test]
    fn test_evaluator_scope_and_feedback() {
        let dashboard = EvaluatorDashboard::build(&plans(), &[2]);
        assert!(dashboard.pending.is_empty());
        assert_eq!(dashboard.approved, 1);
        assert_eq!(dashboard.rejected, 1);
        assert_eq!(dashboard.recent[0].id, 3);
        assert_eq!(dashboard.recent[0].feedback.as_deref(), Some("Weights off"));
        assert_eq!(dashboard.recent[1].feedback, None);
    }

    #[test]
    fn test_evaluator_without_scope_sees_all_pending() {
        let dashboard = EvaluatorDashboard::build(&plans(), &[]);
        assert_eq!(dashboard.pending.len(), 1);
        assert_eq!(dashboard.pending[0].id, 1);
        assert_eq!(dashboard.recent.len(), 3);
    }
}

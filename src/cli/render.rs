// Plain-text rendering of command results

use std::fmt::Write;

use crate::api::AuthStatus;
use crate::costing::Estimate;
use crate::dashboard::{AdminDashboard, EvaluatorDashboard, StatusCounts};
use crate::models::fields::format_number;
use crate::models::{InitiativeFeed, Plan, StrategicObjective, TeamDeskPlan};
use crate::review::{BudgetSummary, PlanRow};

fn money(n: f64) -> String {
    format!("{:.2}", n)
}

fn percent(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_string(), |r| format!("{:.1}%", r * 100.0))
}

pub fn format_objectives(objectives: &[StrategicObjective]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>5}  {:>7}  {:<8}  Title", "ID", "Weight", "Default");
    for o in objectives {
        let _ = writeln!(
            out,
            "{:>5}  {:>7}  {:<8}  {}",
            o.id,
            format_number(o.effective_weight()),
            if o.is_default { "yes" } else { "no" },
            o.title
        );
    }
    let _ = write!(out, "{} objective(s)", objectives.len());
    out
}

pub fn format_plans(plans: &[Plan]) -> String {
    if plans.is_empty() {
        return "No plans.".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<10}  {:<16}  {:<23}  Organization",
        "ID", "Status", "Type", "Period"
    );
    for p in plans {
        let _ = writeln!(
            out,
            "{:>5}  {:<10}  {:<16}  {} – {}  {}",
            p.id,
            p.status.to_string(),
            p.plan_type.to_string(),
            p.from_date,
            p.to_date,
            p.organization_name.as_deref().unwrap_or("-")
        );
    }
    out.trim_end().to_string()
}

pub fn format_summary(summary: &BudgetSummary) -> String {
    format!(
        "Budget required: {}\n\
         Government: {}  Partners: {}  SDG: {}  Other: {}\n\
         Total available: {}\n\
         Funding gap: {}",
        money(summary.total_required),
        money(summary.government),
        money(summary.partners),
        money(summary.sdg),
        money(summary.other),
        money(summary.total_available),
        money(summary.total_gap),
    )
}

pub fn format_plan(
    plan: &Plan,
    rows: &[PlanRow],
    summary: &BudgetSummary,
    complete: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Plan {} ({}) - {} - {}",
        plan.id,
        plan.plan_type,
        plan.organization_name.as_deref().unwrap_or("-"),
        plan.status
    );
    let _ = writeln!(
        out,
        "Planner: {}  Period: {} – {}",
        plan.planner_name, plan.from_date, plan.to_date
    );
    if let Some(review) = plan.latest_review() {
        if let Some(feedback) = &review.feedback {
            let _ = writeln!(out, "Latest feedback: {}", feedback);
        }
    }
    let _ = writeln!(out);
    out.push_str(&format_rows(rows, summary, complete));
    out
}

pub fn format_team_desk_plans(plans: &[TeamDeskPlan]) -> String {
    if plans.is_empty() {
        return "No Team/Desk plans.".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<10}  {:>8}  {:<24}  Organization",
        "ID", "Status", "LEO/EO", "Team/Desk"
    );
    for p in plans {
        let _ = writeln!(
            out,
            "{:>5}  {:<10}  {:>8}  {:<24}  {}",
            p.id,
            p.status.to_string(),
            p.leo_eo_plan.map_or_else(|| "-".to_string(), |id| id.to_string()),
            p.display_name(),
            p.organization_name.as_deref().unwrap_or("-")
        );
    }
    out.trim_end().to_string()
}

pub fn format_team_desk_plan(
    desk: &TeamDeskPlan,
    parent: &Plan,
    rows: &[PlanRow],
    summary: &BudgetSummary,
    complete: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Team/Desk plan {} - {} - {}",
        desk.id,
        desk.display_name(),
        desk.status
    );
    let _ = writeln!(
        out,
        "From plan {} ({})  Period: {} – {}",
        parent.id, parent.plan_type, parent.from_date, parent.to_date
    );
    if let Some(feedback) = desk.latest_review().and_then(|r| r.feedback.as_ref()) {
        let _ = writeln!(out, "Latest feedback: {}", feedback);
    }
    let _ = writeln!(out);
    out.push_str(&format_rows(rows, summary, complete));
    out
}

pub fn format_feeds(feeds: &[InitiativeFeed]) -> String {
    if feeds.is_empty() {
        return "No initiative feeds.".to_string();
    }
    let mut out = String::new();
    for f in feeds {
        let _ = write!(out, "{:>5}  {}", f.id, f.name);
        if !f.is_active {
            let _ = write!(out, " (inactive)");
        }
        let _ = writeln!(out);
    }
    let _ = write!(out, "{} feed(s)", feeds.len());
    out
}

/// Hierarchy lines followed by the budget summary.
pub fn format_rows(rows: &[PlanRow], summary: &BudgetSummary, complete: bool) -> String {
    let mut out = String::new();
    for row in rows {
        if let Some((title, weight)) = &row.objective {
            let _ = writeln!(out, "■ {} ({}%)", title, format_number(*weight));
        }
        if let Some((name, weight)) = &row.initiative {
            let _ = writeln!(out, "  ▸ {} ({})", name, format_number(*weight));
        }
        if let Some(item) = &row.item {
            let _ = write!(
                out,
                "      [{}] {} ({}) 6m: {} annual: {}",
                item.kind.label(),
                item.name,
                format_number(item.weight),
                format_number(item.six_month),
                format_number(item.annual)
            );
            if let Some(b) = item.budget {
                let _ = write!(out, "  budget: {} gap: {}", money(b.required), money(b.gap));
            }
            let _ = writeln!(out);
        }
    }

    let _ = writeln!(out);
    out.push_str(&format_summary(summary));
    if !complete {
        out.push_str("\n\nWarning: some items could not be loaded; figures may be incomplete.");
    }
    out
}

pub fn format_estimate(estimate: &Estimate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} estimate", estimate.activity_type.label());
    for line in &estimate.lines {
        let _ = writeln!(out, "  {:<40} {:>14}", line.label, money(line.amount));
    }
    let _ = write!(out, "  {:<40} {:>14}", "Total", money(estimate.total));
    out
}

fn format_counts(counts: &StatusCounts) -> String {
    format!(
        "draft {}  submitted {}  approved {}  rejected {}  approval rate {}",
        counts.draft,
        counts.submitted,
        counts.approved,
        counts.rejected,
        percent(counts.approval_rate())
    )
}

pub fn format_admin_dashboard(dashboard: &AdminDashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "All plans: {}", format_counts(&dashboard.totals));
    let _ = writeln!(out);
    for org in &dashboard.organizations {
        let _ = writeln!(out, "{}", org.name);
        let _ = writeln!(out, "  {}", format_counts(&org.counts));
        let _ = writeln!(
            out,
            "  budget {}  available {}  gap {}  ({} of {} plans costed)",
            money(org.budget.total_required),
            money(org.budget.total_available),
            money(org.budget.total_gap),
            org.budgeted_plans,
            org.counts.total()
        );
    }
    let _ = writeln!(out);
    out.push_str(&format_summary(&dashboard.budget));
    out
}

pub fn format_evaluator_dashboard(dashboard: &EvaluatorDashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Pending review: {}  Approved: {}  Rejected: {}",
        dashboard.pending.len(),
        dashboard.approved,
        dashboard.rejected
    );
    for p in &dashboard.pending {
        let _ = writeln!(
            out,
            "  #{} {} - {} ({})",
            p.id,
            p.organization_name.as_deref().unwrap_or("-"),
            p.planner_name,
            p.plan_type
        );
    }
    if !dashboard.recent.is_empty() {
        let _ = writeln!(out, "Recent decisions:");
        for r in &dashboard.recent {
            let _ = writeln!(
                out,
                "  #{} {} {}",
                r.id,
                r.status,
                r.feedback.as_deref().unwrap_or("")
            );
        }
    }
    out.trim_end().to_string()
}

pub fn format_whoami(status: &AuthStatus) -> String {
    if !status.is_authenticated {
        return "Not logged in.".to_string();
    }
    let mut out = match &status.user {
        Some(user) => format!("{} ({})", user.display_name(), user.username),
        None => "Authenticated".to_string(),
    };
    for m in &status.user_organizations {
        let _ = write!(
            out,
            "\n  {:?} at {}",
            m.role,
            m.organization_name
                .clone()
                .or_else(|| m.organization.map(|id| format!("organization {}", id)))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::CostLine;
    use crate::models::ActivityType;

    #[test]
    fn test_format_estimate() {
        let estimate = Estimate {
            activity_type: ActivityType::Workshop,
            lines: vec![CostLine {
                label: "Per diem".to_string(),
                amount: 18000.0,
            }],
            total: 18000.0,
        };
        let text = format_estimate(&estimate);
        assert!(text.starts_with("Workshop estimate"));
        assert!(text.contains("18000.00"));
    }

    #[test]
    fn test_format_summary_shows_gap() {
        let summary = BudgetSummary {
            total_required: 10000.0,
            total_available: 5000.0,
            total_gap: 5000.0,
            ..BudgetSummary::default()
        };
        assert!(format_summary(&summary).contains("Funding gap: 5000.00"));
    }

    #[test]
    fn test_whoami_logged_out() {
        assert_eq!(format_whoami(&AuthStatus::default()), "Not logged in.");
    }

    #[test]
    fn test_format_feeds_marks_inactive() {
        let feeds: Vec<InitiativeFeed> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Immunization"},
                {"id": 2, "name": "Legacy", "is_active": false}
            ]"#,
        )
        .unwrap();
        let text = format_feeds(&feeds);
        assert!(text.contains("Immunization\n"));
        assert!(text.contains("Legacy (inactive)"));
        assert!(text.ends_with("2 feed(s)"));
        assert_eq!(format_feeds(&[]), "No initiative feeds.");
    }

    #[test]
    fn test_format_team_desk_plans() {
        let plans: Vec<TeamDeskPlan> = serde_json::from_str(
            r#"[{"id": 7, "team_desk_name": "M&E Desk", "leo_eo_plan": 12, "status": "DRAFT"}]"#,
        )
        .unwrap();
        let text = format_team_desk_plans(&plans);
        let line = text.lines().nth(1).unwrap();
        assert!(line.contains("M&E Desk"));
        assert!(line.contains("12"));
        assert_eq!(format_team_desk_plans(&[]), "No Team/Desk plans.");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(Some(0.5)), "50.0%");
        assert_eq!(percent(None), "-");
    }
}

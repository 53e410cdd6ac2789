// Flattened review table: one row per measure, activity or detail activity

use serde::Serialize;

use crate::enrichment::{InitiativeNode, ObjectiveNode, PlanTree};
use crate::models::{ActivityBudget, DetailActivity, MainActivity, PerformanceMeasure, Targets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Measure,
    Activity,
    Detail,
}

impl RowKind {
    pub fn label(&self) -> &'static str {
        match self {
            RowKind::Measure => "Performance Measure",
            RowKind::Activity => "Main Activity",
            RowKind::Detail => "Detail Activity",
        }
    }
}

/// Budget columns of an activity row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RowBudget {
    pub required: f64,
    pub government: f64,
    pub partners: f64,
    pub sdg: f64,
    pub other: f64,
    pub available: f64,
    pub gap: f64,
}

impl From<&ActivityBudget> for RowBudget {
    fn from(b: &ActivityBudget) -> Self {
        Self {
            required: b.estimated_cost(),
            government: b.government_treasury,
            partners: b.partners_funding,
            sdg: b.sdg_funding,
            other: b.other_funding,
            available: b.total_funding(),
            gap: b.funding_gap(),
        }
    }
}

/// Figures of the measure or activity a row describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowItem {
    pub kind: RowKind,
    pub name: String,
    pub weight: f64,
    pub baseline: Option<String>,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
    pub six_month: f64,
    pub annual: f64,
    pub budget: Option<RowBudget>,
}

impl RowItem {
    fn new(kind: RowKind, name: &str, weight: f64, targets: &Targets) -> Self {
        Self {
            kind,
            name: name.to_string(),
            weight,
            baseline: targets.baseline.clone(),
            q1: targets.q1_target,
            q2: targets.q2_target,
            q3: targets.q3_target,
            q4: targets.q4_target,
            six_month: targets.six_month(),
            annual: targets.annual_target,
            budget: None,
        }
    }
}

impl From<&PerformanceMeasure> for RowItem {
    fn from(m: &PerformanceMeasure) -> Self {
        RowItem::new(RowKind::Measure, &m.name, m.weight, &m.targets)
    }
}

impl From<&MainActivity> for RowItem {
    fn from(a: &MainActivity) -> Self {
        let mut item = RowItem::new(RowKind::Activity, &a.name, a.weight, &a.targets);
        item.budget = a.budget.as_ref().map(RowBudget::from);
        item
    }
}

impl From<&DetailActivity> for RowItem {
    fn from(d: &DetailActivity) -> Self {
        RowItem::new(RowKind::Detail, &d.name, d.weight, &d.targets)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRow {
    /// Objective title and weight, on the first row of the objective's group only.
    pub objective: Option<(String, f64)>,
    /// Initiative name and weight, on the first row of the initiative's group only.
    pub initiative: Option<(String, f64)>,
    /// None for an initiative without items or an objective without initiatives.
    pub item: Option<RowItem>,
}

fn initiative_rows(node: &InitiativeNode) -> Vec<PlanRow> {
    let activities = node.activities.iter().flat_map(|a| {
        std::iter::once(RowItem::from(a)).chain(node.details_of(a.id).map(RowItem::from))
    });
    let items: Vec<RowItem> = node.measures.iter().map(RowItem::from).chain(activities).collect();

    let header = Some((node.initiative.name.clone(), node.initiative.weight));
    if items.is_empty() {
        return vec![PlanRow {
            objective: None,
            initiative: header,
            item: None,
        }];
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| PlanRow {
            objective: None,
            initiative: if i == 0 { header.clone() } else { None },
            item: Some(item),
        })
        .collect()
}

fn objective_rows(node: &ObjectiveNode) -> Vec<PlanRow> {
    let mut rows: Vec<PlanRow> = node.initiatives.iter().flat_map(initiative_rows).collect();
    if rows.is_empty() {
        rows.push(PlanRow {
            objective: None,
            initiative: None,
            item: None,
        });
    }
    rows[0].objective = Some((node.objective.title.clone(), node.effective_weight));
    rows
}

/// Flatten the tree in objective → initiative → measures, activities order,
/// each activity followed by its detail activities.
pub fn flatten(tree: &PlanTree) -> Vec<PlanRow> {
    tree.objectives.iter().flat_map(objective_rows).collect()
}

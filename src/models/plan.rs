// Plans and evaluator reviews

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl PlanStatus {
    pub const ALL: [PlanStatus; 4] = [
        PlanStatus::Draft,
        PlanStatus::Submitted,
        PlanStatus::Approved,
        PlanStatus::Rejected,
    ];
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanStatus::Draft => "Draft",
            PlanStatus::Submitted => "Submitted",
            PlanStatus::Approved => "Approved",
            PlanStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    #[serde(rename = "LEO/EO Plan")]
    LeoEo,
    #[serde(rename = "Desk/Team Plan")]
    DeskTeam,
    #[serde(rename = "Individual Plan")]
    Individual,
    #[serde(other)]
    Other,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanType::LeoEo => "LEO/EO Plan",
            PlanType::DeskTeam => "Desk/Team Plan",
            PlanType::Individual => "Individual Plan",
            PlanType::Other => "Other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub plan: Option<u64>,
    #[serde(default)]
    pub evaluator_name: Option<String>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: u64,
    #[serde(deserialize_with = "fields::id_ref")]
    pub organization: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub planner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_name: Option<String>,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: PlanStatus,
    /// Legacy single-objective field, still set on older plans.
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub strategic_objective: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_list")]
    pub selected_objectives: Vec<u64>,
    #[serde(default, deserialize_with = "fields::weight_map")]
    pub selected_objectives_weights: Option<BTreeMap<u64, f64>>,
    #[serde(default, deserialize_with = "fields::list")]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Plan {
    /// Objective ids selected for this plan, falling back to the legacy single objective.
    pub fn objective_ids(&self) -> Vec<u64> {
        if !self.selected_objectives.is_empty() {
            return self.selected_objectives.clone();
        }
        self.strategic_objective.into_iter().collect()
    }

    /// Planner weight stored on the plan for `objective`, if any.
    pub fn planner_weight(&self, objective: u64) -> Option<f64> {
        self.selected_objectives_weights
            .as_ref()
            .and_then(|weights| weights.get(&objective).copied())
    }

    pub fn latest_review(&self) -> Option<&Review> {
        self.reviews
            .iter()
            .max_by_key(|r| r.reviewed_at.unwrap_or(DateTime::<Utc>::MIN_UTC))
    }
}

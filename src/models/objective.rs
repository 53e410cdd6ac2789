// Strategic objectives, programs, initiatives and initiative feeds

use serde::{Deserialize, Serialize};

use super::fields;
use super::visibility::Owned;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicObjective {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub weight: f64,
    /// Weight chosen by the planner for this plan, overriding `weight`.
    #[serde(
        default,
        deserialize_with = "fields::optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub planner_weight: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, deserialize_with = "fields::list")]
    pub programs: Vec<Program>,
    #[serde(default, deserialize_with = "fields::list")]
    pub initiatives: Vec<StrategicInitiative>,
}

impl StrategicObjective {
    /// Planner override if set, otherwise the objective's own weight.
    pub fn effective_weight(&self) -> f64 {
        self.planner_weight.unwrap_or(self.weight)
    }

    pub fn program_ids(&self) -> Vec<u64> {
        self.programs.iter().map(|p| p.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub strategic_objective: Option<u64>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicInitiative {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub weight: f64,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub strategic_objective: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub program: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub organization: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub initiative_feed: Option<u64>,
}

/// Catalog entry an initiative can be picked from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeFeed {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "fields::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub strategic_objective: Option<u64>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

impl StrategicInitiative {
    /// Whether the initiative hangs off `objective` directly or via one of its programs.
    pub fn belongs_to(&self, objective: u64, programs: &[u64]) -> bool {
        self.strategic_objective == Some(objective)
            || self.program.is_some_and(|p| programs.contains(&p))
    }
}

impl Owned for StrategicInitiative {
    fn owner(&self) -> Option<u64> {
        self.organization
    }

    fn is_default(&self) -> bool {
        self.is_default
    }
}

// Performance measures, main activities and detail activities with their quarterly targets

use serde::{Deserialize, Serialize};

use super::budget::ActivityBudget;
use super::fields;
use super::visibility::Owned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[default]
    Cumulative,
    Increasing,
    Decreasing,
    Constant,
}

/// Baseline, quarterly and annual targets shared by measures and activities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Targets {
    #[serde(default, deserialize_with = "fields::text")]
    pub baseline: Option<String>,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub q1_target: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub q2_target: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub q3_target: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub q4_target: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub annual_target: f64,
}

impl Targets {
    /// Six-month figure: Q1+Q2 for cumulative targets, otherwise Q2 alone.
    pub fn six_month(&self) -> f64 {
        match self.target_type {
            TargetType::Cumulative => self.q1_target + self.q2_target,
            _ => self.q2_target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMeasure {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub weight: f64,
    #[serde(flatten)]
    pub targets: Targets,
    #[serde(default, deserialize_with = "fields::list")]
    pub selected_months: Vec<String>,
    #[serde(default, deserialize_with = "fields::list")]
    pub selected_quarters: Vec<String>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub initiative: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub organization: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainActivity {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub weight: f64,
    #[serde(flatten)]
    pub targets: Targets,
    #[serde(default, deserialize_with = "fields::list")]
    pub selected_months: Vec<String>,
    #[serde(default, deserialize_with = "fields::list")]
    pub selected_quarters: Vec<String>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub initiative: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub organization: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<ActivityBudget>,
}

/// Sub-activity of a main activity, carrying its own weight and targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailActivity {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub weight: f64,
    #[serde(flatten)]
    pub targets: Targets,
    #[serde(default, deserialize_with = "fields::list")]
    pub selected_months: Vec<String>,
    #[serde(default, deserialize_with = "fields::list")]
    pub selected_quarters: Vec<String>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub main_activity: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub organization: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Owned for PerformanceMeasure {
    fn owner(&self) -> Option<u64> {
        self.organization
    }

    fn is_default(&self) -> bool {
        self.is_default
    }
}

impl Owned for MainActivity {
    fn owner(&self) -> Option<u64> {
        self.organization
    }

    fn is_default(&self) -> bool {
        self.is_default
    }
}

impl Owned for DetailActivity {
    fn owner(&self) -> Option<u64> {
        self.organization
    }

    fn is_default(&self) -> bool {
        self.is_default
    }
}

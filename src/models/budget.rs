// Activity budgets: estimated cost plus the funding split

use serde::{Deserialize, Serialize};

use super::fields;

/// Whether the estimate came from a costing tool or was typed in by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetCalculationType {
    WithTool,
    #[default]
    WithoutTool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Training,
    Meeting,
    Workshop,
    Printing,
    Procurement,
    Supervision,
    #[serde(other)]
    Other,
}

impl ActivityType {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Training => "Training",
            ActivityType::Meeting => "Meeting",
            ActivityType::Workshop => "Workshop",
            ActivityType::Printing => "Printing",
            ActivityType::Procurement => "Procurement",
            ActivityType::Supervision => "Supervision",
            ActivityType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(
        default,
        deserialize_with = "fields::id_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub activity: Option<u64>,
    #[serde(default)]
    pub budget_calculation_type: BudgetCalculationType,
    #[serde(default)]
    pub activity_type: Option<ActivityType>,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub estimated_cost_with_tool: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub estimated_cost_without_tool: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub government_treasury: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub sdg_funding: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub partners_funding: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub other_funding: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partners_details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_details: Option<serde_json::Value>,
}

impl ActivityBudget {
    /// Estimate for the active calculation mode.
    pub fn estimated_cost(&self) -> f64 {
        match self.budget_calculation_type {
            BudgetCalculationType::WithTool => self.estimated_cost_with_tool,
            BudgetCalculationType::WithoutTool => self.estimated_cost_without_tool,
        }
    }

    pub fn total_funding(&self) -> f64 {
        self.government_treasury + self.sdg_funding + self.partners_funding + self.other_funding
    }

    /// Shortfall between cost and funding, never negative.
    pub fn funding_gap(&self) -> f64 {
        (self.estimated_cost() - self.total_funding()).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(cost: f64, government: f64, partners: f64) -> ActivityBudget {
        ActivityBudget {
            budget_calculation_type: BudgetCalculationType::WithoutTool,
            estimated_cost_without_tool: cost,
            government_treasury: government,
            partners_funding: partners,
            ..Default::default()
        }
    }

    #[test]
    fn test_available_and_gap() {
        let b = budget(10000.0, 3000.0, 2000.0);
        assert_eq!(b.total_funding(), 5000.0);
        assert_eq!(b.funding_gap(), 5000.0);
    }

    #[test]
    fn test_gap_never_negative() {
        let b = budget(1000.0, 3000.0, 2000.0);
        assert_eq!(b.funding_gap(), 0.0);
    }

    #[test]
    fn test_estimated_cost_follows_mode() {
        let b: ActivityBudget = serde_json::from_str(
            r#"{"budget_calculation_type": "WITH_TOOL", "estimated_cost_with_tool": "18000.00",
                "estimated_cost_without_tool": "5", "activity_type": "Workshop"}"#,
        )
        .unwrap();
        assert_eq!(b.estimated_cost(), 18000.0);
        assert_eq!(b.activity_type, Some(ActivityType::Workshop));
    }
}

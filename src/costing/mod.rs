// Costing calculators
//
// Each tool turns a set of form inputs plus the reference catalogs into an
// itemised estimate. Totals are derived from inputs by pure functions, so
// recomputing after every input change is just calling `estimate` again.

pub mod meeting;
pub mod printing;
pub mod procurement;
pub mod supervision;
pub mod tables;
pub mod transport;

use serde::{Deserialize, Serialize};

use crate::models::{ActivityBudget, ActivityType, BudgetCalculationType};

pub use meeting::{CostBreakdown, CostMode, LocationAttendance, MeetingWorkshopInput};
pub use printing::{PrintingInput, PrintingLine};
pub use procurement::{ProcurementInput, ProcurementLine};
pub use supervision::SupervisionInput;
pub use tables::ReferenceTables;
pub use transport::{TransportPlan, TransportRoute};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CostingError {
    #[error("{field} must be at least 1")]
    NotPositive { field: String },
    #[error("Unknown location id {0}")]
    UnknownLocation(u64),
    #[error("No {kind} rate configured for location '{location}'")]
    MissingRate { kind: &'static str, location: String },
    #[error("Unknown {kind} '{name}'")]
    UnknownCatalogItem { kind: &'static str, name: String },
    #[error("Accommodation mode needs an accommodation service type")]
    MissingAccommodationType,
    #[error(
        "Transport participants ({transport}) exceed the total number of participants ({participants})"
    )]
    TransportExceedsParticipants { transport: u32, participants: u32 },
    #[error("Amount for {field} cannot be negative")]
    NegativeAmount { field: String },
    #[error("Total budget must be greater than zero")]
    ZeroBudget,
}

/// How the session count scales the meeting/workshop total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScaling {
    /// Only per-session cost lines are multiplied by the session count.
    #[default]
    SessionLines,
    /// The whole subtotal is multiplied by the session count.
    WholeSubtotal,
}

/// Rate used when transport is required but no routes were entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFallback {
    #[default]
    Fixed,
    /// Average catalog price, falling back to the fixed rates for an empty catalog.
    CatalogAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostingSettings {
    pub session_scaling: SessionScaling,
    pub transport_fallback: TransportFallback,
    pub land_fallback_rate: f64,
    pub air_fallback_rate: f64,
}

impl Default for CostingSettings {
    fn default() -> Self {
        Self {
            session_scaling: SessionScaling::default(),
            transport_fallback: TransportFallback::default(),
            land_fallback_rate: 1000.0,
            air_fallback_rate: 5000.0,
        }
    }
}

/// Partner contribution entered on the costing form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerFunding {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostLine {
    pub label: String,
    pub amount: f64,
}

/// Validated, itemised estimate of one costing tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub activity_type: ActivityType,
    pub lines: Vec<CostLine>,
    pub total: f64,
}

impl Estimate {
    pub fn line(&self, label: &str) -> Option<f64> {
        self.lines
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.amount)
    }
}

/// Shared shape of every costing tool.
pub trait CostingTool: Serialize {
    fn activity_type(&self) -> ActivityType;

    fn partners(&self) -> &[PartnerFunding];

    /// Validate the inputs and compute the estimate.
    fn estimate(
        &self,
        tables: &ReferenceTables,
        settings: &CostingSettings,
    ) -> Result<Estimate, CostingError>;

    /// Package the estimate and the raw inputs into a budget draft for the activity.
    fn into_budget(
        &self,
        tables: &ReferenceTables,
        settings: &CostingSettings,
    ) -> Result<ActivityBudget, CostingError> {
        let estimate = self.estimate(tables, settings)?;
        Ok(draft_budget(self, &estimate))
    }
}

fn draft_budget<T: CostingTool + ?Sized>(tool: &T, estimate: &Estimate) -> ActivityBudget {
    let partners = tool.partners();
    let partners_funding = partners.iter().map(|p| p.amount).sum();
    let details = serde_json::json!({
        "inputs": serde_json::to_value(tool).unwrap_or(serde_json::Value::Null),
        "breakdown": estimate.lines,
        "total": estimate.total,
    });

    ActivityBudget {
        budget_calculation_type: BudgetCalculationType::WithTool,
        activity_type: Some(tool.activity_type()),
        estimated_cost_with_tool: estimate.total,
        partners_funding,
        partners_details: (!partners.is_empty())
            .then(|| serde_json::to_value(partners).unwrap_or(serde_json::Value::Null)),
        training_details: Some(details),
        ..ActivityBudget::default()
    }
}

pub(crate) fn require_positive(value: u32, field: &str) -> Result<(), CostingError> {
    if value == 0 {
        return Err(CostingError::NotPositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(value: f64, field: &str) -> Result<(), CostingError> {
    if value < 0.0 || value.is_nan() {
        return Err(CostingError::NegativeAmount {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_partners(partners: &[PartnerFunding]) -> Result<(), CostingError> {
    for partner in partners {
        require_non_negative(partner.amount, &format!("partner '{}'", partner.name))?;
    }
    Ok(())
}

pub(crate) fn require_budget(total: f64) -> Result<(), CostingError> {
    if total <= 0.0 {
        return Err(CostingError::ZeroBudget);
    }
    Ok(())
}

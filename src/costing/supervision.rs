// Supervision costing: supervisor per-diem, supervisor add-ons and travel

use serde::{Deserialize, Serialize};

use super::tables::ReferenceTables;
use super::transport::TransportPlan;
use super::{
    check_partners, require_budget, require_non_negative, require_positive, CostLine,
    CostingError, CostingSettings, CostingTool, Estimate, PartnerFunding,
};
use crate::models::ActivityType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisionInput {
    pub description: String,
    pub location_id: u64,
    pub supervisors: u32,
    pub days: u32,
    /// Selected supervisor cost types, each paid once per supervisor.
    pub supervisor_costs: Vec<String>,
    pub transport: TransportPlan,
    pub other_costs: f64,
    pub partners: Vec<PartnerFunding>,
    pub justification: Option<String>,
}

impl Default for SupervisionInput {
    fn default() -> Self {
        Self {
            description: String::new(),
            location_id: 0,
            supervisors: 1,
            days: 1,
            supervisor_costs: Vec::new(),
            transport: TransportPlan::default(),
            other_costs: 0.0,
            partners: Vec::new(),
            justification: None,
        }
    }
}

impl CostingTool for SupervisionInput {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Supervision
    }

    fn partners(&self) -> &[PartnerFunding] {
        &self.partners
    }

    fn estimate(
        &self,
        tables: &ReferenceTables,
        settings: &CostingSettings,
    ) -> Result<Estimate, CostingError> {
        require_positive(self.supervisors, "supervisors")?;
        require_positive(self.days, "days")?;
        require_non_negative(self.other_costs, "other costs")?;
        check_partners(&self.partners)?;
        self.transport.validate()?;

        let travelling = self.transport.participant_count();
        if travelling > self.supervisors {
            return Err(CostingError::TransportExceedsParticipants {
                transport: travelling,
                participants: self.supervisors,
            });
        }

        let supervisors = f64::from(self.supervisors);
        let per_diem =
            tables.daily_per_diem(self.location_id)? * supervisors * f64::from(self.days);
        let add_ons = self
            .supervisor_costs
            .iter()
            .map(|c| tables.supervisor_cost(c))
            .sum::<Result<f64, _>>()?
            * supervisors;
        let transport = self.transport.cost(tables, settings);

        let lines: Vec<CostLine> = [
            ("Per diem", per_diem),
            ("Supervisor costs", add_ons),
            ("Transport", transport),
            ("Other costs", self.other_costs),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(label, amount)| CostLine {
            label: label.to_string(),
            amount,
        })
        .collect();

        let total = lines.iter().map(|l| l.amount).sum();
        require_budget(total)?;
        Ok(Estimate {
            activity_type: ActivityType::Supervision,
            lines,
            total,
        })
    }
}

// Procurement costing: quantity × catalog unit price

use serde::{Deserialize, Serialize};

use super::tables::ReferenceTables;
use super::{
    check_partners, require_budget, require_positive, CostLine, CostingError, CostingSettings,
    CostingTool, Estimate, PartnerFunding,
};
use crate::models::ActivityType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementLine {
    pub item_id: u64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcurementInput {
    pub description: String,
    pub items: Vec<ProcurementLine>,
    pub partners: Vec<PartnerFunding>,
    pub justification: Option<String>,
}

impl CostingTool for ProcurementInput {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Procurement
    }

    fn partners(&self) -> &[PartnerFunding] {
        &self.partners
    }

    fn estimate(
        &self,
        tables: &ReferenceTables,
        _settings: &CostingSettings,
    ) -> Result<Estimate, CostingError> {
        check_partners(&self.partners)?;
        let mut lines = Vec::with_capacity(self.items.len());
        for line in &self.items {
            let item = tables.procurement_item(line.item_id)?;
            require_positive(line.quantity, &format!("quantity of {}", item.name))?;
            lines.push(CostLine {
                label: format!("{} × {} {}", item.name, line.quantity, item.unit),
                amount: f64::from(line.quantity) * item.unit_price,
            });
        }

        let total = lines.iter().map(|l| l.amount).sum();
        require_budget(total)?;
        Ok(Estimate {
            activity_type: ActivityType::Procurement,
            lines,
            total,
        })
    }
}

// Printing costing: pages × copies × catalog price per page

use serde::{Deserialize, Serialize};

use super::tables::ReferenceTables;
use super::{
    check_partners, require_budget, require_positive, CostLine, CostingError, CostingSettings,
    CostingTool, Estimate, PartnerFunding,
};
use crate::models::ActivityType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintingLine {
    pub document_type: String,
    pub pages: u32,
    pub copies: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintingInput {
    pub description: String,
    pub documents: Vec<PrintingLine>,
    pub partners: Vec<PartnerFunding>,
    pub justification: Option<String>,
}

impl PrintingInput {
    pub fn validate(&self) -> Result<(), CostingError> {
        for (i, doc) in self.documents.iter().enumerate() {
            require_positive(doc.pages, &format!("pages of document {}", i + 1))?;
            require_positive(doc.copies, &format!("copies of document {}", i + 1))?;
        }
        check_partners(&self.partners)
    }
}

impl CostingTool for PrintingInput {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Printing
    }

    fn partners(&self) -> &[PartnerFunding] {
        &self.partners
    }

    fn estimate(
        &self,
        tables: &ReferenceTables,
        _settings: &CostingSettings,
    ) -> Result<Estimate, CostingError> {
        self.validate()?;
        let lines = self
            .documents
            .iter()
            .map(|doc| {
                let price = tables.printing_price(&doc.document_type)?;
                Ok(CostLine {
                    label: format!("{} ({} pages × {})", doc.document_type, doc.pages, doc.copies),
                    amount: f64::from(doc.pages) * f64::from(doc.copies) * price,
                })
            })
            .collect::<Result<Vec<_>, CostingError>>()?;

        let total = lines.iter().map(|l| l.amount).sum();
        require_budget(total)?;
        Ok(Estimate {
            activity_type: ActivityType::Printing,
            lines,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::tables::fixtures::tables;

    #[test]
    fn test_printing_total() {
        let input = PrintingInput {
            documents: vec![PrintingLine {
                document_type: "manual".to_string(),
                pages: 40,
                copies: 100,
            }],
            ..PrintingInput::default()
        };
        let estimate = input.estimate(&tables(), &CostingSettings::default()).unwrap();
        assert_eq!(estimate.total, 40.0 * 100.0 * 2.5);
        assert_eq!(estimate.activity_type, ActivityType::Printing);
    }

    #[test]
    fn test_no_documents_is_zero_budget() {
        let input = PrintingInput::default();
        assert_eq!(
            input.estimate(&tables(), &CostingSettings::default()),
            Err(CostingError::ZeroBudget)
        );
    }

    #[test]
    fn test_zero_copies_rejected() {
        let input = PrintingInput {
            documents: vec![PrintingLine {
                document_type: "MANUAL".to_string(),
                pages: 10,
                copies: 0,
            }],
            ..PrintingInput::default()
        };
        assert!(matches!(
            input.validate(),
            Err(CostingError::NotPositive { .. })
        ));
    }
}

// Plan review: flattened table, budget aggregation and export

pub mod export;
pub mod summary;
pub mod table;

pub use export::{column_labels, ExportError, ExportHeader, Language, PlanReport};
pub use summary::BudgetSummary;
pub use table::{flatten, PlanRow, RowBudget, RowItem, RowKind};

// Planning workflow
//
// The plan wizard as an explicit step machine:
// PlanType → SelectionMode → Objectives → Build → Preview → Submit.
// Each transition checks that it is taken from the right step.

pub mod review;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::api::{ApiError, PlanningClient};
use crate::enrichment::PlanTree;
use crate::models::{check_sum, Plan, PlanStatus, PlanType, StrategicObjective, WeightCheck};

pub use review::{approve, approve_team_desk, reject, reject_team_desk};

/// Selected objectives' effective weights must add up to this.
pub const TOTAL_OBJECTIVE_WEIGHT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Step {
    PlanType,
    SelectionMode,
    Objectives,
    Build,
    Preview,
    Submit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::PlanType => "plan type",
            Step::SelectionMode => "selection mode",
            Step::Objectives => "objectives",
            Step::Build => "build",
            Step::Preview => "preview",
            Step::Submit => "submit",
        };
        f.write_str(label)
    }
}

/// Default keeps each objective's own weight; Custom lets the planner override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Default,
    Custom,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Cannot do that at the {actual} step (expected {expected})")]
    OutOfOrder { expected: Step, actual: Step },
    #[error("Select at least one strategic objective")]
    NoObjectives,
    #[error("Objective weights must total {expected}, currently {total}")]
    WeightsMismatch { total: f64, expected: f64 },
    #[error("Planner weights can only be changed in custom selection mode")]
    NotCustomMode,
    #[error("Objective {0} is not selected")]
    UnknownObjective(u64),
    #[error("Weight for objective {id} must be between 0 and 100, got {weight}")]
    InvalidWeight { id: u64, weight: f64 },
    #[error("Planning period must be set and start before it ends")]
    InvalidPeriod,
    #[error("Feedback is required when rejecting a plan")]
    FeedbackRequired,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Body posted to `/plans/` when the wizard is submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSubmission {
    pub organization: u64,
    pub planner_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executive_name: Option<String>,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    /// First selected objective, for backends that still read the single field.
    pub strategic_objective: u64,
    pub selected_objectives: Vec<u64>,
    pub selected_objectives_weights: BTreeMap<u64, f64>,
    pub status: PlanStatus,
}

#[derive(Debug, Clone)]
pub struct PlanningSession {
    organization: u64,
    planner: String,
    executive_name: Option<String>,
    step: Step,
    plan_type: Option<PlanType>,
    mode: Option<SelectionMode>,
    objectives: Vec<StrategicObjective>,
    period: Option<(NaiveDate, NaiveDate)>,
    tree: Option<PlanTree>,
}

impl PlanningSession {
    pub fn new(organization: u64, planner: impl Into<String>) -> Self {
        Self {
            organization,
            planner: planner.into(),
            executive_name: None,
            step: Step::PlanType,
            plan_type: None,
            mode: None,
            objectives: Vec::new(),
            period: None,
            tree: None,
        }
    }

    pub fn with_executive(mut self, name: impl Into<String>) -> Self {
        self.executive_name = Some(name.into());
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn objectives(&self) -> &[StrategicObjective] {
        &self.objectives
    }

    pub fn tree(&self) -> Option<&PlanTree> {
        self.tree.as_ref()
    }

    fn expect_step(&self, expected: Step) -> Result<(), WorkflowError> {
        if self.step != expected {
            return Err(WorkflowError::OutOfOrder {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    pub fn choose_plan_type(&mut self, plan_type: PlanType) -> Result<(), WorkflowError> {
        self.expect_step(Step::PlanType)?;
        self.plan_type = Some(plan_type);
        self.step = Step::SelectionMode;
        Ok(())
    }

    pub fn choose_selection_mode(&mut self, mode: SelectionMode) -> Result<(), WorkflowError> {
        self.expect_step(Step::SelectionMode)?;
        self.mode = Some(mode);
        self.step = Step::Objectives;
        Ok(())
    }

    /// Replace the selection. Default mode drops any planner overrides.
    pub fn select_objectives(
        &mut self,
        objectives: Vec<StrategicObjective>,
    ) -> Result<(), WorkflowError> {
        self.expect_step(Step::Objectives)?;
        if objectives.is_empty() {
            return Err(WorkflowError::NoObjectives);
        }
        self.objectives = objectives;
        if self.mode == Some(SelectionMode::Default) {
            for objective in &mut self.objectives {
                objective.planner_weight = None;
            }
        }
        Ok(())
    }

    pub fn set_planner_weight(&mut self, id: u64, weight: f64) -> Result<(), WorkflowError> {
        self.expect_step(Step::Objectives)?;
        if self.mode != Some(SelectionMode::Custom) {
            return Err(WorkflowError::NotCustomMode);
        }
        if !(0.0..=TOTAL_OBJECTIVE_WEIGHT).contains(&weight) {
            return Err(WorkflowError::InvalidWeight { id, weight });
        }
        let objective = self
            .objectives
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(WorkflowError::UnknownObjective(id))?;
        objective.planner_weight = Some(weight);
        Ok(())
    }

    pub fn weight_check(&self) -> WeightCheck {
        check_sum(
            self.objectives.iter().map(StrategicObjective::effective_weight),
            TOTAL_OBJECTIVE_WEIGHT,
        )
    }

    pub fn set_period(&mut self, from: NaiveDate, to: NaiveDate) -> Result<(), WorkflowError> {
        if from >= to {
            return Err(WorkflowError::InvalidPeriod);
        }
        self.period = Some((from, to));
        Ok(())
    }

    pub fn proceed_to_build(&mut self) -> Result<(), WorkflowError> {
        self.expect_step(Step::Objectives)?;
        if self.objectives.is_empty() {
            return Err(WorkflowError::NoObjectives);
        }
        let check = self.weight_check();
        if !check.is_valid() {
            return Err(WorkflowError::WeightsMismatch {
                total: check.total,
                expected: check.expected,
            });
        }
        self.step = Step::Build;
        tracing::info!(
            objectives = self.objectives.len(),
            "Objective selection confirmed"
        );
        Ok(())
    }

    /// Attach the enriched tree built for the selection. May be repeated to refresh.
    pub fn preview(&mut self, tree: PlanTree) -> Result<(), WorkflowError> {
        if self.step != Step::Preview {
            self.expect_step(Step::Build)?;
        }
        self.tree = Some(tree);
        self.step = Step::Preview;
        Ok(())
    }

    /// One step back, as the wizard's back button.
    pub fn back(&mut self) {
        self.step = match self.step {
            Step::PlanType | Step::SelectionMode => Step::PlanType,
            Step::Objectives => Step::SelectionMode,
            Step::Build => Step::Objectives,
            Step::Preview | Step::Submit => Step::Build,
        };
    }

    pub fn submission(&self) -> Result<PlanSubmission, WorkflowError> {
        self.expect_step(Step::Preview)?;
        let (from_date, to_date) = self.period.ok_or(WorkflowError::InvalidPeriod)?;
        let first = self.objectives.first().ok_or(WorkflowError::NoObjectives)?;

        Ok(PlanSubmission {
            organization: self.organization,
            planner_name: self.planner.clone(),
            executive_name: self.executive_name.clone(),
            plan_type: self.plan_type.unwrap_or(PlanType::LeoEo),
            from_date,
            to_date,
            strategic_objective: first.id,
            selected_objectives: self.objectives.iter().map(|o| o.id).collect(),
            selected_objectives_weights: self
                .objectives
                .iter()
                .map(|o| (o.id, o.effective_weight()))
                .collect(),
            status: PlanStatus::Draft,
        })
    }

    /// Create the plan, then move it to review.
    pub async fn submit(&mut self, client: &PlanningClient) -> Result<Plan, WorkflowError> {
        let submission = self.submission()?;
        let plan = client.plans().create(&submission).await?;
        client.submit_plan(plan.id).await?;
        self.step = Step::Submit;
        tracing::info!(plan = plan.id, "Plan created and submitted");
        Ok(plan)
    }
}

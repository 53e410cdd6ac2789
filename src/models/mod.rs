// Planning domain records as served by the REST backend

pub mod budget;
pub mod catalog;
pub mod fields;
pub mod measure;
pub mod objective;
pub mod organization;
pub mod plan;
pub mod team_desk;
pub mod visibility;
pub mod weights;

pub use budget::{ActivityBudget, ActivityType, BudgetCalculationType};
pub use catalog::{
    Accommodation, ActivityCostingAssumption, AirTransport, LandTransport, Location,
    ParticipantCost, PerDiem, PrintingCost, ProcurementItem, SessionCost, SupervisorCost,
};
pub use measure::{DetailActivity, MainActivity, PerformanceMeasure, TargetType, Targets};
pub use objective::{InitiativeFeed, Program, StrategicInitiative, StrategicObjective};
pub use organization::{Organization, OrganizationMembership, OrganizationType, Role};
pub use plan::{Plan, PlanStatus, PlanType, Review, ReviewStatus};
pub use team_desk::{ItemSelection, Level, TeamDeskPlan, TeamDeskPlanReview};
pub use visibility::{is_visible_to, visible_to, Owned};
pub use weights::{check_sum, WeightCheck};

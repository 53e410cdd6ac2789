// Data source seam for the enrichment engine

use async_trait::async_trait;

use crate::api::{ApiError, PlanningClient};
use crate::models::{
    DetailActivity, MainActivity, PerformanceMeasure, StrategicInitiative, StrategicObjective,
};

/// Hierarchy reads the enricher needs. Implemented by the HTTP client and by
/// in-memory fixtures in tests.
#[async_trait]
pub trait PlanningSource: Send + Sync {
    async fn objectives(&self) -> Result<Vec<StrategicObjective>, ApiError>;

    async fn initiatives_by_objective(
        &self,
        objective: u64,
    ) -> Result<Vec<StrategicInitiative>, ApiError>;

    async fn initiatives_by_program(
        &self,
        program: u64,
    ) -> Result<Vec<StrategicInitiative>, ApiError>;

    async fn all_initiatives(&self) -> Result<Vec<StrategicInitiative>, ApiError>;

    async fn measures_by_initiative(
        &self,
        initiative: u64,
    ) -> Result<Vec<PerformanceMeasure>, ApiError>;

    async fn activities_by_initiative(
        &self,
        initiative: u64,
    ) -> Result<Vec<MainActivity>, ApiError>;

    async fn detail_activities_by_main_activity(
        &self,
        main_activity: u64,
    ) -> Result<Vec<DetailActivity>, ApiError>;
}

#[async_trait]
impl PlanningSource for PlanningClient {
    async fn objectives(&self) -> Result<Vec<StrategicObjective>, ApiError> {
        PlanningClient::objectives(self).get_all().await
    }

    async fn initiatives_by_objective(
        &self,
        objective: u64,
    ) -> Result<Vec<StrategicInitiative>, ApiError> {
        PlanningClient::initiatives_by_objective(self, objective).await
    }

    async fn initiatives_by_program(
        &self,
        program: u64,
    ) -> Result<Vec<StrategicInitiative>, ApiError> {
        PlanningClient::initiatives_by_program(self, program).await
    }

    async fn all_initiatives(&self) -> Result<Vec<StrategicInitiative>, ApiError> {
        self.initiatives().get_all().await
    }

    async fn measures_by_initiative(
        &self,
        initiative: u64,
    ) -> Result<Vec<PerformanceMeasure>, ApiError> {
        PlanningClient::measures_by_initiative(self, initiative).await
    }

    async fn activities_by_initiative(
        &self,
        initiative: u64,
    ) -> Result<Vec<MainActivity>, ApiError> {
        PlanningClient::activities_by_initiative(self, initiative).await
    }

    async fn detail_activities_by_main_activity(
        &self,
        main_activity: u64,
    ) -> Result<Vec<DetailActivity>, ApiError> {
        PlanningClient::detail_activities_by_main_activity(self, main_activity).await
    }
}

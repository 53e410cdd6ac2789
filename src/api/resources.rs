// Per-resource namespaces over the REST endpoints
//
// Every namespace exposes get_all / get_by_id / create / update / delete.
// Failures always come back as `ApiError`; callers that prefer to degrade
// to an empty list say so explicitly with `OrEmpty::or_empty`.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::marker::PhantomData;

use super::client::PlanningClient;
use super::error::ApiError;
use crate::models::{
    Accommodation, ActivityBudget, ActivityCostingAssumption, AirTransport, DetailActivity,
    InitiativeFeed, LandTransport, Location, MainActivity, Organization, ParticipantCost, PerDiem,
    PerformanceMeasure, Plan, PrintingCost, ProcurementItem, Program, SessionCost,
    StrategicInitiative, StrategicObjective, SupervisorCost, TeamDeskPlan, TeamDeskPlanReview,
};

/// List endpoints answer with a bare array or a DRF page.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Plain(Vec<T>),
    Paged {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl<T> ListBody<T> {
    /// Rows of this page and the link to the following one, if any.
    fn into_page(self) -> (Vec<T>, Option<String>) {
        match self {
            ListBody::Plain(items) => (items, None),
            ListBody::Paged { results, next } => (results, next.filter(|n| !n.is_empty())),
        }
    }
}

pub struct Resource<'a, T> {
    client: &'a PlanningClient,
    path: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Resource<'a, T> {
    fn new(client: &'a PlanningClient, path: &'static str) -> Self {
        Self {
            client,
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    fn item_path(&self, id: u64) -> String {
        format!("{}/{}/", self.path, id)
    }

    pub async fn get_all(&self) -> Result<Vec<T>, ApiError> {
        self.list(&[]).await
    }

    /// Every row matching `query`, following `next` links across pages.
    pub async fn list(&self, query: &[(&str, String)]) -> Result<Vec<T>, ApiError> {
        self.client.get_paged(&format!("{}/", self.path), query).await
    }

    pub async fn get_by_id(&self, id: u64) -> Result<T, ApiError> {
        self.client.get(&self.item_path(id), &[]).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T, ApiError> {
        self.client.post(&format!("{}/", self.path), body).await
    }

    /// Partial update (PATCH).
    pub async fn update<B: Serialize + ?Sized>(&self, id: u64, body: &B) -> Result<T, ApiError> {
        self.client.patch(&self.item_path(id), body).await
    }

    pub async fn replace<B: Serialize + ?Sized>(&self, id: u64, body: &B) -> Result<T, ApiError> {
        self.client.put(&self.item_path(id), body).await
    }

    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.client.delete(&self.item_path(id)).await
    }
}

/// Explicit degradation of a failed list fetch to an empty list.
pub trait OrEmpty<T> {
    fn or_empty(self, what: &str) -> Vec<T>;
}

impl<T> OrEmpty<T> for Result<Vec<T>, ApiError> {
    fn or_empty(self, what: &str) -> Vec<T> {
        match self {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Failed to fetch {}, continuing with none: {}", what, e);
                Vec::new()
            }
        }
    }
}

/// Result of one of the backend's weight validation actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightValidation {
    // A 200 without an explicit flag means the weights passed
    #[serde(default = "default_valid")]
    pub is_valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "crate::models::fields::optional_decimal")]
    pub total_weight: Option<f64>,
    #[serde(default, deserialize_with = "crate::models::fields::optional_decimal")]
    pub expected_weight: Option<f64>,
}

fn default_valid() -> bool {
    true
}

#[derive(Serialize)]
struct ReviewBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<&'a str>,
}

/// Plan collections that share the submit / approve / reject actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    LeoEo,
    TeamDesk,
}

impl PlanKind {
    fn collection(self) -> &'static str {
        match self {
            PlanKind::LeoEo => "plans",
            PlanKind::TeamDesk => "team-desk-plans",
        }
    }
}

impl PlanningClient {
    /// GET a list endpoint and keep requesting pages until `next` is null.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let first: ListBody<T> = self.get(path, query).await?;
        let (mut items, mut next) = first.into_page();
        let endpoint = self.url(path)?;
        let mut visited = HashSet::new();

        while let Some(link) = next {
            let url = self.page_url(&endpoint, &link)?;
            if !visited.insert(url.clone()) {
                tracing::warn!("{} links back to {}, stopping", path, url);
                break;
            }
            let page: ListBody<T> = self.get(url.as_str(), &[]).await?;
            let (rows, following) = page.into_page();
            items.extend(rows);
            next = following;
        }

        if !visited.is_empty() {
            tracing::debug!(pages = visited.len() + 1, rows = items.len(), "Fetched {}", path);
        }
        Ok(items)
    }

    /// Resolve a `next` link; it must stay on the API's origin so the
    /// session cookies are never sent elsewhere.
    fn page_url(&self, endpoint: &Url, link: &str) -> Result<Url, ApiError> {
        let url = endpoint
            .join(link)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", link, e)))?;
        if url.origin() != self.base_url().origin() {
            return Err(ApiError::InvalidUrl(format!(
                "{}: next page is outside the API origin",
                link
            )));
        }
        Ok(url)
    }

    pub fn objectives(&self) -> Resource<'_, StrategicObjective> {
        Resource::new(self, "strategic-objectives")
    }

    pub fn programs(&self) -> Resource<'_, Program> {
        Resource::new(self, "programs")
    }

    pub fn initiatives(&self) -> Resource<'_, StrategicInitiative> {
        Resource::new(self, "strategic-initiatives")
    }

    pub fn performance_measures(&self) -> Resource<'_, PerformanceMeasure> {
        Resource::new(self, "performance-measures")
    }

    pub fn main_activities(&self) -> Resource<'_, MainActivity> {
        Resource::new(self, "main-activities")
    }

    pub fn activity_budgets(&self) -> Resource<'_, ActivityBudget> {
        Resource::new(self, "activity-budgets")
    }

    pub fn plans(&self) -> Resource<'_, Plan> {
        Resource::new(self, "plans")
    }

    pub fn detail_activities(&self) -> Resource<'_, DetailActivity> {
        Resource::new(self, "detail-activities")
    }

    pub fn team_desk_plans(&self) -> Resource<'_, TeamDeskPlan> {
        Resource::new(self, "team-desk-plans")
    }

    pub fn team_desk_plan_reviews(&self) -> Resource<'_, TeamDeskPlanReview> {
        Resource::new(self, "team-desk-plan-reviews")
    }

    pub fn initiative_feeds(&self) -> Resource<'_, InitiativeFeed> {
        Resource::new(self, "initiative-feeds")
    }

    pub fn organizations(&self) -> Resource<'_, Organization> {
        Resource::new(self, "organizations")
    }

    pub fn locations(&self) -> Resource<'_, Location> {
        Resource::new(self, "locations")
    }

    pub fn per_diems(&self) -> Resource<'_, PerDiem> {
        Resource::new(self, "per-diems")
    }

    pub fn accommodations(&self) -> Resource<'_, Accommodation> {
        Resource::new(self, "accommodations")
    }

    pub fn participant_costs(&self) -> Resource<'_, ParticipantCost> {
        Resource::new(self, "participant-costs")
    }

    pub fn session_costs(&self) -> Resource<'_, SessionCost> {
        Resource::new(self, "session-costs")
    }

    pub fn land_transports(&self) -> Resource<'_, LandTransport> {
        Resource::new(self, "land-transports")
    }

    pub fn air_transports(&self) -> Resource<'_, AirTransport> {
        Resource::new(self, "air-transports")
    }

    pub fn printing_costs(&self) -> Resource<'_, PrintingCost> {
        Resource::new(self, "printing-costs")
    }

    pub fn supervisor_costs(&self) -> Resource<'_, SupervisorCost> {
        Resource::new(self, "supervisor-costs")
    }

    pub fn procurement_items(&self) -> Resource<'_, ProcurementItem> {
        Resource::new(self, "procurement-items")
    }

    pub fn activity_costing_assumptions(&self) -> Resource<'_, ActivityCostingAssumption> {
        Resource::new(self, "activity-costing-assumptions")
    }

    // ── hierarchy queries ─────────────────────────────────────────────────────

    pub async fn initiatives_by_objective(
        &self,
        objective: u64,
    ) -> Result<Vec<StrategicInitiative>, ApiError> {
        self.initiatives()
            .list(&[("objective", objective.to_string())])
            .await
    }

    pub async fn initiatives_by_program(
        &self,
        program: u64,
    ) -> Result<Vec<StrategicInitiative>, ApiError> {
        self.initiatives()
            .list(&[("program", program.to_string())])
            .await
    }

    pub async fn measures_by_initiative(
        &self,
        initiative: u64,
    ) -> Result<Vec<PerformanceMeasure>, ApiError> {
        self.performance_measures()
            .list(&[("initiative", initiative.to_string())])
            .await
    }

    pub async fn activities_by_initiative(
        &self,
        initiative: u64,
    ) -> Result<Vec<MainActivity>, ApiError> {
        self.main_activities()
            .list(&[("initiative", initiative.to_string())])
            .await
    }

    pub async fn detail_activities_by_main_activity(
        &self,
        main_activity: u64,
    ) -> Result<Vec<DetailActivity>, ApiError> {
        self.detail_activities()
            .list(&[("main_activity", main_activity.to_string())])
            .await
    }

    /// Team/Desk plans cascaded from the LEO/EO plan `leo_eo_plan`.
    pub async fn team_desk_plans_for(
        &self,
        leo_eo_plan: u64,
    ) -> Result<Vec<TeamDeskPlan>, ApiError> {
        self.team_desk_plans()
            .list(&[("leo_eo_plan", leo_eo_plan.to_string())])
            .await
    }

    pub async fn active_initiative_feeds(&self) -> Result<Vec<InitiativeFeed>, ApiError> {
        let feeds = self
            .initiative_feeds()
            .list(&[("is_active", "true".to_string())])
            .await?;
        // Older backends ignore the filter
        Ok(feeds.into_iter().filter(|f| f.is_active).collect())
    }

    // ── weight validation round-trips ─────────────────────────────────────────

    pub async fn validate_initiatives_weight(
        &self,
        objective: u64,
    ) -> Result<WeightValidation, ApiError> {
        let path = format!("strategic-objectives/{}/validate_initiatives_weight/", objective);
        interpret_validation(self.get(&path, &[]).await)
    }

    pub async fn validate_measures_weight(
        &self,
        initiative: u64,
    ) -> Result<WeightValidation, ApiError> {
        let path = format!("strategic-initiatives/{}/validate_measures_weight/", initiative);
        interpret_validation(self.post(&path, &serde_json::json!({})).await)
    }

    pub async fn validate_activities_weight(
        &self,
        initiative: u64,
    ) -> Result<WeightValidation, ApiError> {
        let path = format!("strategic-initiatives/{}/validate_activities_weight/", initiative);
        interpret_validation(self.post(&path, &serde_json::json!({})).await)
    }

    // ── plan actions ──────────────────────────────────────────────────────────

    async fn plan_action(
        &self,
        kind: PlanKind,
        plan: u64,
        action: &str,
        feedback: Option<&str>,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}/{}/", kind.collection(), plan, action);
        self.post::<_, serde_json::Value>(&path, &ReviewBody { feedback })
            .await?;
        Ok(())
    }

    pub async fn submit_plan(&self, plan: u64) -> Result<(), ApiError> {
        self.plan_action(PlanKind::LeoEo, plan, "submit", None).await?;
        tracing::info!(plan, "Plan submitted for review");
        Ok(())
    }

    pub async fn approve_plan(&self, plan: u64, feedback: Option<&str>) -> Result<(), ApiError> {
        self.plan_action(PlanKind::LeoEo, plan, "approve", feedback)
            .await?;
        tracing::info!(plan, "Plan approved");
        Ok(())
    }

    pub async fn reject_plan(&self, plan: u64, feedback: &str) -> Result<(), ApiError> {
        self.plan_action(PlanKind::LeoEo, plan, "reject", Some(feedback))
            .await?;
        tracing::info!(plan, "Plan rejected");
        Ok(())
    }

    pub async fn submit_team_desk_plan(&self, plan: u64) -> Result<(), ApiError> {
        self.plan_action(PlanKind::TeamDesk, plan, "submit", None)
            .await?;
        tracing::info!(plan, "Team/Desk plan submitted for review");
        Ok(())
    }

    pub async fn approve_team_desk_plan(
        &self,
        plan: u64,
        feedback: Option<&str>,
    ) -> Result<(), ApiError> {
        self.plan_action(PlanKind::TeamDesk, plan, "approve", feedback)
            .await?;
        tracing::info!(plan, "Team/Desk plan approved");
        Ok(())
    }

    pub async fn reject_team_desk_plan(&self, plan: u64, feedback: &str) -> Result<(), ApiError> {
        self.plan_action(PlanKind::TeamDesk, plan, "reject", Some(feedback))
            .await?;
        tracing::info!(plan, "Team/Desk plan rejected");
        Ok(())
    }

    pub async fn pending_reviews(&self) -> Result<Vec<Plan>, ApiError> {
        self.get_paged("plans/pending_reviews/", &[]).await
    }
}

/// A 400 from a validation action carries the reason rather than a failure.
fn interpret_validation(
    result: Result<WeightValidation, ApiError>,
) -> Result<WeightValidation, ApiError> {
    match result {
        Ok(validation) => Ok(validation),
        Err(ApiError::Status { status: 400, body }) => {
            let mut validation: WeightValidation =
                serde_json::from_str(&body).unwrap_or_default();
            validation.is_valid = false;
            if validation.message.is_none() {
                validation.message = Some(body);
            }
            Ok(validation)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::api::ApiSettings;

    #[test]
    fn test_list_body_plain_and_paged() {
        let plain: ListBody<u64> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(plain.into_page(), (vec![1, 2], None));
        let last: ListBody<u64> =
            serde_json::from_str(r#"{"count": 2, "next": null, "results": [3, 4]}"#).unwrap();
        assert_eq!(last.into_page(), (vec![3, 4], None));
        let first: ListBody<u64> = serde_json::from_str(
            r#"{"count": 3, "next": "http://host/api/plans/?page=2", "results": [5]}"#,
        )
        .unwrap();
        assert_eq!(
            first.into_page(),
            (vec![5], Some("http://host/api/plans/?page=2".to_string()))
        );
    }

    #[test]
    fn test_page_url_stays_on_api_origin() {
        let client =
            PlanningClient::new(ApiSettings::default().with_base_url("http://host/api")).unwrap();
        let endpoint = client.url("plans/").unwrap();

        let absolute = client
            .page_url(&endpoint, "http://host/api/plans/?page=2")
            .unwrap();
        assert_eq!(absolute.as_str(), "http://host/api/plans/?page=2");
        let relative = client.page_url(&endpoint, "?page=3").unwrap();
        assert_eq!(relative.as_str(), "http://host/api/plans/?page=3");

        let foreign = client.page_url(&endpoint, "http://elsewhere/api/plans/?page=2");
        assert!(matches!(foreign, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_or_empty_swallows_with_warning() {
        let failed: Result<Vec<u8>, ApiError> = Err(ApiError::Timeout);
        assert!(failed.or_empty("locations").is_empty());
        let ok: Result<Vec<u8>, ApiError> = Ok(vec![1]);
        assert_eq!(ok.or_empty("locations"), vec![1]);
    }

    #[test]
    fn test_validation_400_is_an_answer() {
        let result = interpret_validation(Err(ApiError::Status {
            status: 400,
            body: r#"{"message": "Total weight is 80, expected 100", "total_weight": "80"}"#
                .to_string(),
        }))
        .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.total_weight, Some(80.0));
        assert!(result.message.unwrap().contains("expected 100"));
    }

    #[test]
    fn test_validation_500_is_an_error() {
        let result = interpret_validation(Err(ApiError::Status {
            status: 500,
            body: String::new(),
        }));
        assert!(result.is_err());
    }
}

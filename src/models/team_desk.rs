// Team/Desk plans cascaded from a LEO/EO plan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::fields;
use super::plan::{PlanStatus, ReviewStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDeskPlanReview {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub plan: Option<u64>,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDeskPlan {
    pub id: u64,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub organization: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub team_desk: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_desk_name: Option<String>,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub leo_eo_plan: Option<u64>,
    pub status: PlanStatus,
    #[serde(default, deserialize_with = "fields::id_list")]
    pub objectives: Vec<u64>,
    #[serde(default, deserialize_with = "fields::id_list")]
    pub initiatives: Vec<u64>,
    #[serde(default, deserialize_with = "fields::id_list")]
    pub performance_measures: Vec<u64>,
    #[serde(default, deserialize_with = "fields::id_list")]
    pub main_activities: Vec<u64>,
    #[serde(default, deserialize_with = "fields::id_list")]
    pub detail_activities: Vec<u64>,
    #[serde(default, deserialize_with = "fields::list")]
    pub reviews: Vec<TeamDeskPlanReview>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TeamDeskPlan {
    /// Name shown for the team or desk, falling back to its id.
    pub fn display_name(&self) -> String {
        self.team_desk_name
            .clone()
            .or_else(|| self.team_desk.map(|id| format!("Team/Desk {}", id)))
            .unwrap_or_else(|| format!("Team/Desk plan {}", self.id))
    }

    pub fn selection(&self) -> ItemSelection {
        ItemSelection {
            objectives: Level::of(&self.objectives),
            initiatives: Level::of(&self.initiatives),
            measures: Level::of(&self.performance_measures),
            activities: Level::of(&self.main_activities),
            details: Level::of(&self.detail_activities),
        }
    }

    pub fn latest_review(&self) -> Option<&TeamDeskPlanReview> {
        self.reviews
            .iter()
            .max_by_key(|r| r.reviewed_at.unwrap_or(DateTime::<Utc>::MIN_UTC))
    }
}

/// Ids chosen at one level of the hierarchy. An empty choice keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Level(Option<HashSet<u64>>);

impl Level {
    pub fn of(ids: &[u64]) -> Self {
        if ids.is_empty() {
            Level(None)
        } else {
            Level(Some(ids.iter().copied().collect()))
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.0.as_ref().map_or(true, |ids| ids.contains(&id))
    }
}

/// Which items of the parent plan a Team/Desk plan carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSelection {
    pub objectives: Level,
    pub initiatives: Level,
    pub measures: Level,
    pub activities: Level,
    pub details: Level,
}

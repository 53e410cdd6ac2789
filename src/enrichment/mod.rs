// Plan enrichment
//
// Expands selected objectives into the full objective → initiative →
// measure/activity → detail activity tree for one viewing organization. Fetches run with
// bounded concurrency under the retry policy; a failed fetch degrades only
// its own node, which is flagged incomplete.

pub mod source;
pub mod tree;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::api::{with_retry, ApiError, RetryPolicy};
use crate::models::{
    visible_to, DetailActivity, MainActivity, Plan, StrategicInitiative, StrategicObjective,
};

pub use source::PlanningSource;
pub use tree::{InitiativeNode, ObjectiveNode, PlanTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentOptions {
    /// Maximum objectives (and initiatives per objective) fetched at once.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Also collect initiatives from the full list and from each program.
    pub three_way_merge: bool,
    /// Fetch the detail activities under each visible main activity.
    pub detail_activities: bool,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            retry: RetryPolicy::default(),
            three_way_merge: true,
            detail_activities: true,
        }
    }
}

pub struct Enricher<S> {
    source: S,
    options: EnrichmentOptions,
}

/// Outcome of a degradable fetch: the rows, or nothing plus a failure flag.
struct Fetched<T> {
    items: Vec<T>,
    failed: bool,
}

impl<T> Fetched<T> {
    fn settle(result: Result<Vec<T>, ApiError>, what: &str) -> Self {
        match result {
            Ok(items) => Self {
                items,
                failed: false,
            },
            Err(e) => {
                tracing::warn!("Failed to fetch {}, node marked incomplete: {}", what, e);
                Self {
                    items: Vec::new(),
                    failed: true,
                }
            }
        }
    }
}

impl<S: PlanningSource> Enricher<S> {
    pub fn new(source: S, options: EnrichmentOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn concurrency(&self) -> usize {
        self.options.concurrency.max(1)
    }

    /// Build the tree for `objectives` as seen by `viewer`. Output order
    /// follows input order. Always returns; check `PlanTree::is_complete`.
    pub async fn enrich(
        &self,
        objectives: Vec<StrategicObjective>,
        viewer: Option<u64>,
    ) -> PlanTree {
        let all_initiatives = if self.options.three_way_merge {
            let result = with_retry(&self.options.retry, "initiative list", || {
                self.source.all_initiatives()
            })
            .await;
            Some(Fetched::settle(result, "initiative list"))
        } else {
            None
        };

        let objectives = stream::iter(objectives)
            .map(|objective| self.enrich_objective(objective, all_initiatives.as_ref(), viewer))
            .buffered(self.concurrency())
            .collect::<Vec<_>>()
            .await;

        let tree = PlanTree { objectives };
        tracing::debug!(
            objectives = tree.objectives.len(),
            complete = tree.is_complete(),
            "Enriched plan tree"
        );
        tree
    }

    /// Enrich the objectives selected by `plan`, applying its stored planner weights.
    pub async fn enrich_plan(
        &self,
        plan: &Plan,
        viewer: Option<u64>,
    ) -> Result<PlanTree, ApiError> {
        let catalog =
            with_retry(&self.options.retry, "objectives", || self.source.objectives()).await?;

        let mut selected = Vec::new();
        for id in plan.objective_ids() {
            match catalog.iter().find(|o| o.id == id) {
                Some(objective) => {
                    let mut objective = objective.clone();
                    if let Some(weight) = plan.planner_weight(id) {
                        objective.planner_weight = Some(weight);
                    }
                    selected.push(objective);
                }
                None => {
                    tracing::warn!(plan = plan.id, objective = id, "Selected objective not found")
                }
            }
        }

        Ok(self.enrich(selected, viewer).await)
    }

    async fn enrich_objective(
        &self,
        objective: StrategicObjective,
        all_initiatives: Option<&Fetched<StrategicInitiative>>,
        viewer: Option<u64>,
    ) -> ObjectiveNode {
        let id = objective.id;
        let retry = &self.options.retry;
        let mut failed = false;

        let direct = Fetched::settle(
            with_retry(retry, "initiatives by objective", || {
                self.source.initiatives_by_objective(id)
            })
            .await,
            &format!("initiatives of objective {}", id),
        );
        failed |= direct.failed;
        let mut sources = vec![direct.items];

        if let Some(all) = all_initiatives {
            failed |= all.failed;
            let programs = objective.program_ids();
            sources.push(
                all.items
                    .iter()
                    .filter(|i| i.belongs_to(id, &programs))
                    .cloned()
                    .collect(),
            );

            for program in programs {
                let by_program = Fetched::settle(
                    with_retry(retry, "initiatives by program", || {
                        self.source.initiatives_by_program(program)
                    })
                    .await,
                    &format!("initiatives of program {}", program),
                );
                failed |= by_program.failed;
                sources.push(by_program.items);
            }
        }

        let initiatives = visible_to(merge_unique(sources), viewer);
        let initiatives = stream::iter(initiatives)
            .map(|initiative| self.enrich_initiative(initiative, viewer))
            .buffered(self.concurrency())
            .collect::<Vec<_>>()
            .await;

        ObjectiveNode {
            effective_weight: objective.effective_weight(),
            objective,
            initiatives,
            incomplete: failed,
        }
    }

    async fn enrich_initiative(
        &self,
        initiative: StrategicInitiative,
        viewer: Option<u64>,
    ) -> InitiativeNode {
        let id = initiative.id;
        let retry = &self.options.retry;
        let (measures, activities) = tokio::join!(
            with_retry(retry, "performance measures", || self.source.measures_by_initiative(id)),
            with_retry(retry, "main activities", || self.source.activities_by_initiative(id)),
        );
        let measures = Fetched::settle(measures, &format!("measures of initiative {}", id));
        let activities = Fetched::settle(activities, &format!("activities of initiative {}", id));
        let visible_activities = visible_to(activities.items, viewer);

        let (details, details_failed) = if self.options.detail_activities {
            self.enrich_details(&visible_activities, viewer).await
        } else {
            (Vec::new(), false)
        };

        InitiativeNode {
            initiative,
            measures: visible_to(measures.items, viewer),
            activities: visible_activities,
            details,
            incomplete: measures.failed || activities.failed || details_failed,
        }
    }

    /// Detail activities of `activities` in activity order, and whether any fetch failed.
    async fn enrich_details(
        &self,
        activities: &[MainActivity],
        viewer: Option<u64>,
    ) -> (Vec<DetailActivity>, bool) {
        let retry = &self.options.retry;
        let fetched = stream::iter(activities.iter().map(|a| a.id))
            .map(|id| async move {
                let result = with_retry(retry, "detail activities", || {
                    self.source.detail_activities_by_main_activity(id)
                })
                .await;
                Fetched::settle(result, &format!("detail activities of activity {}", id))
            })
            .buffered(self.concurrency())
            .collect::<Vec<_>>()
            .await;

        let failed = fetched.iter().any(|f| f.failed);
        let details = fetched.into_iter().flat_map(|f| f.items).collect();
        (visible_to(details, viewer), failed)
    }
}

/// Concatenate and drop repeated ids; the first occurrence wins and order is kept.
pub fn merge_unique(sources: Vec<Vec<StrategicInitiative>>) -> Vec<StrategicInitiative> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .flatten()
        .filter(|i| seen.insert(i.id))
        .collect()
}

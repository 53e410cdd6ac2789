// Enriched plan hierarchy

use serde::Serialize;

use crate::models::{
    DetailActivity, ItemSelection, MainActivity, PerformanceMeasure, StrategicInitiative,
    StrategicObjective,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitiativeNode {
    pub initiative: StrategicInitiative,
    pub measures: Vec<PerformanceMeasure>,
    pub activities: Vec<MainActivity>,
    /// Detail activities of every activity above, in activity order.
    pub details: Vec<DetailActivity>,
    /// Set when a child fetch failed and the lists above may be partial.
    pub incomplete: bool,
}

impl InitiativeNode {
    pub fn details_of(&self, activity: u64) -> impl Iterator<Item = &DetailActivity> {
        self.details
            .iter()
            .filter(move |d| d.main_activity == Some(activity))
    }

    fn restrict(&self, selection: &ItemSelection) -> Self {
        let activities: Vec<MainActivity> = self
            .activities
            .iter()
            .filter(|a| selection.activities.contains(a.id))
            .cloned()
            .collect();
        let details = self
            .details
            .iter()
            .filter(|d| {
                selection.details.contains(d.id)
                    && d.main_activity
                        .is_some_and(|parent| activities.iter().any(|a| a.id == parent))
            })
            .cloned()
            .collect();
        Self {
            initiative: self.initiative.clone(),
            measures: self
                .measures
                .iter()
                .filter(|m| selection.measures.contains(m.id))
                .cloned()
                .collect(),
            activities,
            details,
            incomplete: self.incomplete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveNode {
    pub objective: StrategicObjective,
    pub effective_weight: f64,
    pub initiatives: Vec<InitiativeNode>,
    pub incomplete: bool,
}

impl ObjectiveNode {
    pub fn is_complete(&self) -> bool {
        !self.incomplete && self.initiatives.iter().all(|i| !i.incomplete)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanTree {
    pub objectives: Vec<ObjectiveNode>,
}

impl PlanTree {
    pub fn is_complete(&self) -> bool {
        self.objectives.iter().all(ObjectiveNode::is_complete)
    }

    pub fn activities(&self) -> impl Iterator<Item = &MainActivity> {
        self.objectives
            .iter()
            .flat_map(|o| &o.initiatives)
            .flat_map(|i| &i.activities)
    }

    pub fn total_weight(&self) -> f64 {
        self.objectives.iter().map(|o| o.effective_weight).sum()
    }

    /// The part of this tree a Team/Desk plan carries. Children of a dropped
    /// node are dropped with it.
    pub fn restrict(&self, selection: &ItemSelection) -> PlanTree {
        let objectives = self
            .objectives
            .iter()
            .filter(|o| selection.objectives.contains(o.objective.id))
            .map(|o| ObjectiveNode {
                objective: o.objective.clone(),
                effective_weight: o.effective_weight,
                initiatives: o
                    .initiatives
                    .iter()
                    .filter(|i| selection.initiatives.contains(i.initiative.id))
                    .map(|i| i.restrict(selection))
                    .collect(),
                incomplete: o.incomplete,
            })
            .collect();
        PlanTree { objectives }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, Targets};

    fn objective(id: u64) -> StrategicObjective {
        StrategicObjective {
            id,
            title: format!("Objective {}", id),
            description: None,
            weight: 50.0,
            planner_weight: None,
            is_default: true,
            programs: Vec::new(),
            initiatives: Vec::new(),
        }
    }

    fn activity(id: u64) -> MainActivity {
        MainActivity {
            id,
            name: format!("Activity {}", id),
            weight: 50.0,
            targets: Targets::default(),
            selected_months: Vec::new(),
            selected_quarters: Vec::new(),
            initiative: Some(1),
            organization: None,
            organization_name: None,
            is_default: true,
            budget: None,
        }
    }

    fn detail(id: u64, parent: u64) -> DetailActivity {
        DetailActivity {
            id,
            name: format!("Detail {}", id),
            weight: 50.0,
            targets: Targets::default(),
            selected_months: Vec::new(),
            selected_quarters: Vec::new(),
            main_activity: Some(parent),
            organization: None,
            organization_name: None,
            is_default: true,
        }
    }

    fn tree() -> PlanTree {
        let node = InitiativeNode {
            initiative: StrategicInitiative {
                id: 1,
                name: "Initiative 1".to_string(),
                weight: 100.0,
                strategic_objective: Some(1),
                program: None,
                organization: None,
                organization_name: None,
                is_default: true,
                initiative_feed: None,
            },
            measures: Vec::new(),
            activities: vec![activity(10), activity(11)],
            details: vec![detail(100, 10), detail(101, 10), detail(110, 11)],
            incomplete: false,
        };
        PlanTree {
            objectives: vec![
                ObjectiveNode {
                    objective: objective(1),
                    effective_weight: 60.0,
                    initiatives: vec![node],
                    incomplete: false,
                },
                ObjectiveNode {
                    objective: objective(2),
                    effective_weight: 40.0,
                    initiatives: Vec::new(),
                    incomplete: false,
                },
            ],
        }
    }

    #[test]
    fn test_details_of_activity() {
        let tree = tree();
        let node = &tree.objectives[0].initiatives[0];
        let ids: Vec<u64> = node.details_of(10).map(|d| d.id).collect();
        assert_eq!(ids, vec![100, 101]);
        assert_eq!(node.details_of(12).count(), 0);
    }

    #[test]
    fn test_restrict_keeps_selected_items() {
        let selection = ItemSelection {
            objectives: Level::of(&[1]),
            activities: Level::of(&[10]),
            details: Level::of(&[101, 110]),
            ..ItemSelection::default()
        };
        let restricted = tree().restrict(&selection);

        assert_eq!(restricted.objectives.len(), 1);
        let node = &restricted.objectives[0].initiatives[0];
        let activities: Vec<u64> = node.activities.iter().map(|a| a.id).collect();
        assert_eq!(activities, vec![10]);
        // 110 is selected but its activity is not
        let details: Vec<u64> = node.details.iter().map(|d| d.id).collect();
        assert_eq!(details, vec![101]);
    }

    #[test]
    fn test_restrict_with_empty_selection_keeps_everything() {
        let tree = tree();
        assert_eq!(tree.restrict(&ItemSelection::default()), tree);
    }
}

// Cost reference catalogs loaded once per costing session

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, PlanningClient};
use crate::models::{
    Accommodation, ActivityCostingAssumption, ActivityType, AirTransport, LandTransport, Location,
    ParticipantCost, PerDiem, PrintingCost, ProcurementItem, SessionCost, SupervisorCost,
};

use super::CostingError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub locations: Vec<Location>,
    pub per_diems: Vec<PerDiem>,
    pub accommodations: Vec<Accommodation>,
    pub participant_costs: Vec<ParticipantCost>,
    pub session_costs: Vec<SessionCost>,
    pub land_transports: Vec<LandTransport>,
    pub air_transports: Vec<AirTransport>,
    pub printing_costs: Vec<PrintingCost>,
    pub supervisor_costs: Vec<SupervisorCost>,
    pub procurement_items: Vec<ProcurementItem>,
    #[serde(default)]
    pub costing_assumptions: Vec<ActivityCostingAssumption>,
    /// Catalogs that failed to load and were replaced by a fallback.
    #[serde(default)]
    pub degraded: Vec<String>,
}

/// Locations offered when the catalog cannot be fetched.
pub fn fallback_locations() -> Vec<Location> {
    [
        (1, "Addis Ababa", "Addis Ababa"),
        (2, "Adama", "Oromia"),
        (3, "Bahir Dar", "Amhara"),
        (4, "Hawassa", "Sidama"),
        (5, "Mekelle", "Tigray"),
    ]
    .into_iter()
    .map(|(id, name, region)| Location {
        id,
        name: name.to_string(),
        region: region.to_string(),
        is_hardship_area: false,
    })
    .collect()
}

fn settle<T>(name: &str, result: Result<Vec<T>, ApiError>, degraded: &mut Vec<String>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Failed to load {} catalog, continuing without it: {}", name, e);
            degraded.push(name.to_string());
            Vec::new()
        }
    }
}

/// An empty location catalog is replaced by the fixed set and recorded as degraded.
fn with_fallback_locations(locations: Vec<Location>, degraded: &mut Vec<String>) -> Vec<Location> {
    if !locations.is_empty() {
        return locations;
    }
    if !degraded.iter().any(|d| d == "locations") {
        tracing::warn!("Location catalog is empty, using the fallback locations");
        degraded.push("locations".to_string());
    }
    fallback_locations()
}

impl ReferenceTables {
    /// Fetch every catalog concurrently. A failed catalog degrades to an empty
    /// list (locations to a small fixed set) and is named in `degraded`.
    pub async fn load(client: &PlanningClient) -> Self {
        let locations = client.locations();
        let per_diems = client.per_diems();
        let accommodations = client.accommodations();
        let participant_costs = client.participant_costs();
        let session_costs = client.session_costs();
        let land_transports = client.land_transports();
        let air_transports = client.air_transports();
        let printing_costs = client.printing_costs();
        let supervisor_costs = client.supervisor_costs();
        let procurement_items = client.procurement_items();
        let costing_assumptions = client.activity_costing_assumptions();

        let (
            locations,
            per_diems,
            accommodations,
            participant_costs,
            session_costs,
            land_transports,
            air_transports,
            printing_costs,
            supervisor_costs,
            procurement_items,
            costing_assumptions,
        ) = tokio::join!(
            locations.get_all(),
            per_diems.get_all(),
            accommodations.get_all(),
            participant_costs.get_all(),
            session_costs.get_all(),
            land_transports.get_all(),
            air_transports.get_all(),
            printing_costs.get_all(),
            supervisor_costs.get_all(),
            procurement_items.get_all(),
            costing_assumptions.get_all(),
        );

        let mut degraded = Vec::new();
        let locations = settle("locations", locations, &mut degraded);
        let locations = with_fallback_locations(locations, &mut degraded);

        let tables = Self {
            locations,
            per_diems: settle("per-diems", per_diems, &mut degraded),
            accommodations: settle("accommodations", accommodations, &mut degraded),
            participant_costs: settle("participant-costs", participant_costs, &mut degraded),
            session_costs: settle("session-costs", session_costs, &mut degraded),
            land_transports: settle("land-transports", land_transports, &mut degraded),
            air_transports: settle("air-transports", air_transports, &mut degraded),
            printing_costs: settle("printing-costs", printing_costs, &mut degraded),
            supervisor_costs: settle("supervisor-costs", supervisor_costs, &mut degraded),
            procurement_items: settle("procurement-items", procurement_items, &mut degraded),
            costing_assumptions: settle(
                "activity-costing-assumptions",
                costing_assumptions,
                &mut degraded,
            ),
            degraded,
        };

        tracing::debug!(
            locations = tables.locations.len(),
            degraded = tables.degraded.len(),
            "Loaded costing reference tables"
        );
        tables
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn location(&self, id: u64) -> Result<&Location, CostingError> {
        self.locations
            .iter()
            .find(|l| l.id == id)
            .ok_or(CostingError::UnknownLocation(id))
    }

    /// Daily per-diem plus hardship allowance at `location`.
    pub fn daily_per_diem(&self, location: u64) -> Result<f64, CostingError> {
        let place = self.location(location)?;
        self.per_diems
            .iter()
            .find(|p| p.location == Some(location))
            .map(|p| p.amount + p.hardship_allowance_amount)
            .ok_or_else(|| CostingError::MissingRate {
                kind: "per diem",
                location: place.name.clone(),
            })
    }

    pub fn accommodation_price(
        &self,
        location: u64,
        service_type: &str,
    ) -> Result<f64, CostingError> {
        let place = self.location(location)?;
        self.accommodations
            .iter()
            .find(|a| {
                a.location == Some(location) && a.service_type.eq_ignore_ascii_case(service_type)
            })
            .map(|a| a.price)
            .ok_or_else(|| CostingError::MissingRate {
                kind: "accommodation",
                location: place.name.clone(),
            })
    }

    pub fn participant_cost(&self, cost_type: &str) -> Result<f64, CostingError> {
        self.participant_costs
            .iter()
            .find(|c| c.cost_type.eq_ignore_ascii_case(cost_type))
            .map(|c| c.price)
            .ok_or_else(|| CostingError::UnknownCatalogItem {
                kind: "participant cost",
                name: cost_type.to_string(),
            })
    }

    pub fn session_cost(&self, cost_type: &str) -> Result<f64, CostingError> {
        self.session_costs
            .iter()
            .find(|c| c.cost_type.eq_ignore_ascii_case(cost_type))
            .map(|c| c.price)
            .ok_or_else(|| CostingError::UnknownCatalogItem {
                kind: "session cost",
                name: cost_type.to_string(),
            })
    }

    pub fn printing_price(&self, document_type: &str) -> Result<f64, CostingError> {
        self.printing_costs
            .iter()
            .find(|c| c.document_type.eq_ignore_ascii_case(document_type))
            .map(|c| c.price_per_page)
            .ok_or_else(|| CostingError::UnknownCatalogItem {
                kind: "printing document type",
                name: document_type.to_string(),
            })
    }

    pub fn supervisor_cost(&self, cost_type: &str) -> Result<f64, CostingError> {
        self.supervisor_costs
            .iter()
            .find(|c| c.cost_type.eq_ignore_ascii_case(cost_type))
            .map(|c| c.amount)
            .ok_or_else(|| CostingError::UnknownCatalogItem {
                kind: "supervisor cost",
                name: cost_type.to_string(),
            })
    }

    pub fn procurement_item(&self, id: u64) -> Result<&ProcurementItem, CostingError> {
        self.procurement_items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| CostingError::UnknownCatalogItem {
                kind: "procurement item",
                name: id.to_string(),
            })
    }

    /// Assumed amount for `cost_type` of an activity type. A row for `location`
    /// wins over a row that applies everywhere.
    pub fn costing_assumption(
        &self,
        activity_type: ActivityType,
        location: Option<u64>,
        cost_type: &str,
    ) -> Option<f64> {
        let mut matching = self.costing_assumptions.iter().filter(|a| {
            a.activity_type == activity_type && a.cost_type.eq_ignore_ascii_case(cost_type)
        });
        let specific = location.and_then(|loc| {
            matching
                .clone()
                .find(|a| a.location == Some(loc))
                .map(|a| a.amount)
        });
        specific.or_else(|| matching.find(|a| a.location.is_none()).map(|a| a.amount))
    }

    pub fn average_land_price(&self) -> Option<f64> {
        average(self.land_transports.iter().map(|t| t.price))
    }

    pub fn average_air_price(&self) -> Option<f64> {
        average(self.air_transports.iter().map(|t| t.price))
    }
}

fn average(prices: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = prices
        .filter(|p| *p > 0.0)
        .fold((0.0, 0usize), |(s, c), p| (s + p, c + 1));
    (count > 0).then(|| sum / count as f64)
}


#[cfg(test)]
mod tests {
    use super::fixtures::tables;
    use super::*;

    #[test]
    fn test_daily_per_diem_includes_hardship() {
        assert_eq!(tables().daily_per_diem(1).unwrap(), 600.0);
    }

    #[test]
    fn test_unknown_location() {
        assert_eq!(
            tables().daily_per_diem(99).unwrap_err(),
            CostingError::UnknownLocation(99)
        );
    }

    #[test]
    fn test_catalog_lookups_ignore_case() {
        let t = tables();
        assert_eq!(t.participant_cost("flash_disk").unwrap(), 300.0);
        assert_eq!(t.accommodation_price(2, "full_board").unwrap(), 900.0);
        assert!(t.session_cost("CATERING").is_err());
    }

    #[test]
    fn test_costing_assumption_prefers_location_row() {
        let t = tables();
        assert_eq!(
            t.costing_assumption(ActivityType::Training, Some(2), "stationary"),
            Some(90.0)
        );
        assert_eq!(
            t.costing_assumption(ActivityType::Training, Some(1), "STATIONARY"),
            Some(60.0)
        );
        assert_eq!(t.costing_assumption(ActivityType::Training, None, "STATIONARY"), Some(60.0));
        assert_eq!(t.costing_assumption(ActivityType::Workshop, None, "STATIONARY"), None);
    }

    #[test]
    fn test_average_prices() {
        let t = tables();
        assert_eq!(t.average_land_price(), Some(1000.0));
        assert_eq!(ReferenceTables::default().average_air_price(), None);
    }

    #[test]
    fn test_empty_location_catalog_is_degraded() {
        let mut degraded = Vec::new();
        let locations = with_fallback_locations(Vec::new(), &mut degraded);
        assert_eq!(locations.len(), 5);
        assert_eq!(degraded, vec!["locations".to_string()]);

        // A failed fetch is already recorded once
        let mut degraded = vec!["locations".to_string()];
        with_fallback_locations(Vec::new(), &mut degraded);
        assert_eq!(degraded.len(), 1);

        let mut degraded = Vec::new();
        let kept = with_fallback_locations(tables().locations, &mut degraded);
        assert_eq!(kept.len(), 2);
        assert!(degraded.is_empty());
    }

    #[test]
    fn test_fallback_locations_not_empty() {
        let locations = fallback_locations();
        assert_eq!(locations[0].name, "Addis Ababa");
        assert_eq!(locations.len(), 5);
    }
}

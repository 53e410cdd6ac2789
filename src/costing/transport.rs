// Transport section shared by the meeting and supervision tools

use serde::{Deserialize, Serialize};

use super::tables::ReferenceTables;
use super::{require_non_negative, CostingSettings, CostingError, TransportFallback};

/// One user-entered route: a catalog price paid once per travelling participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRoute {
    #[serde(default)]
    pub origin: Option<u64>,
    #[serde(default)]
    pub destination: Option<u64>,
    pub price: f64,
    pub participants: u32,
}

impl TransportRoute {
    pub fn cost(&self) -> f64 {
        self.price * f64::from(self.participants)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportPlan {
    pub required: bool,
    pub land_routes: Vec<TransportRoute>,
    pub air_routes: Vec<TransportRoute>,
    /// Head counts used by older forms that had no route list.
    pub legacy_land_participants: u32,
    pub legacy_air_participants: u32,
}

impl TransportPlan {
    fn has_routes(&self) -> bool {
        !self.land_routes.is_empty() || !self.air_routes.is_empty()
    }

    /// Travellers counted against the activity's participant total.
    pub fn participant_count(&self) -> u32 {
        if !self.required {
            return 0;
        }
        if self.has_routes() {
            self.land_routes
                .iter()
                .chain(&self.air_routes)
                .map(|r| r.participants)
                .sum()
        } else {
            self.legacy_land_participants + self.legacy_air_participants
        }
    }

    pub fn validate(&self) -> Result<(), CostingError> {
        for (i, route) in self.land_routes.iter().enumerate() {
            require_non_negative(route.price, &format!("land route {}", i + 1))?;
        }
        for (i, route) in self.air_routes.iter().enumerate() {
            require_non_negative(route.price, &format!("air route {}", i + 1))?;
        }
        Ok(())
    }

    pub fn cost(&self, tables: &ReferenceTables, settings: &CostingSettings) -> f64 {
        if !self.required {
            return 0.0;
        }
        if self.has_routes() {
            return self
                .land_routes
                .iter()
                .chain(&self.air_routes)
                .map(TransportRoute::cost)
                .sum();
        }

        let (land_rate, air_rate) = fallback_rates(tables, settings);
        f64::from(self.legacy_land_participants) * land_rate
            + f64::from(self.legacy_air_participants) * air_rate
    }
}

fn fallback_rates(tables: &ReferenceTables, settings: &CostingSettings) -> (f64, f64) {
    match settings.transport_fallback {
        TransportFallback::Fixed => (settings.land_fallback_rate, settings.air_fallback_rate),
        TransportFallback::CatalogAverage => (
            tables
                .average_land_price()
                .unwrap_or(settings.land_fallback_rate),
            tables
                .average_air_price()
                .unwrap_or(settings.air_fallback_rate),
        ),
    }
}

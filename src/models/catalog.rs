// Cost reference catalogs: flat priced rows keyed by location or cost type

use serde::{Deserialize, Serialize};

use super::budget::ActivityType;
use super::fields;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub is_hardship_area: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerDiem {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(deserialize_with = "fields::id_ref")]
    pub location: Option<u64>,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub amount: f64,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub hardship_allowance_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(deserialize_with = "fields::id_ref")]
    pub location: Option<u64>,
    pub service_type: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub price: f64,
}

/// Per-participant add-on (stationery, flash disk, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantCost {
    #[serde(default)]
    pub id: Option<u64>,
    pub cost_type: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub price: f64,
}

/// Per-session add-on (hall rental, refreshments, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCost {
    #[serde(default)]
    pub id: Option<u64>,
    pub cost_type: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandTransport {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(deserialize_with = "fields::id_ref")]
    pub origin: Option<u64>,
    #[serde(deserialize_with = "fields::id_ref")]
    pub destination: Option<u64>,
    #[serde(default)]
    pub trip_type: Option<String>,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirTransport {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(deserialize_with = "fields::id_ref")]
    pub origin: Option<u64>,
    #[serde(deserialize_with = "fields::id_ref")]
    pub destination: Option<u64>,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintingCost {
    #[serde(default)]
    pub id: Option<u64>,
    pub document_type: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub price_per_page: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorCost {
    #[serde(default)]
    pub id: Option<u64>,
    pub cost_type: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementItem {
    pub id: u64,
    #[serde(default)]
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub unit_price: f64,
}

/// Standard amount assumed for one cost type of an activity type, optionally
/// specific to a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCostingAssumption {
    #[serde(default)]
    pub id: Option<u64>,
    pub activity_type: ActivityType,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub location: Option<u64>,
    pub cost_type: String,
    #[serde(default, deserialize_with = "fields::decimal")]
    pub amount: f64,
    #[serde(default, deserialize_with = "fields::text")]
    pub description: Option<String>,
}

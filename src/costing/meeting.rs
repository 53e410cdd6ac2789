// Meeting / workshop / training costing

use serde::{Deserialize, Serialize};

use super::tables::ReferenceTables;
use super::transport::TransportPlan;
use super::{
    check_partners, require_budget, require_non_negative, require_positive, CostLine,
    CostingError, CostingSettings, CostingTool, Estimate, PartnerFunding, SessionScaling,
};
use crate::models::ActivityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMode {
    #[default]
    #[serde(alias = "per_diem")]
    PerDiem,
    Accommodation,
}

/// A venue other than the primary location, with its own head count and duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAttendance {
    pub location_id: u64,
    pub days: u32,
    pub participants: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingWorkshopInput {
    pub activity_type: ActivityType,
    pub description: String,
    pub location_id: u64,
    pub days: u32,
    pub participants: u32,
    pub number_of_sessions: u32,
    pub additional_locations: Vec<LocationAttendance>,
    pub cost_mode: CostMode,
    /// Accommodation service type, required in accommodation mode.
    pub accommodation_type: Option<String>,
    /// Selected participant cost types.
    pub participant_costs: Vec<String>,
    /// Selected session cost types.
    pub session_costs: Vec<String>,
    pub transport: TransportPlan,
    pub other_costs: f64,
    pub partners: Vec<PartnerFunding>,
    pub justification: Option<String>,
}

impl Default for MeetingWorkshopInput {
    fn default() -> Self {
        Self {
            activity_type: ActivityType::Meeting,
            description: String::new(),
            location_id: 0,
            days: 1,
            participants: 1,
            number_of_sessions: 1,
            additional_locations: Vec::new(),
            cost_mode: CostMode::default(),
            accommodation_type: None,
            participant_costs: Vec::new(),
            session_costs: Vec::new(),
            transport: TransportPlan::default(),
            other_costs: 0.0,
            partners: Vec::new(),
            justification: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub per_diem: f64,
    pub accommodation: f64,
    pub participant_costs: f64,
    pub session_costs: f64,
    pub transport: f64,
    pub other: f64,
    pub subtotal: f64,
    pub total: f64,
}

impl MeetingWorkshopInput {
    /// Primary venue followed by the additional ones.
    fn venues(&self) -> impl Iterator<Item = LocationAttendance> + '_ {
        std::iter::once(LocationAttendance {
            location_id: self.location_id,
            days: self.days,
            participants: self.participants,
        })
        .chain(self.additional_locations.iter().cloned())
    }

    pub fn total_participants(&self) -> u32 {
        self.venues().map(|v| v.participants).sum()
    }

    /// Compute every cost line from the inputs. Catalog lookups fail on
    /// unknown locations or cost types; nothing else is checked here.
    pub fn calculate(
        &self,
        tables: &ReferenceTables,
        settings: &CostingSettings,
    ) -> Result<CostBreakdown, CostingError> {
        let mut breakdown = CostBreakdown::default();

        for venue in self.venues() {
            let person_days = f64::from(venue.participants) * f64::from(venue.days);
            match self.cost_mode {
                CostMode::PerDiem => {
                    breakdown.per_diem += tables.daily_per_diem(venue.location_id)? * person_days;
                }
                CostMode::Accommodation => {
                    let service = self
                        .accommodation_type
                        .as_deref()
                        .ok_or(CostingError::MissingAccommodationType)?;
                    breakdown.accommodation +=
                        tables.accommodation_price(venue.location_id, service)? * person_days;
                }
            }
        }

        let participant_unit: f64 = self
            .participant_costs
            .iter()
            .map(|c| tables.participant_cost(c))
            .sum::<Result<f64, _>>()?;
        breakdown.participant_costs = participant_unit * f64::from(self.total_participants());

        let session_unit: f64 = self
            .session_costs
            .iter()
            .map(|c| tables.session_cost(c))
            .sum::<Result<f64, _>>()?;
        let sessions = f64::from(self.number_of_sessions);
        breakdown.session_costs = match settings.session_scaling {
            SessionScaling::SessionLines => session_unit * sessions,
            SessionScaling::WholeSubtotal => session_unit,
        };

        breakdown.transport = self.transport.cost(tables, settings);
        breakdown.other = self.other_costs;

        breakdown.subtotal = breakdown.per_diem
            + breakdown.accommodation
            + breakdown.participant_costs
            + breakdown.session_costs
            + breakdown.transport
            + breakdown.other;
        breakdown.total = match settings.session_scaling {
            SessionScaling::SessionLines => breakdown.subtotal,
            SessionScaling::WholeSubtotal => breakdown.subtotal * sessions,
        };
        Ok(breakdown)
    }

    /// Full pre-submission check; returns the breakdown that passed it.
    pub fn validate(
        &self,
        tables: &ReferenceTables,
        settings: &CostingSettings,
    ) -> Result<CostBreakdown, CostingError> {
        require_positive(self.days, "days")?;
        require_positive(self.participants, "participants")?;
        require_positive(self.number_of_sessions, "number of sessions")?;
        for (i, venue) in self.additional_locations.iter().enumerate() {
            require_positive(venue.days, &format!("days at additional location {}", i + 1))?;
            require_positive(
                venue.participants,
                &format!("participants at additional location {}", i + 1),
            )?;
        }
        require_non_negative(self.other_costs, "other costs")?;
        check_partners(&self.partners)?;
        self.transport.validate()?;

        let participants = self.total_participants();
        let travelling = self.transport.participant_count();
        if travelling > participants {
            return Err(CostingError::TransportExceedsParticipants {
                transport: travelling,
                participants,
            });
        }

        let breakdown = self.calculate(tables, settings)?;
        require_budget(breakdown.total)?;
        Ok(breakdown)
    }
}

impl CostingTool for MeetingWorkshopInput {
    fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    fn partners(&self) -> &[PartnerFunding] {
        &self.partners
    }

    fn estimate(
        &self,
        tables: &ReferenceTables,
        settings: &CostingSettings,
    ) -> Result<Estimate, CostingError> {
        let b = self.validate(tables, settings)?;
        let lines = [
            ("Per diem", b.per_diem),
            ("Accommodation", b.accommodation),
            ("Participant costs", b.participant_costs),
            ("Session costs", b.session_costs),
            ("Transport", b.transport),
            ("Other costs", b.other),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(label, amount)| CostLine {
            label: label.to_string(),
            amount,
        })
        .collect();

        Ok(Estimate {
            activity_type: self.activity_type,
            lines,
            total: b.total,
        })
    }
}

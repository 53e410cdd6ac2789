// Organizations and the viewer's membership in them

use serde::{Deserialize, Serialize};

use super::fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    Minister,
    StateMinister,
    ChiefExecutive,
    LeadExecutive,
    Executive,
    TeamLead,
    Desk,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: OrganizationType,
    #[serde(default, deserialize_with = "fields::id_ref")]
    pub parent: Option<u64>,
    #[serde(default)]
    pub vision: Option<String>,
    #[serde(default)]
    pub mission: Option<String>,
    #[serde(default, deserialize_with = "fields::list")]
    pub core_values: Vec<String>,
}

/// Role of a user inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Planner,
    Evaluator,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    #[serde(deserialize_with = "fields::id_ref", default)]
    pub organization: Option<u64>,
    #[serde(default, alias = "organizationName")]
    pub organization_name: Option<String>,
    pub role: Role,
}

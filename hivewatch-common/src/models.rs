//! Domain models shared between the server and the field client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// GPS coordinate pair as captured on the reporting device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gps {
    pub lat: f64,
    pub long: f64,
}

/// Where the colony was sighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    Buildings,
    Farm,
    #[serde(rename = "Tall Cliffs/Tree")]
    TallCliffsTree,
    Bridges,
    Other,
}

impl LocationType {
    /// Wire name as shown to users and stored in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Buildings => "Buildings",
            LocationType::Farm => "Farm",
            LocationType::TallCliffsTree => "Tall Cliffs/Tree",
            LocationType::Bridges => "Bridges",
            LocationType::Other => "Other",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buildings" => Ok(LocationType::Buildings),
            "Farm" => Ok(LocationType::Farm),
            "Tall Cliffs/Tree" => Ok(LocationType::TallCliffsTree),
            "Bridges" => Ok(LocationType::Bridges),
            "Other" => Ok(LocationType::Other),
            other => Err(crate::Error::Validation(format!(
                "Unknown location type: {}",
                other
            ))),
        }
    }
}

/// Who is filing the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Farmer,
    #[serde(rename = "General Public")]
    GeneralPublic,
    #[serde(rename = "Authorized Person")]
    AuthorizedPerson,
    Researcher,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Farmer => "Farmer",
            UserRole::GeneralPublic => "General Public",
            UserRole::AuthorizedPerson => "Authorized Person",
            UserRole::Researcher => "Researcher",
            UserRole::Student => "Student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Farmer" => Ok(UserRole::Farmer),
            "General Public" => Ok(UserRole::GeneralPublic),
            "Authorized Person" => Ok(UserRole::AuthorizedPerson),
            "Researcher" => Ok(UserRole::Researcher),
            "Student" => Ok(UserRole::Student),
            other => Err(crate::Error::Validation(format!(
                "Unknown user role: {}",
                other
            ))),
        }
    }
}

/// A persisted colony report
///
/// Created only after a positive verification verdict; immutable once
/// stored. The `image` field is the served path under `/uploads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub image: String,
    pub gps: Gps,
    pub location_type: LocationType,
    pub user_role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Report payload before the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub image: String,
    pub gps: Gps,
    pub location_type: LocationType,
    pub user_role: UserRole,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Regional emergency contact for hive incidents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub id: Uuid,
    pub region: String,
    pub contact_name: String,
    pub phone_number: String,
    pub designation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmergencyContact {
    /// Synthetic last-resort contact returned when the directory is
    /// empty. Fixed id and timestamp so repeated lookups yield an
    /// identical payload.
    pub fn national_default() -> Self {
        EmergencyContact {
            id: Uuid::nil(),
            region: "India".to_string(),
            contact_name: "National Bee Emergency Helpline".to_string(),
            phone_number: "+91 98765 43212".to_string(),
            designation: "Emergency Response Team".to_string(),
            city: None,
            state: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Create/update payload for the contact CRUD surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub region: String,
    pub contact_name: String,
    pub phone_number: String,
    pub designation: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// One ranked classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_type_wire_names_round_trip() {
        for loc in [
            LocationType::Buildings,
            LocationType::Farm,
            LocationType::TallCliffsTree,
            LocationType::Bridges,
            LocationType::Other,
        ] {
            assert_eq!(loc.as_str().parse::<LocationType>().unwrap(), loc);
        }
        assert!("Rooftop".parse::<LocationType>().is_err());
    }

    #[test]
    fn user_role_serializes_with_spaces() {
        let json = serde_json::to_string(&UserRole::GeneralPublic).unwrap();
        assert_eq!(json, "\"General Public\"");
        let json = serde_json::to_string(&LocationType::TallCliffsTree).unwrap();
        assert_eq!(json, "\"Tall Cliffs/Tree\"");
    }

    #[test]
    fn national_default_is_stable() {
        assert_eq!(
            EmergencyContact::national_default(),
            EmergencyContact::national_default()
        );
    }
}

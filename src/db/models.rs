use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub rank: i64,
    pub call_sign: String,
    pub user_id: i64,
}

/// Data needed to insert or update an agent (no auto-generated fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAgent {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub rank: i64,
    pub call_sign: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub region_id: i64,
    pub name: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRegion {
    pub name: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: i64,
    pub site_name: String,
    pub location: String,
    pub time_zone: String,
    pub region_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub site_name: String,
    pub location: String,
    pub time_zone: String,
    pub region_id: Option<i64>,
}

/// An agent's status report for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStatusReport {
    pub report_id: i64,
    pub agent_id: i64,
    pub location_id: i64,
    pub status: i64,
    /// RFC 3339, UTC, seconds precision.
    pub report_time: String,
    pub report_body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocationStatusReport {
    pub agent_id: i64,
    pub location_id: i64,
    pub status: i64,
    pub report_time: String,
    pub report_body: String,
}

/// An account that may own one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
}

//! Typed mirrors of the contest API's JSON payloads.
//!
//! The upstream server owns all persistence; everything here is a flat record
//! shaped exactly like its wire responses so the client stays a thin proxy.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Contest {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    pub start_date: String,
    pub end_date: String,
    pub created_on: Option<String>,
    pub last_updated: Option<String>,
    #[serde(default)]
    pub user_count: u32,
    #[serde(default)]
    pub beer_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Beer {
    pub id: u64,
    pub name: String,
    pub brewery: String,
    #[serde(default)]
    pub brewery_state: Option<String>,
    pub point_value: i32,
    #[serde(default)]
    pub checked_into: bool,
    #[serde(default)]
    pub challenger: Option<String>,
    #[serde(default)]
    pub challenge_point_value: Option<i32>,
    #[serde(default)]
    pub challenge_point_loss: Option<i32>,
    #[serde(default)]
    pub max_point_loss: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Brewery {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub untappd_url: Option<String>,
    pub point_value: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bonus {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hash_tags: Vec<String>,
    pub point_value: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Player {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub beer_count: u32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub rank: Option<u32>,
}

/// An external checkin awaiting an operator decision.
#[derive(Debug, Clone, Deserialize)]
pub struct Checkin {
    pub id: u64,
    pub player: String,
    pub checkin_url: String,
    pub beer: String,
    pub brewery: String,
    #[serde(deserialize_with = "mdy_date")]
    pub checkin_date: NaiveDate,
    #[serde(default)]
    pub possible_id: Option<u64>,
    #[serde(default)]
    pub possible_name: Option<String>,
}

/// One slice of the unvalidated checkin list.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinPage {
    pub page_count: u32,
    pub page_index: u32,
    pub page_size: u32,
    pub checkins: Vec<Checkin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeerLookup {
    pub name: String,
    pub brewery: String,
    pub untappd_url: String,
    #[serde(default)]
    pub brewery_url: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreweryLookup {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub untappd_url: String,
}

/// What the operator matched a checkin against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Beer(u64),
    Brewery(u64),
}

/// Validation decision submitted to `contests/{id}/checkins`.
///
/// The upstream endpoint reads `as_beer` or `as_brewery` exclusively and
/// treats a missing `bonuses` key differently from an empty list, so absent
/// fields must be omitted rather than serialized as null.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Decision {
    pub checkin: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_beer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_brewery: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonuses: Option<Vec<String>>,
}

impl Decision {
    pub fn new(checkin: u64, target: Option<Target>, bonuses: Vec<String>) -> Self {
        let (as_beer, as_brewery) = match target {
            Some(Target::Beer(id)) => (Some(id), None),
            Some(Target::Brewery(id)) => (None, Some(id)),
            None => (None, None),
        };
        Decision {
            checkin,
            as_beer,
            as_brewery,
            bonuses: if bonuses.is_empty() { None } else { Some(bonuses) },
        }
    }
}

/// Structured 400 body from the add-entity endpoints: field name to messages,
/// with `non_field_errors` as the form-wide bucket.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

impl FieldErrors {
    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn form_wide(&self) -> &[String] {
        self.field(NON_FIELD_ERRORS)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                first = false;
                if field == NON_FIELD_ERRORS {
                    write!(f, "{message}")?;
                } else {
                    write!(f, "{field}: {message}")?;
                }
            }
        }
        Ok(())
    }
}

// Checkin dates arrive as MM/DD/YYYY strings.
fn mdy_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, "%m/%d/%Y").map_err(serde::de::Error::custom)
}

//! # Add-entity forms
//!
//! One submit pattern shared by the beer, brewery, and bonus panels: collect
//! the panel's fields into a JSON body, POST it, and on rejection map the
//! structured error body back onto the fields. Point values are checked
//! client side so an obvious typo never leaves the console; everything else
//! is the upstream validator's call.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{FieldErrors, NON_FIELD_ERRORS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Beer,
    Brewery,
    Bonus,
}

/// Beer challenge block, only submitted when the challenge flag is set.
pub const CHALLENGE_FIELDS: [&str; 4] = [
    "challenger",
    "challenge_point_value",
    "challenge_point_loss",
    "max_point_loss",
];

pub const CHALLENGE_FLAG: &str = "is_challenge";

impl FormKind {
    pub fn from_plural(plural: &str) -> Option<FormKind> {
        match plural {
            "beers" => Some(FormKind::Beer),
            "breweries" => Some(FormKind::Brewery),
            "bonuses" => Some(FormKind::Bonus),
            _ => None,
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            FormKind::Beer => "beers",
            FormKind::Brewery => "breweries",
            FormKind::Bonus => "bonuses",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormKind::Beer => "beer",
            FormKind::Brewery => "brewery",
            FormKind::Bonus => "bonus",
        }
    }

    pub fn base_fields(self) -> &'static [&'static str] {
        match self {
            FormKind::Beer => &["name", "brewery", "brewery_url", "untappd_url", "point_value"],
            FormKind::Brewery => &["name", "location", "untappd_url", "point_value"],
            FormKind::Bonus => &["name", "description", "hash_tags", "point_value"],
        }
    }
}

fn is_point_field(name: &str) -> bool {
    name.ends_with("point_value") || name.ends_with("point_loss")
}

fn flag_set(fields: &HashMap<String, String>, name: &str) -> bool {
    matches!(
        fields.get(name).map(String::as_str),
        Some("on") | Some("true") | Some("1")
    )
}

/// Builds the JSON body for an add-entity submit from the posted fields.
/// Unparseable numbers come back as `Rejected` with the offending field
/// named, the same shape the upstream validator uses.
pub fn build_payload(kind: FormKind, fields: &HashMap<String, String>) -> Result<Value, AppError> {
    let mut names: Vec<&str> = kind.base_fields().to_vec();
    if kind == FormKind::Beer && flag_set(fields, CHALLENGE_FLAG) {
        names.extend(CHALLENGE_FIELDS);
    }

    let mut body = serde_json::Map::new();
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in names {
        let raw = fields.get(name).map(String::as_str).unwrap_or("").trim();
        let value = if name == "hash_tags" {
            json!(split_tags(raw))
        } else if is_point_field(name) {
            match raw.parse::<i64>() {
                Ok(points) => json!(points),
                Err(_) => {
                    errors
                        .entry(name.to_string())
                        .or_default()
                        .push(format!("'{raw}' is not a whole number"));
                    continue;
                }
            }
        } else {
            json!(raw)
        };
        body.insert(name.to_string(), value);
    }

    if errors.is_empty() {
        Ok(Value::Object(body))
    } else {
        Err(AppError::Rejected(FieldErrors(errors)))
    }
}

/// Comma-separated tag list, trimmed, empties dropped.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn success_message(kind: FormKind, body: &Value) -> String {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(kind.label());
    format!("Added {name}")
}

pub fn failure_message(kind: FormKind, fields: &HashMap<String, String>) -> String {
    let name = fields.get("name").map(String::as_str).unwrap_or("");
    if name.is_empty() {
        format!("Failed to add {}", kind.label())
    } else {
        format!("Failed to add {name}")
    }
}

/// Folds any client-side rejection into the same error surface the upstream
/// 400 bodies use so the renderer has one path.
pub fn as_field_errors(error: &AppError) -> FieldErrors {
    match error {
        AppError::Rejected(errors) => errors.clone(),
        other => FieldErrors(BTreeMap::from([(
            NON_FIELD_ERRORS.to_string(),
            vec![other.to_string()],
        )])),
    }
}

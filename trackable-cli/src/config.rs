//! Scenario loading and parsing
//!
//! A scenario describes a tree of chain members and the events to replay
//! through it:
//!
//! ```toml
//! [tracking]
//! key_prefix_to_remove = "app."
//!
//! [[members]]
//! name = "app"
//! class_properties = { "app.build" = 42 }
//!
//! [[members]]
//! name = "screen"
//! parent = "app"
//! properties = { "app.screen" = "home" }
//!
//! [[events]]
//! member = "screen"
//! name = "app.Events.Viewed"
//! properties = { "app.source" = "deeplink" }
//! ```
//!
//! Tables become nested property sets; arrays and datetimes are rejected.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use trackable::{PropertySet, TrackedProperty, TrackingConfig};

/// Errors in an otherwise well-formed scenario file
#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("Member '{0}' is declared more than once")]
    DuplicateMember(String),

    #[error("Member '{member}' names unknown parent '{parent}'")]
    UnknownParent { member: String, parent: String },

    #[error("Event '{event}' is tracked by unknown member '{member}'")]
    UnknownMember { event: String, member: String },

    #[error("Property '{key}' has unsupported {kind} value")]
    UnsupportedValue { key: String, kind: &'static str },
}

/// A complete scenario (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub members: Vec<MemberConfig>,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemberConfig {
    pub name: String,
    pub parent: Option<String>,
    #[serde(default)]
    pub properties: toml::Table,
    pub class_properties: Option<toml::Table>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventConfig {
    pub member: String,
    pub name: String,
    #[serde(default)]
    pub properties: toml::Table,
}

impl Scenario {
    /// Check member names and references
    pub fn validate(&self) -> std::result::Result<(), ScenarioError> {
        let mut names = HashSet::new();
        for member in &self.members {
            if !names.insert(member.name.as_str()) {
                return Err(ScenarioError::DuplicateMember(member.name.clone()));
            }
        }

        for member in &self.members {
            if let Some(parent) = &member.parent {
                if !names.contains(parent.as_str()) {
                    return Err(ScenarioError::UnknownParent {
                        member: member.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for event in &self.events {
            if !names.contains(event.member.as_str()) {
                return Err(ScenarioError::UnknownMember {
                    event: event.name.clone(),
                    member: event.member.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Convert a TOML table into a property set
///
/// Keys are used verbatim as property key paths; nested tables become nested
/// property sets.
pub fn to_property_set(table: &toml::Table) -> std::result::Result<PropertySet, ScenarioError> {
    let mut set = PropertySet::new();
    for (key, value) in table {
        let property = match value {
            toml::Value::Boolean(v) => TrackedProperty::from_raw(key.as_str(), *v),
            toml::Value::Integer(v) => TrackedProperty::from_raw(key.as_str(), *v),
            toml::Value::Float(v) => TrackedProperty::from_raw(key.as_str(), *v),
            toml::Value::String(v) => TrackedProperty::from_raw(key.as_str(), v.as_str()),
            toml::Value::Table(nested) => TrackedProperty::from_raw(key.as_str(), to_property_set(nested)?),
            toml::Value::Array(_) => return Err(unsupported(key, "array")),
            toml::Value::Datetime(_) => return Err(unsupported(key, "datetime")),
        };
        set.insert(property);
    }
    Ok(set)
}

fn unsupported(key: &str, kind: &'static str) -> ScenarioError {
    ScenarioError::UnsupportedValue {
        key: key.to_string(),
        kind,
    }
}

/// Load a scenario from a TOML file
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {:?}", path))?;

    let scenario: Scenario = toml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario file: {:?}", path))?;

    scenario
        .validate()
        .with_context(|| format!("Invalid scenario: {:?}", path))?;

    Ok(scenario)
}

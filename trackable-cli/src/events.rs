//! Event replay
//!
//! Tracks every scenario event, in order, from the member that declares it.

use crate::config::{to_property_set, Scenario, ScenarioError};
use crate::state::Members;
use trackable::{NamedEvent, TrackableExt};

/// Replay all scenario events; returns the number tracked
pub fn replay(scenario: &Scenario, members: &Members) -> Result<usize, ScenarioError> {
    for event in &scenario.events {
        let member = members.get(&event.member).ok_or_else(|| ScenarioError::UnknownMember {
            event: event.name.clone(),
            member: event.member.clone(),
        })?;
        let properties = to_property_set(&event.properties)?;

        log::debug!("Tracking {} from '{}'", event.name, member.name);
        member.track(&NamedEvent::new(event.name.as_str()), properties);
    }

    Ok(scenario.events.len())
}

//! Scenario members and their chain links
//!
//! Every scenario member becomes a live object registered in the global
//! responsibility chain. Members are released together, after which a
//! cleanup sweep evicts their entries.

use crate::config::{to_property_set, Scenario, ScenarioError};
use std::collections::HashMap;
use std::sync::Arc;
use trackable::{ChainLink, ChainMember, ParentLink, ResponsibilityChain, Trackable};

/// A scenario object taking part in the chain
#[derive(Debug)]
pub struct Member {
    pub name: String,
}

impl Trackable for Member {}

/// All live members of a scenario, by name
#[derive(Debug)]
pub struct Members {
    members: HashMap<String, Arc<Member>>,
}

impl Members {
    /// Create the members of a validated scenario and register their links
    pub fn build(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let members: HashMap<String, Arc<Member>> = scenario
            .members
            .iter()
            .map(|config| {
                let member = Arc::new(Member {
                    name: config.name.clone(),
                });
                (config.name.clone(), member)
            })
            .collect();

        let table = ResponsibilityChain::global();
        for config in &scenario.members {
            let instance_properties = to_property_set(&config.properties)?;
            let class_properties = config
                .class_properties
                .as_ref()
                .map(to_property_set)
                .transpose()?;

            let parent = match &config.parent {
                Some(parent_name) => {
                    let parent = members.get(parent_name).ok_or_else(|| ScenarioError::UnknownParent {
                        member: config.name.clone(),
                        parent: parent_name.clone(),
                    })?;
                    Some(ParentLink::member(parent.chain_identity(), parent.liveness()))
                }
                None => None,
            };

            let provider = move || class_properties.clone();
            let link = match parent {
                Some(parent) => ChainLink::chainer(instance_properties, provider, Some(parent)),
                None => ChainLink::tracker(instance_properties, provider),
            };

            let member = &members[&config.name];
            log::debug!("Registering member '{}' as {:?}", member.name, link);
            table.register(member.chain_identity(), member.liveness(), link);
        }

        Ok(Self { members })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Member>> {
        self.members.get(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Drop every member and sweep the table
    ///
    /// Returns the number of evicted chain entries.
    pub fn release(self) -> usize {
        drop(self.members);
        ResponsibilityChain::global().cleanup()
    }
}

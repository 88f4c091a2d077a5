//! Chain links: the nodes of the responsibility chain
//!
//! A [`ChainLink::Tracker`] terminates the chain and hands the event to the
//! sink. A [`ChainLink::Chainer`] folds its own properties into the event and
//! forwards it to its parent. Both carry instance properties and a class
//! property provider that is evaluated on every `track` call.
//!
//! Precedence, lowest to highest: root ancestor, intermediate ancestors, leaf
//! class properties, leaf instance properties, call-site properties.

use crate::key::Event;
use crate::property::PropertySet;
use crate::table::{Liveness, ObjectIdentity, ResponsibilityChain};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

/// Deferred provider of type-level properties
pub type ClassProperties = Arc<dyn Fn() -> Option<PropertySet> + Send + Sync>;

/// Non-owning reference from a chainer to its parent
#[derive(Clone)]
pub enum ParentLink {
    /// A link kept alive elsewhere
    Link(Weak<ChainLink>),
    /// A registered chain member, looked up in the global table on every walk
    Member {
        identity: ObjectIdentity,
        liveness: Liveness,
    },
}

impl ParentLink {
    /// Reference a link without keeping it alive
    pub fn link(link: &Arc<ChainLink>) -> Self {
        ParentLink::Link(Arc::downgrade(link))
    }

    /// Reference a chain member by identity
    pub fn member(identity: ObjectIdentity, liveness: Liveness) -> Self {
        ParentLink::Member { identity, liveness }
    }

    /// Current parent link, if the parent still exists
    pub fn resolve(&self) -> Option<Arc<ChainLink>> {
        match self {
            ParentLink::Link(weak) => weak.upgrade(),
            // A dead owner's identity may already belong to someone else
            ParentLink::Member { identity, liveness } if liveness.is_alive() => {
                ResponsibilityChain::global().lookup(*identity)
            }
            ParentLink::Member { .. } => None,
        }
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentLink::Link(weak) => f
                .debug_struct("Link")
                .field("alive", &(weak.strong_count() > 0))
                .finish(),
            ParentLink::Member { identity, liveness } => f
                .debug_struct("Member")
                .field("identity", identity)
                .field("alive", &liveness.is_alive())
                .finish(),
        }
    }
}

/// A node of the responsibility chain
#[derive(Clone)]
pub enum ChainLink {
    /// Terminal link: emits events to the sink
    Tracker {
        instance_properties: PropertySet,
        class_properties: ClassProperties,
    },
    /// Internal link: forwards events to its parent
    Chainer {
        instance_properties: PropertySet,
        class_properties: ClassProperties,
        parent: Option<ParentLink>,
    },
}

impl ChainLink {
    /// Create a terminal link
    pub fn tracker<F>(instance_properties: PropertySet, class_properties: F) -> Self
    where
        F: Fn() -> Option<PropertySet> + Send + Sync + 'static,
    {
        ChainLink::Tracker {
            instance_properties,
            class_properties: Arc::new(class_properties),
        }
    }

    /// Create a forwarding link
    pub fn chainer<F>(
        instance_properties: PropertySet,
        class_properties: F,
        parent: Option<ParentLink>,
    ) -> Self
    where
        F: Fn() -> Option<PropertySet> + Send + Sync + 'static,
    {
        ChainLink::Chainer {
            instance_properties,
            class_properties: Arc::new(class_properties),
            parent,
        }
    }

    pub fn instance_properties(&self) -> &PropertySet {
        match self {
            ChainLink::Tracker { instance_properties, .. }
            | ChainLink::Chainer { instance_properties, .. } => instance_properties,
        }
    }

    /// Evaluate the class property provider
    pub fn class_properties(&self) -> Option<PropertySet> {
        match self {
            ChainLink::Tracker { class_properties, .. }
            | ChainLink::Chainer { class_properties, .. } => class_properties(),
        }
    }

    /// Parent of a chainer, if it still resolves
    pub fn parent(&self) -> Option<Arc<ChainLink>> {
        match self {
            ChainLink::Tracker { .. } => None,
            ChainLink::Chainer { parent, .. } => parent.as_ref().and_then(ParentLink::resolve),
        }
    }

    /// Fold this link's properties under `tracked_properties`
    ///
    /// Class properties are the base, instance properties override them, and
    /// the incoming properties override both.
    pub fn merge(&self, tracked_properties: &PropertySet) -> PropertySet {
        let mut accumulator = match self.class_properties() {
            Some(class_properties) => class_properties + self.instance_properties(),
            None => self.instance_properties().clone(),
        };
        accumulator.update_values_from(tracked_properties);
        accumulator
    }

    /// Track an event through this link and its ancestors
    ///
    /// The sink is called exactly once: at the first tracker, or at the first
    /// chainer whose parent no longer resolves.
    pub fn track<E: Event + ?Sized>(&self, event: &E, tracked_properties: PropertySet) {
        let mut accumulator = self.merge(&tracked_properties);
        let mut visited = HashSet::from([self as *const ChainLink]);
        let mut next = self.parent();

        while let Some(link) = next {
            if !visited.insert(Arc::as_ptr(&link)) {
                log::warn!(
                    "Responsibility chain for {} loops back on itself, emitting early",
                    event.description()
                );
                break;
            }
            accumulator = link.merge(&accumulator);
            next = link.parent();
        }

        if let ChainLink::Chainer { parent: Some(_), .. } = self {
            log::trace!("Chain walked {} link(s)", visited.len());
        }

        crate::sink::emit(&event.description(), &accumulator);
    }
}

impl fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainLink::Tracker { instance_properties, .. } => f
                .debug_struct("Tracker")
                .field("instance_properties", instance_properties)
                .finish_non_exhaustive(),
            ChainLink::Chainer {
                instance_properties,
                parent,
                ..
            } => f
                .debug_struct("Chainer")
                .field("instance_properties", instance_properties)
                .field("parent", parent)
                .finish_non_exhaustive(),
        }
    }
}

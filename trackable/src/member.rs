//! Chain membership for application objects
//!
//! Application types implement [`Trackable`] and live in an `Arc`. Through
//! [`TrackableExt`] an object joins the responsibility chain (optionally below
//! a parent) and tracks events that pick up its ancestors' properties.
//!
//! ```
//! use std::sync::Arc;
//! use trackable::{properties, PropertySet, Trackable, TrackableExt};
//!
//! trackable::keys! { enum Keys { Screen = "screen", Version = "version" } }
//! trackable::events! { enum Events { Viewed } }
//!
//! struct App;
//! impl Trackable for App {
//!     fn class_properties() -> Option<PropertySet> {
//!         Some(properties![Keys::Version => "1.0"])
//!     }
//! }
//!
//! struct Screen;
//! impl Trackable for Screen {}
//!
//! let app = Arc::new(App);
//! let screen = Arc::new(Screen);
//! screen.setup_tracking_chain(properties![Keys::Screen => "home"], Some(&app));
//!
//! // Emitted with both `screen` and `version`
//! screen.track(&Events::Viewed, PropertySet::new());
//! ```

use crate::chain::{ChainLink, ParentLink};
use crate::key::Event;
use crate::property::PropertySet;
use crate::table::{Liveness, ObjectIdentity, ResponsibilityChain};
use std::sync::Arc;

/// An application type that contributes tracking properties
pub trait Trackable: Send + Sync + 'static {
    /// Type-level properties, evaluated on every track call
    fn class_properties() -> Option<PropertySet>
    where
        Self: Sized,
    {
        None
    }
}

/// Object-safe view of a chain member, used to name parents
pub trait ChainMember {
    fn chain_identity(&self) -> ObjectIdentity;

    fn liveness(&self) -> Liveness;

    /// Link registered for a member that never set up its own chain
    fn default_link(&self) -> ChainLink;
}

impl<T: Trackable> ChainMember for Arc<T> {
    fn chain_identity(&self) -> ObjectIdentity {
        ObjectIdentity::of(self)
    }

    fn liveness(&self) -> Liveness {
        Liveness::of(self)
    }

    fn default_link(&self) -> ChainLink {
        ChainLink::tracker(PropertySet::new(), T::class_properties)
    }
}

/// Chain operations for trackable objects held in an `Arc`
pub trait TrackableExt: ChainMember {
    /// Join the global responsibility chain
    ///
    /// With a parent, events are forwarded to it; a parent that has not set
    /// up its own chain is registered with its default link. Without a
    /// parent the object becomes a chain root. Replaces any previous setup.
    fn setup_tracking_chain(&self, instance_properties: PropertySet, parent: Option<&dyn ChainMember>);

    /// Track an event through this object's chain
    fn track<E: Event + ?Sized>(&self, event: &E, tracked_properties: PropertySet);
}

impl<T: Trackable> TrackableExt for Arc<T> {
    fn setup_tracking_chain(&self, instance_properties: PropertySet, parent: Option<&dyn ChainMember>) {
        let table = ResponsibilityChain::global();

        let link = match parent {
            Some(parent) => {
                let parent_identity = parent.chain_identity();
                // A parent set up concurrently keeps its own link
                table.register_if_absent(parent_identity, parent.liveness(), parent.default_link());
                ChainLink::chainer(
                    instance_properties,
                    T::class_properties,
                    Some(ParentLink::member(parent_identity, parent.liveness())),
                )
            }
            None => ChainLink::tracker(instance_properties, T::class_properties),
        };

        table.register(self.chain_identity(), self.liveness(), link);
    }

    fn track<E: Event + ?Sized>(&self, event: &E, tracked_properties: PropertySet) {
        match ResponsibilityChain::global().lookup(self.chain_identity()) {
            Some(link) => link.track(event, tracked_properties),
            None => self.default_link().track(event, tracked_properties),
        }
    }
}

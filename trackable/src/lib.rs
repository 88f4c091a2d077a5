//! Trackable Library
//!
//! A property-propagation engine for structured event tracking. Objects in an
//! application tree contribute named, typed properties; an event tracked
//! anywhere in the tree picks up the properties of every ancestor without
//! re-declaring them.
//!
//! # Architecture
//!
//! - [`Key`] / [`Event`]: symbols rendering a dotted path from their
//!   declaration nesting (`keys!`, `events!`)
//! - [`TrackedProperty`] / [`PropertySet`]: key + payload, unique by key, with
//!   merge (`update_values_from`, `+`, `+=`) and flattening
//! - [`ChainLink`]: `Tracker` emits, `Chainer` forwards to its parent
//! - [`ResponsibilityChain`]: process-wide identity -> link table with
//!   explicit cleanup of entries whose owner is gone
//! - [`sink`]: the replaceable callback that receives every emitted event
//!
//! The library does NOT:
//! - Deliver events anywhere (that is the sink's job)
//! - Batch, retry or persist events
//! - Evict table entries automatically when an owner is dropped
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use trackable::{properties, sink, Dictionary, PropertySet, ResponsibilityChain, Trackable, TrackableExt};
//!
//! trackable::keys! { enum Keys { Screen = "screen", Build = "build" } }
//! trackable::events! { enum Events { Viewed } }
//!
//! struct App;
//! impl Trackable for App {}
//! struct Screen;
//! impl Trackable for Screen {}
//!
//! sink::set_sink(|name: &str, properties: &Dictionary| {
//!     println!("{} {:?}", name, properties);
//! });
//!
//! let app = Arc::new(App);
//! app.setup_tracking_chain(properties![Keys::Build => 42], None);
//!
//! let screen = Arc::new(Screen);
//! screen.setup_tracking_chain(properties![Keys::Screen => "home"], Some(&app));
//! screen.track(&Events::Viewed, PropertySet::new());
//!
//! // Periodically sweep entries of dropped objects
//! drop(screen);
//! ResponsibilityChain::global().cleanup();
//! ```

// Public modules
pub mod chain;
pub mod config;
pub mod key;
pub mod member;
pub mod property;
pub mod sink;
pub mod table;
pub mod types;

// Re-export main types for convenience
pub use chain::{ChainLink, ClassProperties, ParentLink};
pub use config::{configure, current_config, TrackingConfig};
pub use key::{Event, Key, NamedEvent, NamedKey};
pub use member::{ChainMember, Trackable, TrackableExt};
pub use property::{PropertySet, TrackedProperty};
pub use table::{Liveness, ObjectIdentity, ResponsibilityChain};
pub use types::{Dictionary, Payload};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh table has nothing to sweep
        let table = ResponsibilityChain::new();
        assert!(table.is_empty());
        assert_eq!(table.cleanup(), 0);
        assert!(!VERSION.is_empty());
    }
}

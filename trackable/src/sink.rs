//! The event sink
//!
//! The sink is the single boundary to an analytics backend: a process-wide,
//! replaceable callback receiving the event name and the flattened property
//! map. Delivery, batching and retries are the sink's business.
//!
//! The default sink logs each event at debug level.

use crate::config;
use crate::property::PropertySet;
use crate::types::Dictionary;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Sink callback: event name and flattened properties
pub type Sink = Arc<dyn Fn(&str, &Dictionary) + Send + Sync>;

static SINK: LazyLock<RwLock<Sink>> = LazyLock::new(|| RwLock::new(default_sink()));

fn default_sink() -> Sink {
    Arc::new(|event_name: &str, properties: &Dictionary| {
        log::debug!("Tracked {} with {} propert(ies)", event_name, properties.len());
    })
}

/// Replace the process-wide sink
pub fn set_sink<F>(sink: F)
where
    F: Fn(&str, &Dictionary) + Send + Sync + 'static,
{
    *SINK.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(sink);
}

/// Restore the default, logging sink
pub fn reset_sink() {
    *SINK.write().unwrap_or_else(PoisonError::into_inner) = default_sink();
}

fn current_sink() -> Sink {
    Arc::clone(&SINK.read().unwrap_or_else(PoisonError::into_inner))
}

/// Flatten `properties` and hand the event to the sink
///
/// Configured prefixes are stripped here. The sink runs without any engine
/// lock held, so it may track or register itself.
pub(crate) fn emit(event_name: &str, properties: &PropertySet) {
    let config = config::current_config();
    let event_name = config.strip_event_prefix(event_name);
    let dictionary = config.strip_key_prefixes(properties.dictionary_representation());

    log::trace!("Emitting {} {:?}", event_name, dictionary);
    let sink = current_sink();
    sink(event_name, &dictionary);
}

//! Tracking configuration
//!
//! Prefix removal applied when an event leaves the engine. Rendered key paths
//! carry the full declaration nesting; backends usually want shorter names,
//! so a configured prefix is stripped from the event name and from every
//! flattened property key right before the sink is called.

use crate::types::Dictionary;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Process-wide tracking configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Prefix removed from every flattened property key
    #[serde(default)]
    pub key_prefix_to_remove: Option<String>,

    /// Prefix removed from event names
    #[serde(default)]
    pub event_prefix_to_remove: Option<String>,
}

impl TrackingConfig {
    /// Create a configuration that strips nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the key prefix to remove
    pub fn with_key_prefix_to_remove(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix_to_remove = Some(prefix.into());
        self
    }

    /// Builder method: set the event prefix to remove
    pub fn with_event_prefix_to_remove(mut self, prefix: impl Into<String>) -> Self {
        self.event_prefix_to_remove = Some(prefix.into());
        self
    }

    /// Event name with the configured prefix removed
    pub fn strip_event_prefix<'a>(&self, event_name: &'a str) -> &'a str {
        strip(self.event_prefix_to_remove.as_deref(), event_name)
    }

    /// Flattened properties with the configured key prefix removed
    ///
    /// If stripping makes `<prefix><key>` collide with an existing `<key>`,
    /// the entry that never carried the prefix is kept.
    pub fn strip_key_prefixes(&self, dictionary: Dictionary) -> Dictionary {
        let prefix = match self.key_prefix_to_remove.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => return dictionary,
        };

        let mut stripped = Dictionary::new();
        for (key, value) in dictionary {
            let short = strip(Some(prefix), &key);
            let was_prefixed = short.len() != key.len();
            match stripped.entry(short.to_string()) {
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
                Entry::Occupied(mut entry) => {
                    log::debug!("Key {} collides with {} after prefix removal", key, entry.key());
                    if !was_prefixed {
                        entry.insert(value);
                    }
                }
            }
        }
        stripped
    }
}

// Never strips a name down to nothing
fn strip<'a>(prefix: Option<&str>, name: &'a str) -> &'a str {
    match prefix.and_then(|prefix| name.strip_prefix(prefix)) {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

static CONFIG: LazyLock<RwLock<Arc<TrackingConfig>>> = LazyLock::new(Default::default);

/// Install the process-wide configuration
pub fn configure(config: TrackingConfig) {
    log::debug!("Tracking configuration updated: {:?}", config);
    *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
}

/// The configuration currently in effect
pub fn current_config() -> Arc<TrackingConfig> {
    Arc::clone(&CONFIG.read().unwrap_or_else(PoisonError::into_inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Payload;

    #[test]
    fn test_config_builder() {
        let config = TrackingConfig::new()
            .with_key_prefix_to_remove("app.")
            .with_event_prefix_to_remove("app.Events.");

        assert_eq!(config.key_prefix_to_remove.as_deref(), Some("app."));
        assert_eq!(config.event_prefix_to_remove.as_deref(), Some("app.Events."));
    }

    #[test]
    fn test_strip_logic() {
        let config = TrackingConfig::new().with_event_prefix_to_remove("app.");

        assert_eq!(config.strip_event_prefix("app.Launched"), "Launched");
        assert_eq!(config.strip_event_prefix("other.Launched"), "other.Launched");
        assert_eq!(config.strip_event_prefix("app."), "app."); // Would be empty
    }

    #[test]
    fn test_no_prefixes() {
        let config = TrackingConfig::new();
        let mut dictionary = Dictionary::new();
        dictionary.insert("app.key".to_string(), Payload::Integer(1));

        assert_eq!(config.strip_event_prefix("app.Launched"), "app.Launched");
        assert_eq!(config.strip_key_prefixes(dictionary.clone()), dictionary);
    }

    #[test]
    fn test_config_deserialization() {
        let config: TrackingConfig =
            serde_json::from_str(r#"{ "key_prefix_to_remove": "app." }"#).unwrap();
        assert_eq!(config.key_prefix_to_remove.as_deref(), Some("app."));
        assert_eq!(config.event_prefix_to_remove, None);
    }

    #[test]
    fn test_strip_key_collision_keeps_unprefixed() {
        let config = TrackingConfig::new().with_key_prefix_to_remove("app.");
        let mut dictionary = Dictionary::new();
        dictionary.insert("app.x".to_string(), Payload::Integer(1));
        dictionary.insert("x".to_string(), Payload::Integer(2));

        let stripped = config.strip_key_prefixes(dictionary);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped["x"], Payload::Integer(2));

        // Unprefixed key sorting before the prefixed one
        let config = TrackingConfig::new().with_key_prefix_to_remove("zz.");
        let mut dictionary = Dictionary::new();
        dictionary.insert("a".to_string(), Payload::Integer(2));
        dictionary.insert("zz.a".to_string(), Payload::Integer(1));

        let stripped = config.strip_key_prefixes(dictionary);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped["a"], Payload::Integer(2));
    }
}

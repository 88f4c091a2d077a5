//! Tracked properties and property-set algebra
//!
//! A [`TrackedProperty`] is a rendered key plus a [`Payload`]. Equality and
//! hashing look at the key only, so a [`PropertySet`] behaves like a map keyed
//! by key path: inserting a property whose key is already present replaces the
//! old value.
//!
//! Every place that combines properties uses the same precedence rule: the
//! right-hand (later, closer) operand wins.

use crate::key::Key;
use crate::types::{Dictionary, Payload};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Borrow;
use std::collections::btree_map::Entry;
use std::collections::hash_set;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign};

/// A single named value
#[derive(Debug, Clone)]
pub struct TrackedProperty {
    key: String,
    value: Payload,
}

impl TrackedProperty {
    /// Associate a value with a key
    pub fn new<K: Key + ?Sized>(key: &K, value: impl Into<Payload>) -> Self {
        Self::from_raw(key.description(), value)
    }

    /// Associate a value with an already rendered key path
    pub fn from_raw(key: impl Into<String>, value: impl Into<Payload>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Rendered key path
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Payload {
        &self.value
    }

    /// Split into key and value
    pub fn into_parts(self) -> (String, Payload) {
        (self.key, self.value)
    }
}

impl PartialEq for TrackedProperty {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TrackedProperty {}

impl Hash for TrackedProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

// Hashes exactly like the key, so sets can be queried by `&str`.
impl Borrow<str> for TrackedProperty {
    fn borrow(&self) -> &str {
        &self.key
    }
}

/// A set of tracked properties, unique by key
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    properties: HashSet<TrackedProperty>,
}

impl PropertySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Value stored under a key path
    pub fn get(&self, key: &str) -> Option<&Payload> {
        self.properties.get(key).map(TrackedProperty::value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains(key)
    }

    /// Insert a property, replacing any property with the same key
    ///
    /// Returns the replaced property, if any.
    pub fn insert(&mut self, property: TrackedProperty) -> Option<TrackedProperty> {
        self.properties.replace(property)
    }

    pub fn remove(&mut self, key: &str) -> Option<TrackedProperty> {
        self.properties.take(key)
    }

    pub fn iter(&self) -> hash_set::Iter<'_, TrackedProperty> {
        self.properties.iter()
    }

    /// Merge `other` into `self`, with `other`'s values taking precedence
    ///
    /// Afterwards `self` holds one property per distinct key of both sets.
    pub fn update_values_from(&mut self, other: &PropertySet) {
        for property in other.iter() {
            self.insert(property.clone());
        }
    }

    /// Flatten into a key path -> value map
    ///
    /// Scalar properties appear under their own key. A nested set contributes
    /// its flattened entries under `<outer key>.<relative inner key>` and no
    /// entry for the outer key itself (see [`relative_key`]).
    ///
    /// When a flattened path collides with a scalar key, the scalar wins.
    /// Between nested sets, the one whose key sorts first wins.
    pub fn dictionary_representation(&self) -> Dictionary {
        let mut dictionary = Dictionary::new();
        let mut nested_sets: Vec<(&str, &PropertySet)> = Vec::new();

        for property in self.iter() {
            match property.value() {
                Payload::Properties(nested) => nested_sets.push((property.key(), nested)),
                value => {
                    dictionary.insert(property.key().to_string(), value.clone());
                }
            }
        }

        nested_sets.sort_unstable_by_key(|(key, _)| *key);
        for (outer_key, nested) in nested_sets {
            for (inner_key, value) in nested.dictionary_representation() {
                let path = format!("{}.{}", outer_key, relative_key(outer_key, &inner_key));
                match dictionary.entry(path) {
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                    Entry::Occupied(entry) => {
                        log::trace!("Flattened {} shadowed by an existing entry", entry.key());
                    }
                }
            }
        }
        dictionary
    }
}

/// Portion of `inner` to append below `outer` when flattening
///
/// Segments `inner` shares with the namespace `outer` was declared in are
/// dropped. An unrelated inner key keeps only its last segment. The last
/// segment of `inner` is always kept.
pub fn relative_key<'a>(outer: &str, inner: &'a str) -> &'a str {
    let outer_segments: Vec<&str> = outer.split('.').collect();
    let namespace = &outer_segments[..outer_segments.len() - 1];

    let inner_segments: Vec<&str> = inner.split('.').collect();
    let shared = namespace
        .iter()
        .zip(&inner_segments[..inner_segments.len() - 1])
        .take_while(|(a, b)| a == b)
        .count();

    let skip = if shared == 0 {
        inner_segments.len() - 1
    } else {
        shared
    };

    // Byte offset of the first kept segment
    let offset: usize = inner_segments[..skip].iter().map(|s| s.len() + 1).sum();
    &inner[offset..]
}

impl PartialEq for PropertySet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|p| other.get(p.key()).is_some_and(|value| value == p.value()))
    }
}

impl FromIterator<TrackedProperty> for PropertySet {
    /// Later properties replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = TrackedProperty>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<TrackedProperty> for PropertySet {
    fn extend<I: IntoIterator<Item = TrackedProperty>>(&mut self, iter: I) {
        for property in iter {
            self.insert(property);
        }
    }
}

impl IntoIterator for PropertySet {
    type Item = TrackedProperty;
    type IntoIter = hash_set::IntoIter<TrackedProperty>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = &'a TrackedProperty;
    type IntoIter = hash_set::Iter<'a, TrackedProperty>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

impl Add for PropertySet {
    type Output = PropertySet;

    fn add(mut self, rhs: PropertySet) -> PropertySet {
        self += rhs;
        self
    }
}

impl Add<&PropertySet> for PropertySet {
    type Output = PropertySet;

    fn add(mut self, rhs: &PropertySet) -> PropertySet {
        self += rhs;
        self
    }
}

impl AddAssign for PropertySet {
    fn add_assign(&mut self, rhs: PropertySet) {
        self.extend(rhs);
    }
}

impl AddAssign<&PropertySet> for PropertySet {
    fn add_assign(&mut self, rhs: &PropertySet) {
        self.update_values_from(rhs);
    }
}

impl Serialize for PropertySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for property in self.iter() {
            map.serialize_entry(property.key(), property.value())?;
        }
        map.end()
    }
}

/// Build a [`PropertySet`] from `key => value` pairs
///
/// ```
/// trackable::keys! {
///     enum Keys { Name = "name", Depth = "depth" }
/// }
///
/// let set = trackable::properties![Keys::Name => "home", Keys::Depth => 2];
/// assert_eq!(set.len(), 2);
/// ```
#[macro_export]
macro_rules! properties {
    () => {
        $crate::PropertySet::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut set = $crate::PropertySet::new();
        $( set.insert($crate::TrackedProperty::new(&$key, $value)); )+
        set
    }};
}

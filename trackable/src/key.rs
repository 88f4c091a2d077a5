//! Hierarchical keys and event identifiers
//!
//! A key renders itself as a dotted path reflecting where it was declared:
//! the enclosing module path (without the crate name), the enum name, and
//! the symbol. `keys!` and `events!` declare string-backed enums that
//! implement these traits.
//!
//! ```
//! mod screen {
//!     trackable::keys! {
//!         pub enum Keys {
//!             Name = "name",
//!             Depth,
//!         }
//!     }
//! }
//!
//! use trackable::Key;
//! assert!(screen::Keys::Name.description().ends_with("screen.Keys.name"));
//! assert!(screen::Keys::Depth.description().ends_with("screen.Keys.Depth"));
//! ```

use crate::property::TrackedProperty;
use crate::types::Payload;
use std::fmt;

/// A symbol that names a tracked property
pub trait Key {
    /// Stable dotted path of this key
    fn description(&self) -> String;

    /// Associate a value with this key
    fn with(&self, value: impl Into<Payload>) -> TrackedProperty
    where
        Self: Sized,
    {
        TrackedProperty::new(self, value)
    }
}

/// A symbol that names an emitted event
///
/// The rendered path is passed verbatim to the sink as the event name.
pub trait Event: Key {}

/// Render a declaration path
///
/// `module_path` is a `::`-separated module path as produced by
/// `module_path!()`; its first segment (the crate) is dropped.
pub fn render(module_path: &str, type_name: &str, symbol: &str) -> String {
    module_path
        .split("::")
        .skip(1)
        .chain([type_name, symbol])
        .collect::<Vec<_>>()
        .join(".")
}

/// A key whose path is supplied at runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedKey(pub String);

impl NamedKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

impl Key for NamedKey {
    fn description(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An event whose name is supplied at runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedEvent(pub String);

impl NamedEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Key for NamedEvent {
    fn description(&self) -> String {
        self.0.clone()
    }
}

impl Event for NamedEvent {}

impl fmt::Display for NamedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declare one or more key enums
///
/// Each variant renders as its identifier, or as the string literal given
/// after `=`.
#[macro_export]
macro_rules! keys {
    (@symbol $variant:ident) => {
        stringify!($variant)
    };
    (@symbol $variant:ident $raw:literal) => {
        $raw
    };
    ($(
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident $(= $raw:literal)? ),* $(,)?
        }
    )+) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $variant ),*
        }

        impl $crate::Key for $name {
            fn description(&self) -> String {
                let symbol = match self {
                    $( $name::$variant => $crate::keys!(@symbol $variant $($raw)?) ),*
                };
                $crate::key::render(module_path!(), stringify!($name), symbol)
            }
        }
    )+};
}

/// Declare one or more event enums
///
/// Same syntax as [`keys!`]; the enums also implement [`Event`].
#[macro_export]
macro_rules! events {
    ($(
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident $(= $raw:literal)? ),* $(,)?
        }
    )+) => {$(
        $crate::keys! {
            $(#[$meta])*
            $vis enum $name {
                $( $variant $(= $raw)? ),*
            }
        }

        impl $crate::Event for $name {}
    )+};
}

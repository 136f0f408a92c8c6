//! Configuration values as seen by a provider.
//!
//! A value can be absent (`Null`), known, or not yet known because it
//! depends on something the host has not applied yet.

use serde::{Deserialize, Deserializer};

/// A configuration value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigValue<T> {
    /// Not set
    #[default]
    Null,
    /// Set, but only known after apply
    Unknown,
    /// Set to a concrete value
    Known(T),
}

impl<T> ConfigValue<T> {
    /// Whether the value is not set.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value is not known yet.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// The concrete value, if any.
    #[must_use]
    pub const fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for ConfigValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}

impl<'de, T> Deserialize<'de> for ConfigValue<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

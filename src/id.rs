use compact_str::CompactString;
use serde::{Deserialize, Deserializer};

/// Opaque key for one polling subscription.
///
/// Ids come from a process-local counter in the registry, so two `add` calls
/// for the same target always yield distinct subscriptions.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId {
    value: u64,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub struct SpotId {
    /// Numeric or slug identifier as Gowalla returns it
    value: CompactString,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct CheckinId {
    value: u64,
}

impl SubscriptionId {
    pub fn new(id: u64) -> Self {
        Self { value: id }
    }
}

impl SpotId {
    pub fn new<S: Into<CompactString>>(id: S) -> Self {
        Self { value: id.into() }
    }
}

impl CheckinId {
    pub fn new(id: u64) -> Self {
        Self { value: id }
    }
}

impl<'de> Deserialize<'de> for SpotId {
    fn deserialize<D>(deserializer: D) -> Result<SpotId, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct SpotIdVisitor;

        impl<'de> Visitor<'de> for SpotIdVisitor {
            type Value = SpotId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a spot ID")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(SpotId::new(value))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(SpotId::new(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(SpotId::new(value.to_string()))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(SpotId::new(value.to_string()))
            }
        }

        deserializer.deserialize_any(SpotIdVisitor)
    }
}

impl<'de> Deserialize<'de> for CheckinId {
    fn deserialize<D>(deserializer: D) -> Result<CheckinId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(CheckinId::new(id))
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for SpotId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for CheckinId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

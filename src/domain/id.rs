//! Sequential task identifiers
//!
//! Ids are plain non-negative integers issued in strictly increasing
//! order by an [`IdGenerator`]. The in-memory store owns a generator
//! directly; the JSON file store keeps the next unused value in its
//! counter document instead and never instantiates one.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unique identifier for a task
///
/// Ordered by integer value. Ids are never reused while the owning store
/// is alive; `clear()` on a store restarts the sequence at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(u64);

impl Id {
    /// Creates an id from a raw integer value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw integer value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Ids serialize as bare integers; the counter document in the JSON store
// wraps one as `{"id": <int>}` on its own.
impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = Id;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-negative integer id")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Id, E>
            where
                E: de::Error,
            {
                Ok(Id(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Id, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(Id)
                    .map_err(|_| E::custom(format!("id must be non-negative, got {value}")))
            }
        }

        deserializer.deserialize_u64(IdVisitor)
    }
}

/// Issues ids in strictly increasing order
///
/// Holds the next unused id and advances by one on every call. No upper
/// bound, no wraparound handling. Not safe for concurrent use without
/// external synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGenerator {
    current: Id,
}

impl IdGenerator {
    /// Creates a generator whose first issued id will be `start`
    pub const fn new(start: Id) -> Self {
        Self { current: start }
    }

    /// Returns the current id and advances to the next one
    pub fn next_id(&mut self) -> Id {
        let id = self.current;
        self.current = id.next();
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_call_returns_seed() {
        let mut ids = IdGenerator::new(Id::new(7));
        assert_eq!(ids.next_id(), Id::new(7));
    }

    #[test]
    fn generated_ids_strictly_increase() {
        let mut ids = IdGenerator::new(Id::new(0));
        let mut previous = ids.next_id();

        for _ in 0..999 {
            let id = ids.next_id();
            assert!(id > previous);
            previous = id;
        }
    }

    #[test]
    fn id_next_adds_one() {
        assert_eq!(Id::new(0).next(), Id::new(1));
        assert_eq!(Id::new(41).next(), Id::new(42));
    }

    #[test]
    fn ids_order_by_value() {
        assert!(Id::new(1) < Id::new(2));
        assert_eq!(Id::new(3), Id::new(3));
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_value(Id::new(12)).unwrap();
        assert_eq!(json, serde_json::json!(12));
    }

    #[test]
    fn deserializes_from_bare_integer() {
        let id: Id = serde_json::from_str("12").unwrap();
        assert_eq!(id, Id::new(12));
    }

    #[test]
    fn rejects_negative_value() {
        let result = serde_json::from_str::<Id>("-1");
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn nth_call_returns_seed_plus_n_minus_one(
            seed in 0u64..1_000_000,
            n in 1usize..500,
        ) {
            let mut ids = IdGenerator::new(Id::new(seed));
            let mut last = ids.next_id();
            for _ in 1..n {
                last = ids.next_id();
            }
            prop_assert_eq!(last, Id::new(seed + n as u64 - 1));
        }
    }
}

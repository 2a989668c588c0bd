//! Typed string keys.
//!
//! Store keys are opaque strings; the marker parameter keeps a machine id from
//! being passed where a product id is expected.

use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A store key tagged with the kind of thing it names.
pub struct TypedId<T>(String, PhantomData<fn() -> T>);

/// Marker for machine ids.
#[derive(Debug)]
pub enum Machine {}

/// Marker for product ids.
#[derive(Debug)]
pub enum Product {}

/// Marker for payment references.
#[derive(Debug)]
pub enum Transaction {}

/// One physical vending unit.
pub type MachineId = TypedId<Machine>;

/// A product key, unique within one machine.
pub type ProductId = TypedId<Product>;

/// External payment reference.
pub type TransactionId = TypedId<Transaction>;

impl<T> TypedId<T> {
    /// Wrap a raw key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into(), PhantomData)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        Self::new(self.0.clone())
    }
}

impl<T> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Borrow<str> for TypedId<T> {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<T> From<&str> for TypedId<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> From<String> for TypedId<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn serializes_as_plain_string() -> TestResult {
        let id = MachineId::new("VEND001");

        assert_eq!(serde_json::to_value(&id)?, json!("VEND001"));
        assert_eq!(serde_json::from_value::<MachineId>(json!("VEND001"))?, id);

        Ok(())
    }

    #[test]
    fn orders_by_value() {
        let mut ids = vec![ProductId::new("p2"), ProductId::new("p1")];
        ids.sort();

        assert_eq!(ids, vec![ProductId::new("p1"), ProductId::new("p2")]);
    }
}

//! Store paths and the persisted layout.

use std::fmt;

/// A slash-separated location in the remote store, without leading or
/// trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StorePath(String);

impl StorePath {
    /// Normalise `path`, dropping empty segments.
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalised = path
            .as_ref()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Self(normalised)
    }

    /// The root of the store.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Append one or more segments.
    #[must_use]
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        if self.0.is_empty() {
            return Self::new(segment);
        }

        Self::new(format!("{}/{}", self.0, segment.as_ref()))
    }

    /// The path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the store root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    #[must_use]
    pub fn contains(&self, other: &StorePath) -> bool {
        let mut theirs = other.segments();

        self.segments().all(|segment| theirs.next() == Some(segment))
    }

    /// Whether a change at `self` can alter the value observed at `other`.
    #[must_use]
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// `sessions`
    #[must_use]
    pub fn sessions() -> Self {
        Self::new("sessions")
    }

    /// `sessions/{code}`
    #[must_use]
    pub fn session(code: impl fmt::Display) -> Self {
        Self::sessions().child(code.to_string())
    }

    /// `machines`
    #[must_use]
    pub fn machines() -> Self {
        Self::new("machines")
    }

    /// `machines/{machine}/inventory`
    #[must_use]
    pub fn inventory(machine: impl fmt::Display) -> Self {
        Self::machines()
            .child(machine.to_string())
            .child("inventory")
    }

    /// `machines/{machine}/inventory/{product}`
    #[must_use]
    pub fn product(machine: impl fmt::Display, product: impl fmt::Display) -> Self {
        Self::inventory(machine).child(product.to_string())
    }

    /// `coupons/{code}`
    #[must_use]
    pub fn coupon(code: impl fmt::Display) -> Self {
        Self::new("coupons").child(code.to_string())
    }

    /// `transactions`
    #[must_use]
    pub fn transactions() -> Self {
        Self::new("transactions")
    }

    /// `transactions/{transaction}`
    #[must_use]
    pub fn transaction(transaction: impl fmt::Display) -> Self {
        Self::transactions().child(transaction.to_string())
    }

    /// `dispenseQueue/{code}`
    #[must_use]
    pub fn dispense(code: impl fmt::Display) -> Self {
        Self::new("dispenseQueue").child(code.to_string())
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalises_slashes() {
        assert_eq!(StorePath::new("/sessions//ABC123/").as_str(), "sessions/ABC123");
        assert!(StorePath::new("/").is_root());
    }

    #[test]
    fn layout_paths_match_persisted_layout() {
        assert_eq!(StorePath::session("ABC123").as_str(), "sessions/ABC123");
        assert_eq!(
            StorePath::product("VEND001", "p1").as_str(),
            "machines/VEND001/inventory/p1"
        );
        assert_eq!(StorePath::coupon("VND-AB12-CD34").as_str(), "coupons/VND-AB12-CD34");
        assert_eq!(StorePath::transaction("pay_1").as_str(), "transactions/pay_1");
        assert_eq!(StorePath::dispense("ABC123").as_str(), "dispenseQueue/ABC123");
    }

    #[test]
    fn containment_is_segment_wise() {
        let inventory = StorePath::inventory("VEND001");

        assert!(inventory.contains(&StorePath::product("VEND001", "p1")));
        assert!(StorePath::root().contains(&inventory));
        assert!(!StorePath::new("machines/VEND").contains(&inventory));
        assert!(StorePath::product("VEND001", "p1").overlaps(&inventory));
        assert!(!StorePath::sessions().overlaps(&inventory));
    }
}

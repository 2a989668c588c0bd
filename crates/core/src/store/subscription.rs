//! Change subscriptions.

use serde_json::Value;
use tokio::sync::watch;

use super::StorePath;

/// A live view of one store path.
///
/// The first call to [`Subscription::next`] yields the value current at the
/// time of subscribing; later calls wait for the next change. Dropping the
/// subscription (or calling [`Subscription::unsubscribe`]) detaches it from
/// the store.
#[derive(Debug)]
pub struct Subscription {
    path: StorePath,
    receiver: watch::Receiver<Option<Value>>,
    delivered_initial: bool,
}

impl Subscription {
    /// Wrap the receiving half of a store watch channel.
    #[must_use]
    pub fn new(path: StorePath, receiver: watch::Receiver<Option<Value>>) -> Self {
        Self {
            path,
            receiver,
            delivered_initial: false,
        }
    }

    /// The subscribed path.
    #[must_use]
    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Wait for the next full value at the path.
    ///
    /// Returns `None` once the store side has gone away. An inner `None` means
    /// there is no data at the path.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        if self.delivered_initial {
            self.receiver.changed().await.ok()?;
        } else {
            self.delivered_initial = true;
        }

        Some(self.receiver.borrow_and_update().clone())
    }

    /// The most recently delivered value, without waiting.
    #[must_use]
    pub fn current(&self) -> Option<Value> {
        self.receiver.borrow().clone()
    }

    /// Stop receiving changes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn first_next_yields_current_value() -> TestResult {
        let (_sender, receiver) = watch::channel(Some(json!({"stock": 3})));
        let mut subscription = Subscription::new(StorePath::new("a"), receiver);

        assert_eq!(subscription.next().await, Some(Some(json!({"stock": 3}))));

        Ok(())
    }

    #[tokio::test]
    async fn next_waits_for_changes_and_ends_with_sender() -> TestResult {
        let (sender, receiver) = watch::channel(None);
        let mut subscription = Subscription::new(StorePath::new("a"), receiver);

        assert_eq!(subscription.next().await, Some(None));

        sender.send(Some(json!(1)))?;
        assert_eq!(subscription.next().await, Some(Some(json!(1))));

        drop(sender);
        assert_eq!(subscription.next().await, None);

        Ok(())
    }
}

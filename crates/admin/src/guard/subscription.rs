//! Provider subscription held while a guarded subtree is mounted.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::identity::Principal;

/// Forwards principal changes to a callback until dropped.
///
/// Dropping the subscription aborts the watcher task, so no callback runs
/// after the guarded subtree is gone.
#[derive(Debug)]
pub struct GuardSubscription {
    task: JoinHandle<()>,
}

impl GuardSubscription {
    /// Watch `rx` and call `on_change` with every newly published principal.
    ///
    /// The value current at subscription time is not replayed.
    #[must_use]
    pub fn spawn<F>(mut rx: watch::Receiver<Option<Principal>>, mut on_change: F) -> Self
    where
        F: FnMut(Option<Principal>) + Send + 'static,
    {
        rx.mark_unchanged();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let principal = rx.borrow_and_update().clone();
                on_change(principal);
            }
        });
        Self { task }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for GuardSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::identity::PrincipalWatch;

    #[tokio::test]
    async fn test_forwards_changes_until_dropped() {
        let watch = PrincipalWatch::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subscription = {
            let seen = Arc::clone(&seen);
            GuardSubscription::spawn(watch.subscribe(), move |principal| {
                seen.lock().unwrap().push(principal.is_some());
            })
        };
        assert!(subscription.is_active());

        watch.publish(None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*seen.lock().unwrap(), vec![false]);

        drop(subscription);
        tokio::time::sleep(Duration::from_millis(10)).await;
        watch.publish(None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}

use std::{collections::HashMap, sync::RwLock};

use log::debug;
use tokio::sync::watch;

/// Per-user change notifications for the live task socket.
///
/// Each user with at least one open socket owns a `watch` channel carrying a
/// revision number. Mutations of the user's collection bump the revision;
/// subscribers wake up, re-read the collection and push a fresh snapshot.
/// Intermediate revisions may be skipped, only the latest one matters.
pub struct TaskFeed {
    channels: RwLock<HashMap<String, watch::Sender<u64>>>,
}

impl Default for TaskFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskFeed {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, uid: &str) -> watch::Receiver<u64> {
        if let Some(tx) = self.channels.read().unwrap().get(uid) {
            return tx.subscribe();
        }
        self.channels
            .write()
            .unwrap()
            .entry(uid.to_string())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }

    /// Marks the user's collection as changed.
    pub fn publish(&self, uid: &str) {
        if let Some(tx) = self.channels.read().unwrap().get(uid) {
            tx.send_modify(|revision| *revision += 1);
            debug!(
                "Task feed for {} at revision {}, {} subscriber(s)",
                uid,
                *tx.borrow(),
                tx.receiver_count()
            );
        }
    }

    pub fn revision(&self, uid: &str) -> u64 {
        self.channels
            .read()
            .unwrap()
            .get(uid)
            .map(|tx| *tx.borrow())
            .unwrap_or(0)
    }

    /// Drops channels nobody listens to any more; returns how many went away.
    pub fn prune(&self) -> usize {
        let mut channels = self.channels.write().unwrap();
        let before = channels.len();
        channels.retain(|_, tx| tx.receiver_count() > 0);
        before - channels.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.channels
            .read()
            .unwrap()
            .values()
            .map(|tx| tx.receiver_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_revisions() {
        let feed = TaskFeed::new();
        let mut rx = feed.subscribe("alice");
        assert_eq!(*rx.borrow(), 0);

        feed.publish("alice");
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
        assert_eq!(feed.revision("alice"), 1);
    }

    #[tokio::test]
    async fn publishing_for_another_user_does_not_wake_subscriber() {
        let feed = TaskFeed::new();
        let mut rx = feed.subscribe("alice");
        feed.publish("bob");

        let woke = tokio::time::timeout(Duration::from_millis(50), rx.changed()).await;
        assert!(woke.is_err());
        assert_eq!(feed.revision("bob"), 0);
    }

    #[test]
    fn prune_removes_channels_without_receivers() {
        let feed = TaskFeed::new();
        let kept = feed.subscribe("alice");
        let dropped = feed.subscribe("bob");
        let second = feed.subscribe("alice");
        assert_eq!(feed.subscriber_count(), 3);

        drop(dropped);
        assert_eq!(feed.prune(), 1);
        assert_eq!(feed.subscriber_count(), 2);
        drop((kept, second));
        assert_eq!(feed.prune(), 1);
        assert_eq!(feed.subscriber_count(), 0);
    }
}

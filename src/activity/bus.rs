//! Live fan-out of recorded activity to connected observers.

use futures::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::feed::FeedEntry;

/// Process-wide broadcast of enriched activity entries.
///
/// Delivery is at-most-once with no replay: an observer only sees entries
/// published while it is subscribed. All observers see entries in publish
/// order. Publishing never waits on observers.
#[derive(Clone)]
pub struct ActivityBus {
    sender: broadcast::Sender<FeedEntry>,
}

impl ActivityBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Push an entry to every current observer. Returns how many observers
    /// were connected at the time.
    pub fn publish(&self, entry: FeedEntry) -> usize {
        match self.sender.send(entry) {
            Ok(observers) => observers,
            Err(_) => {
                // Nobody listening is the normal idle state
                tracing::trace!("No activity observers connected");
                0
            }
        }
    }

    pub fn subscribe(&self) -> Observer {
        let observer = Observer {
            receiver: self.sender.subscribe(),
        };
        tracing::debug!(
            "Activity observer connected ({} total)",
            self.observer_count()
        );
        observer
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ActivityBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// One connected observer. Dropping it unsubscribes.
pub struct Observer {
    receiver: broadcast::Receiver<FeedEntry>,
}

impl Observer {
    /// Next published entry, or `None` once the bus is gone. A slow observer
    /// that fell behind skips what it missed and carries on.
    pub async fn next(&mut self) -> Option<FeedEntry> {
        loop {
            match self.receiver.recv().await {
                Ok(entry) => return Some(entry),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Activity observer lagged, skipped {} events", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = FeedEntry> + Send + 'static {
        futures::stream::unfold(self, |mut observer| async move {
            observer.next().await.map(|entry| (entry, observer))
        })
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        tracing::debug!("Activity observer disconnected");
    }
}

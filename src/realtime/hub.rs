use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::Stream;
use uuid::Uuid;

use crate::models::{Message, Notification};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    Notification,
    Message,
}

/// Something a connected user should see without re-fetching.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Push {
    Notification(Notification),
    Message(Message),
}

impl Push {
    pub fn kind(&self) -> PushKind {
        match self {
            Push::Notification(_) => PushKind::Notification,
            Push::Message(_) => PushKind::Message,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Push::Notification(_) => "notification",
            Push::Message(_) => "message",
        }
    }
}

type Channels = HashMap<Uuid, broadcast::Sender<Push>>;

/// Per-user fan-out for live connections.
///
/// Each user with at least one open stream has a broadcast channel. A channel
/// is created by the first [`Hub::subscribe`] and removed once its last
/// [`Subscription`] is dropped, so a disconnected client leaves nothing behind.
/// [`Hub::close`] ends every open stream at once.
#[derive(Clone)]
pub struct Hub {
    channels: Arc<RwLock<Channels>>,
    closed: Arc<AtomicBool>,
    capacity: usize,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            closed: Arc::new(AtomicBool::new(false)),
            capacity: capacity.max(1),
        }
    }

    /// Opens a stream for `user_id`. Once the hub is closed the returned
    /// subscription is already finished.
    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        let receiver = {
            let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
            if self.closed.load(Ordering::Acquire) {
                None
            } else {
                Some(
                    channels
                        .entry(user_id)
                        .or_insert_with(|| broadcast::channel(self.capacity).0)
                        .subscribe(),
                )
            }
        };
        if receiver.is_some() {
            tracing::debug!(%user_id, "Realtime subscriber connected");
        }

        Subscription {
            stream: receiver
                .map(|receiver| Box::pin(BroadcastStream::new(receiver)) as PushStream),
            hub: self.clone(),
            user_id,
        }
    }

    /// Ends every open stream and refuses new ones. Dropping the senders
    /// lets each receiver drain what it already holds and then finish.
    pub fn close(&self) {
        let released = {
            let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
            self.closed.store(true, Ordering::Release);
            let released = channels.len();
            channels.clear();
            released
        };
        tracing::info!(channels = released, "Realtime hub closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Sends `push` to every live stream of `user_id`. Returns how many
    /// streams received it; zero when the user is offline.
    pub fn publish(&self, user_id: Uuid, push: Push) -> usize {
        let sender = {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            channels.get(&user_id).cloned()
        };

        match sender {
            Some(sender) => match sender.send(push) {
                Ok(delivered) => delivered,
                Err(_) => {
                    self.prune(user_id);
                    0
                }
            },
            None => 0,
        }
    }

    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(&user_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn prune(&self, user_id: Uuid) {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if channels
            .get(&user_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&user_id);
            tracing::debug!(%user_id, "Realtime channel released");
        }
    }
}

type PushStream = Pin<Box<dyn Stream<Item = Result<Push, BroadcastStreamRecvError>> + Send>>;

/// One live connection's view of the hub. Dropping it unsubscribes.
pub struct Subscription {
    stream: Option<PushStream>,
    hub: Hub,
    user_id: Uuid,
}

impl Stream for Subscription {
    type Item = Result<Push, BroadcastStreamRecvError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().stream.as_mut() {
            Some(stream) => stream.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release the receiver before checking whether the channel is still used
        self.stream.take();
        self.hub.prune(self.user_id);
        tracing::debug!(user_id = %self.user_id, "Realtime subscriber disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;
    use chrono::Utc;
    use tokio_stream::StreamExt;

    fn notification(user_id: Uuid, content: &str) -> Push {
        Push::Notification(Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: NotificationType::NewEvent,
            content: content.to_string(),
            is_read: false,
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_push_reaches_only_its_user() {
        let hub = Hub::default();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut alice_stream = hub.subscribe(alice);
        let _bob_stream = hub.subscribe(bob);

        assert_eq!(hub.publish(alice, notification(alice, "for alice")), 1);

        match alice_stream.next().await {
            Some(Ok(Push::Notification(n))) => assert_eq!(n.content, "for alice"),
            other => panic!("unexpected item: {:?}", other),
        }
        assert_eq!(hub.subscriber_count(bob), 1);
    }

    #[tokio::test]
    async fn test_publish_to_offline_user_is_a_noop() {
        let hub = Hub::default();
        assert_eq!(hub.publish(Uuid::new_v4(), notification(Uuid::nil(), "x")), 0);
        assert_eq!(hub.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_last_subscription_releases_channel() {
        let hub = Hub::default();
        let user = Uuid::new_v4();
        let first = hub.subscribe(user);
        let second = hub.subscribe(user);
        assert_eq!(hub.subscriber_count(user), 2);

        drop(first);
        assert_eq!(hub.channel_count(), 1);
        assert_eq!(hub.subscriber_count(user), 1);

        drop(second);
        assert_eq!(hub.channel_count(), 0);
        assert_eq!(hub.publish(user, notification(user, "late")), 0);
    }

    #[tokio::test]
    async fn test_slow_consumer_sees_lag() {
        let hub = Hub::new(2);
        let user = Uuid::new_v4();
        let mut stream = hub.subscribe(user);
        for i in 0..5 {
            hub.publish(user, notification(user, &i.to_string()));
        }

        assert!(matches!(
            stream.next().await,
            Some(Err(BroadcastStreamRecvError::Lagged(_)))
        ));
        // The most recent items are still delivered after the lag marker
        assert!(matches!(stream.next().await, Some(Ok(_))));
    }

    #[tokio::test]
    async fn test_close_ends_open_streams() {
        let hub = Hub::default();
        let user = Uuid::new_v4();
        let mut first = hub.subscribe(user);
        let mut second = hub.subscribe(user);
        hub.publish(user, notification(user, "before close"));

        hub.close();

        // Already queued items are still delivered, then the stream ends
        assert!(matches!(first.next().await, Some(Ok(_))));
        assert!(first.next().await.is_none());
        assert!(matches!(second.next().await, Some(Ok(_))));
        assert!(second.next().await.is_none());
        assert_eq!(hub.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_hub_refuses_new_streams() {
        let hub = Hub::default();
        hub.close();
        assert!(hub.is_closed());

        let user = Uuid::new_v4();
        let mut late = hub.subscribe(user);
        assert!(late.next().await.is_none());
        assert_eq!(hub.channel_count(), 0);
        assert_eq!(hub.publish(user, notification(user, "nobody")), 0);
    }

    #[test]
    fn test_event_names() {
        let push = notification(Uuid::nil(), "x");
        assert_eq!(push.event_name(), "notification");
        assert_eq!(push.kind(), PushKind::Notification);
    }
}

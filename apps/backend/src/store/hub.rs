//! In-process fan-out of room events.

use std::pin::Pin;
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::store::RoomEvent;

const CHANNEL_CAPACITY: usize = 64;

/// One broadcast channel per room with at least one live subscriber.
#[derive(Default)]
pub struct RoomHub {
    rooms: DashMap<String, broadcast::Sender<RoomEvent>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn subscribe(&self, room_code: &str) -> RoomSubscription {
        let receiver = self
            .rooms
            .entry(room_code.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        RoomSubscription {
            room_code: room_code.to_string(),
            inner: BroadcastStream::new(receiver),
        }
    }

    /// Deliver `event` to every subscriber of the room. Channels whose
    /// subscribers have all gone are dropped.
    pub fn publish(&self, room_code: &str, event: RoomEvent) {
        let Some(sender) = self.rooms.get(room_code).map(|s| s.clone()) else {
            return;
        };
        if sender.send(event).is_err() {
            self.rooms
                .remove_if(room_code, |_, tx| tx.receiver_count() == 0);
        }
    }

    /// Deliver the deletion to current subscribers and drop the room's
    /// channel. Subscribers drain what is buffered, then see the feed end.
    pub fn close(&self, room_code: &str) {
        if let Some((_, sender)) = self.rooms.remove(room_code) {
            let _ = sender.send(RoomEvent::Deleted {
                room_code: room_code.to_string(),
            });
        }
    }

    pub fn subscriber_count(&self, room_code: &str) -> usize {
        self.rooms
            .get(room_code)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

/// Push feed for a single room. Dropping it unsubscribes.
pub struct RoomSubscription {
    room_code: String,
    inner: BroadcastStream<RoomEvent>,
}

impl RoomSubscription {
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    /// Next event, or `None` once the hub side is gone.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.next().await
    }
}

impl Stream for RoomSubscription {
    type Item = RoomEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                // Every event carries the full document, so skipped ones are superseded.
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    debug!(room_code = %self.room_code, skipped, "Room subscriber lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

//! Typed event bus shared by the host application, the engine, and the scheduler.
//!
//! Built on a `tokio::sync::broadcast` channel: events from one sender arrive in
//! order, and a receiver that falls behind loses the oldest events.

use tokio::sync::broadcast;

use crate::models::VideoId;

use super::engine::SyncOutcome;
use super::error::SyncError;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Local annotations of a video were edited
    LocalDataChanged { video_id: VideoId },
    /// Connectivity changed
    NetworkStatusChanged { online: bool },
    /// Application moved to the foreground
    AppForeground,
    /// Application moved to the background
    AppBackground,
    /// An engine operation finished successfully
    SyncCompleted {
        video_id: VideoId,
        outcome: SyncOutcome,
    },
    /// An engine operation failed
    SyncFailed { video_id: VideoId, error: SyncError },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SyncEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    /// Fire-and-forget; events published with no subscriber are dropped
    pub fn publish(&self, event: SyncEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Sync event dropped: no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    pub fn local_data_changed(&self, video_id: VideoId) {
        self.publish(SyncEvent::LocalDataChanged { video_id });
    }

    pub fn network_status_changed(&self, online: bool) {
        self.publish(SyncEvent::NetworkStatusChanged { online });
    }
}

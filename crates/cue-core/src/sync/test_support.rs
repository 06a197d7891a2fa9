//! Fixtures shared by the sync tests: a scripted gateway and timeline builders.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::models::{
    compact_timelines, expand_timelines, ExpandedTimeline, FieldPosition, Label, Stamp, Tag,
    TagLibrary, TimeEvent, Timeline, VideoId,
};

use super::error::GatewayError;
use super::gateway::RemoteGateway;

/// One timeline with two stamps; the first carries a label, an event and a position
pub(crate) fn sample_timelines() -> Vec<Timeline> {
    let pass = Tag::new("Pass", "#3366ff").in_group("Offense");
    let tackle = Tag::new("Tackle", "#ff6633").in_group("Defense");
    let first = Stamp::new(&pass, 12.0, 16.5)
        .with_label(&Label::new("Left wing"))
        .with_time_event(&TimeEvent::new("Kick-off"))
        .with_position(FieldPosition::new(0.25, 0.6));
    let second = Stamp::new(&tackle, 40.0, 42.0);
    vec![timeline_with_stamps("Home", vec![first, second])]
}

pub(crate) fn timeline_with_stamps(name: &str, stamps: Vec<Stamp>) -> Timeline {
    stamps
        .into_iter()
        .fold(Timeline::new(name), Timeline::with_stamp)
}

pub(crate) fn video(id: &str) -> VideoId {
    VideoId::new(id).unwrap()
}

/// In-memory gateway with scripted failures and fetches that can be held open
#[derive(Default)]
pub(crate) struct FakeGateway {
    remote: Mutex<HashMap<VideoId, Vec<ExpandedTimeline>>>,
    uploads: Mutex<Vec<(VideoId, Vec<ExpandedTimeline>)>>,
    fetch_error: Mutex<Option<GatewayError>>,
    upload_error: Mutex<Option<GatewayError>>,
    held: Mutex<HashSet<VideoId>>,
    hang: AtomicBool,
    fetches: AtomicUsize,
    fetch_started: Notify,
    fetch_released: Notify,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_remote(&self, video_id: &VideoId, timelines: &[Timeline]) {
        self.set_remote_expanded(video_id, expand_timelines(timelines, &TagLibrary::new()));
    }

    pub(crate) fn set_remote_expanded(&self, video_id: &VideoId, timelines: Vec<ExpandedTimeline>) {
        self.remote
            .lock()
            .unwrap()
            .insert(video_id.clone(), timelines);
    }

    pub(crate) fn remote(&self, video_id: &VideoId) -> Vec<Timeline> {
        self.remote
            .lock()
            .unwrap()
            .get(video_id)
            .map(|timelines| compact_timelines(timelines))
            .unwrap_or_default()
    }

    /// Compact form of every successful upload, oldest first
    pub(crate) fn uploads(&self) -> Vec<(VideoId, Vec<Timeline>)> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(video_id, timelines)| (video_id.clone(), compact_timelines(timelines)))
            .collect()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_fetch(&self, error: GatewayError) {
        *self.fetch_error.lock().unwrap() = Some(error);
    }

    pub(crate) fn fail_upload(&self, error: GatewayError) {
        *self.upload_error.lock().unwrap() = Some(error);
    }

    /// Fetches for `video_id` wait until [`Self::release_fetch`]
    pub(crate) fn hold_fetches_for(&self, video_id: &VideoId) {
        self.held.lock().unwrap().insert(video_id.clone());
    }

    pub(crate) fn release_fetch(&self) {
        self.fetch_released.notify_one();
    }

    /// Every fetch stays pending forever
    pub(crate) fn hang_fetches(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    /// Resolves once a fetch has started
    pub(crate) async fn fetch_started(&self) {
        self.fetch_started.notified().await;
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn fetch(&self, video_id: &VideoId) -> Result<Vec<ExpandedTimeline>, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_started.notify_one();

        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let held = self.held.lock().unwrap().contains(video_id);
        if held {
            self.fetch_released.notified().await;
        }

        let error = self.fetch_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }
        let remote = self.remote.lock().unwrap().get(video_id).cloned();
        Ok(remote.unwrap_or_default())
    }

    async fn upload(
        &self,
        video_id: &VideoId,
        timelines: &[ExpandedTimeline],
    ) -> Result<(), GatewayError> {
        let error = self.upload_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }
        self.uploads
            .lock()
            .unwrap()
            .push((video_id.clone(), timelines.to_vec()));
        self.set_remote_expanded(video_id, timelines.to_vec());
        Ok(())
    }
}

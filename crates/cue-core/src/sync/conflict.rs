//! Divergence detection between local and remote annotation sets

use crate::models::{index_timelines, Stamp, Timeline};

/// Whether `local` and `remote` have diverged.
///
/// An empty side never conflicts. Timelines and stamps are matched by id;
/// their order is irrelevant. Label and time event sets compare unordered.
#[must_use]
pub fn detect_conflicts(local: &[Timeline], remote: &[Timeline]) -> bool {
    if local.is_empty() || remote.is_empty() {
        return false;
    }
    if local.len() != remote.len() {
        return true;
    }

    let local_index = index_timelines(local);
    let remote_index = index_timelines(remote);
    if local_index.len() != remote_index.len()
        || local_index.keys().any(|id| !remote_index.contains_key(id))
    {
        return true;
    }

    local_index.iter().any(|(id, local_timeline)| {
        remote_index
            .get(id)
            .is_some_and(|remote_timeline| timelines_diverge(local_timeline, remote_timeline))
    })
}

fn timelines_diverge(local: &Timeline, remote: &Timeline) -> bool {
    if local.stamps.len() != remote.stamps.len() {
        return true;
    }

    let local_stamps = local.stamp_index();
    let remote_stamps = remote.stamp_index();
    if local_stamps.len() != remote_stamps.len()
        || local_stamps.keys().any(|id| !remote_stamps.contains_key(id))
    {
        return true;
    }

    local_stamps.iter().any(|(id, local_stamp)| {
        remote_stamps
            .get(id)
            .is_some_and(|remote_stamp| stamps_diverge(local_stamp, remote_stamp))
    })
}

/// Color, name, and field position are presentation data and never conflict.
fn stamps_diverge(local: &Stamp, remote: &Stamp) -> bool {
    local.start.total_cmp(&remote.start).is_ne()
        || local.end.total_cmp(&remote.end).is_ne()
        || local.tag_id != remote.tag_id
        || local.labels != remote.labels
        || local.time_events != remote.time_events
}

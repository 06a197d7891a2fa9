//! Field-level reconciliation of diverged annotation sets

use std::collections::HashSet;

use crate::models::{index_timelines, Stamp, Timeline};

/// Merge `remote` into `local`.
///
/// Timelines and stamps are unioned by id, local order first. For stamps on
/// both sides every scalar field comes from `local` while label and time event
/// sets are unioned. Stamps in a merged timeline end up sorted by start time
/// (stable, so ties keep their relative order).
#[must_use]
pub fn merge_timelines(local: &[Timeline], remote: &[Timeline]) -> Vec<Timeline> {
    let remote_index = index_timelines(remote);
    let local_ids: HashSet<_> = local.iter().map(|timeline| timeline.id).collect();

    let mut merged: Vec<Timeline> = local
        .iter()
        .map(|timeline| match remote_index.get(&timeline.id) {
            Some(remote_timeline) => merge_timeline(timeline, remote_timeline),
            None => timeline.clone(),
        })
        .collect();

    merged.extend(
        remote
            .iter()
            .filter(|timeline| !local_ids.contains(&timeline.id))
            .cloned(),
    );
    merged
}

fn merge_timeline(local: &Timeline, remote: &Timeline) -> Timeline {
    let remote_stamps = remote.stamp_index();
    let local_ids: HashSet<_> = local.stamps.iter().map(|stamp| stamp.id).collect();

    let mut stamps: Vec<Stamp> = local
        .stamps
        .iter()
        .map(|stamp| match remote_stamps.get(&stamp.id) {
            Some(remote_stamp) => merge_stamp(stamp, remote_stamp),
            None => stamp.clone(),
        })
        .collect();
    stamps.extend(
        remote
            .stamps
            .iter()
            .filter(|stamp| !local_ids.contains(&stamp.id))
            .cloned(),
    );
    stamps.sort_by(|a, b| a.start.total_cmp(&b.start));

    Timeline {
        id: local.id,
        name: local.name.clone(),
        stamps,
    }
}

fn merge_stamp(local: &Stamp, remote: &Stamp) -> Stamp {
    let mut merged = local.clone();
    merged.labels.extend(remote.labels.iter().copied());
    merged
        .time_events
        .extend(remote.time_events.iter().copied());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldPosition, Label, Tag, TimeEvent};
    use crate::sync::conflict::detect_conflicts;
    use crate::sync::test_support::{sample_timelines, timeline_with_stamps};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn one_sided_timelines_carry_through() {
        let local = sample_timelines();
        let remote = vec![Timeline::new("Remote only")];

        let merged = merge_timelines(&local, &remote);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], local[0]);
        assert_eq!(merged[1], remote[0]);
    }

    #[test]
    fn label_sets_union_and_scalars_come_from_local() {
        let tag = Tag::new("Attack", "#e00");
        let label_a = Label::new("A");
        let label_b = Label::new("B");
        let event = TimeEvent::new("Whistle");

        let local_stamp = Stamp::new(&tag, 5.0, 9.0).with_label(&label_a);
        let mut remote_stamp = local_stamp.clone();
        remote_stamp.labels = BTreeSet::from([label_b.id]);
        remote_stamp.time_events.insert(event.id);
        remote_stamp.start = 4.0;
        remote_stamp.end = 11.0;
        remote_stamp.color = "#00e".to_string();
        remote_stamp.position = Some(FieldPosition::new(0.1, 0.2));

        let local = vec![timeline_with_stamps("Home", vec![local_stamp.clone()])];
        let mut remote = local.clone();
        remote[0].stamps = vec![remote_stamp];

        assert!(detect_conflicts(&local, &remote));

        let merged = merge_timelines(&local, &remote);
        let stamp = &merged[0].stamps[0];
        assert_eq!(stamp.labels, BTreeSet::from([label_a.id, label_b.id]));
        assert_eq!(stamp.time_events, BTreeSet::from([event.id]));
        assert_eq!(stamp.start, local_stamp.start);
        assert_eq!(stamp.end, local_stamp.end);
        assert_eq!(stamp.color, local_stamp.color);
        assert_eq!(stamp.position, None);
    }

    #[test]
    fn merged_stamps_sorted_by_start_with_stable_ties() {
        let tag = Tag::new("Run", "#0a0");
        let late = Stamp::new(&tag, 30.0, 31.0);
        let tie_local = Stamp::new(&tag, 10.0, 12.0);
        let tie_remote = Stamp::new(&tag, 10.0, 15.0);
        let early = Stamp::new(&tag, 1.0, 2.0);

        let local = vec![timeline_with_stamps(
            "Home",
            vec![late.clone(), tie_local.clone()],
        )];
        let mut remote = local.clone();
        remote[0].stamps = vec![tie_remote.clone(), early.clone()];

        let merged = merge_timelines(&local, &remote);
        let ids: Vec<_> = merged[0].stamps.iter().map(|stamp| stamp.id).collect();
        assert_eq!(ids, vec![early.id, tie_local.id, tie_remote.id, late.id]);
    }

    #[test]
    fn merge_is_idempotent() {
        let tag = Tag::new("Save", "#999");
        let local = sample_timelines();
        let mut remote = local.clone();
        remote[0].stamps[0].labels.insert(Label::new("Diving").id);
        remote[0].stamps.push(Stamp::new(&tag, 0.5, 0.7));
        remote.push(Timeline::new("Keeper"));

        let once = merge_timelines(&local, &remote);
        let twice = merge_timelines(&once, &once);
        assert_eq!(twice, once);
    }

    #[test]
    fn merge_is_deterministic() {
        let local = sample_timelines();
        let mut remote = local.clone();
        remote[0].stamps[0].labels.insert(Label::new("Late").id);

        assert_eq!(
            merge_timelines(&local, &remote),
            merge_timelines(&local, &remote)
        );
    }
}

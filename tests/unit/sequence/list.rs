use chrono::{TimeZone, Utc};

use super::*;

fn file(name: &str, size: usize, modified_secs: i64) -> IncomingFile {
    IncomingFile {
        name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: vec![0u8; size],
        last_modified: Utc.timestamp_opt(modified_secs, 0).unwrap(),
    }
}

fn names(seq: &Sequence) -> Vec<&str> {
    seq.entries().iter().map(|e| e.name()).collect()
}

fn sample() -> Sequence {
    let mut seq = Sequence::new(HandleRegistry::new());
    seq.ingest([
        file("c.png", 30, 100),
        file("a.png", 10, 300),
        file("B.png", 20, 200),
    ]);
    seq
}

#[test]
fn ingest_skips_non_images_and_assigns_unique_ids() {
    let mut seq = Sequence::new(HandleRegistry::new());
    let mut notes = file("notes.txt", 5, 0);
    notes.content_type = Some("text/plain".to_string());
    let mut unknown = file("blob", 5, 0);
    unknown.content_type = None;

    let report = seq.ingest([file("a.png", 1, 0), notes, unknown, file("b.png", 1, 0)]);
    assert_eq!(report.added.len(), 2);
    assert_eq!(report.skipped, vec!["notes.txt".to_string(), "blob".to_string()]);
    assert_ne!(report.added[0], report.added[1]);
    assert_eq!(names(&seq), vec!["a.png", "b.png"]);
    assert_eq!(seq.handles().live_count(), 2);

    let more = seq.ingest([file("c.png", 1, 0)]);
    assert!(!report.added.contains(&more.added[0]));
}

#[test]
fn move_entry_is_a_permutation() {
    let mut seq = sample();
    let before: std::collections::BTreeSet<_> = seq.entries().iter().map(|e| e.id()).collect();

    seq.move_entry(0, 2).unwrap();
    assert_eq!(names(&seq), vec!["a.png", "B.png", "c.png"]);
    seq.move_entry(2, 0).unwrap();
    assert_eq!(names(&seq), vec!["c.png", "a.png", "B.png"]);
    seq.move_entry(1, 1).unwrap();

    let after: std::collections::BTreeSet<_> = seq.entries().iter().map(|e| e.id()).collect();
    assert_eq!(before, after);
    assert_eq!(seq.len(), 3);

    assert!(seq.move_entry(0, 3).is_err());
}

#[test]
fn move_entry_requires_manual_order() {
    let mut seq = sample();
    seq.set_sort_order(SortOrder::Name);
    assert!(matches!(
        seq.move_entry(0, 1),
        Err(StillsError::Validation(_))
    ));
}

#[test]
fn derived_sorts_follow_attributes_and_are_idempotent() {
    let mut seq = sample();

    seq.set_sort_order(SortOrder::Name);
    assert_eq!(names(&seq), vec!["a.png", "B.png", "c.png"]);
    seq.set_sort_order(SortOrder::Name);
    assert_eq!(names(&seq), vec!["a.png", "B.png", "c.png"]);

    seq.set_sort_order(SortOrder::Date);
    assert_eq!(names(&seq), vec!["c.png", "B.png", "a.png"]);
    for w in seq.entries().windows(2) {
        assert!(w[0].last_modified() <= w[1].last_modified());
    }

    seq.set_sort_order(SortOrder::Size);
    assert_eq!(names(&seq), vec!["a.png", "B.png", "c.png"]);
    for w in seq.entries().windows(2) {
        assert!(w[0].size() <= w[1].size());
    }
}

#[test]
fn switching_to_manual_keeps_the_last_order() {
    let mut seq = sample();
    seq.set_sort_order(SortOrder::Size);
    seq.set_sort_order(SortOrder::Manual);
    assert_eq!(names(&seq), vec!["a.png", "B.png", "c.png"]);

    seq.move_entry(2, 0).unwrap();
    assert_eq!(names(&seq), vec!["c.png", "a.png", "B.png"]);
}

#[test]
fn ingest_reapplies_a_derived_sort() {
    let mut seq = sample();
    seq.set_sort_order(SortOrder::Size);
    seq.ingest([file("tiny.png", 1, 0)]);
    assert_eq!(names(&seq)[0], "tiny.png");
}

#[test]
fn remove_revokes_handle_exactly_once() {
    let mut seq = sample();
    let reg = seq.handles().clone();
    let victim = seq.entries()[1].id();
    let handle = seq.get(victim).unwrap().display().id();

    seq.remove(victim).unwrap();
    assert!(!reg.is_live(handle));
    assert_eq!(reg.revoked_count(), 1);
    assert!(seq.get(victim).is_none());
    assert!(seq.entries().iter().all(|e| e.id() != victim));

    assert!(seq.remove(victim).is_err());
    assert_eq!(reg.revoked_count(), 1);
}

#[test]
fn remove_defers_revocation_while_a_snapshot_holds_the_entry() {
    let mut seq = sample();
    let reg = seq.handles().clone();
    let snapshot = seq.snapshot();
    let victim = snapshot[0].id();
    let handle = snapshot[0].display().id();

    seq.remove(victim).unwrap();
    assert!(reg.is_live(handle));
    assert_eq!(reg.revoked_count(), 0);

    drop(snapshot);
    assert!(!reg.is_live(handle));
    assert_eq!(reg.revoked_count(), 1);
}

#[test]
fn clear_revokes_everything() {
    let mut seq = sample();
    let reg = seq.handles().clone();
    seq.clear();
    assert!(seq.is_empty());
    assert_eq!(reg.live_count(), 0);
    assert_eq!(reg.revoked_count(), 3);
}

#[test]
fn nominal_duration_is_count_over_fps() {
    let seq = sample();
    let fps = Fps::new(2.0).unwrap();
    assert_eq!(seq.nominal_duration(fps), Duration::from_millis(1500));
}

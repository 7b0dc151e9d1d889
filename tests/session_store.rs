use muxpanel::{NoticeKind, Notifier, SessionStore, Severity};

#[test]
fn run_counter_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut store = SessionStore::open(&path);
    assert_eq!(store.run_id(), 0);
    store.begin_run();
    store.begin_run();
    drop(store);

    let store = SessionStore::open(&path);
    assert_eq!(store.run_id(), 2);
}

#[test]
fn acknowledgment_survives_reopen_for_the_same_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut notifier = Notifier::new(SessionStore::open(&path));
    notifier.begin_run();
    let notice = notifier
        .notify(NoticeKind::Device, "USB stick removed", Severity::Warning)
        .expect("fresh notice is presented");
    notifier.acknowledge(&notice);
    drop(notifier);

    // Console restarts mid-run: the dismissal still holds.
    let mut notifier = Notifier::new(SessionStore::open(&path));
    assert_eq!(notifier.run_id(), 1);
    assert!(notifier
        .notify(NoticeKind::Device, "USB stick removed", Severity::Warning)
        .is_none());

    // The next run gets the notice again.
    notifier.begin_run();
    assert!(notifier
        .notify(NoticeKind::Device, "USB stick removed", Severity::Warning)
        .is_some());
}

#[test]
fn corrupt_store_file_reads_as_empty_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json at all").unwrap();

    let store = SessionStore::open(&path);
    assert_eq!(store.run_id(), 0);
    assert_eq!(store.dismissed_count(), 0);

    // And the store recovers: the next write replaces the garbage.
    let mut store = store;
    store.begin_run();
    drop(store);
    assert_eq!(SessionStore::open(&path).run_id(), 1);
}

#[test]
fn missing_file_starts_empty_and_saves_on_first_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never_written.json");

    let store = SessionStore::open(&path);
    assert_eq!(store.run_id(), 0);
    assert!(!path.exists(), "opening alone must not create the file");

    let mut store = store;
    store.set_dismissed("1:stream:connection lost").unwrap();
    assert!(path.exists());
    assert!(SessionStore::open(&path).is_dismissed("1:stream:connection lost"));
}

#[test]
fn wrong_shape_fields_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    // Valid JSON, wrong types: same treatment as garbage.
    std::fs::write(&path, r#"{"run_id":"three","dismissed":[]}"#).unwrap();

    let store = SessionStore::open(&path);
    assert_eq!(store.run_id(), 0);
    assert_eq!(store.dismissed_count(), 0);
}

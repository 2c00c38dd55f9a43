//! Upload tracker behaviour against the in-memory directory.
//!
//! Gated uploads let each test decide when an in-flight upload finishes, so
//! intermediate states can be observed deterministically.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gallery_client::{MockCall, MockDirectoryClient};
use gallery_core::{Error, SourceFile, UploadStatus};
use gallery_state::{
    GalleryOrderEngine, InMemoryPreviewStore, TrackerEvent, UploadTracker,
};
use uuid::Uuid;

fn jpg(name: &str) -> SourceFile {
    SourceFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

fn setup(mock: &MockDirectoryClient) -> (UploadTracker, Arc<InMemoryPreviewStore>) {
    let previews = Arc::new(InMemoryPreviewStore::new());
    let tracker = UploadTracker::new(Arc::new(mock.clone()), previews.clone());
    (tracker, previews)
}

/// Yield to other tasks until `cond` holds.
async fn settle(cond: impl Fn() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

fn count_status(tracker: &UploadTracker, status: UploadStatus) -> usize {
    tracker.snapshot().iter().filter(|e| e.status == status).count()
}

#[tokio::test]
async fn test_two_file_batch_success_then_error() {
    let mock = MockDirectoryClient::new().with_upload_failure("photo2.jpg", "disk full");
    let (tracker, _) = setup(&mock);

    let ids = tracker.add_files(vec![jpg("photo1.jpg"), jpg("photo2.jpg")], &[]);
    assert_eq!(count_status(&tracker, UploadStatus::Pending), 2);

    let report = tracker.upload_all_pending().await.unwrap();
    assert_eq!((report.attempted, report.succeeded, report.failed), (2, 1, 1));

    let entries = tracker.snapshot();
    assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), ids);

    assert_eq!(entries[0].status, UploadStatus::Success);
    assert_eq!(
        entries[0].remote_url.as_deref(),
        Some("https://cdn.test/gallery/photo1.jpg")
    );
    assert_eq!(entries[1].status, UploadStatus::Error);
    assert_eq!(entries[1].error.as_deref(), Some("disk full"));
    assert!(entries[1].remote_url.is_none());

    assert_eq!(
        mock.calls(),
        vec![
            MockCall::Upload("photo1.jpg".to_string()),
            MockCall::Upload("photo2.jpg".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_observed_transitions_follow_state_machine() {
    let mock = MockDirectoryClient::new()
        .with_upload_failure("b.jpg", "quota exceeded")
        .with_upload_failure("d.jpg", "bad request");
    let (tracker, _) = setup(&mock);
    let mut events = tracker.subscribe();

    tracker.add_files(
        vec![jpg("a.jpg"), jpg("b.jpg"), jpg("c.jpg"), jpg("d.jpg")],
        &[],
    );
    tracker.upload_all_pending().await.unwrap();

    let mut history: HashMap<Uuid, Vec<UploadStatus>> = HashMap::new();
    while let Ok(event) = events.try_recv() {
        if let TrackerEvent::EntryChanged(snapshot) = event {
            assert_eq!(
                snapshot.progress == 100,
                snapshot.status == UploadStatus::Success,
                "progress {} with status {}",
                snapshot.progress,
                snapshot.status
            );
            let seen = history.entry(snapshot.id).or_default();
            if seen.last() != Some(&snapshot.status) {
                if let Some(prev) = seen.last() {
                    assert!(
                        prev.can_transition_to(snapshot.status),
                        "{} -> {}",
                        prev,
                        snapshot.status
                    );
                }
                seen.push(snapshot.status);
            }
        }
    }

    assert_eq!(history.len(), 4);
    for statuses in history.values() {
        assert_eq!(statuses[..2], [UploadStatus::Pending, UploadStatus::Uploading]);
        assert!(statuses[2].is_terminal());
        assert_eq!(statuses.len(), 3);
    }
}

#[tokio::test]
async fn test_batch_uploads_one_entry_at_a_time() {
    let mock = MockDirectoryClient::new().with_upload_gate();
    let (tracker, _) = setup(&mock);
    tracker.add_files(vec![jpg("a.jpg"), jpg("b.jpg"), jpg("c.jpg")], &[]);

    let batch = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.upload_all_pending().await })
    };

    for done in 0..3 {
        settle(|| mock.upload_call_count() == done + 1).await;
        assert!(tracker.is_uploading());
        assert_eq!(count_status(&tracker, UploadStatus::Uploading), 1);
        assert_eq!(count_status(&tracker, UploadStatus::Success), done);
        assert_eq!(count_status(&tracker, UploadStatus::Pending), 2 - done);

        let uploading = tracker
            .snapshot()
            .into_iter()
            .find(|e| e.status == UploadStatus::Uploading)
            .unwrap();
        assert!(uploading.progress >= 10 && uploading.progress < 100);

        mock.release_upload();
    }

    let report = batch.await.unwrap().unwrap();
    assert_eq!(report.succeeded, 3);
    assert_eq!(mock.max_uploads_in_flight(), 1);
    assert!(!tracker.is_uploading());
}

#[tokio::test]
async fn test_second_batch_while_running_is_rejected() {
    let mock = MockDirectoryClient::new().with_upload_gate();
    let (tracker, _) = setup(&mock);
    tracker.add_files(vec![jpg("a.jpg"), jpg("b.jpg")], &[]);

    let batch = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.upload_all_pending().await })
    };
    settle(|| mock.upload_call_count() == 1).await;

    let err = tracker.upload_all_pending().await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    mock.release_upload();
    mock.release_upload();
    let report = batch.await.unwrap().unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(mock.upload_call_count(), 2);
}

#[tokio::test]
async fn test_files_added_mid_batch_wait_for_next_batch() {
    let mock = MockDirectoryClient::new().with_upload_gate();
    let (tracker, _) = setup(&mock);
    tracker.add_files(vec![jpg("a.jpg")], &[]);

    let batch = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.upload_all_pending().await })
    };
    settle(|| mock.upload_call_count() == 1).await;

    let late = tracker.add_files(vec![jpg("late.jpg")], &[])[0];
    mock.release_upload();
    let report = batch.await.unwrap().unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(tracker.get(late).unwrap().status, UploadStatus::Pending);
}

#[tokio::test]
async fn test_entry_removed_in_flight_stays_removed() {
    let mock = MockDirectoryClient::new().with_upload_gate();
    let (tracker, previews) = setup(&mock);
    let ids = tracker.add_files(vec![jpg("a.jpg"), jpg("b.jpg")], &[]);

    let batch = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.upload_all_pending().await })
    };
    settle(|| mock.upload_call_count() == 1).await;

    let preview = tracker.get(ids[0]).unwrap().preview_url;
    tracker.remove_entry(ids[0]);
    assert_eq!(previews.revoked(), vec![preview]);

    mock.release_upload();
    settle(|| mock.upload_call_count() == 2).await;
    mock.release_upload();
    batch.await.unwrap().unwrap();

    assert!(tracker.get(ids[0]).is_none());
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.get(ids[1]).unwrap().status, UploadStatus::Success);
    assert_eq!(previews.revoked().len(), 1);
}

#[tokio::test]
async fn test_entry_removed_before_its_turn_is_skipped() {
    let mock = MockDirectoryClient::new().with_upload_gate();
    let (tracker, _) = setup(&mock);
    let ids = tracker.add_files(vec![jpg("a.jpg"), jpg("b.jpg")], &[]);

    let batch = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.upload_all_pending().await })
    };
    settle(|| mock.upload_call_count() == 1).await;

    tracker.remove_entry(ids[1]);
    mock.release_upload();
    let report = batch.await.unwrap().unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(mock.upload_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_upload_that_never_completes_stays_uploading() {
    let mock = MockDirectoryClient::new().with_upload_gate();
    let (tracker, _) = setup(&mock);
    let id = tracker.add_files(vec![jpg("slow.jpg")], &[])[0];

    let batch = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.upload_all_pending().await })
    };

    let waited = tokio::time::timeout(Duration::from_secs(600), batch).await;
    assert!(waited.is_err(), "batch should still be running");

    let entry = tracker.get(id).unwrap();
    assert_eq!(entry.status, UploadStatus::Uploading);
    assert!(entry.progress < 100);
    assert!(tracker.is_uploading());

    // Other operations keep working while the upload hangs.
    let other = tracker.add_files(vec![jpg("other.jpg")], &[])[0];
    tracker.remove_entry(other);
    assert_eq!(tracker.len(), 1);
}

#[tokio::test]
async fn test_previews_released_exactly_once() {
    let mock = MockDirectoryClient::new().with_upload_failure("c.jpg", "nope");
    let (tracker, previews) = setup(&mock);
    let ids = tracker.add_files(vec![jpg("a.jpg"), jpg("b.jpg"), jpg("c.jpg")], &[]);
    assert_eq!(previews.live_count(), 3);
    assert!(previews.revoked().is_empty());

    tracker.remove_entry(ids[0]);
    tracker.remove_entry(ids[0]);
    assert_eq!(previews.revoked().len(), 1);

    tracker.upload_all_pending().await.unwrap();
    assert!(previews.revoked().len() == 1, "upload must not release previews");

    assert_eq!(tracker.clear_completed(), 1);
    assert_eq!(previews.revoked().len(), 2);
    assert_eq!(tracker.clear_completed(), 0);
    assert_eq!(previews.revoked().len(), 2);

    drop(tracker);
    let revoked = previews.revoked();
    assert_eq!(revoked.len(), 3);
    let mut unique = revoked.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3);
    assert_eq!(previews.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_copied_flag_resets_after_two_seconds() {
    let mock = MockDirectoryClient::new();
    let (tracker, _) = setup(&mock);
    let id = tracker.add_files(vec![jpg("a.jpg")], &[])[0];
    tracker.upload_all_pending().await.unwrap();

    let url = tracker.copy_url(id).unwrap();
    assert_eq!(url, "https://cdn.test/gallery/a.jpg");
    assert!(tracker.get(id).unwrap().copied);

    tokio::time::sleep(Duration::from_millis(1_999)).await;
    assert!(tracker.get(id).unwrap().copied);

    tokio::time::sleep(Duration::from_millis(2)).await;
    tokio::task::yield_now().await;
    assert!(!tracker.get(id).unwrap().copied);
}

#[tokio::test(start_paused = true)]
async fn test_copied_reset_after_removal_is_harmless() {
    let mock = MockDirectoryClient::new();
    let (tracker, _) = setup(&mock);
    let id = tracker.add_files(vec![jpg("a.jpg")], &[])[0];
    tracker.upload_all_pending().await.unwrap();

    tracker.copy_url(id).unwrap();
    tracker.remove_entry(id);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(tracker.get(id).is_none());
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn test_batch_refreshes_gallery_in_background() {
    let mock = MockDirectoryClient::new().with_files(&["existing.jpg"]);
    let engine = GalleryOrderEngine::new(Arc::new(mock.clone()), Vec::new());
    engine.refresh().await.unwrap();
    assert_eq!(engine.len(), 1);

    let previews = Arc::new(InMemoryPreviewStore::new());
    let tracker = UploadTracker::new(Arc::new(mock.clone()), previews)
        .with_refresh_target(engine.clone());
    tracker.add_files(vec![jpg("new.jpg")], &[]);
    tracker.upload_all_pending().await.unwrap();

    settle(|| engine.len() == 2).await;
    assert_eq!(
        engine.keys(),
        vec!["gallery/existing.jpg".to_string(), "gallery/new.jpg".to_string()]
    );
}

#[tokio::test]
async fn test_selected_categories_reach_the_directory() {
    let mock = MockDirectoryClient::new();
    let (tracker, _) = setup(&mock);
    let categories = vec!["Library".to_string(), "Travel".to_string()];
    tracker.add_files(vec![jpg("a.jpg")], &categories);
    tracker.upload_all_pending().await.unwrap();

    let engine = GalleryOrderEngine::new(Arc::new(mock.clone()), Vec::new());
    engine.refresh().await.unwrap();
    assert_eq!(engine.items()[0].categories, categories);
}

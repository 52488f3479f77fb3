// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

use nostrmq::{EventId, Timestamp};
use nostrmq_sdk::{ReplayTracker, TrackerOptions};
use serde_json::Value;

fn id(byte: u8) -> EventId {
    EventId::from_byte_array([byte; 32])
}

#[tokio::test]
async fn test_replay_suppression_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let opts = TrackerOptions::new().cache_dir(dir.path()).track_limit(10);

    let base = Timestamp::now();
    {
        let mut tracker = ReplayTracker::init(opts.clone()).await;
        assert!(tracker.persistence_enabled());
        for i in 1..=3u8 {
            tracker.mark_processed(id(i), base + i as u64).await;
        }
    }

    // A new tracker over the same cache dir remembers everything
    let tracker = ReplayTracker::init(opts).await;
    for i in 1..=3u8 {
        assert!(tracker.has_processed(&id(i), base + i as u64));
    }

    // A fresh event one second past the watermark is new
    let fresh = id(4);
    assert!(!tracker.has_processed(&fresh, base + 4u64));
    assert!(tracker.has_processed(&fresh, base + 3u64));
}

#[tokio::test]
async fn test_eviction_snapshot_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let opts = TrackerOptions::new().cache_dir(dir.path()).track_limit(10);

    let base = Timestamp::now();
    let mut tracker = ReplayTracker::init(opts.clone()).await;
    for i in 1..=15u8 {
        tracker.mark_processed(id(i), base + i as u64).await;
    }

    assert_eq!(tracker.recent_ids().len(), 10);

    // The snapshot holds exactly the 10 most recent ids, insertion order
    let snapshot: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("snapshot.json")).unwrap()).unwrap();
    let on_disk: Vec<String> = snapshot["eventIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (6..=15u8).map(|i| id(i).to_hex()).collect();
    assert_eq!(on_disk, expected);
    assert_eq!(snapshot["count"], 10);

    // Restart: survivors are known by id, evictees only via the watermark
    drop(tracker);
    let tracker = ReplayTracker::init(opts).await;
    let beyond = base + 100u64;
    assert!(tracker.has_processed(&id(15), beyond));
    assert!(!tracker.has_processed(&id(1), beyond));
}

#[tokio::test]
async fn test_timestamp_file_shape() {
    let dir = tempfile::tempdir().unwrap();
    let opts = TrackerOptions::new().cache_dir(dir.path());

    let ts = Timestamp::now() + 5u64;
    let mut tracker = ReplayTracker::init(opts).await;
    tracker.mark_processed(id(1), ts).await;

    let file: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("timestamp.json")).unwrap())
            .unwrap();
    assert_eq!(file["lastProcessed"], ts.as_u64());
    assert!(file["updatedAt"].as_u64().is_some());
}

#[tokio::test]
async fn test_corrupt_cache_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("timestamp.json"), b"{not json").unwrap();
    std::fs::write(dir.path().join("snapshot.json"), b"[1,2,3").unwrap();

    let opts = TrackerOptions::new()
        .cache_dir(dir.path())
        .lookback_seconds(3600);
    let tracker = ReplayTracker::init(opts).await;

    // Starts fresh, still with persistence on
    assert!(tracker.persistence_enabled());
    assert!(tracker.recent_ids().is_empty());
    let expected = Timestamp::now() - 3600u64;
    let since = tracker.subscription_since();
    assert!(since >= expected - 5u64 && since <= expected + 5u64);
}

#[tokio::test]
async fn test_unwritable_cache_dir_falls_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"a file, not a dir").unwrap();

    let opts = TrackerOptions::new()
        .cache_dir(blocker.join("cache"))
        .lookback_seconds(3600);

    let mut tracker = ReplayTracker::init(opts.clone()).await;
    assert!(!tracker.persistence_enabled());

    // Memory-only tracking still works
    let ts = Timestamp::now() + 10u64;
    tracker.mark_processed(id(1), ts).await;
    assert!(tracker.has_processed(&id(1), ts));
    assert_eq!(tracker.subscription_since(), ts);

    // A restart starts from the default watermark
    drop(tracker);
    let tracker = ReplayTracker::init(opts).await;
    let expected = Timestamp::now() - 3600u64;
    let since = tracker.subscription_since();
    assert!(since >= expected - 5u64 && since <= expected + 5u64);
}

#[tokio::test]
async fn test_old_watermark_is_clamped_forward() {
    let dir = tempfile::tempdir().unwrap();
    let stale = serde_json::json!({"lastProcessed": 1000, "updatedAt": 1000});
    std::fs::write(
        dir.path().join("timestamp.json"),
        serde_json::to_vec(&stale).unwrap(),
    )
    .unwrap();

    let opts = TrackerOptions::new()
        .cache_dir(dir.path())
        .lookback_seconds(3600);
    let tracker = ReplayTracker::init(opts).await;

    // No point replaying more than two lookback windows
    let floor = Timestamp::now() - 7200u64;
    let since = tracker.subscription_since();
    assert!(since >= floor - 5u64 && since <= floor + 5u64);
}

// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Replay tracker
//!
//! A bounded memory of what the receive pipeline has already handled: a
//! watermark timestamp plus a set of recently processed event ids, with
//! best-effort JSON persistence. The on-disk cache is a hint, never a
//! source of truth: unreadable files are treated as absent, and the first
//! failed write flips the tracker into memory-only mode for the rest of
//! its life.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use nostrmq::{EventId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::fs;

const DEFAULT_LOOKBACK_SECS: u64 = 3600;
const MIN_LOOKBACK_SECS: u64 = 60;

const DEFAULT_TRACK_LIMIT: usize = 100;
const MIN_TRACK_LIMIT: usize = 10;
const MAX_TRACK_LIMIT: usize = 1000;

const DEFAULT_CACHE_DIR: &str = ".nostrmq";

const TIMESTAMP_FILE: &str = "timestamp.json";
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Replay tracker options
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub(crate) lookback: u64,
    pub(crate) track_limit: usize,
    pub(crate) cache_dir: PathBuf,
    pub(crate) enable_persistence: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK_SECS,
            track_limit: DEFAULT_TRACK_LIMIT,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            enable_persistence: true,
        }
    }
}

impl TrackerOptions {
    /// New default options
    pub fn new() -> Self {
        Self::default()
    }

    /// How far back a fresh tracker starts watching (default: 3600 s,
    /// floor: 60 s)
    pub fn lookback_seconds(mut self, seconds: u64) -> Self {
        self.lookback = seconds.max(MIN_LOOKBACK_SECS);
        self
    }

    /// Recent-id capacity (default: 100, clamped to 10..=1000)
    pub fn track_limit(mut self, limit: usize) -> Self {
        self.track_limit = limit.clamp(MIN_TRACK_LIMIT, MAX_TRACK_LIMIT);
        self
    }

    /// Cache directory (default: `.nostrmq`)
    pub fn cache_dir<P>(mut self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.cache_dir = dir.into();
        self
    }

    /// Enable/disable on-disk persistence (default: enabled)
    pub fn enable_persistence(mut self, enable: bool) -> Self {
        self.enable_persistence = enable;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimestampFile {
    last_processed: u64,
    updated_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    event_ids: Vec<String>,
    created_at: u64,
    count: usize,
}

/// Replay tracker
#[derive(Debug)]
pub struct ReplayTracker {
    last_processed: Timestamp,
    /// Insertion order, for eviction
    recent: VecDeque<EventId>,
    /// Same ids, for lookup
    seen: HashSet<EventId>,
    persistence_enabled: bool,
    opts: TrackerOptions,
}

impl ReplayTracker {
    /// Initialize the tracker: create the cache directory and load both
    /// cache files if persistence is enabled. Never fails; every
    /// persistence problem degrades to memory-only mode.
    pub async fn init(opts: TrackerOptions) -> Self {
        let mut tracker = Self {
            last_processed: Timestamp::now() - opts.lookback,
            recent: VecDeque::with_capacity(opts.track_limit),
            seen: HashSet::with_capacity(opts.track_limit),
            persistence_enabled: opts.enable_persistence,
            opts,
        };

        if !tracker.persistence_enabled {
            return tracker;
        }

        if let Err(e) = fs::create_dir_all(&tracker.opts.cache_dir).await {
            tracing::warn!(
                dir = %tracker.opts.cache_dir.display(),
                error = %e,
                "Can't create cache dir; replay tracking continues in memory only."
            );
            tracker.persistence_enabled = false;
            return tracker;
        }

        tracker.load_timestamp().await;
        tracker.load_snapshot().await;

        tracker
    }

    /// Lower bound for relay subscription filters (`since`)
    #[inline]
    pub fn subscription_since(&self) -> Timestamp {
        self.last_processed
    }

    /// Check if persistence is still active
    #[inline]
    pub fn persistence_enabled(&self) -> bool {
        self.persistence_enabled
    }

    /// Recently processed ids, oldest first
    pub fn recent_ids(&self) -> Vec<EventId> {
        self.recent.iter().copied().collect()
    }

    /// An event is already processed if it is at or below the watermark, or
    /// its id is in the recent set. The watermark itself counts as
    /// processed; `watermark + 1` is new.
    pub fn has_processed(&self, id: &EventId, created_at: Timestamp) -> bool {
        created_at <= self.last_processed || self.seen.contains(id)
    }

    /// Record a delivered event.
    ///
    /// Advances the watermark (never backwards), remembers the id, evicts
    /// oldest insertions over the limit. Persistence failures are logged
    /// and swallowed.
    pub async fn mark_processed(&mut self, id: EventId, created_at: Timestamp) {
        if created_at > self.last_processed {
            self.last_processed = created_at;
            self.save_timestamp().await;
        }

        if self.seen.insert(id) {
            self.recent.push_back(id);

            if self.recent.len() > self.opts.track_limit {
                while self.recent.len() > self.opts.track_limit {
                    if let Some(evicted) = self.recent.pop_front() {
                        self.seen.remove(&evicted);
                    }
                }
                self.save_snapshot().await;
            }
        }
    }

    fn timestamp_path(&self) -> PathBuf {
        self.opts.cache_dir.join(TIMESTAMP_FILE)
    }

    fn snapshot_path(&self) -> PathBuf {
        self.opts.cache_dir.join(SNAPSHOT_FILE)
    }

    async fn load_timestamp(&mut self) {
        if let Some(file) = read_json::<TimestampFile>(&self.timestamp_path()).await {
            if file.last_processed > 0 {
                // A very old watermark is clamped forward; no point replaying
                // more than two lookback windows.
                let floor: Timestamp = Timestamp::now() - 2 * self.opts.lookback;
                self.last_processed =
                    std::cmp::max(Timestamp::from(file.last_processed), floor);
            }
        }
    }

    async fn load_snapshot(&mut self) {
        if let Some(file) = read_json::<SnapshotFile>(&self.snapshot_path()).await {
            let ids = file
                .event_ids
                .iter()
                .filter_map(|id| EventId::from_hex(id).ok());

            // Keep the newest `track_limit` entries, preserving order
            let skip: usize = file.event_ids.len().saturating_sub(self.opts.track_limit);
            for id in ids.skip(skip) {
                if self.seen.insert(id) {
                    self.recent.push_back(id);
                }
            }
        }
    }

    async fn save_timestamp(&mut self) {
        if !self.persistence_enabled {
            return;
        }
        let file = TimestampFile {
            last_processed: self.last_processed.as_u64(),
            updated_at: Timestamp::now().as_u64(),
        };
        self.write_json(&self.timestamp_path(), &file).await;
    }

    async fn save_snapshot(&mut self) {
        if !self.persistence_enabled {
            return;
        }
        let file = SnapshotFile {
            event_ids: self.recent.iter().map(|id| id.to_hex()).collect(),
            created_at: Timestamp::now().as_u64(),
            count: self.recent.len(),
        };
        self.write_json(&self.snapshot_path(), &file).await;
    }

    /// Rewrite a cache file whole. The first failure disables persistence
    /// for the rest of the tracker's life.
    async fn write_json<T>(&mut self, path: &Path, value: &T)
    where
        T: Serialize,
    {
        let bytes: Vec<u8> = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Can't serialize cache file.");
                return;
            }
        };

        if let Err(e) = fs::write(path, bytes).await {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Cache write failed; replay tracking continues in memory only."
            );
            self.persistence_enabled = false;
        }
    }
}

/// Read and parse a cache file; anything invalid is treated as absent.
async fn read_json<T>(path: &Path) -> Option<T>
where
    T: for<'de> Deserialize<'de>,
{
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Ignoring invalid cache file.");
                None
            }
        },
        Err(..) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> EventId {
        EventId::from_byte_array([byte; 32])
    }

    fn memory_opts() -> TrackerOptions {
        TrackerOptions::new().enable_persistence(false)
    }

    #[tokio::test]
    async fn test_watermark_boundary() {
        let mut tracker = ReplayTracker::init(memory_opts()).await;
        let ts = Timestamp::now() + 100u64;
        tracker.mark_processed(id(1), ts).await;

        let unseen = id(2);
        assert!(tracker.has_processed(&unseen, ts));
        assert!(!tracker.has_processed(&unseen, ts + 1u64));
    }

    #[tokio::test]
    async fn test_watermark_is_monotonic() {
        let mut tracker = ReplayTracker::init(memory_opts()).await;
        let high = Timestamp::now() + 100u64;
        tracker.mark_processed(id(1), high).await;
        tracker.mark_processed(id(2), high - 50u64).await;
        assert_eq!(tracker.subscription_since(), high);

        // The older event is still remembered by id
        assert!(tracker.has_processed(&id(2), high - 50u64));
    }

    #[tokio::test]
    async fn test_eviction_preserves_insertion_order() {
        let mut tracker =
            ReplayTracker::init(memory_opts().track_limit(10)).await;
        let base = Timestamp::now();
        for i in 1..=20u8 {
            tracker.mark_processed(id(i), base + i as u64).await;
        }

        assert_eq!(tracker.recent_ids().len(), 10);
        assert_eq!(
            tracker.recent_ids(),
            (11..=20u8).map(id).collect::<Vec<_>>()
        );

        // Evicted ids are still covered by the watermark
        assert!(tracker.has_processed(&id(1), base + 1u64));
        // Survivors are covered by the id set even past the watermark probe
        assert!(tracker.has_processed(&id(20), base + 20u64));
    }

    #[tokio::test]
    async fn test_options_clamps() {
        let opts = TrackerOptions::new().lookback_seconds(5).track_limit(2);
        assert_eq!(opts.lookback, MIN_LOOKBACK_SECS);
        assert_eq!(opts.track_limit, MIN_TRACK_LIMIT);

        let opts = TrackerOptions::new().track_limit(10_000);
        assert_eq!(opts.track_limit, MAX_TRACK_LIMIT);
    }

    #[tokio::test]
    async fn test_default_watermark_is_lookback_ago() {
        let tracker = ReplayTracker::init(memory_opts()).await;
        let expected = Timestamp::now() - DEFAULT_LOOKBACK_SECS;
        let since = tracker.subscription_since();
        assert!(since >= expected - 5u64 && since <= expected + 5u64);
    }
}

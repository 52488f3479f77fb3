// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! NIP-13 proof of work
//!
//! Mining appends a `["nonce", <nonce>, <target>]` tag to an event template
//! until the event id carries the requested number of leading zero bits.
//!
//! <https://github.com/nostr-protocol/nips/blob/master/13.md>

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::event::{Event, EventId, Tag, UnsignedEvent};
use crate::Timestamp;

/// Default wall-clock budget for a mining call
pub const DEFAULT_MINING_TIMEOUT: Duration = Duration::from_secs(300);

/// Workers poll the cancellation flag and the deadline once per batch of
/// this many nonces, so a cancelled call never runs away.
const CANCEL_CHECK_INTERVAL: u64 = 8_192;

/// Refresh the template's `created_at` once per this many nonces, keeping
/// long mining runs from emitting stale timestamps.
const CREATED_AT_REFRESH_INTERVAL: u64 = 1_048_576;

/// NIP-13 error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Mining deadline exceeded
    #[error("proof-of-work target of {difficulty} bits not reached within {timeout:?}")]
    Timeout {
        /// Requested leading-zero-bit target
        difficulty: u8,
        /// Wall-clock budget that elapsed
        timeout: Duration,
    },
    /// Worker spawn failure
    #[error("failed to spawn mining worker: {0}")]
    ThreadSpawn(#[from] std::io::Error),
    /// All workers exited without reporting a solution
    #[error("mining workers exited without a solution")]
    NoSolution,
}

/// Count leading zero bits. Result is between 0 and 255.
#[inline]
pub fn get_leading_zero_bits<T>(h: T) -> u8
where
    T: AsRef<[u8]>,
{
    let mut res: u8 = 0;
    for b in h.as_ref().iter() {
        if *b == 0 {
            res = res.saturating_add(8);
        } else {
            res += b.leading_zeros() as u8;
            return res;
        }
    }
    res
}

/// Mine `template` to `difficulty` leading zero bits with `workers` threads.
///
/// Returns a template identical to the input except for exactly one trailing
/// `nonce` tag (and a possibly refreshed `created_at`). With `difficulty`
/// of zero the template is returned unchanged. Workers run on dedicated OS
/// threads, partition the nonce space by stride, and exit within a bounded
/// batch of iterations after the first solution or the deadline.
pub fn mine_event(
    template: UnsignedEvent,
    difficulty: u8,
    workers: usize,
    timeout: Duration,
) -> Result<UnsignedEvent, Error> {
    if difficulty == 0 {
        return Ok(template);
    }

    let workers: usize = workers.max(1);
    let deadline: Instant = Instant::now() + timeout;
    let found: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<UnsignedEvent>();

    // Any stale nonce tag is replaced by the freshly mined one
    let mut base: UnsignedEvent = template;
    base.tags.retain(|tag| !matches!(tag, Tag::Nonce { .. }));

    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);
    for worker in 0..workers {
        let template: UnsignedEvent = base.clone();
        let worker_found: Arc<AtomicBool> = found.clone();
        let tx: mpsc::Sender<UnsignedEvent> = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("nostrmq-pow-{worker}"))
            .spawn(move || {
                mine_worker(
                    template,
                    difficulty,
                    worker as u128,
                    workers as u128,
                    deadline,
                    worker_found,
                    tx,
                )
            });
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                // Stop the workers already started before bailing out
                found.store(true, Ordering::SeqCst);
                for handle in handles.into_iter() {
                    let _ = handle.join();
                }
                return Err(Error::ThreadSpawn(e));
            }
        }
    }
    drop(tx);

    let result: Result<UnsignedEvent, Error> = match rx.recv_timeout(timeout) {
        Ok(mined) => Ok(mined),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::Timeout {
            difficulty,
            timeout,
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::NoSolution),
    };

    // Stop the losers and wait for them to exit
    found.store(true, Ordering::SeqCst);
    for handle in handles.into_iter() {
        let _ = handle.join();
    }

    result
}

fn mine_worker(
    mut template: UnsignedEvent,
    difficulty: u8,
    start: u128,
    stride: u128,
    deadline: Instant,
    found: Arc<AtomicBool>,
    tx: mpsc::Sender<UnsignedEvent>,
) {
    let mut nonce: u128 = start;
    let mut iterations: u64 = 0;

    template.tags.push(Tag::Nonce { nonce, difficulty });

    loop {
        if let Some(last) = template.tags.last_mut() {
            *last = Tag::Nonce { nonce, difficulty };
        }
        template.recompute_id();

        if get_leading_zero_bits(template.id) >= difficulty {
            // First solution wins; the rest are discarded
            if !found.swap(true, Ordering::SeqCst) {
                tracing::debug!(
                    difficulty = %difficulty,
                    nonce = %nonce,
                    iterations = %iterations,
                    "Proof of work found."
                );
                let _ = tx.send(template);
            }
            return;
        }

        nonce += stride;
        iterations += 1;

        if iterations % CANCEL_CHECK_INTERVAL == 0 {
            if found.load(Ordering::SeqCst) || Instant::now() >= deadline {
                return;
            }
            if iterations % CREATED_AT_REFRESH_INTERVAL == 0 {
                template.created_at = Timestamp::now();
            }
        }
    }
}

/// Check an event's proof of work against `difficulty`.
///
/// Valid iff the target is zero, or a `nonce` tag declares at least
/// `difficulty` bits **and** the id actually carries them. The leading-zero
/// count is always recomputed from the id; the declared value alone proves
/// nothing.
pub fn has_valid_pow(event: &Event, difficulty: u8) -> bool {
    if difficulty == 0 {
        return true;
    }
    match event.pow_nonce() {
        Some((_, declared)) if declared >= difficulty => event.id.check_pow(difficulty),
        _ => false,
    }
}

/// Check that a bare event id (hex) carries `difficulty` leading zero bits
pub fn validate_pow_difficulty(id: &str, difficulty: u8) -> bool {
    match EventId::from_hex(id) {
        Ok(id) => id.check_pow(difficulty),
        Err(_) => false,
    }
}

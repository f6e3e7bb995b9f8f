//! Rotating gate codes.
//!
//! One code is live per event. A code is two random three-digit groups
//! (`"472-910"`); it is superseded the moment a new one is issued, either by
//! the rotation task when the countdown reaches zero or by a manual refresh.
//!
//! The backend is the source of truth. When it cannot be reached the manager
//! fabricates a code locally with the same TTL so the gate never blocks.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::backend::{EventBackend, IssuedCode};
use crate::error::ScanError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessCode {
    pub event_id: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Fresh `NNN-NNN` code, both groups in `[100, 999]`.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let a: u16 = rng.gen_range(100..=999);
    let b: u16 = rng.gen_range(100..=999);
    format!("{a}-{b}")
}

/// Canonical `NNN-NNN` form of operator input, or `None` if it is not a code.
///
/// Surrounding whitespace is ignored and the hyphen is optional.
pub fn normalize_code(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let digits: String = match trimmed.len() {
        6 => trimmed.to_owned(),
        7 if trimmed.as_bytes()[3] == b'-' => trimmed.replacen('-', "", 1),
        _ => return None,
    };
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}", &digits[..3], &digits[3..]))
}

/// Snapshot published by a rotation task once per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub event_id: String,
    pub code: String,
    pub remaining_seconds: u64,
    pub expires_at: DateTime<Utc>,
    /// Automatic rotations performed by this task so far.
    pub rotations: u64,
}

/// Seconds between attempts to replace a fallback code while rotating.
const RECOVERY_RETRY_SECS: u64 = 10;

#[derive(Debug, Clone)]
struct CachedCode {
    code: AccessCode,
    generation: u64,
    /// Generated locally because the backend could not be reached; the
    /// backend does not know this code.
    fallback: bool,
}

struct Rotation {
    token: CancellationToken,
    handle: JoinHandle<()>,
    countdown: watch::Receiver<Countdown>,
}

/// Issues, caches and rotates gate codes per event.
pub struct AccessCodeManager {
    backend: Arc<dyn EventBackend>,
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedCode>>,
    generation: std::sync::atomic::AtomicU64,
    rotations: Mutex<HashMap<String, Rotation>>,
}

impl AccessCodeManager {
    pub fn new(backend: Arc<dyn EventBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            cache: RwLock::new(HashMap::new()),
            generation: std::sync::atomic::AtomicU64::new(0),
            rotations: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Requests a fresh code, falling back to a local one if the backend fails.
    pub async fn issue(&self, event_id: &str) -> AccessCode {
        let remote = self.backend.issue_access_code(event_id).await;
        self.adopt(event_id, remote).await
    }

    /// Cached code if still valid, otherwise a newly issued one.
    ///
    /// A cached fallback code is replaced as soon as the backend answers
    /// again, since validation only accepts codes the backend issued.
    pub async fn current(&self, event_id: &str) -> AccessCode {
        let cached = self.cache.read().await.get(event_id).cloned();
        if let Some(cached) = cached {
            if !cached.code.is_expired_at(Utc::now()) {
                if cached.fallback {
                    return self.recover(event_id).await.unwrap_or(cached.code);
                }
                return cached.code;
            }
        }
        self.issue(event_id).await
    }

    /// Swaps a fallback code for a backend-issued one. `None` while the
    /// backend is still unreachable; the fallback stays in place.
    async fn recover(&self, event_id: &str) -> Option<AccessCode> {
        match self.backend.issue_access_code(event_id).await {
            Ok(issued) => {
                tracing::info!(%event_id, "backend reachable again; replacing fallback access code");
                Some(self.adopt(event_id, Ok(issued)).await)
            }
            Err(err) => {
                tracing::debug!(%event_id, error = %err, "backend still unreachable");
                None
            }
        }
    }

    async fn is_fallback(&self, event_id: &str) -> bool {
        self.cache
            .read()
            .await
            .get(event_id)
            .is_some_and(|c| c.fallback)
    }

    /// Forces a rotation regardless of the remaining TTL.
    pub async fn refresh(&self, event_id: &str) -> AccessCode {
        let remote = self.backend.refresh_access_code(event_id).await;
        self.adopt(event_id, remote).await
    }

    pub async fn cached(&self, event_id: &str) -> Option<AccessCode> {
        self.cache
            .read()
            .await
            .get(event_id)
            .map(|c| c.code.clone())
    }

    async fn cached_generation(&self, event_id: &str) -> Option<u64> {
        self.cache.read().await.get(event_id).map(|c| c.generation)
    }

    async fn adopt(&self, event_id: &str, remote: Result<IssuedCode, ScanError>) -> AccessCode {
        let issued_at = Utc::now();
        let fallback = remote.is_err();
        let code = match remote {
            Ok(issued) => AccessCode {
                event_id: event_id.to_owned(),
                code: issued.code,
                issued_at,
                expires_at: issued.expires_at,
            },
            Err(err) => {
                tracing::warn!(%event_id, error = %err, "access code issuance failed; generating locally");
                AccessCode {
                    event_id: event_id.to_owned(),
                    code: generate_code(),
                    issued_at,
                    expires_at: issued_at
                        + chrono::Duration::from_std(self.ttl)
                            .unwrap_or_else(|_| chrono::Duration::seconds(300)),
                }
            }
        };

        let generation = self
            .generation
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        self.cache.write().await.insert(
            event_id.to_owned(),
            CachedCode {
                code: code.clone(),
                generation,
                fallback,
            },
        );
        tracing::info!(%event_id, expires_at = %code.expires_at, "access code issued");
        code
    }

    /// Starts the one-second rotation task for `event_id`.
    ///
    /// Returns the countdown and whether this call started the task; starting
    /// an already running rotation returns the existing countdown and `false`.
    pub async fn start_rotation(
        self: &Arc<Self>,
        event_id: &str,
    ) -> (watch::Receiver<Countdown>, bool) {
        if let Some(existing) = self.countdown(event_id).await {
            return (existing, false);
        }

        // Issued before taking the lock: this may wait on the backend.
        let code = self.current(event_id).await;

        let mut rotations = self.rotations.lock().await;
        if let Some(existing) = rotations.get(event_id) {
            if !existing.handle.is_finished() {
                return (existing.countdown.clone(), false);
            }
        }

        let ttl_secs = self.ttl.as_secs().max(1);
        let left_ms = (code.expires_at - Utc::now()).num_milliseconds();
        let remaining = ((left_ms + 999) / 1000).clamp(1, ttl_secs as i64) as u64;

        let (tx, rx) = watch::channel(Countdown {
            event_id: event_id.to_owned(),
            code: code.code.clone(),
            remaining_seconds: remaining,
            expires_at: code.expires_at,
            rotations: 0,
        });
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_rotation(
            Arc::clone(self),
            event_id.to_owned(),
            remaining,
            token.clone(),
            tx,
        ));

        tracing::info!(%event_id, ttl_secs, "access code rotation started");
        rotations.insert(
            event_id.to_owned(),
            Rotation {
                token,
                handle,
                countdown: rx.clone(),
            },
        );
        (rx, true)
    }

    /// Countdown of a running rotation, if any.
    pub async fn countdown(&self, event_id: &str) -> Option<watch::Receiver<Countdown>> {
        self.rotations
            .lock()
            .await
            .get(event_id)
            .filter(|r| !r.handle.is_finished())
            .map(|r| r.countdown.clone())
    }

    /// Stops the rotation for `event_id`. Returns whether one was running.
    pub async fn stop_rotation(&self, event_id: &str) -> bool {
        let Some(rotation) = self.rotations.lock().await.remove(event_id) else {
            return false;
        };
        rotation.token.cancel();
        let _ = rotation.handle.await;
        tracing::info!(%event_id, "access code rotation stopped");
        true
    }

    /// Stops every rotation task; used on shutdown.
    pub async fn stop_all(&self) {
        let drained: Vec<(String, Rotation)> = self.rotations.lock().await.drain().collect();
        for (event_id, rotation) in drained {
            rotation.token.cancel();
            let _ = rotation.handle.await;
            tracing::debug!(%event_id, "access code rotation stopped");
        }
    }
}

async fn run_rotation(
    manager: Arc<AccessCodeManager>,
    event_id: String,
    mut remaining: u64,
    token: CancellationToken,
    tx: watch::Sender<Countdown>,
) {
    let ttl_secs = manager.ttl.as_secs().max(1);
    let mut seen_generation = manager.cached_generation(&event_id).await.unwrap_or(0);
    let mut rotations = 0u64;
    let mut since_recovery = 0u64;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        since_recovery += 1;
        if since_recovery >= RECOVERY_RETRY_SECS && manager.is_fallback(&event_id).await {
            since_recovery = 0;
            manager.recover(&event_id).await;
        }

        // A manual refresh or a recovered code restarts the countdown.
        if let Some(generation) = manager.cached_generation(&event_id).await {
            if generation != seen_generation {
                seen_generation = generation;
                remaining = ttl_secs;
            }
        }

        remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            manager.issue(&event_id).await;
            seen_generation = manager.cached_generation(&event_id).await.unwrap_or(0);
            remaining = ttl_secs;
            rotations += 1;
        }

        let Some(code) = manager.cached(&event_id).await else {
            break;
        };
        tracing::debug!(%event_id, remaining, "access code tick");
        tx.send_replace(Countdown {
            event_id: event_id.clone(),
            code: code.code,
            remaining_seconds: remaining,
            expires_at: code.expires_at,
            rotations,
        });
    }
}

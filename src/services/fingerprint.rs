use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{EmotionalEvent, EmotionalFingerprint, PreferenceUpdate, RawEvent, UserId},
    services::{
        clock::Clock,
        ingest::normalize_event,
        ports::{EventLog, ProfileStore},
        updater,
    },
};

/// Owns every write to a user's fingerprint.
///
/// Writes for one user are serialized through a per-user async lock and committed
/// with a version-checked compare-and-swap, so concurrent events never lose an
/// update even when several processes share the same store.
pub struct FingerprintService {
    store: Arc<dyn ProfileStore>,
    events: Arc<dyn EventLog>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl FingerprintService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        events: Arc<dyn EventLog>,
        clock: Arc<dyn Clock>,
        max_retries: u32,
    ) -> Self {
        Self {
            store,
            events,
            clock,
            max_retries: max_retries.max(1),
            user_locks: DashMap::new(),
        }
    }

    /// Normalizes a raw event, folds it into the fingerprint and then appends it to
    /// the log.
    ///
    /// The log only receives events whose fingerprint update committed, so a request
    /// rejected with `Conflict` can be retried without duplicating history.
    pub async fn record_event(
        &self,
        user_id: UserId,
        raw: RawEvent,
    ) -> AppResult<(EmotionalEvent, EmotionalFingerprint)> {
        let event = normalize_event(user_id, raw, self.clock.now())?;

        let fingerprint = self
            .mutate(user_id, |current| updater::apply_event(current, &event))
            .await?;
        self.events.append(&event).await?;

        tracing::debug!(
            user_id = %user_id,
            event_type = %event.event_type,
            data_points = fingerprint.data_points,
            "Event applied to fingerprint"
        );

        Ok((event, fingerprint))
    }

    /// Current fingerprint, created with defaults on first access
    pub async fn get_fingerprint(&self, user_id: UserId) -> AppResult<EmotionalFingerprint> {
        self.store
            .get_or_create_fingerprint(user_id, self.clock.now())
            .await
    }

    pub async fn update_preferences(
        &self,
        user_id: UserId,
        update: PreferenceUpdate,
    ) -> AppResult<EmotionalFingerprint> {
        let now = self.clock.now();
        self.mutate(user_id, |current| {
            updater::apply_preferences(current, &update, now)
        })
        .await
    }

    pub async fn reset(&self, user_id: UserId) -> AppResult<EmotionalFingerprint> {
        let now = self.clock.now();
        let fingerprint = self
            .mutate(user_id, |current| updater::reset(current, now))
            .await?;
        tracing::info!(user_id = %user_id, "Fingerprint reset");
        Ok(fingerprint)
    }

    fn lock_for(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Read-modify-write under the user's lock, retried on version conflicts.
    ///
    /// The lock entry is dropped again once no other writer holds or waits on it.
    async fn mutate<F>(&self, user_id: UserId, transition: F) -> AppResult<EmotionalFingerprint>
    where
        F: Fn(&EmotionalFingerprint) -> EmotionalFingerprint,
    {
        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.commit(user_id, transition).await
        };
        drop(lock);

        self.user_locks.remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn commit<F>(&self, user_id: UserId, transition: F) -> AppResult<EmotionalFingerprint>
    where
        F: Fn(&EmotionalFingerprint) -> EmotionalFingerprint,
    {
        for attempt in 1..=self.max_retries {
            let current = self
                .store
                .get_or_create_fingerprint(user_id, self.clock.now())
                .await?;
            let expected = current.version;

            let mut next = transition(&current);
            next.version = expected + 1;

            if self
                .store
                .compare_and_swap_fingerprint(&next, expected)
                .await?
            {
                return Ok(next);
            }

            tracing::warn!(
                user_id = %user_id,
                attempt,
                expected_version = expected,
                "Fingerprint version conflict, retrying"
            );
        }

        Err(AppError::Conflict(format!(
            "fingerprint for user {} kept changing after {} attempts",
            user_id, self.max_retries
        )))
    }
}

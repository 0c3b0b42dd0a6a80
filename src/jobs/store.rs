use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{Job, JobId, JobUpdate};

struct Entry {
    job: Job,
    // Monotonic insertion time; `job.created_at` is only for clients.
    inserted: Instant,
}

/// In-memory job records for the lifetime of the process.
///
/// Records live for `retention` from creation regardless of their state. Reads
/// treat an aged record as gone immediately; the sweeper reclaims the memory.
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Entry>>,
    retention: Duration,
}

impl JobStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub fn create(&self) -> Job {
        let mut jobs = self.write();

        let mut job = Job::new();
        while jobs.contains_key(&job.id) {
            job.id = JobId::generate();
        }

        jobs.insert(
            job.id.clone(),
            Entry {
                job: job.clone(),
                inserted: Instant::now(),
            },
        );

        job
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        let now = Instant::now();
        self.read()
            .get(id)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.job.clone())
    }

    /// Apply `update` to a live job and return the resulting record.
    ///
    /// Unknown or aged ids return `None` without creating anything. Updates to a
    /// job that has already finished are dropped and the finished record is
    /// returned as-is.
    pub fn update(&self, id: &JobId, update: JobUpdate) -> Option<Job> {
        let now = Instant::now();
        let mut jobs = self.write();

        let entry = jobs.get_mut(id)?;
        if self.is_expired(entry, now) {
            return None;
        }

        if !entry.job.apply(update.clone()) {
            tracing::warn!(
                job_id = %id,
                status = %entry.job.status,
                ?update,
                "Ignoring illegal job transition"
            );
        }

        Some(entry.job.clone())
    }

    /// Remove every record older than the retention window, terminal or not.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, entry| !self.is_expired(entry, now));
        before - jobs.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the periodic eviction sweep.
    ///
    /// The task only holds a weak reference, so it ends on its own once the
    /// store is dropped. Abort the handle to stop it earlier.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(store) = store.upgrade() else {
                    tracing::debug!("Job store dropped, stopping sweeper");
                    break;
                };

                let evicted = store.evict_expired();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = store.len(), "Evicted expired jobs");
                }
            }
        })
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted) > self.retention
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, Entry>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, Entry>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

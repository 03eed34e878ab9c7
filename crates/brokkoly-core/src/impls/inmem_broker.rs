//! InMemoryBroker - 開発・テスト用のブローカー
//!
//! 本番のブローカー（Redis 等）の代わりに、投入されたジョブをメモリに記録します。
//! `run_pending()` を呼ぶと bind された handler で pending のジョブを順に実行します。
//!
//! # 実装詳細
//! - `std::sync::Mutex` で状態を保護（await をまたいでロックを保持しない）
//! - location ごとに 1 つのブローカーを共有（`InMemoryConnector`）
//! - 終了したジョブは `Retention` に従って `run_pending()` の最後に捨てる

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::domain::{BrokerError, JobHandle, JobState, Payload};
use crate::observability::JobCounts;
use crate::ports::{Broker, BrokerConnector, Clock, IdGenerator, RemoteTask, SystemClock, UlidGenerator};
use crate::typed::DynHandler;

/// Locations this connector accepts start with this scheme.
pub const MEMORY_SCHEME: &str = "memory://";

/// One submitted job, as the broker sees it.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job: JobHandle,
    pub task: String,
    pub kwargs: Payload,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// How long finished (succeeded / failed) jobs stay queryable.
///
/// Pending and started jobs are never dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Finished jobs older than this, by the broker's clock, are dropped.
    pub max_age: Duration,
    /// At most this many finished jobs are kept; the oldest go first.
    pub max_finished: usize,
}

impl Retention {
    pub fn keep_for(max_age: std::time::Duration) -> Self {
        Self {
            max_age: Duration::from_std(max_age).unwrap_or(Self::default().max_age),
            ..Self::default()
        }
    }
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            max_age: Duration::hours(1),
            max_finished: 10_000,
        }
    }
}

struct BrokerState {
    handlers: HashMap<String, Arc<dyn DynHandler>>,
    jobs: HashMap<JobHandle, JobRecord>,
    /// Submission order, for inspection.
    order: Vec<JobHandle>,
    pending: VecDeque<JobHandle>,
    available: bool,
}

impl BrokerState {
    /// Drop finished jobs outside `retention`. Returns how many were dropped.
    fn evict(&mut self, now: DateTime<Utc>, retention: &Retention) -> usize {
        let cutoff = now.checked_sub_signed(retention.max_age);
        let mut finished = self
            .order
            .iter()
            .filter(|id| self.jobs.get(*id).is_some_and(|r| r.state.is_terminal()))
            .count();

        let before = self.order.len();
        let jobs = &mut self.jobs;
        self.order.retain(|id| {
            let Some(record) = jobs.get(id) else {
                return false;
            };
            if !record.state.is_terminal() {
                return true;
            }
            let expired = match (cutoff, record.finished_at) {
                (Some(cutoff), Some(at)) => at <= cutoff,
                _ => false,
            };
            if expired || finished > retention.max_finished {
                jobs.remove(id);
                finished -= 1;
                return false;
            }
            true
        });
        before - self.order.len()
    }
}

struct Shared {
    state: Mutex<BrokerState>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    retention: Retention,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, BrokerState>, BrokerError> {
        self.state
            .lock()
            .map_err(|_| BrokerError::Unavailable("broker state lock poisoned".to_string()))
    }
}

pub struct InMemoryBroker {
    location: String,
    shared: Arc<Shared>,
}

impl InMemoryBroker {
    pub fn new(location: impl Into<String>) -> Self {
        Self::with_clock(location, SystemClock)
    }

    pub fn with_clock<C: Clock + Clone + 'static>(location: impl Into<String>, clock: C) -> Self {
        Self::with_options(location, clock, Retention::default())
    }

    pub fn with_options<C: Clock + Clone + 'static>(
        location: impl Into<String>,
        clock: C,
        retention: Retention,
    ) -> Self {
        Self {
            location: location.into(),
            shared: Arc::new(Shared {
                state: Mutex::new(BrokerState {
                    handlers: HashMap::new(),
                    jobs: HashMap::new(),
                    order: Vec::new(),
                    pending: VecDeque::new(),
                    available: true,
                }),
                ids: Box::new(UlidGenerator::new(clock.clone())),
                clock: Box::new(clock),
                retention,
            }),
        }
    }

    /// Simulate the broker going away (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) -> Result<(), BrokerError> {
        self.shared.lock()?.available = available;
        Ok(())
    }

    /// Jobs submitted for `task` and still retained, in submission order.
    pub fn jobs(&self, task: &str) -> Result<Vec<JobRecord>, BrokerError> {
        let state = self.shared.lock()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .filter(|record| record.task == task)
            .cloned()
            .collect())
    }

    pub fn counts(&self) -> Result<JobCounts, BrokerError> {
        let state = self.shared.lock()?;
        let mut counts = JobCounts::default();
        for record in state.jobs.values() {
            counts.record(record.state);
        }
        Ok(counts)
    }

    /// Run every pending job with its bound handler, then drop finished jobs
    /// outside the retention. Returns how many ran.
    pub async fn run_pending(&self) -> Result<usize, BrokerError> {
        let mut ran = 0;
        loop {
            // ロックは handler の実行前に手放す
            let (job, handler, kwargs) = {
                let mut state = self.shared.lock()?;
                let Some(job) = state.pending.pop_front() else {
                    break;
                };
                let Some(record) = state.jobs.get_mut(&job) else {
                    continue;
                };
                record.state = JobState::Started;
                let task = record.task.clone();
                let kwargs = record.kwargs.clone();
                let handler = state
                    .handlers
                    .get(&task)
                    .cloned()
                    .ok_or(BrokerError::UnboundTask(task))?;
                (job, handler, kwargs)
            };

            let result = handler.handle_dyn(kwargs).await;
            ran += 1;

            let mut state = self.shared.lock()?;
            let now = self.shared.clock.now();
            if let Some(record) = state.jobs.get_mut(&job) {
                record.finished_at = Some(now);
                match result {
                    Ok(()) => {
                        debug!(%job, task = %record.task, "job succeeded");
                        record.state = JobState::Succeeded;
                    }
                    Err(e) => {
                        warn!(%job, task = %record.task, error = %e, "job failed");
                        record.state = JobState::Failed;
                        record.last_error = Some(e.to_string());
                    }
                }
            }
        }

        let mut state = self.shared.lock()?;
        let now = self.shared.clock.now();
        let dropped = state.evict(now, &self.shared.retention);
        if dropped > 0 {
            debug!(dropped, retained = state.order.len(), "dropped finished jobs");
        }
        Ok(ran)
    }
}

impl Broker for InMemoryBroker {
    fn location(&self) -> &str {
        &self.location
    }

    fn bind_task(
        &self,
        name: &str,
        handler: Arc<dyn DynHandler>,
    ) -> Result<Arc<dyn RemoteTask>, BrokerError> {
        self.shared
            .lock()?
            .handlers
            .insert(name.to_string(), handler);
        Ok(Arc::new(InMemoryRemoteTask {
            name: name.to_string(),
            shared: self.shared.clone(),
        }))
    }
}

struct InMemoryRemoteTask {
    name: String,
    shared: Arc<Shared>,
}

#[async_trait]
impl RemoteTask for InMemoryRemoteTask {
    async fn submit(&self, kwargs: Payload) -> Result<JobHandle, BrokerError> {
        let mut state = self.shared.lock()?;
        if !state.available {
            return Err(BrokerError::Unavailable("in-memory broker is paused".to_string()));
        }
        if !state.handlers.contains_key(&self.name) {
            return Err(BrokerError::UnboundTask(self.name.clone()));
        }

        let job = self.shared.ids.generate_job_handle();
        state.jobs.insert(
            job,
            JobRecord {
                job,
                task: self.name.clone(),
                kwargs,
                state: JobState::Pending,
                submitted_at: self.shared.clock.now(),
                finished_at: None,
                last_error: None,
            },
        );
        state.order.push(job);
        state.pending.push_back(job);
        info!(%job, task = %self.name, "job accepted");
        Ok(job)
    }

    async fn status(&self, job: &JobHandle) -> Result<JobState, BrokerError> {
        let state = self.shared.lock()?;
        state
            .jobs
            .get(job)
            .filter(|record| record.task == self.name)
            .map(|record| record.state)
            .ok_or(BrokerError::UnknownJob(*job))
    }
}

/// Connects `memory://...` locations; one broker per location.
#[derive(Default)]
pub struct InMemoryConnector {
    brokers: Mutex<HashMap<String, Arc<InMemoryBroker>>>,
    retention: Retention,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brokers connected from now on keep finished jobs per `retention`.
    pub fn with_retention(retention: Retention) -> Self {
        Self {
            brokers: Mutex::default(),
            retention,
        }
    }

    /// The broker previously connected for `location`, if any.
    pub fn broker(&self, location: &str) -> Option<Arc<InMemoryBroker>> {
        self.brokers.lock().ok()?.get(location).cloned()
    }
}

impl BrokerConnector for InMemoryConnector {
    fn connect(&self, queue: &str, location: &str) -> Result<Arc<dyn Broker>, BrokerError> {
        if !location.starts_with(MEMORY_SCHEME) {
            return Err(BrokerError::UnsupportedLocation(location.to_string()));
        }
        let mut brokers = self
            .brokers
            .lock()
            .map_err(|_| BrokerError::Unavailable("connector lock poisoned".to_string()))?;
        let broker = brokers
            .entry(location.to_string())
            .or_insert_with(|| {
                debug!(queue, location, "connecting in-memory broker");
                Arc::new(InMemoryBroker::with_options(
                    location,
                    SystemClock,
                    self.retention,
                ))
            })
            .clone();
        Ok(broker)
    }
}

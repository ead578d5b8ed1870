//! Job arena.
//!
//! Jobs are keyed by id in a sharded concurrent map. Each job carries its
//! own synchronization: the chunk map is itself concurrent so uploads to
//! distinct indices never wait on each other, and the lifecycle record sits
//! behind a per-job mutex that is only held for non-async critical sections.
//! Unrelated jobs never contend on a common lock.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use amux_models::{Artifact, ChunkRef, JobId, JobStatus, RenderErrorRecord};

/// Lifecycle record of one job.
///
/// `status` and the timestamps are written by the lifecycle manager;
/// `artifact` and `last_error` carry the orchestrator's outcome and are
/// applied together with the status transition that ends a render.
#[derive(Debug, Clone)]
pub struct JobState {
    pub(crate) status: JobStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) finalized_at: Option<DateTime<Utc>>,
    pub(crate) rendered_at: Option<DateTime<Utc>>,
    pub(crate) artifact: Option<Artifact>,
    pub(crate) last_error: Option<RenderErrorRecord>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl JobState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Collecting,
            created_at: now,
            finalized_at: None,
            rendered_at: None,
            artifact: None,
            last_error: None,
            updated_at: now,
        }
    }

    /// Bump `updated_at`, never moving it backwards.
    pub(crate) fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// One job in the arena.
#[derive(Debug)]
pub struct JobEntry {
    id: JobId,
    /// Index -> chunk; mutated only by the chunk registry
    pub(crate) chunks: DashMap<u64, ChunkRef>,
    /// Mutated only by the lifecycle manager
    state: Mutex<JobState>,
}

impl JobEntry {
    fn new(id: JobId) -> Self {
        Self {
            id,
            chunks: DashMap::new(),
            state: Mutex::new(JobState::new(Utc::now())),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Lock the lifecycle record.
    ///
    /// Critical sections never panic while holding the lock, but a poisoned
    /// mutex is still recovered so one bad caller cannot wedge the job.
    pub(crate) fn state(&self) -> MutexGuard<'_, JobState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current status.
    pub fn status(&self) -> JobStatus {
        self.state().status
    }

    /// Copy of the lifecycle record.
    pub(crate) fn snapshot(&self) -> JobState {
        self.state().clone()
    }
}

/// Outcome of [`JobStore::insert_chunk`].
#[derive(Debug)]
pub(crate) struct ChunkInsert {
    pub job: Arc<JobEntry>,
    /// The job did not exist before this chunk
    pub created: bool,
    /// Chunk previously registered at the same index
    pub replaced: Option<ChunkRef>,
}

/// Arena of all known jobs.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: DashMap<JobId, Arc<JobEntry>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a job.
    pub fn get(&self, id: &JobId) -> Option<Arc<JobEntry>> {
        self.jobs.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Register a chunk, creating its job in `Collecting` if absent.
    ///
    /// A new job is published to the arena with its first chunk already in
    /// place, so no reader ever sees a job without chunks. The map shard is
    /// released before an existing job's chunk map is touched.
    pub(crate) fn insert_chunk(&self, id: &JobId, chunk: ChunkRef) -> ChunkInsert {
        let job = match self.jobs.entry(id.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let job = JobEntry::new(id.clone());
                job.chunks.insert(chunk.index, chunk);
                let job = Arc::new(job);
                entry.insert(Arc::clone(&job));
                return ChunkInsert {
                    job,
                    created: true,
                    replaced: None,
                };
            }
        };

        let replaced = job.chunks.insert(chunk.index, chunk);
        ChunkInsert {
            job,
            created: false,
            replaced,
        }
    }

    /// Number of known jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

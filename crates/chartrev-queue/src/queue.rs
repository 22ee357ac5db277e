// queue.rs — WorkQueue trait and its two implementations.
//
// The engine only needs "enqueue(kind, payload)"; delivery guarantees belong
// to whatever transport sits behind the trait.
//
// - MemoryQueue: keeps jobs in a Vec. Used by tests and embedders that drain
//   jobs themselves.
// - JsonlQueue: appends each job as one JSON line to an outbox file that an
//   external relay tails and forwards.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use crate::error::QueueError;
use crate::job::{QueuedJob, ReindexJob};

/// Fire-and-forget job submission.
pub trait WorkQueue: Send + Sync {
    /// Submit a job. Returns the job id assigned by the queue.
    fn enqueue(&self, kind: &str, payload: serde_json::Value) -> Result<Uuid, QueueError>;
}

/// In-memory queue.
#[derive(Default)]
pub struct MemoryQueue {
    jobs: Mutex<Vec<QueuedJob>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every job enqueued so far.
    pub fn jobs(&self) -> Vec<QueuedJob> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reindex payloads of the given kind, in enqueue order.
    pub fn reindex_jobs(&self, kind: &str) -> Vec<ReindexJob> {
        self.jobs()
            .iter()
            .filter(|j| j.kind == kind)
            .filter_map(|j| j.reindex().ok())
            .collect()
    }

    /// Remove and return every queued job.
    pub fn drain(&self) -> Vec<QueuedJob> {
        std::mem::take(&mut *self.jobs.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl WorkQueue for MemoryQueue {
    fn enqueue(&self, kind: &str, payload: serde_json::Value) -> Result<Uuid, QueueError> {
        let job = QueuedJob::new(kind, payload);
        let job_id = job.job_id;
        self.jobs
            .lock()
            .map_err(|_| QueueError::LockPoisoned)?
            .push(job);
        Ok(job_id)
    }
}

/// Outbox queue writing one JSON line per job.
pub struct JsonlQueue {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlQueue {
    /// Open (or create) the outbox file in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| QueueError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| QueueError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every job written to an outbox file, oldest first.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<QueuedJob>, QueueError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| QueueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut jobs = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| QueueError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            jobs.push(serde_json::from_str(&line)?);
        }
        Ok(jobs)
    }
}

impl WorkQueue for JsonlQueue {
    fn enqueue(&self, kind: &str, payload: serde_json::Value) -> Result<Uuid, QueueError> {
        let job = QueuedJob::new(kind, payload);
        let line = serde_json::to_string(&job)?;

        let mut writer = self.writer.lock().map_err(|_| QueueError::LockPoisoned)?;
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|source| QueueError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(job_id = %job.job_id, kind = %kind, "job written to outbox");
        Ok(job.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::REINDEX_JOB_KIND;
    use tempfile::tempdir;

    fn reindex_payload(revision: u64) -> serde_json::Value {
        serde_json::to_value(ReindexJob {
            workspace_id: Uuid::new_v4(),
            file_id: Uuid::new_v4(),
            file_path: "values.yaml".into(),
            revision,
        })
        .unwrap()
    }

    #[test]
    fn memory_queue_records_and_drains() {
        let queue = MemoryQueue::new();
        queue.enqueue(REINDEX_JOB_KIND, reindex_payload(1)).unwrap();
        queue
            .enqueue("other.kind", serde_json::json!({"x": 1}))
            .unwrap();

        assert_eq!(queue.len(), 2);
        let reindex = queue.reindex_jobs(REINDEX_JOB_KIND);
        assert_eq!(reindex.len(), 1);
        assert_eq!(reindex[0].revision, 1);

        assert_eq!(queue.drain().len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn jsonl_queue_appends_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("outbox").join("jobs.jsonl");

        let first = {
            let queue = JsonlQueue::open(&path).unwrap();
            queue.enqueue(REINDEX_JOB_KIND, reindex_payload(1)).unwrap()
        };
        {
            let queue = JsonlQueue::open(&path).unwrap();
            queue.enqueue(REINDEX_JOB_KIND, reindex_payload(2)).unwrap();
        }

        let jobs = JsonlQueue::read_all(&path).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_id, first);
        assert_eq!(jobs[1].reindex().unwrap().revision, 2);
    }

    #[test]
    fn jsonl_queue_is_safe_to_share_between_threads() {
        let dir = tempdir().unwrap();
        let queue = JsonlQueue::open(dir.path().join("jobs.jsonl")).unwrap();

        std::thread::scope(|scope| {
            for i in 0..4 {
                let queue = &queue;
                scope.spawn(move || {
                    for _ in 0..10 {
                        queue.enqueue(REINDEX_JOB_KIND, reindex_payload(i)).unwrap();
                    }
                });
            }
        });

        assert_eq!(JsonlQueue::read_all(queue.path()).unwrap().len(), 40);
    }
}

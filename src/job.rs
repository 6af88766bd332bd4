//! Run a split or merge on a worker thread and stream progress back.

use crate::merge::{self, MergeError, MergeOutcome, MergeRequest};
use crate::split::{self, SplitError, SplitOutcome, SplitRequest};
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Status shown to the user around an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Complete,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "Idle"),
            Status::Running => write!(f, "Running..."),
            Status::Complete => write!(f, "Complete!"),
        }
    }
}

#[derive(Debug)]
pub enum JobReport {
    Split(SplitOutcome),
    Merge(MergeOutcome),
}

impl JobReport {
    pub fn summary(&self) -> String {
        match self {
            JobReport::Split(outcome) => outcome.summary(),
            JobReport::Merge(outcome) => format!(
                "{} into {}",
                outcome.summary(),
                outcome.output_path.display()
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("Failed to start worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Worker stopped without reporting a result")]
    Disconnected,
}

#[derive(Debug)]
pub enum JobEvent {
    Started,
    /// One part written (split) or appended (merge).
    Progress { index: u64, bytes: u64 },
    Finished(Result<JobReport, JobError>),
}

pub struct JobHandle {
    events: Receiver<JobEvent>,
    worker: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Block until the job finishes, discarding progress.
    pub fn wait(self) -> Result<JobReport, JobError> {
        self.wait_with(|_| {})
    }

    /// Block until the job finishes, passing every event to `on_event` first.
    pub fn wait_with<F>(mut self, mut on_event: F) -> Result<JobReport, JobError>
    where
        F: FnMut(&JobEvent),
    {
        let mut result = Err(JobError::Disconnected);
        for event in self.events.iter() {
            on_event(&event);
            if let JobEvent::Finished(outcome) = event {
                result = outcome;
                break;
            }
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                return Err(JobError::Disconnected);
            }
        }
        result
    }
}

pub struct Job;

impl Job {
    pub fn spawn_split(request: SplitRequest) -> Result<JobHandle, JobError> {
        spawn("split", move |tx| {
            split::execute_with_progress(&request, |part| {
                let _ = tx.send(JobEvent::Progress {
                    index: part.index,
                    bytes: part.bytes,
                });
            })
            .map(JobReport::Split)
            .map_err(JobError::from)
        })
    }

    pub fn spawn_merge(request: MergeRequest) -> Result<JobHandle, JobError> {
        spawn("merge", move |tx| {
            merge::execute_with_progress(&request, |part| {
                let _ = tx.send(JobEvent::Progress {
                    index: part.index,
                    bytes: part.bytes,
                });
            })
            .map(JobReport::Merge)
            .map_err(JobError::from)
        })
    }
}

fn spawn<F>(name: &str, work: F) -> Result<JobHandle, JobError>
where
    F: FnOnce(&Sender<JobEvent>) -> Result<JobReport, JobError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let worker = thread::Builder::new()
        .name(format!("{name}-worker"))
        .spawn(move || {
            // The receiver may be gone if the caller stopped listening.
            let _ = tx.send(JobEvent::Started);
            let result = work(&tx);
            debug!(ok = result.is_ok(), "job finished");
            let _ = tx.send(JobEvent::Finished(result));
        })
        .map_err(JobError::Spawn)?;
    Ok(JobHandle {
        events: rx,
        worker: Some(worker),
    })
}

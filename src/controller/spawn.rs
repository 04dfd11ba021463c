//! Where request jobs run.
//!
//! The controller never blocks on the network itself: each request becomes a
//! [`Job`] handed to a [`Spawner`], and the job reports back over the
//! controller's event channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};

/// One unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Spawner {
    /// Hand `job` off. An error means the job was dropped and will never
    /// run.
    fn spawn(&self, job: Job) -> Result<()>;
}

/// One OS thread per job. Jobs are short HTTP calls bounded by the
/// transport timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, job: Job) -> Result<()> {
        thread::Builder::new()
            .name("threatwatch-fetch".to_string())
            .spawn(job)
            .context("failed to start request thread")?;
        Ok(())
    }
}

/// Runs each job to completion before returning. Used by one-shot CLI
/// commands where there is nothing to overlap with.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSpawner;

impl Spawner for InlineSpawner {
    fn spawn(&self, job: Job) -> Result<()> {
        job();
        Ok(())
    }
}

/// Holds jobs until the owner decides when (and in which order) they run.
///
/// Cloning shares the queue, so a test can keep one handle while the
/// controller owns the other.
#[derive(Clone, Default)]
pub struct QueueSpawner {
    jobs: Arc<Mutex<VecDeque<Job>>>,
}

impl QueueSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Run the oldest queued job. Returns `false` if the queue was empty.
    pub fn run_next(&self) -> Result<bool> {
        let job = self.lock()?.pop_front();
        Ok(run(job))
    }

    /// Run the most recently queued job.
    pub fn run_latest(&self) -> Result<bool> {
        let job = self.lock()?.pop_back();
        Ok(run(job))
    }

    /// Run queued jobs oldest first until the queue is empty, including jobs
    /// queued while running. Returns how many ran.
    pub fn run_all(&self) -> Result<usize> {
        let mut count = 0;
        while self.run_next()? {
            count += 1;
        }
        Ok(count)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<Job>>> {
        self.jobs
            .lock()
            .map_err(|_| anyhow::anyhow!("job queue poisoned"))
    }
}

/// Run outside the lock so a job may queue further jobs.
fn run(job: Option<Job>) -> bool {
    match job {
        Some(job) => {
            job();
            true
        }
        None => false,
    }
}

impl Spawner for QueueSpawner {
    fn spawn(&self, job: Job) -> Result<()> {
        self.lock()?.push_back(job);
        Ok(())
    }
}

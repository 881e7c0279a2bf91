use std::collections::VecDeque;

use crate::job::Job;

/// Pending jobs of one kind, awaiting a free worker slot.
///
/// Fresh submissions append at the tail; a job re-queued after a
/// retryable failure goes back at the head, so retried work is
/// serviced before newer arrivals.
#[derive(Debug, Default)]
pub(crate) struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    pub fn push_front(&mut self, job: Job) {
        self.jobs.push_front(job);
    }

    pub fn pop_front(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }
}

//! Shared crawl frontier
//!
//! The frontier owns the FIFO queue, the seen-set and every URL record of a
//! run. All three sit behind one mutex so the seen check and the enqueue are
//! a single atomic step; a URL can never be queued twice.
//!
//! Workers block in `next_job` until either a URL is queued or no job is in
//! flight anymore, at which point the crawl is over.

use crate::state::UrlState;
use crate::AuditError;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use url::Url;

/// A URL handed to a worker
///
/// `seq` is the discovery index: the seed is 0, then links in the order
/// they were first enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub seq: usize,
    pub url: Url,
}

/// Outcome of an enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Added(usize),
    /// Already seen in this run
    Duplicate,
    /// The page budget is spent
    OverBudget,
}

#[derive(Debug)]
struct UrlRecord {
    url: Url,
    state: UrlState,
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<usize>,
    records: Vec<UrlRecord>,
    seen: HashSet<String>,
    /// Jobs handed out and not yet completed
    dispatched: usize,
    cancelled: bool,
}

/// Frontier shared by all workers of one run
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    max_pages: usize,
    notify: Notify,
}

impl Frontier {
    pub fn new(max_pages: usize) -> Self {
        Self {
            inner: Mutex::new(FrontierInner::default()),
            max_pages,
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues a normalized URL unless it was seen before or the budget is spent
    pub fn try_enqueue(&self, url: Url) -> EnqueueOutcome {
        let mut inner = self.lock();

        if inner.cancelled {
            return EnqueueOutcome::OverBudget;
        }
        if inner.seen.contains(url.as_str()) {
            return EnqueueOutcome::Duplicate;
        }
        if inner.records.len() >= self.max_pages {
            return EnqueueOutcome::OverBudget;
        }

        let seq = inner.records.len();
        inner.seen.insert(url.as_str().to_string());
        inner.records.push(UrlRecord {
            url,
            state: UrlState::Queued,
        });
        inner.queue.push_back(seq);
        drop(inner);

        self.notify.notify_waiters();
        EnqueueOutcome::Added(seq)
    }

    /// Records a URL as seen without queueing it or spending budget
    ///
    /// Used for redirect targets, which are audited under the URL that
    /// redirected to them. Returns false if the URL was already seen.
    pub fn mark_seen(&self, url: &Url) -> bool {
        self.lock().seen.insert(url.as_str().to_string())
    }

    /// Waits for the next queued URL
    ///
    /// Returns `None` once the queue is empty with nothing in flight, or
    /// after `cancel`.
    pub async fn next_job(&self) -> Option<Job> {
        loop {
            // Created before the check so a wakeup between unlock and await is kept
            let notified = self.notify.notified();

            {
                let mut inner = self.lock();
                if inner.cancelled {
                    return None;
                }
                if let Some(seq) = inner.queue.pop_front() {
                    inner.dispatched += 1;
                    let url = inner.records[seq].url.clone();
                    return Some(Job { seq, url });
                }
                if inner.dispatched == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Moves a dispatched job to `Fetching`
    pub fn start_fetch(&self, seq: usize) -> Result<(), AuditError> {
        self.set_state(&mut self.lock(), seq, UrlState::Fetching)
    }

    /// Records a dispatched job's terminal state and releases it
    pub fn complete(&self, seq: usize, state: UrlState) -> Result<(), AuditError> {
        let result = {
            let mut inner = self.lock();
            inner.dispatched = inner.dispatched.saturating_sub(1);
            self.set_state(&mut inner, seq, state)
        };
        self.notify.notify_waiters();
        result
    }

    fn set_state(
        &self,
        inner: &mut FrontierInner,
        seq: usize,
        to: UrlState,
    ) -> Result<(), AuditError> {
        let Some(record) = inner.records.get_mut(seq) else {
            return Ok(());
        };
        record.state = record.state.transition(to)?;
        tracing::trace!("{} -> {}", record.url, record.state);
        Ok(())
    }

    /// Stops dispatching and marks every undispatched URL as skipped
    ///
    /// Returns the skipped jobs so the caller can report them.
    pub fn cancel(&self) -> Vec<Job> {
        let skipped = {
            let mut inner = self.lock();
            inner.cancelled = true;

            let queued: Vec<usize> = inner.queue.drain(..).collect();
            let mut skipped = Vec::with_capacity(queued.len());
            for seq in queued {
                let record = &mut inner.records[seq];
                if let Ok(state) = record.state.transition(UrlState::Skipped) {
                    record.state = state;
                    skipped.push(Job {
                        seq,
                        url: record.url.clone(),
                    });
                }
            }
            skipped
        };

        self.notify.notify_waiters();
        skipped
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Number of URLs ever enqueued
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current state of a record
    pub fn state_of(&self, seq: usize) -> Option<UrlState> {
        self.lock().records.get(seq).map(|r| r.state)
    }
}

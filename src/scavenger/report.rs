use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters shared by every tier of a scan run.
#[derive(Debug, Default)]
pub struct RunReport {
    repos_scanned: AtomicUsize,
    repos_failed: AtomicUsize,
    tasks_submitted: AtomicUsize,
    prs_evaluated: AtomicUsize,
    reminders_posted: AtomicUsize,
    prs_closed: AtomicUsize,
    reminders_suppressed: AtomicUsize,
    evaluations_aborted: AtomicUsize,
    write_failures: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub repos_scanned: usize,
    pub repos_failed: usize,
    pub tasks_submitted: usize,
    pub prs_evaluated: usize,
    pub reminders_posted: usize,
    pub prs_closed: usize,
    pub reminders_suppressed: usize,
    pub evaluations_aborted: usize,
    pub write_failures: usize,
}

impl RunReport {
    pub fn repo_scanned(&self) {
        self.repos_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn repo_failed(&self) {
        self.repos_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pr_evaluated(&self) {
        self.prs_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reminder_posted(&self) {
        self.reminders_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pr_closed(&self) {
        self.prs_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reminder_suppressed(&self) {
        self.reminders_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evaluation_aborted(&self) {
        self.evaluations_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_failed(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            repos_scanned: self.repos_scanned.load(Ordering::Relaxed),
            repos_failed: self.repos_failed.load(Ordering::Relaxed),
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            prs_evaluated: self.prs_evaluated.load(Ordering::Relaxed),
            reminders_posted: self.reminders_posted.load(Ordering::Relaxed),
            prs_closed: self.prs_closed.load(Ordering::Relaxed),
            reminders_suppressed: self.reminders_suppressed.load(Ordering::Relaxed),
            evaluations_aborted: self.evaluations_aborted.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

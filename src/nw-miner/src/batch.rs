//! Bounded parallel execution of one pipeline phase
//!
//! A phase is a list of independent tasks. Each task runs on a fixed-size
//! rayon pool; failures are logged and collected instead of aborting the
//! phase, and `run` returns only after every task has reported.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Something a batch can name in its failure report
pub trait BatchItem {
    fn label(&self) -> String;
}

impl BatchItem for PathBuf {
    fn label(&self) -> String {
        self.display().to_string()
    }
}

/// Outcome of a phase
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    /// (task label, error message)
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another phase's counts into this one
    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded += other.succeeded;
        self.failed.extend(other.failed);
    }
}

pub struct Batch {
    label: String,
    pool: rayon::ThreadPool,
}

impl Batch {
    /// Create a batch running at most `jobs` tasks at once
    pub fn new(label: impl Into<String>, jobs: usize) -> Result<Self> {
        let label = label.into();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .thread_name({
                let label = label.clone();
                move |i| format!("{}-{}", label, i)
            })
            .build()
            .with_context(|| format!("Failed to build worker pool for {}", label))?;

        Ok(Self { label, pool })
    }

    /// Run `f` over every task and wait for all of them
    pub fn run<T, F>(&self, tasks: &[T], f: F) -> BatchReport
    where
        T: BatchItem + Sync,
        F: Fn(&T) -> Result<()> + Sync,
    {
        let started = Instant::now();
        let pb = progress_bar(tasks.len() as u64, &self.label);

        let failures: Vec<(String, String)> = self.pool.install(|| {
            tasks
                .par_iter()
                .filter_map(|task| {
                    let outcome = f(task);
                    pb.inc(1);
                    match outcome {
                        Ok(()) => None,
                        Err(e) => {
                            let label = task.label();
                            tracing::warn!("{}: {} failed: {:#}", self.label, label, e);
                            Some((label, format!("{:#}", e)))
                        }
                    }
                })
                .collect()
        });

        pb.finish_and_clear();

        let report = BatchReport {
            succeeded: tasks.len() - failures.len(),
            failed: failures,
        };

        tracing::info!(
            "{}: {} succeeded, {} failed in {} ms",
            self.label,
            report.succeeded,
            report.failed.len(),
            started.elapsed().as_millis()
        );

        report
    }
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(label.to_string());
    pb
}

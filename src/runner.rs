//! Run Driver
//!
//! Loads the pair list and synchronizes every pair, isolating failures so
//! one bad pair never stops the batch

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::pairs::{load_repository_pairs, MalformedLine, RepositoryPair};
use crate::runlog;
use crate::sync::{LabelSyncer, PairReport};

/// A pair whose sync did not complete
#[derive(Debug, Clone)]
pub struct PairFailure {
    /// 1-based position in the pair list
    pub index: usize,
    pub pair: RepositoryPair,
    pub error: String,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Reports of pairs that completed, in file order
    pub reports: Vec<PairReport>,

    /// Pairs that failed before any label could be processed
    pub failures: Vec<PairFailure>,

    /// Lines of the input file that could not be parsed
    pub malformed_lines: Vec<MalformedLine>,

    /// Set when the input file could not be read
    pub input_error: Option<String>,
}

impl RunSummary {
    pub fn pairs_processed(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    pub fn labels_created(&self) -> u32 {
        self.reports.iter().map(|r| r.created).sum()
    }

    pub fn labels_updated(&self) -> u32 {
        self.reports.iter().map(|r| r.updated).sum()
    }

    pub fn labels_skipped(&self) -> u32 {
        self.reports.iter().map(|r| r.skipped).sum()
    }

    pub fn labels_failed(&self) -> u32 {
        self.reports.iter().map(|r| r.failed).sum()
    }

    /// Whether anything went wrong: unreadable or empty input, malformed
    /// lines, failed pairs or failed labels
    pub fn has_failures(&self) -> bool {
        self.input_error.is_some()
            || self.pairs_processed() == 0
            || !self.malformed_lines.is_empty()
            || !self.failures.is_empty()
            || self.reports.iter().any(PairReport::has_failures)
    }
}

/// Synchronize every pair listed in `repo_file`
///
/// Never fails: read errors, malformed lines and per-pair errors are logged
/// and recorded in the returned summary.
pub async fn run(syncer: Arc<LabelSyncer>, repo_file: &Path) -> RunSummary {
    let mut summary = RunSummary::default();

    let list = match load_repository_pairs(repo_file) {
        Ok(list) => list,
        Err(e) => {
            runlog::error(format!(
                "...Error reading the file {}: {}",
                repo_file.display(),
                e
            ));
            summary.input_error = Some(e.to_string());
            runlog::error(format!(
                "...No repositories found in the file {}...",
                repo_file.display()
            ));
            return summary;
        }
    };

    for malformed in &list.malformed {
        runlog::warning(format!(
            "...Skipping malformed line {} in {}: '{}' (expected 'owner/repo::owner/repo')",
            malformed.line,
            repo_file.display(),
            malformed.content
        ));
    }
    summary.malformed_lines = list.malformed;

    if list.pairs.is_empty() {
        runlog::error(format!(
            "...No repositories found in the file {}...",
            repo_file.display()
        ));
        return summary;
    }

    sync_pairs(syncer, list.pairs, &mut summary).await;
    log_summary(&summary);
    summary
}

/// Run the pair workers and collect their results in list order
///
/// At most `concurrency` pairs are in flight at once.
pub async fn sync_pairs(
    syncer: Arc<LabelSyncer>,
    pairs: Vec<RepositoryPair>,
    summary: &mut RunSummary,
) {
    let concurrency = std::cmp::max(1, syncer.config().concurrency);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    let handles: Vec<_> = pairs
        .into_iter()
        .enumerate()
        .map(|(offset, pair)| {
            let index = offset + 1;
            let syncer = Arc::clone(&syncer);
            let semaphore = Arc::clone(&semaphore);
            let task_pair = pair.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire().await;
                runlog::info(format!(
                    "{}...Syncing custom labels from '{}' to '{}' ",
                    index, task_pair.source, task_pair.destination
                ));
                syncer.sync_pair(&task_pair).await
            });

            (index, pair, handle)
        })
        .collect();

    for (index, pair, handle) in handles {
        let error = match handle.await {
            Ok(Ok(report)) => {
                log_pair_report(index, &report);
                summary.reports.push(report);
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("sync task aborted: {}", e),
        };

        runlog::error(format!(
            "{}...Failed to sync label from '{}' to '{}' due to error: {}",
            index, pair.source, pair.destination, error
        ));
        summary.failures.push(PairFailure { index, pair, error });
    }
}

fn log_pair_report(index: usize, report: &PairReport) {
    let dry_run = if report.dry_run { " (dry run)" } else { "" };
    let message = format!(
        "{}...{}: created {}, updated {}, skipped {}, failed {}{}",
        index,
        report.pair,
        report.created,
        report.updated,
        report.skipped,
        report.failed,
        dry_run
    );

    if report.has_failures() {
        runlog::warning(message);
    } else if report.total_operations() == 0 {
        runlog::warning(format!(
            "{}...No labels found in '{}', nothing to sync",
            index, report.pair.source
        ));
    } else {
        runlog::success(message);
    }
}

fn log_summary(summary: &RunSummary) {
    let message = format!(
        "...Processed {} pair(s), {} failed; labels created {}, updated {}, skipped {}, failed {}",
        summary.pairs_processed(),
        summary.failures.len(),
        summary.labels_created(),
        summary.labels_updated(),
        summary.labels_skipped(),
        summary.labels_failed()
    );

    if summary.has_failures() {
        runlog::warning(message);
    } else {
        runlog::success(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncOperation;

    fn pair(n: usize) -> RepositoryPair {
        RepositoryPair {
            source: format!("src/repo{}", n),
            destination: format!("dst/repo{}", n),
            line: n,
        }
    }

    fn skip(name: &str) -> SyncOperation {
        SyncOperation::Skip {
            name: name.to_string(),
            reason: "default label".to_string(),
        }
    }

    #[test]
    fn test_empty_summary_counts_as_failure() {
        let summary = RunSummary::default();
        assert_eq!(summary.pairs_processed(), 0);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_summary_totals() {
        let mut first = PairReport::new(pair(1), false);
        first.add_operation(skip("bug"));
        let mut second = PairReport::new(pair(2), false);
        second.add_operation(skip("question"));
        second.add_operation(SyncOperation::Failed {
            name: "feature-x".to_string(),
            error: "boom".to_string(),
        });

        let summary = RunSummary {
            reports: vec![first, second],
            ..Default::default()
        };

        assert_eq!(summary.pairs_processed(), 2);
        assert_eq!(summary.labels_skipped(), 2);
        assert_eq!(summary.labels_failed(), 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_summary_clean_run() {
        let mut report = PairReport::new(pair(1), false);
        report.add_operation(skip("bug"));
        let summary = RunSummary {
            reports: vec![report],
            ..Default::default()
        };
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_summary_malformed_lines_are_failures() {
        let summary = RunSummary {
            reports: vec![PairReport::new(pair(1), false)],
            malformed_lines: vec![MalformedLine {
                line: 2,
                content: "oops".to_string(),
            }],
            ..Default::default()
        };
        assert!(summary.has_failures());
    }
}

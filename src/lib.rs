//! # gh-label-sync
//!
//! Copies custom issue labels from source GitHub repositories to destination
//! repositories, driven by a list of `source::destination` pairs
//!
//! ## Features
//! - Skips GitHub's built-in default labels (case-insensitive)
//! - Creates missing labels and overwrites existing ones
//! - Per-label and per-pair failure isolation
//! - Separate source and destination credentials
//! - Dry-run mode and bounded concurrency

pub mod config;
pub mod error;
pub mod github;
pub mod pairs;
pub mod runlog;
pub mod runner;
pub mod sync;

pub use config::{Credentials, DefaultLabelSet, SyncConfig};
pub use error::{Error, Result};
pub use github::{GitHubLabel, LabelClient, LabelPayload};
pub use pairs::RepositoryPair;
pub use runner::RunSummary;
pub use sync::LabelSyncer;

/// Synchronize the custom labels of a single repository pair
///
/// # Examples
///
/// ```rust,no_run
/// use gh_label_sync::{Credentials, SyncConfig};
///
/// #[tokio::main]
/// async fn main() -> gh_label_sync::Result<()> {
///     let config = SyncConfig::new(Credentials::new(
///         Some("source_token".to_string()),
///         Some("destination_token".to_string()),
///     ));
///
///     let report = gh_label_sync::sync_repository_labels(config, "orgA/repo1", "orgB/repo2").await?;
///
///     println!("Created {}, updated {}", report.created, report.updated);
///     Ok(())
/// }
/// ```
pub async fn sync_repository_labels(
    config: SyncConfig,
    source: &str,
    destination: &str,
) -> Result<sync::PairReport> {
    let pair = RepositoryPair {
        source: source.to_string(),
        destination: destination.to_string(),
        line: 1,
    };

    let syncer = LabelSyncer::new(config)?;
    syncer.sync_pair(&pair).await
}

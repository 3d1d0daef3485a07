//! Label Synchronization Functionality
//!
//! Copies the custom labels of one source repository onto a destination
//! repository

use crate::config::SyncConfig;
use crate::error::Result;
use crate::github::{LabelClient, LabelPayload, UpsertAction};
use crate::pairs::RepositoryPair;

/// Outcome for a single source label
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOperation {
    /// Label did not exist on the destination and was created
    Create { label: LabelPayload },

    /// Label existed on the destination and was overwritten
    Update { label: LabelPayload },

    /// Label was not copied
    Skip { name: String, reason: String },

    /// Existence check or write failed
    Failed { name: String, error: String },
}

/// Synchronization result for one repository pair
#[derive(Debug, Clone)]
pub struct PairReport {
    /// Pair this report belongs to
    pub pair: RepositoryPair,

    /// List of per-label outcomes, in source order
    pub operations: Vec<SyncOperation>,

    /// Number of labels created
    pub created: u32,

    /// Number of labels updated
    pub updated: u32,

    /// Number of labels skipped
    pub skipped: u32,

    /// Number of labels that failed
    pub failed: u32,

    /// Whether this is a dry run
    pub dry_run: bool,
}

impl PairReport {
    /// Create a new empty report
    pub fn new(pair: RepositoryPair, dry_run: bool) -> Self {
        Self {
            pair,
            operations: Vec::new(),
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            dry_run,
        }
    }

    /// Add an operation and update statistics
    pub fn add_operation(&mut self, operation: SyncOperation) {
        match &operation {
            SyncOperation::Create { .. } => self.created += 1,
            SyncOperation::Update { .. } => self.updated += 1,
            SyncOperation::Skip { .. } => self.skipped += 1,
            SyncOperation::Failed { .. } => self.failed += 1,
        }
        self.operations.push(operation);
    }

    /// Number of labels written (or that would be written in dry-run mode)
    pub fn synced(&self) -> u32 {
        self.created + self.updated
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Get total number of operations
    pub fn total_operations(&self) -> u32 {
        self.created + self.updated + self.skipped + self.failed
    }
}

/// Label Synchronization Engine
///
/// Shared by all pair workers of a run
pub struct LabelSyncer {
    client: LabelClient,
    config: SyncConfig,
}

impl LabelSyncer {
    /// Create a new label synchronization engine
    ///
    /// # Errors
    /// Returns an error if configuration validation or HTTP client creation fails
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        let client = LabelClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronize the custom labels of one pair
    ///
    /// Default labels are skipped. Each remaining label is upserted on the
    /// destination; a failing label is recorded and the rest still run.
    ///
    /// # Errors
    /// Returns an error if either repository identifier is invalid or the
    /// source labels cannot be fetched
    pub async fn sync_pair(&self, pair: &RepositoryPair) -> Result<PairReport> {
        let mut report = PairReport::new(pair.clone(), self.config.dry_run);

        let source_url = self.client.labels_url(&pair.source)?;
        let target_url = self.client.labels_url(&pair.destination)?;

        let labels = self.client.fetch_labels(&source_url).await?;
        if labels.is_empty() {
            tracing::error!("No labels fetched from {}. Skipping sync.", source_url);
            return Ok(report);
        }

        for label in &labels {
            if self.config.default_labels.contains(&label.name) {
                tracing::info!("Skipping default label '{}'", label.name);
                report.add_operation(SyncOperation::Skip {
                    name: label.name.clone(),
                    reason: "default label".to_string(),
                });
                continue;
            }

            let payload = LabelPayload::from(label);
            let operation = match self
                .client
                .upsert_label(&target_url, &payload, self.config.dry_run)
                .await
            {
                Ok(action) => {
                    if self.config.dry_run {
                        let verb = match action {
                            UpsertAction::Created => "created",
                            UpsertAction::Updated => "updated",
                        };
                        tracing::info!("Label '{}' would be {} (dry run).", label.name, verb);
                    } else {
                        tracing::info!("Label '{}' synced successfully.", label.name);
                    }
                    match action {
                        UpsertAction::Created => SyncOperation::Create { label: payload },
                        UpsertAction::Updated => SyncOperation::Update { label: payload },
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to sync label '{}': {}", label.name, e);
                    SyncOperation::Failed {
                        name: label.name.clone(),
                        error: e.to_string(),
                    }
                }
            };
            report.add_operation(operation);
        }

        Ok(report)
    }
}

//! Migration pipeline orchestration.
//!
//! Three linear phases: schema transfer, document transfer, verification.
//! There is no retry loop and no rollback; a failure mid-run surfaces as an
//! error and leaves the target index partially populated.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::client::{Document, IndexAction, IndexBatch, SearchClient};
use crate::config::MigrationConfig;
use crate::error::Result;
use crate::schema::{diff_fields, IndexDefinition};

/// Delay between the first and second verification polls; doubles from here.
const POLL_FLOOR: Duration = Duration::from_millis(500);
/// Upper bound on the delay between verification polls.
const POLL_CEIL: Duration = Duration::from_secs(10);

/// What happened to the target index during schema transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// The target index did not exist and was created.
    Created,
    /// The target index existed and was deleted, then recreated.
    Replaced,
    /// Dry run: the listed field changes would have been applied.
    Preview(Vec<String>),
    /// Schema transfer failed but the run was configured to continue.
    Failed(String),
}

/// Outcome of one migration run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Documents counted in the source index before paging started.
    pub source_total: u64,
    /// Search pages fetched.
    pub pages: u64,
    /// Documents copied and, unless this was a dry run, uploaded.
    pub transferred: u64,
    /// Schema fields that at least one returned document was missing.
    pub failed_fields: Vec<String>,
    /// Final target document count; `None` in dry runs.
    pub target_count: Option<u64>,
    /// Schema phase outcome.
    pub schema: SchemaOutcome,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationReport {
    /// Calculate throughput (documents per second).
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.transferred as f64 / self.duration_secs
        } else {
            0.0
        }
    }

    /// Whether the final target count matched the source; `None` in dry runs.
    #[must_use]
    pub fn counts_match(&self) -> Option<bool> {
        self.target_count.map(|count| count == self.source_total)
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Dry run - no changes were made to the target service.")?;
        }
        match &self.schema {
            SchemaOutcome::Created => writeln!(f, "Target index created.")?,
            SchemaOutcome::Replaced => writeln!(f, "Target index replaced (deleted and recreated).")?,
            SchemaOutcome::Preview(changes) if changes.is_empty() => {
                writeln!(f, "Schema preview: no field changes.")?;
            }
            SchemaOutcome::Preview(changes) => {
                writeln!(f, "Schema preview:")?;
                for line in changes {
                    writeln!(f, "  {line}")?;
                }
            }
            SchemaOutcome::Failed(message) => writeln!(f, "Schema transfer FAILED: {message}")?,
        }
        writeln!(f, "Source documents: {}", self.source_total)?;
        writeln!(f, "Pages transferred: {}", self.pages)?;
        let verb = if self.dry_run { "scanned" } else { "uploaded" };
        writeln!(f, "Documents {}: {}", verb, self.transferred)?;
        match self.target_count {
            Some(count) if count == self.source_total => {
                writeln!(f, "ALL DOCUMENTS INDEXED! Found {count} documents in the new index.")?;
            }
            Some(count) => {
                writeln!(
                    f,
                    "Found {} documents in the new index (expected {}).",
                    count, self.source_total
                )?;
            }
            None => {}
        }
        if !self.failed_fields.is_empty() {
            writeln!(f, "The following fields were not copied:")?;
            for name in &self.failed_fields {
                writeln!(f, "  - {name}")?;
            }
        }
        Ok(())
    }
}

/// Counters accumulated while paging documents across.
#[derive(Debug, Default)]
struct DocumentPhase {
    source_total: u64,
    pages: u64,
    transferred: u64,
    failed_fields: Vec<String>,
}

/// Migration pipeline: one run copies schema and documents source to target.
pub struct Migration {
    config: MigrationConfig,
    source: SearchClient,
    target: SearchClient,
}

impl Migration {
    /// Create a new migration pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a client cannot
    /// be created for either service.
    pub fn new(config: MigrationConfig) -> Result<Self> {
        config.validate()?;
        let source = SearchClient::new(&config.source)?;
        let target = SearchClient::new(&config.target)?;

        Ok(Self {
            config,
            source,
            target,
        })
    }

    /// Run the migration pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if any phase fails. A schema failure aborts the run
    /// before documents move unless `continue_on_schema_error` is set.
    pub async fn run(&self) -> Result<MigrationReport> {
        let start = Instant::now();
        let options = &self.config.options;

        info!(
            "Starting migration: index '{}' at {} -> index '{}' at {}",
            self.config.source.index,
            self.source.endpoint(),
            self.config.target.index,
            self.target.endpoint()
        );

        // Phase 1: schema
        let (schema_outcome, source_schema) = match self.transfer_schema().await {
            Ok((outcome, schema)) => (outcome, Some(schema)),
            Err(e) if options.continue_on_schema_error => {
                warn!("Schema transfer failed: {}; continuing with documents", e);
                (SchemaOutcome::Failed(e.to_string()), None)
            }
            Err(e) => return Err(e),
        };

        // Phase 2: documents
        let documents = self.transfer_documents(source_schema.as_ref()).await?;

        // Phase 3: verification
        let target_count = if options.dry_run {
            info!("Dry run mode - skipping count verification");
            None
        } else {
            Some(self.settled_target_count(documents.source_total).await?)
        };

        let report = MigrationReport {
            source_total: documents.source_total,
            pages: documents.pages,
            transferred: documents.transferred,
            failed_fields: documents.failed_fields,
            target_count,
            schema: schema_outcome,
            dry_run: options.dry_run,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            "Migration complete: {} documents in {} pages in {:.2}s ({:.0} docs/sec)",
            report.transferred,
            report.pages,
            report.duration_secs,
            report.throughput()
        );

        Ok(report)
    }

    /// Copies the source index definition onto the target service.
    ///
    /// The target index is deleted first when it exists; create-over-existing
    /// is rejected by the service, and a stale schema must not survive.
    async fn transfer_schema(&self) -> Result<(SchemaOutcome, IndexDefinition)> {
        let source_index = self.source.get_index(&self.config.source.index).await?;
        info!(
            "Source index '{}': {} fields",
            source_index.name,
            source_index.fields.len()
        );

        let planned = IndexDefinition {
            name: self.config.target.index.clone(),
            fields: source_index.fields.clone(),
        };
        let existing = self.target.get_index_if_exists(&planned.name).await?;

        if self.config.options.dry_run {
            let current = existing.as_ref().map_or(&[][..], |index| &index.fields[..]);
            let changes = diff_fields(current, &planned.fields);
            info!(
                "Dry run mode - target index '{}' left untouched ({} field changes)",
                planned.name,
                changes.len()
            );
            return Ok((SchemaOutcome::Preview(changes), source_index));
        }

        let outcome = if existing.is_some() {
            self.target.delete_index(&planned.name).await?;
            info!("Deleted existing target index '{}'", planned.name);
            SchemaOutcome::Replaced
        } else {
            SchemaOutcome::Created
        };

        self.target.create_index(&planned).await?;
        info!(
            "Created target index '{}' with {} fields",
            planned.name,
            planned.fields.len()
        );

        Ok((outcome, source_index))
    }

    /// Pages every document out of the source and uploads it to the target.
    async fn transfer_documents(
        &self,
        source_schema: Option<&IndexDefinition>,
    ) -> Result<DocumentPhase> {
        let options = &self.config.options;

        let source_total = self.source.count_documents(&self.config.source.index).await?;
        let pages = page_count(source_total, options.page_size);
        info!(
            "Found {} documents to transfer ({} pages of up to {})",
            source_total, pages, options.page_size
        );

        let expected_fields = source_schema.map(IndexDefinition::retrievable_fields);
        let key_field = source_schema
            .and_then(IndexDefinition::key_field)
            .map(|field| field.name.clone());

        let mut phase = DocumentPhase {
            source_total,
            ..DocumentPhase::default()
        };
        let progress = create_progress_bar(source_total);

        for page in 0..pages {
            let skip = page * options.page_size as u64;
            let documents = self
                .source
                .search_page(&self.config.source.index, skip, options.page_size)
                .await?;

            // The count is a snapshot; a shrinking index can run dry early.
            if documents.is_empty() {
                warn!("Page {} of {} came back empty, stopping early", page + 1, pages);
                break;
            }

            let mut actions = Vec::with_capacity(documents.len());
            for document in &documents {
                let copy =
                    copy_document(document, expected_fields.as_deref(), &mut phase.failed_fields);
                if options.trace_documents {
                    debug!(
                        "Copied document '{}' ({} fields)",
                        describe_key(&copy, key_field.as_deref()),
                        copy.len()
                    );
                }
                actions.push(IndexAction::upload(copy));
            }

            phase.pages += 1;
            phase.transferred += actions.len() as u64;

            if !options.dry_run {
                self.target
                    .upload_batch(&self.config.target.index, &IndexBatch { value: actions })
                    .await?;
            }
            progress.inc(documents.len() as u64);
        }

        progress.finish_with_message("Transfer complete");

        Ok(phase)
    }

    /// Waits out the indexing delay, then polls the target count until it
    /// matches `expected` or `verify_timeout_secs` elapses. Returns the last
    /// count observed either way.
    async fn settled_target_count(&self, expected: u64) -> Result<u64> {
        let options = &self.config.options;

        info!(
            "Waiting {}s for target indexing to settle",
            options.settle_secs
        );
        tokio::time::sleep(Duration::from_secs(options.settle_secs)).await;

        let timeout = Duration::from_secs(options.verify_timeout_secs);
        let start = Instant::now();
        let mut delay = POLL_FLOOR;

        loop {
            let count = self.target.count_documents(&self.config.target.index).await?;
            if count == expected || start.elapsed() >= timeout {
                return Ok(count);
            }

            debug!("Target reports {} of {} documents, polling again", count, expected);
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(POLL_CEIL);
        }
    }
}

/// Number of search pages needed to cover `total` documents.
fn page_count(total: u64, page_size: usize) -> u64 {
    total.div_ceil(page_size as u64)
}

/// Copies a document, dropping `@search.*` result metadata the service
/// injects. When a schema is known, any retrievable field absent from the
/// document is recorded in `failures` (once per field name, not per
/// document).
fn copy_document(
    source: &Document,
    expected_fields: Option<&[String]>,
    failures: &mut Vec<String>,
) -> Document {
    let mut copy = Document::new();
    for (name, value) in source {
        if name.starts_with("@search.") {
            continue;
        }
        copy.insert(name.clone(), value.clone());
    }

    if let Some(expected) = expected_fields {
        for name in expected {
            if !copy.contains_key(name) && !failures.iter().any(|failed| failed == name) {
                failures.push(name.clone());
            }
        }
    }

    copy
}

/// Best-effort key for trace logging.
fn describe_key(document: &Document, key_field: Option<&str>) -> String {
    key_field
        .and_then(|name| document.get(name))
        .map(|value| match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "<no key>".to_string())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::new_spinner()
    };

    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    pb
}

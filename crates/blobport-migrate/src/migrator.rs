//! Phase orchestration.

use std::sync::Arc;

use anyhow::Context;
use blobport_core::{LogEntry, StorageTarget, UploadDoc};
use blobport_db::{BlobRepository, DbError, UploadRepository};
use blobport_storage::BlobSink;
use indicatif::ProgressBar;

use crate::log::MigrationLog;
use crate::pipeline::{BatchPipeline, BatchReport, Outcome};

/// Runs one migration phase against one database.
///
/// Holds the repositories, the worker pool, and the migration log. A
/// `Migrator` lives for a single process invocation; nothing here is
/// persisted except what [`MigrationLog`] writes.
pub struct Migrator {
    uploads: UploadRepository,
    blobs: BlobRepository,
    log: MigrationLog,
    pipeline: BatchPipeline,
}

impl Migrator {
    pub fn new(
        uploads: UploadRepository,
        blobs: BlobRepository,
        log: MigrationLog,
        workers: usize,
    ) -> Self {
        Self {
            uploads,
            blobs,
            log,
            pipeline: BatchPipeline::new(workers),
        }
    }

    /// Copy every eligible blob in `collection` to the sink, recording one
    /// log entry per success. The log is flushed once at the end; a flush
    /// failure is logged and the entries for this run are lost, though the
    /// blobs themselves are already copied.
    pub async fn dump(
        &mut self,
        collection: &str,
        sink: Arc<dyn BlobSink>,
        progress: ProgressBar,
    ) -> anyhow::Result<BatchReport> {
        let total = self
            .uploads
            .count(collection)
            .await
            .context("failed to count upload records")?;
        progress.set_length(total);
        tracing::info!(collection, total, workers = self.pipeline.workers(), "starting blob dump");

        let cursor = self
            .uploads
            .stream(collection)
            .await
            .context("failed to open the upload cursor")?;

        let blobs = self.blobs.clone();
        let collection_name = collection.to_string();
        let op = move |record: Result<UploadDoc, DbError>| {
            let blobs = blobs.clone();
            let sink = sink.clone();
            let collection = collection_name.clone();
            async move {
                match record {
                    Ok(upload) => dump_one(&blobs, sink.as_ref(), &collection, upload).await,
                    Err(e) => {
                        tracing::error!(error = %e, "upload cursor returned an error");
                        Outcome::Failure {
                            id: "<cursor>".to_string(),
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        let report = {
            let log = &mut self.log;
            self.pipeline
                .run(cursor, op, |entry| log.push(entry), &progress)
                .await
        };
        progress.finish();

        match self.log.flush() {
            Ok(written) => {
                tracing::info!(written, path = %self.log.path().display(), "migration log flushed")
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to write the migration log; entries for this run are lost")
            }
        }

        summarize("dump", &report);
        Ok(report)
    }

    /// Rewrite every logged upload record to point at its migrated location.
    pub async fn update_db(
        &self,
        target: StorageTarget,
        progress: ProgressBar,
    ) -> anyhow::Result<BatchReport> {
        let entries = MigrationLog::read_all(self.log.path())
            .context("the migration log is required for the update phase")?;
        progress.set_length(entries.len() as u64);
        tracing::info!(entries = entries.len(), target = %target, "updating upload records");

        let uploads = self.uploads.clone();
        let op = move |entry: LogEntry| {
            let uploads = uploads.clone();
            async move {
                let id = entry.id.clone();
                match uploads.relocate(&entry, target).await {
                    Ok(true) => Outcome::Success(()),
                    Ok(false) => {
                        tracing::error!(upload_id = %id, "no upload record matches this log entry");
                        Outcome::Failure {
                            id,
                            reason: "record not found".to_string(),
                        }
                    }
                    Err(e) => {
                        tracing::error!(upload_id = %id, error = %e, "failed to update upload record");
                        Outcome::Failure {
                            id,
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        let report = self
            .pipeline
            .run(futures::stream::iter(entries), op, |_| {}, &progress)
            .await;
        progress.finish();

        summarize("updatedb", &report);
        Ok(report)
    }

    /// Delete every logged blob from its GridFS bucket. Failures (including
    /// already-deleted blobs on a rerun) are warnings, not fatal.
    pub async fn remove_blobs(&self, progress: ProgressBar) -> anyhow::Result<BatchReport> {
        let entries = MigrationLog::read_all(self.log.path())
            .context("the migration log is required for the removal phase")?;
        progress.set_length(entries.len() as u64);
        tracing::info!(entries = entries.len(), "removing original blobs");

        let blobs = self.blobs.clone();
        let op = move |entry: LogEntry| {
            let blobs = blobs.clone();
            async move {
                match blobs.delete(&entry.collection, &entry.id).await {
                    Ok(()) => Outcome::Success(()),
                    Err(e) => {
                        tracing::warn!(upload_id = %entry.id, error = %e, "failed to remove blob");
                        Outcome::Failure {
                            id: entry.id,
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        let report = self
            .pipeline
            .run(futures::stream::iter(entries), op, |_| {}, &progress)
            .await;
        progress.finish();

        summarize("removeblobs", &report);
        Ok(report)
    }
}

async fn dump_one(
    blobs: &BlobRepository,
    sink: &dyn BlobSink,
    collection: &str,
    upload: UploadDoc,
) -> Outcome<LogEntry> {
    if !upload.is_gridfs() {
        tracing::debug!(upload_id = %upload.id, store = ?upload.store, "skipping upload outside GridFS");
        return Outcome::Skip;
    }
    if !upload.complete {
        tracing::warn!(upload_id = %upload.id, "skipping incomplete upload");
        return Outcome::Skip;
    }

    let data = match blobs.read(collection, &upload.id).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(upload_id = %upload.id, error = %e, "failed to read blob");
            return Outcome::Failure {
                id: upload.id,
                reason: e.to_string(),
            };
        }
    };

    let filename = upload.dump_filename();
    match sink.put(&filename, data, &upload).await {
        Ok(key) => Outcome::Success(LogEntry {
            id: upload.id,
            file: filename,
            collection: collection.to_string(),
            key,
        }),
        Err(e) => {
            tracing::error!(upload_id = %upload.id, error = %e, "failed to store blob");
            Outcome::Failure {
                id: upload.id,
                reason: e.to_string(),
            }
        }
    }
}

fn summarize(phase: &str, report: &BatchReport) {
    tracing::info!(
        phase,
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed,
        total = report.total,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "phase finished"
    );
    if !report.failed_ids.is_empty() {
        tracing::warn!(
            phase,
            failed = report.failed,
            ids = ?report.failed_ids,
            "some records were not processed"
        );
    }
}

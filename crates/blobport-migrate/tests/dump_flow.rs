//! End-to-end dump flow over the local sink, minus the database: a record
//! stream goes through the pipeline, eligible blobs land in a directory, and
//! successes end up as rows in the migration log.

use std::collections::HashMap;
use std::sync::Arc;

use blobport_core::{LogEntry, UploadDoc};
use blobport_migrate::{BatchPipeline, MigrationLog, Outcome};
use blobport_storage::{BlobSink, LocalSink};
use futures::stream;
use indicatif::ProgressBar;
use tempfile::tempdir;

fn upload(id: &str, store: Option<&str>, complete: bool) -> UploadDoc {
    UploadDoc {
        id: id.to_string(),
        complete,
        store: store.map(String::from),
        extension: Some("txt".to_string()),
        name: format!("{id}.txt"),
        user_id: Some("u1".to_string()),
        room_id: Some("r1".to_string()),
        content_type: Some("text/plain".to_string()),
    }
}

#[tokio::test]
async fn eligible_records_are_dumped_and_logged_ineligible_are_skipped() {
    let out = tempdir().unwrap();
    let log_dir = tempdir().unwrap();
    let log_path = log_dir.path().join("migration.csv");

    let sink: Arc<dyn BlobSink> = Arc::new(LocalSink::new(out.path()).await.unwrap());

    // Blob bytes keyed by upload id, standing in for the GridFS bucket.
    let blob_bytes: Arc<HashMap<String, Vec<u8>>> = Arc::new(
        ["a1", "a2", "a3"]
            .iter()
            .map(|id| (id.to_string(), format!("payload-{id}").into_bytes()))
            .collect(),
    );

    let records = vec![
        upload("a1", Some("GridFS:Uploads"), true),
        upload("a2", Some("GridFS:Uploads"), true),
        upload("a3", Some("GridFS:Uploads"), true),
        // Already migrated elsewhere: skipped, not failed.
        upload("b1", Some("FileSystem:Uploads"), true),
        // Still uploading: skipped, not failed.
        upload("b2", Some("GridFS:Uploads"), false),
    ];

    let mut log = MigrationLog::new(&log_path);
    let pipeline = BatchPipeline::new(4);

    let op = {
        let sink = sink.clone();
        let blob_bytes = blob_bytes.clone();
        move |record: UploadDoc| {
            let sink = sink.clone();
            let blob_bytes = blob_bytes.clone();
            async move {
                if !record.is_gridfs() || !record.complete {
                    return Outcome::Skip;
                }
                let data = blob_bytes[&record.id].clone();
                let filename = record.dump_filename();
                match sink.put(&filename, data, &record).await {
                    Ok(key) => Outcome::Success(LogEntry {
                        id: record.id,
                        file: filename,
                        collection: "rocketchat_uploads".to_string(),
                        key,
                    }),
                    Err(e) => Outcome::Failure {
                        id: record.id,
                        reason: e.to_string(),
                    },
                }
            }
        }
    };

    let report = pipeline
        .run(
            stream::iter(records),
            op,
            |entry| log.push(entry),
            &ProgressBar::hidden(),
        )
        .await;

    assert_eq!(report.total, 5);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);

    log.flush().unwrap();
    let entries = MigrationLog::read_all(&log_path).unwrap();
    assert_eq!(entries.len(), 3);

    for entry in &entries {
        assert_eq!(entry.file, format!("{}.txt", entry.id));
        assert_eq!(entry.collection, "rocketchat_uploads");
        // The local sink's key is the path it wrote; the payload must be the
        // blob bytes for that id.
        let written = std::fs::read(&entry.key).unwrap();
        assert_eq!(written, format!("payload-{}", entry.id).into_bytes());
    }
}

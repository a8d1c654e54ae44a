//! Batch runner.
//!
//! Records are grouped by source venue. Each source is worked through one
//! record at a time, while up to `concurrency` sources run side by side. Every
//! record commits in its own transaction, so a failing record only affects
//! itself, and a source task that dies only affects that source.
//!
//! Elements that are not valid records are reported as blocked, and an input
//! file that cannot be read is reported as one errored line; neither stops
//! the rest of the batch.
//!
//! Cancellation stops new records from being started. A record that is
//! already committing always finishes. A dry run previews a whole source at
//! once, so there cancellation is checked per source.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use gigboard_core::outcome::{BatchSummary, RecordOutcome, RecordReport};
use gigboard_core::planner::ImportContext;
use gigboard_core::preview::preview_batch;
use gigboard_core::raw_event::RawEventRecord;
use gigboard_db::catalog::PgCatalog;
use gigboard_db::DbPool;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::commit::commit_record;
use crate::input::SourceBatch;

/// Group key for records that carry no source venue.
const UNKEYED_SOURCE: &str = "(no source)";

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Plan only; write nothing.
    pub dry_run: bool,
    /// Maximum number of sources in flight.
    pub concurrency: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Per-record lines, ordered by origin then record index.
    pub reports: Vec<RecordReport>,
    pub summary: BatchSummary,
    /// Records never started because the run was cancelled.
    pub not_started: usize,
}

impl BatchReport {
    pub fn was_cancelled(&self) -> bool {
        self.not_started > 0
    }
}

struct QueuedRecord {
    origin: Option<String>,
    index: usize,
    record: RawEventRecord,
}

#[derive(Default)]
struct SourceResult {
    reports: Vec<RecordReport>,
    not_started: usize,
}

/// Work split out of the input: runnable records per source, plus lines for
/// input that never becomes a record.
struct GroupedInput {
    sources: Vec<(String, Vec<QueuedRecord>)>,
    rejected: Vec<RecordReport>,
}

/// Run every record in `batches`.
pub async fn run_batch(
    pool: &DbPool,
    ctx: &ImportContext,
    batches: Vec<SourceBatch>,
    options: BatchOptions,
    cancel: CancellationToken,
) -> BatchReport {
    let GroupedInput { sources, rejected } = group_by_source(batches);
    tracing::info!(
        sources = sources.len(),
        rejected = rejected.len(),
        concurrency = options.concurrency,
        dry_run = options.dry_run,
        "Starting import batch"
    );

    // Sources overlap under READ COMMITTED, so two of them naming the same
    // new artist or venue can both create it. Later resolutions pick the
    // lowest id, which folds the pair back into one match.
    let results: Vec<SourceResult> = stream::iter(sources.into_iter().map(|(source, records)| {
        let pool = pool.clone();
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        async move { run_source_isolated(pool, ctx, source, records, options.dry_run, cancel).await }
    }))
    .buffer_unordered(options.concurrency.max(1))
    .collect()
    .await;

    let mut summary = BatchSummary::new(options.dry_run);
    let mut reports = rejected;
    let mut not_started = 0;
    for result in results {
        reports.extend(result.reports);
        not_started += result.not_started;
    }
    for report in &reports {
        summary.record(&report.outcome);
    }
    reports.sort_by(|a, b| (&a.origin, a.index).cmp(&(&b.origin, b.index)));

    tracing::info!(%summary, not_started, "Import batch finished");
    BatchReport {
        reports,
        summary,
        not_started,
    }
}

/// Run one source on its own task so a panic is contained to that source.
async fn run_source_isolated(
    pool: DbPool,
    ctx: ImportContext,
    source: String,
    records: Vec<QueuedRecord>,
    dry_run: bool,
    cancel: CancellationToken,
) -> SourceResult {
    let labels: Vec<(Option<String>, usize, String)> = records
        .iter()
        .map(|q| (q.origin.clone(), q.index, q.record.label()))
        .collect();

    let task_source = source.clone();
    let handle = tokio::spawn(async move {
        if dry_run {
            preview_source(pool, ctx, task_source, records, cancel).await
        } else {
            commit_source(pool, ctx, task_source, records, cancel).await
        }
    });

    match handle.await {
        Ok(result) => result,
        Err(join_err) => source_task_failed(&source, labels, &join_err),
    }
}

/// Mark every record of a source whose task died as errored.
fn source_task_failed(
    source: &str,
    labels: Vec<(Option<String>, usize, String)>,
    join_err: &JoinError,
) -> SourceResult {
    tracing::error!(source_venue = %source, error = %join_err, "Source import task failed");
    let message = format!("Source {source} failed: {join_err}");
    SourceResult {
        reports: labels
            .into_iter()
            .map(|(origin, index, label)| RecordReport {
                origin,
                index,
                label,
                outcome: RecordOutcome::Errored {
                    message: message.clone(),
                },
            })
            .collect(),
        not_started: 0,
    }
}

async fn commit_source(
    pool: DbPool,
    ctx: ImportContext,
    source: String,
    records: Vec<QueuedRecord>,
    cancel: CancellationToken,
) -> SourceResult {
    let total = records.len();
    let mut result = SourceResult::default();

    for (done, queued) in records.into_iter().enumerate() {
        if cancel.is_cancelled() {
            result.not_started = total - done;
            log_cancelled(&source, result.not_started);
            break;
        }

        let outcome = commit_one(&pool, &ctx, &queued).await;
        result.reports.push(finish_record(&source, queued, outcome));
    }

    result
}

/// Plan a whole source with [`preview_batch`] on one read-only connection.
async fn preview_source(
    pool: DbPool,
    ctx: ImportContext,
    source: String,
    records: Vec<QueuedRecord>,
    cancel: CancellationToken,
) -> SourceResult {
    if cancel.is_cancelled() {
        log_cancelled(&source, records.len());
        return SourceResult {
            reports: Vec::new(),
            not_started: records.len(),
        };
    }

    let raw: Vec<RawEventRecord> = records.iter().map(|q| q.record.clone()).collect();
    let planned = async {
        let mut conn = pool.acquire().await?;
        preview_batch(&mut PgCatalog::new(&mut conn), &ctx, &raw).await
    }
    .await;

    let outcomes: Vec<RecordOutcome> = match planned {
        Ok(plans) => plans.iter().map(RecordOutcome::from_plan).collect(),
        Err(err) => {
            tracing::error!(source_venue = %source, error = %err, "Source preview failed");
            let outcome = RecordOutcome::Errored {
                message: format!("Database error: {err}"),
            };
            vec![outcome; records.len()]
        }
    };

    SourceResult {
        reports: records
            .into_iter()
            .zip(outcomes)
            .map(|(queued, outcome)| finish_record(&source, queued, outcome))
            .collect(),
        not_started: 0,
    }
}

async fn commit_one(pool: &DbPool, ctx: &ImportContext, queued: &QueuedRecord) -> RecordOutcome {
    match commit_record(pool, ctx, &queued.record).await {
        Ok(report) => report.outcome,
        Err(err) => {
            tracing::error!(
                origin = queued.origin.as_deref().unwrap_or(""),
                record_index = queued.index,
                source_venue = queued.record.source_venue_key.as_deref().unwrap_or(""),
                source_event_id = queued.record.source_event_id.as_deref().unwrap_or(""),
                error = %err,
                "Record import failed"
            );
            RecordOutcome::Errored {
                message: err.to_string(),
            }
        }
    }
}

fn finish_record(source: &str, queued: QueuedRecord, outcome: RecordOutcome) -> RecordReport {
    tracing::info!(
        source_venue = %source,
        source_event_id = queued.record.source_event_id.as_deref().unwrap_or(""),
        origin = queued.origin.as_deref().unwrap_or(""),
        record_index = queued.index,
        outcome = outcome.kind(),
        "Record processed"
    );
    RecordReport {
        origin: queued.origin,
        index: queued.index,
        label: queued.record.label(),
        outcome,
    }
}

fn log_cancelled(source: &str, not_started: usize) {
    tracing::warn!(
        source_venue = %source,
        not_started,
        "Import cancelled; remaining records not started"
    );
}

/// Group records by source venue key, keeping first-seen order of sources
/// and input order within a source. Malformed elements and unreadable files
/// become report lines straight away.
fn group_by_source(batches: Vec<SourceBatch>) -> GroupedInput {
    let mut sources: Vec<(String, Vec<QueuedRecord>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut rejected = Vec::new();

    for batch in batches {
        if let Some(failure) = batch.failure {
            tracing::error!(
                origin = batch.origin.as_deref().unwrap_or(""),
                error = %failure,
                outcome = "errored",
                "Input file skipped"
            );
            rejected.push(RecordReport {
                label: batch.origin.clone().unwrap_or_else(|| "(input)".to_string()),
                origin: batch.origin,
                index: 0,
                outcome: RecordOutcome::Errored { message: failure },
            });
            continue;
        }

        for (index, entry) in batch.entries.into_iter().enumerate() {
            let record = match entry {
                Ok(record) => record,
                Err(bad) => {
                    tracing::warn!(
                        origin = batch.origin.as_deref().unwrap_or(""),
                        record_index = index,
                        outcome = "blocked",
                        error = %bad.message,
                        "Malformed record"
                    );
                    rejected.push(RecordReport {
                        origin: batch.origin.clone(),
                        index,
                        label: bad.label,
                        outcome: RecordOutcome::Blocked {
                            issues: vec![bad.message],
                        },
                    });
                    continue;
                }
            };

            let key = record
                .source_venue_key
                .as_deref()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| UNKEYED_SOURCE.to_string());
            let slot = *slots.entry(key.clone()).or_insert_with(|| {
                sources.push((key, Vec::new()));
                sources.len() - 1
            });
            sources[slot].1.push(QueuedRecord {
                origin: batch.origin.clone(),
                index,
                record,
            });
        }
    }

    GroupedInput { sources, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigboard_core::raw_event::{parse_record_entries, parse_records};

    fn batch(origin: &str, json: &str) -> SourceBatch {
        SourceBatch::from_records(Some(origin.to_string()), parse_records(json).unwrap())
    }

    #[test]
    fn groups_by_source_across_files() {
        let grouped = group_by_source(vec![
            batch(
                "a.json",
                r#"[{"source_venue": "valley-bar", "source_event_id": "1"},
                    {"source_venue": "crescent", "source_event_id": "1"},
                    {"source_venue": "Valley-Bar", "source_event_id": "2"}]"#,
            ),
            batch("b.json", r#"[{"title": "Manual"}, {"source_venue": "crescent"}]"#),
        ]);
        let groups = grouped.sources;

        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["valley-bar", "crescent", UNKEYED_SOURCE]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].index, 2);
        assert_eq!(groups[1].1.len(), 2);
        assert_eq!(groups[1].1[1].origin.as_deref(), Some("b.json"));
        assert_eq!(groups[2].1[0].index, 0);
        assert!(grouped.rejected.is_empty());
    }

    #[test]
    fn malformed_entries_are_blocked_in_place() {
        let entries = parse_record_entries(
            r#"[{"source_venue": "valley-bar", "source_event_id": "1"},
                {"title": 5},
                {"source_venue": "valley-bar", "source_event_id": "2"}]"#,
        )
        .unwrap();
        let grouped = group_by_source(vec![SourceBatch {
            origin: Some("a.json".to_string()),
            entries,
            failure: None,
        }]);

        assert_eq!(grouped.sources.len(), 1);
        let indices: Vec<usize> = grouped.sources[0].1.iter().map(|q| q.index).collect();
        assert_eq!(indices, [0, 2]);

        assert_eq!(grouped.rejected.len(), 1);
        assert_eq!(grouped.rejected[0].index, 1);
        assert_eq!(grouped.rejected[0].outcome.kind(), "blocked");
    }

    #[test]
    fn unreadable_file_is_one_errored_line() {
        let grouped = group_by_source(vec![
            SourceBatch {
                origin: Some("broken.json".to_string()),
                entries: Vec::new(),
                failure: Some("Invalid event JSON".to_string()),
            },
            batch("ok.json", r#"{"source_venue": "crescent", "source_event_id": "9"}"#),
        ]);

        assert_eq!(grouped.sources.len(), 1);
        assert_eq!(grouped.rejected.len(), 1);
        assert_eq!(grouped.rejected[0].label, "broken.json");
        assert!(grouped.rejected[0].outcome.is_error());
    }

    #[tokio::test]
    async fn dead_source_task_errors_its_records() {
        let join_err = tokio::spawn(async { panic!("scraper exploded") })
            .await
            .unwrap_err();
        let labels = vec![
            (Some("a.json".to_string()), 0, "valley-bar/1".to_string()),
            (Some("a.json".to_string()), 3, "valley-bar/2".to_string()),
        ];

        let result = source_task_failed("valley-bar", labels, &join_err);

        assert_eq!(result.not_started, 0);
        assert_eq!(result.reports.len(), 2);
        assert_eq!(result.reports[1].index, 3);
        assert!(result.reports.iter().all(|r| r.outcome.is_error()));
    }

    #[test]
    fn empty_input_has_no_groups() {
        let grouped = group_by_source(Vec::new());
        assert!(grouped.sources.is_empty());
        assert!(grouped.rejected.is_empty());
    }
}

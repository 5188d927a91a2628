//! High-level runner API for the bookstore report.
//!
//! This module provides the public interface used by the CLI: build a client
//! from connection settings, run the report (or seed the collection), and
//! guarantee the connection is closed exactly once however the run ends.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ConnectionSettings;
use crate::db::BookStore;
use crate::db::mongo::{self, StoreArgsBuilder};
use crate::model::{self, Book};
use crate::report::{self, ReportParams, Step};
use crate::telemetry::{RunStats, TelemetryEvent};

/// Arguments for a report or seed run
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl From<ConnectionSettings> for ReportArgs {
    fn from(settings: ConnectionSettings) -> Self {
        Self {
            uri: settings.uri,
            database: settings.database,
            collection: settings.collection,
        }
    }
}

/// Result of a completed report run
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub steps_completed: usize,
    pub documents_returned: u64,
    pub duration: Duration,
    pub p50_ms: Option<u64>,
    pub p90_ms: Option<u64>,
    pub p99_ms: Option<u64>,
}

/// Run the full report against MongoDB, printing to stdout and errors to stderr
pub async fn run_report(args: ReportArgs) -> Result<RunSummary> {
    let mut out = std::io::stdout();
    let mut err = std::io::stderr();

    let store = match open_store(&args).await {
        Ok(store) => store,
        Err(e) => return Err(report_error(&mut err, e)),
    };

    let steps = report::default_steps(&ReportParams::default());
    execute(&store, &steps, &mut out, &mut err).await
}

/// Replace the collection's contents with the built-in catalog
pub async fn run_seed(args: ReportArgs) -> Result<usize> {
    let mut out = std::io::stdout();
    let mut err = std::io::stderr();

    let store = match open_store(&args).await {
        Ok(store) => store,
        Err(e) => return Err(report_error(&mut err, e)),
    };

    seed(&store, &model::catalog(), &mut out, &mut err).await
}

async fn open_store(args: &ReportArgs) -> Result<mongo::MongoStore> {
    let store_args = StoreArgsBuilder::default()
        .uri(args.uri.as_str())
        .database(args.database.as_str())
        .collection(args.collection.as_str())
        .build()?;
    mongo::store(store_args).await
}

/// Connect, run `steps` in order, and close the store.
///
/// The first failing step aborts the rest and is written once to `err`. The
/// store is closed exactly once whether or not a step failed.
pub async fn execute<S: BookStore + ?Sized>(
    store: &S,
    steps: &[Step],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<RunSummary> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let start_time = Instant::now();
    info!("Starting report run: {}", run_id);

    let mut stats = RunStats::new();
    let result = run_steps(store, steps, out, &mut stats).await;
    if let Err(e) = finish(store, result, out, err).await {
        warn!(
            "Report run {} aborted after {} steps ({} failed)",
            run_id, stats.steps_completed, stats.steps_failed
        );
        return Err(e);
    }

    let (p50_ms, p90_ms, p99_ms) = stats.get_percentiles();
    info!(
        "Report run {} finished: {} steps, {} documents",
        run_id, stats.steps_completed, stats.documents_returned
    );

    Ok(RunSummary {
        run_id,
        started_at,
        steps_completed: stats.steps_completed,
        documents_returned: stats.documents_returned,
        duration: start_time.elapsed(),
        p50_ms,
        p90_ms,
        p99_ms,
    })
}

/// Connect, replace the collection contents with `books`, and close the store
pub async fn seed<S: BookStore + ?Sized>(
    store: &S,
    books: &[Book],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<usize> {
    let result = seed_books(store, books, out).await;
    finish(store, result, out, err).await
}

async fn run_steps<S: BookStore + ?Sized>(
    store: &S,
    steps: &[Step],
    out: &mut dyn Write,
    stats: &mut RunStats,
) -> Result<()> {
    store.connect().await?;
    writeln!(out, "Connected to MongoDB")?;

    for step in steps {
        let step_start = Instant::now();
        let outcome = match step.run(store).await {
            Ok(outcome) => outcome,
            Err(e) => {
                stats.update(&TelemetryEvent::StepFailed);
                return Err(e.context(format!("Step '{}' failed", step.heading)));
            }
        };

        let duration_ms = step_start.elapsed().as_millis() as u64;
        stats.update(&TelemetryEvent::StepCompleted {
            documents_returned: outcome.documents_returned() as u64,
            duration_ms,
        });
        debug!(step = %step.heading, duration_ms, "step completed");

        report::render(out, step, &outcome)?;
    }

    Ok(())
}

async fn seed_books<S: BookStore + ?Sized>(
    store: &S,
    books: &[Book],
    out: &mut dyn Write,
) -> Result<usize> {
    store.connect().await?;
    writeln!(out, "Connected to MongoDB")?;

    let existing = store.count().await.context("Failed to count existing books")?;
    if existing > 0 {
        store
            .drop_collection()
            .await
            .context("Failed to drop existing collection")?;
        info!("Dropped collection holding {} documents", existing);
        writeln!(out, "Dropped {} existing documents.", existing)?;
    }

    let inserted = store
        .insert_books(books)
        .await
        .context("Failed to insert books")?;
    writeln!(out, "Inserted {} books.", inserted)?;
    Ok(inserted)
}

/// Report a failed result, then close the store unconditionally
async fn finish<S: BookStore + ?Sized, T>(
    store: &S,
    result: Result<T>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<T> {
    if let Err(e) = &result {
        let _ = writeln!(err, "Error: {:#}", e);
    }

    let closed = store.close().await;
    let _ = writeln!(out, "\nConnection closed.");

    match (result, closed) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(report_error(err, e.context("Failed to close connection"))),
        (Ok(value), Ok(())) => Ok(value),
    }
}

fn report_error(err: &mut dyn Write, e: anyhow::Error) -> anyhow::Error {
    let _ = writeln!(err, "Error: {:#}", e);
    e
}

//! Collection command handlers.
//!
//! A batch runs its jobs one after another in a single browser. A failed
//! job is logged and counted; the remaining jobs still run.

use std::path::{Path, PathBuf};

use anyhow::Context;
use mapscout_core::{AppConfig, Job, Place};
use mapscout_export::{AppendSummary, CsvSink};
use mapscout_scraper::{BrowserOptions, ChromeSession, Collector, CollectorConfig, StopReason};
use tokio_util::sync::CancellationToken;

/// Result of one job that ran to completion (possibly with zero places).
pub(crate) struct JobReport {
    pub places: Vec<Place>,
    pub summary: AppendSummary,
    pub stop: StopReason,
}

impl JobReport {
    /// A job whose search page never loaded produced nothing worth keeping.
    fn failed(&self) -> bool {
        matches!(self.stop, StopReason::NavigationFailed(_))
    }
}

/// Collect a single query and persist the results.
///
/// # Errors
///
/// Returns an error if the browser cannot be launched, the search page does
/// not load, or the results cannot be written.
pub(crate) async fn run_collect(
    config: &AppConfig,
    job: &Job,
    enrich_emails: bool,
    json: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut collector_config = CollectorConfig::from(config);
    collector_config.enrich_emails = collector_config.enrich_emails && enrich_emails;
    let sink = CsvSink::new(&config.output_dir);
    resolve_destination(&sink, job)?;

    let session = ChromeSession::launch(&BrowserOptions::from_app_config(config)).await?;
    let result = collect_job(&session, &collector_config, &sink, job, cancel).await;
    session.shutdown().await;
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.places)?);
    } else {
        println!(
            "collected {} places for \"{}\" ({}); wrote {} rows to {}",
            report.places.len(),
            job.query,
            report.stop,
            report.summary.rows_written,
            report.summary.path.display()
        );
    }

    if report.failed() {
        anyhow::bail!("collection for \"{}\" failed: {}", job.query, report.stop);
    }
    Ok(())
}

/// Run every job in the jobs file.
///
/// When `dry_run` is `true` the jobs are printed and no browser is started.
///
/// # Errors
///
/// Returns an error if the jobs file is invalid, the browser cannot be
/// launched, or any job failed.
pub(crate) async fn run_batch(
    config: &AppConfig,
    jobs_path: Option<&Path>,
    dry_run: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let jobs_path = jobs_path.unwrap_or(config.jobs_path.as_path());
    let jobs = mapscout_core::load_jobs(jobs_path)?.jobs;
    if jobs.is_empty() {
        println!("no jobs in {}; nothing to do", jobs_path.display());
        return Ok(());
    }

    if dry_run {
        println!("dry-run: would run {} jobs:", jobs.len());
        for job in &jobs {
            println!(
                "  {} | {} | limit {} -> {}.csv",
                job.city,
                job.query,
                job.limit,
                job.file_key()
            );
        }
        return Ok(());
    }

    let collector_config = CollectorConfig::from(config);
    let sink = CsvSink::new(&config.output_dir);
    for job in &jobs {
        resolve_destination(&sink, job)?;
    }
    let session = ChromeSession::launch(&BrowserOptions::from_app_config(config)).await?;

    let job_count = jobs.len();
    let mut failed_jobs: usize = 0;
    let mut total_places: usize = 0;

    for (index, job) in jobs.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(remaining = job_count - index, "batch cancelled; skipping remaining jobs");
            break;
        }
        tracing::info!(city = %job.city, query = %job.query, limit = job.limit, "starting job");

        match collect_job(&session, &collector_config, &sink, job, cancel).await {
            Ok(report) => {
                total_places += report.places.len();
                if report.failed() {
                    tracing::error!(city = %job.city, stop = %report.stop, "job failed");
                    failed_jobs += 1;
                }
            }
            Err(e) => {
                tracing::error!(city = %job.city, error = %format!("{e:#}"), "job failed");
                failed_jobs += 1;
            }
        }
    }

    session.shutdown().await;

    println!(
        "batch finished: {total_places} places from {job_count} jobs into {}, {failed_jobs} failed",
        sink.output_dir().display()
    );
    if failed_jobs > 0 {
        anyhow::bail!("{failed_jobs} of {job_count} jobs failed");
    }
    Ok(())
}

/// Checks `job` and resolves its output file before any browsing, so an
/// unusable key cannot discard a finished collection.
///
/// # Errors
///
/// Returns an error if the job is invalid or its file key is unusable.
pub(crate) fn resolve_destination(sink: &CsvSink, job: &Job) -> anyhow::Result<PathBuf> {
    job.validate()?;
    let file_key = job.file_key();
    sink.path_for(&file_key)
        .with_context(|| format!("job for '{}' has no usable output file", job.city))
}

/// Runs one job on its own page and appends whatever it gathered.
async fn collect_job(
    session: &ChromeSession,
    collector_config: &CollectorConfig,
    sink: &CsvSink,
    job: &Job,
    cancel: &CancellationToken,
) -> anyhow::Result<JobReport> {
    let page = session.new_page().await?;
    let run = Collector::new(&page, collector_config)
        .run(&job.query, &job.city, job.limit, cancel)
        .await;
    if let Err(e) = page.close().await {
        tracing::warn!(error = %e, "failed to close search page");
    }

    let file_key = job.file_key();
    let summary = sink
        .append_records(&run.places, &file_key)
        .with_context(|| format!("failed to persist places for {file_key}"))?;

    Ok(JobReport {
        places: run.places,
        summary,
        stop: run.stop,
    })
}

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;

use sunshine_core::dates::SystemClock;
use sunshine_core::db::Database;
use sunshine_core::scheduler::{InitOutcome, Scheduler};
use sunshine_core::sync::{Notifier, SyncOutcome, SyncTask};

use crate::config::Config;
use crate::dispatcher::{JobRegistry, JobRunner, TokioDispatcher, network_probe};
use crate::notifier::default_notifier;
use crate::openweather::OpenWeatherClient;

use super::helpers::print_json;

pub(crate) fn cmd_sync(db: &Database, config: &Config, json: bool) -> Result<()> {
    let fetcher = OpenWeatherClient::new(&config.api_url)?;
    let notifier = default_notifier();
    let outcome = tokio::task::block_in_place(|| {
        SyncTask::new(db, &fetcher, notifier.as_ref(), &SystemClock).sync()
    });

    if json {
        return print_json(&outcome);
    }
    match outcome {
        SyncOutcome::Updated { inserted, notified } => {
            println!("Stored {inserted} forecast days");
            if notified {
                println!("  Notification shown");
            }
        }
        SyncOutcome::NoData => {
            eprintln!("No forecast available for this location. Stored data was kept.");
        }
        SyncOutcome::Failed { reason } => bail!("Sync failed: {reason}"),
    }
    Ok(())
}

/// Schedules the recurring sync and keeps it running until Ctrl-C.
pub(crate) async fn cmd_daemon(db: Arc<Database>, config: &Config, json: bool) -> Result<()> {
    let fetcher = Arc::new(OpenWeatherClient::new(&config.api_url)?);
    let notifier: Arc<dyn Notifier> = Arc::from(default_notifier());
    let dispatcher = TokioDispatcher::new(
        sync_runner(Arc::clone(&db), fetcher, notifier),
        JobRegistry::new(config.jobs_path.clone()),
        network_probe(&config.api_url),
    );
    let scheduler = Scheduler::new(dispatcher);

    let outcome = scheduler.initialize(&db, &SystemClock)?;
    let cold_start = matches!(outcome, InitOutcome::Initialized { cold_start: true });
    if json {
        println!(
            "{}",
            serde_json::json!({ "status": "running", "cold_start": cold_start })
        );
    } else {
        eprintln!("Sunshine sync running. Press Ctrl-C to stop.");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("shutting down");
    scheduler.dispatcher().shutdown();
    Ok(())
}

pub(crate) fn cmd_jobs(config: &Config, json: bool) -> Result<()> {
    let jobs = JobRegistry::new(config.jobs_path.clone()).load()?;

    if json {
        let list: Vec<_> = jobs.values().collect();
        return print_json(&list);
    }
    if jobs.is_empty() {
        eprintln!("No jobs registered. Use `sunshine daemon` to start syncing.");
    }
    for job in jobs.values() {
        println!(
            "{}: every {}h, may run up to {}m late{}",
            job.tag,
            job.interval_secs / 3600,
            job.flex_secs / 60,
            if job.requires_network {
                ", needs network"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn sync_runner(
    db: Arc<Database>,
    fetcher: Arc<OpenWeatherClient>,
    notifier: Arc<dyn Notifier>,
) -> JobRunner {
    Arc::new(move |tag: &str| {
        let outcome = SyncTask::new(&db, fetcher.as_ref(), notifier.as_ref(), &SystemClock).sync();
        info!(tag, ?outcome, "job finished");
    })
}

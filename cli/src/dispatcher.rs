use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use sunshine_core::scheduler::{JobDispatcher, JobSpec};

/// Work executed for a job tag, on a blocking thread.
pub type JobRunner = Arc<dyn Fn(&str) + Send + Sync>;

/// Job registrations persisted as JSON, keyed by tag.
pub struct JobRegistry {
    path: PathBuf,
}

impl JobRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<BTreeMap<String, JobSpec>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Stores `job`. Returns false when a job with the same tag exists and
    /// `job` does not ask to replace it.
    pub fn register(&self, job: &JobSpec) -> Result<bool> {
        let mut jobs = self.load()?;
        if jobs.contains_key(&job.tag) && !job.replace_current {
            return Ok(false);
        }
        jobs.insert(job.tag.clone(), job.clone());
        let raw = serde_json::to_string_pretty(&jobs)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(true)
    }
}

/// Runs jobs on the tokio runtime: recurring jobs loop on a timer that fires
/// somewhere inside `[interval, interval + flex]` after the previous run.
pub struct TokioDispatcher {
    runner: JobRunner,
    registry: JobRegistry,
    /// `host:port` that must resolve before a network job runs.
    network_probe: Option<String>,
    handle: Handle,
    running: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioDispatcher {
    pub fn new(runner: JobRunner, registry: JobRegistry, network_probe: Option<String>) -> Self {
        Self {
            runner,
            registry,
            network_probe,
            handle: Handle::current(),
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn running_tags(&self) -> Vec<String> {
        self.running
            .lock()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Cancels every recurring job.
    pub fn shutdown(&self) {
        if let Ok(mut running) = self.running.lock() {
            for (tag, handle) in running.drain() {
                debug!(%tag, "stopping job");
                handle.abort();
            }
        }
    }
}

impl JobDispatcher for TokioDispatcher {
    fn schedule(&self, job: &JobSpec) -> Result<()> {
        if job.persisted && !self.registry.register(job)? {
            debug!(tag = %job.tag, "job already registered");
            return Ok(());
        }
        if !job.recurring {
            return self.run_now(&job.tag);
        }

        let mut running = self
            .running
            .lock()
            .map_err(|_| anyhow::anyhow!("job table lock poisoned"))?;
        if let Some(previous) = running.remove(&job.tag) {
            if job.replace_current {
                debug!(tag = %job.tag, "replacing scheduled job");
                previous.abort();
            } else {
                running.insert(job.tag.clone(), previous);
                return Ok(());
            }
        }

        let task = self.handle.spawn(run_recurring(
            job.clone(),
            Arc::clone(&self.runner),
            self.network_probe.clone(),
        ));
        running.insert(job.tag.clone(), task);
        Ok(())
    }

    fn run_now(&self, tag: &str) -> Result<()> {
        let runner = Arc::clone(&self.runner);
        let tag = tag.to_string();
        self.handle.spawn(async move {
            run_job(&tag, &runner, None).await;
        });
        Ok(())
    }
}

async fn run_recurring(job: JobSpec, runner: JobRunner, network_probe: Option<String>) {
    let probe = if job.requires_network {
        network_probe.as_deref()
    } else {
        None
    };
    loop {
        let delay = next_delay(&job);
        debug!(tag = %job.tag, delay_secs = delay.as_secs(), "next run scheduled");
        tokio::time::sleep(delay).await;
        run_job(&job.tag, &runner, probe).await;
    }
}

async fn run_job(tag: &str, runner: &JobRunner, network_probe: Option<&str>) {
    if let Some(host) = network_probe {
        if !network_available(host).await {
            info!(tag, host, "network unavailable, skipping run");
            return;
        }
    }
    let runner = Arc::clone(runner);
    let owned_tag = tag.to_string();
    if let Err(e) = tokio::task::spawn_blocking(move || runner(&owned_tag)).await {
        error!(tag, "job failed to complete: {e}");
    }
}

fn next_delay(job: &JobSpec) -> Duration {
    let extra = if job.flex_secs == 0 {
        0
    } else {
        rand::rng().random_range(0..=job.flex_secs)
    };
    Duration::from_secs(job.interval_secs + extra)
}

async fn network_available(host: &str) -> bool {
    match tokio::net::lookup_host(host).await {
        Ok(mut addrs) => addrs.next().is_some(),
        Err(e) => {
            warn!(host, "lookup failed: {e}");
            false
        }
    }
}

/// `host:port` of a URL, for the network check.
pub fn network_probe(url: &str) -> Option<String> {
    let url = reqwest::Url::parse(url).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}

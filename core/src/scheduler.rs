use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dates::{Clock, normalized_today};
use crate::db::Database;

pub const SYNC_TAG: &str = "sunshine_sync";
pub const SYNC_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);
pub const SYNC_FLEX: Duration = Duration::from_secs(SYNC_INTERVAL.as_secs() / 3);

/// A background job registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub tag: String,
    pub recurring: bool,
    pub interval_secs: u64,
    /// Extra time after the interval during which the job may run.
    pub flex_secs: u64,
    pub requires_network: bool,
    /// Survives process restarts.
    pub persisted: bool,
    /// Replaces any registration with the same tag.
    pub replace_current: bool,
}

impl JobSpec {
    /// The recurring forecast sync.
    #[must_use]
    pub fn forecast_sync() -> Self {
        Self {
            tag: SYNC_TAG.to_string(),
            recurring: true,
            interval_secs: SYNC_INTERVAL.as_secs(),
            flex_secs: SYNC_FLEX.as_secs(),
            requires_network: true,
            persisted: true,
            replace_current: true,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn flex(&self) -> Duration {
        Duration::from_secs(self.flex_secs)
    }

    /// Latest point after the previous run at which the job should run.
    #[must_use]
    pub fn window_end(&self) -> Duration {
        self.interval() + self.flex()
    }
}

/// The host's background execution facility.
pub trait JobDispatcher: Send + Sync {
    fn schedule(&self, job: &JobSpec) -> Result<()>;

    /// Runs the job once, as soon as possible, without waiting for its window.
    fn run_now(&self, tag: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    AlreadyInitialized,
    Initialized { cold_start: bool },
}

/// Owns sync scheduling for one process.
///
/// Construct one at startup; [`Scheduler::initialize`] registers the
/// recurring job the first time and is a no-op afterwards.
pub struct Scheduler<D> {
    dispatcher: D,
    initialized: AtomicBool,
}

impl<D: JobDispatcher> Scheduler<D> {
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Registers the recurring sync and, when nothing is stored for today
    /// onward, starts one sync right away.
    pub fn initialize(&self, db: &Database, clock: &dyn Clock) -> Result<InitOutcome> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("scheduler already initialized");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let job = JobSpec::forecast_sync();
        self.dispatcher.schedule(&job)?;
        info!(
            tag = %job.tag,
            interval_secs = job.interval_secs,
            flex_secs = job.flex_secs,
            "recurring sync scheduled"
        );

        let today = normalized_today(clock);
        let cold_start = db.count_from_date(today)? == 0;
        if cold_start {
            info!("no forecast for today onward, syncing now");
            self.dispatcher.run_now(SYNC_TAG)?;
        }
        Ok(InitOutcome::Initialized { cold_start })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::dates::{DAY_IN_MILLIS, FixedClock};
    use crate::models::ForecastDay;

    const NOW: i64 = 1_791_973_800_000;
    const TODAY: i64 = 1_791_936_000_000;

    #[derive(Default)]
    struct RecordingDispatcher {
        scheduled: Mutex<Vec<JobSpec>>,
        immediate: Mutex<Vec<String>>,
    }

    impl JobDispatcher for RecordingDispatcher {
        fn schedule(&self, job: &JobSpec) -> Result<()> {
            self.scheduled.lock().unwrap().push(job.clone());
            Ok(())
        }

        fn run_now(&self, tag: &str) -> Result<()> {
            self.immediate.lock().unwrap().push(tag.to_string());
            Ok(())
        }
    }

    fn day(date: i64) -> ForecastDay {
        ForecastDay {
            date,
            weather_id: 800,
            temp_min: 1.0,
            temp_max: 2.0,
            humidity: 50.0,
            pressure: 1000.0,
            wind_speed: 1.0,
            wind_degrees: 0.0,
        }
    }

    #[test]
    fn test_job_spec_constants() {
        let job = JobSpec::forecast_sync();
        assert_eq!(job.tag, SYNC_TAG);
        assert_eq!(job.interval(), Duration::from_secs(10_800));
        assert_eq!(job.flex(), Duration::from_secs(3_600));
        assert_eq!(job.window_end(), Duration::from_secs(14_400));
        assert!(job.recurring && job.requires_network && job.persisted && job.replace_current);
    }

    #[test]
    fn test_cold_start_syncs_once() {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock::utc(NOW);
        let scheduler = Scheduler::new(RecordingDispatcher::default());

        assert_eq!(
            scheduler.initialize(&db, &clock).unwrap(),
            InitOutcome::Initialized { cold_start: true }
        );
        assert_eq!(
            scheduler.initialize(&db, &clock).unwrap(),
            InitOutcome::AlreadyInitialized
        );

        let dispatcher = scheduler.dispatcher();
        assert_eq!(dispatcher.scheduled.lock().unwrap().len(), 1);
        assert_eq!(*dispatcher.immediate.lock().unwrap(), vec![SYNC_TAG.to_string()]);
        assert!(scheduler.is_initialized());
    }

    #[test]
    fn test_warm_start_skips_immediate_sync() {
        let db = Database::open_in_memory().unwrap();
        db.replace_all(&[day(TODAY), day(TODAY + DAY_IN_MILLIS)])
            .unwrap();
        let scheduler = Scheduler::new(RecordingDispatcher::default());

        assert_eq!(
            scheduler.initialize(&db, &FixedClock::utc(NOW)).unwrap(),
            InitOutcome::Initialized { cold_start: false }
        );
        assert_eq!(scheduler.dispatcher().scheduled.lock().unwrap().len(), 1);
        assert!(scheduler.dispatcher().immediate.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stale_rows_count_as_cold_start() {
        let db = Database::open_in_memory().unwrap();
        db.replace_all(&[day(TODAY - 2 * DAY_IN_MILLIS), day(TODAY - DAY_IN_MILLIS)])
            .unwrap();
        let scheduler = Scheduler::new(RecordingDispatcher::default());

        assert_eq!(
            scheduler.initialize(&db, &FixedClock::utc(NOW)).unwrap(),
            InitOutcome::Initialized { cold_start: true }
        );
    }

    #[test]
    fn test_job_spec_serde() {
        let json = serde_json::to_string(&JobSpec::forecast_sync()).unwrap();
        let back: JobSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, JobSpec::forecast_sync());
    }
}

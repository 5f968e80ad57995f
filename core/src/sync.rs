use anyhow::Result;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::dates::{Clock, DAY_IN_MILLIS, normalized_today};
use crate::db::Database;
use crate::models::{ForecastQuery, Units};
use crate::openweather::{FORECAST_DAYS, ParsedForecast, parse_forecast};
use crate::prefs::Preferences;
use crate::weather::{ConditionArt, condition_description, format_temperature};

/// Fetches the raw forecast payload.
///
/// The CLI implements this with reqwest. Called synchronously; async hosts
/// should run [`SyncTask::sync`] on a blocking thread.
pub trait ForecastFetcher: Send + Sync {
    fn fetch(&self, query: &ForecastQuery) -> Result<String>;
}

/// Shows the "new weather" alert to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &WeatherAlert) -> Result<()>;
}

/// Today's headline conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherAlert {
    pub date: i64,
    pub weather_id: i32,
    pub high: f64,
    pub low: f64,
    pub units: Units,
}

impl WeatherAlert {
    #[must_use]
    pub fn title(&self) -> &'static str {
        "Sunshine"
    }

    #[must_use]
    pub fn text(&self) -> String {
        format!(
            "Forecast: {} High: {} Low: {}",
            condition_description(self.weather_id),
            format_temperature(self.high, self.units),
            format_temperature(self.low, self.units),
        )
    }

    #[must_use]
    pub fn art(&self) -> ConditionArt {
        ConditionArt::from_weather_id(self.weather_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Updated { inserted: usize, notified: bool },
    /// Upstream reported an error status or an empty forecast.
    NoData,
    Failed { reason: String },
}

/// One fetch → parse → replace → notify pass.
pub struct SyncTask<'a> {
    db: &'a Database,
    fetcher: &'a dyn ForecastFetcher,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
}

impl<'a> SyncTask<'a> {
    #[must_use]
    pub fn new(
        db: &'a Database,
        fetcher: &'a dyn ForecastFetcher,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            db,
            fetcher,
            notifier,
            clock,
        }
    }

    /// Runs a sync. Failures are logged and reported in the outcome, never
    /// returned; the store keeps whatever it held before the failing step.
    pub fn sync(&self) -> SyncOutcome {
        match self.try_sync() {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("forecast sync failed: {e:#}");
                SyncOutcome::Failed {
                    reason: format!("{e:#}"),
                }
            }
        }
    }

    fn try_sync(&self) -> Result<SyncOutcome> {
        let prefs = Preferences::new(self.db);
        let query = ForecastQuery {
            location: prefs.location()?,
            days: FORECAST_DAYS,
            // Stored temperatures are always Celsius; units apply on display.
            units: Units::Metric,
        };
        debug!(location = %query.location, "fetching forecast");
        let body = self.fetcher.fetch(&query)?;

        let today = normalized_today(self.clock);
        let days = match parse_forecast(&body, today)? {
            ParsedForecast::UpstreamStatus(code) => {
                info!(code, "forecast unavailable upstream");
                return Ok(SyncOutcome::NoData);
            }
            ParsedForecast::Forecast { coordinates, days } => {
                prefs.set_coordinates(coordinates)?;
                days
            }
        };
        if days.is_empty() {
            info!("forecast payload had no days");
            return Ok(SyncOutcome::NoData);
        }

        let inserted = self.db.replace_all(&days)?;
        let notified = inserted > 0
            && match self.notify_if_due(&prefs) {
                Ok(notified) => notified,
                Err(e) => {
                    warn!("skipping weather notification: {e:#}");
                    false
                }
            };

        info!(inserted, notified, "forecast sync finished");
        Ok(SyncOutcome::Updated { inserted, notified })
    }

    /// Notifies at most once per rolling day, and only when enabled.
    fn notify_if_due(&self, prefs: &Preferences<'_>) -> Result<bool> {
        if !prefs.notifications_enabled()? {
            return Ok(false);
        }
        let now = self.clock.now_millis();
        if prefs.elapsed_since_last_notification(now)? < DAY_IN_MILLIS {
            debug!("notified within the last day");
            return Ok(false);
        }

        let today = normalized_today(self.clock);
        let Some(day) = self.db.query_by_date(today)? else {
            debug!(today, "no forecast for today, not notifying");
            return Ok(false);
        };
        let alert = WeatherAlert {
            date: day.date,
            weather_id: day.weather_id,
            high: day.temp_max,
            low: day.temp_min,
            units: prefs.units()?,
        };
        self.notifier.notify(&alert)?;
        prefs.set_last_notification_millis(now)?;
        Ok(true)
    }
}

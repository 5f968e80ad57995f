use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::changes::{ChangeBus, Resource};
use crate::dates::is_normalized;
use crate::error::StoreError;
use crate::models::ForecastDay;

const SCHEMA_VERSION: i64 = 1;

const CREATE_WEATHER: &str = "CREATE TABLE IF NOT EXISTS weather (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date INTEGER NOT NULL UNIQUE ON CONFLICT REPLACE,
        weather_id INTEGER NOT NULL,
        min REAL NOT NULL,
        max REAL NOT NULL,
        humidity REAL NOT NULL,
        pressure REAL NOT NULL,
        wind REAL NOT NULL,
        degrees REAL NOT NULL
    );";

const CREATE_SETTINGS: &str = "CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );";

const SELECT_DAY: &str = "SELECT date, weather_id, min, max, humidity, pressure, wind, degrees
     FROM weather";

/// The forecast store.
///
/// One connection behind one lock: every read and write holds the whole
/// table, so a reader sees either the state before a `replace_all` or the
/// state after it, and two replaces never interleave.
pub struct Database {
    conn: Mutex<Connection>,
    changes: ChangeBus,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrate(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
            changes: ChangeBus::new(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))
    }

    pub fn subscribe(&self, resource: Resource) -> Receiver<Resource> {
        self.changes.subscribe(resource)
    }

    // --- Forecast ---

    /// Replaces the whole forecast with `days` and returns how many rows were
    /// inserted.
    ///
    /// Rows whose date is not normalized are skipped and logged; the others
    /// still go in. A non-empty batch in which every row is rejected fails
    /// with [`StoreError::UnnormalizedDate`] and leaves the table untouched.
    pub fn replace_all(&self, days: &[ForecastDay]) -> Result<usize> {
        let (deleted, inserted) = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let deleted = tx.execute("DELETE FROM weather", [])?;

            let mut inserted = 0;
            let mut first_rejected = None;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO weather (date, weather_id, min, max, humidity, pressure, wind, degrees)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                for day in days {
                    if let Err(e) = ensure_normalized(day.date) {
                        warn!(date = day.date, "skipping forecast row: {e}");
                        first_rejected.get_or_insert(day.date);
                        continue;
                    }
                    inserted += stmt.execute(params![
                        day.date,
                        day.weather_id,
                        day.temp_min,
                        day.temp_max,
                        day.humidity,
                        day.pressure,
                        day.wind_speed,
                        day.wind_degrees,
                    ])?;
                }
            }

            if let (0, Some(date)) = (inserted, first_rejected) {
                // Dropping the transaction rolls the delete back.
                return Err(StoreError::UnnormalizedDate(date).into());
            }
            tx.commit()?;
            (deleted, inserted)
        };

        info!(deleted, inserted, "forecast replaced");
        if deleted > 0 || inserted > 0 {
            self.changes.notify(Resource::Forecast);
        }
        Ok(inserted)
    }

    /// Deletes everything under `resource`. Only the whole table can be
    /// deleted; single days are replaced through [`Database::replace_all`].
    pub fn delete(&self, resource: Resource) -> Result<usize> {
        match resource {
            Resource::Forecast => {
                let deleted = self.conn()?.execute("DELETE FROM weather", [])?;
                debug!(deleted, "forecast cleared");
                if deleted > 0 {
                    self.changes.notify(Resource::Forecast);
                }
                Ok(deleted)
            }
            Resource::ForecastDay(_) => {
                Err(StoreError::Unsupported(format!("delete {resource}")).into())
            }
        }
    }

    pub fn query_by_date(&self, date: i64) -> Result<Option<ForecastDay>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_DAY} WHERE date = ?1"))?;
        let mut rows = stmt.query(params![date])?;
        if let Some(row) = rows.next()? {
            Ok(Some(forecast_day_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All days on or after `date`, oldest first.
    pub fn query_from_date(&self, date: i64) -> Result<Vec<ForecastDay>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_DAY} WHERE date >= ?1 ORDER BY date ASC"))?;
        let days = stmt
            .query_map(params![date], forecast_day_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }

    pub fn count_from_date(&self, date: i64) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM weather WHERE date >= ?1",
            params![date],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    // --- Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn()?
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version != SCHEMA_VERSION {
        if version != 0 {
            // No migrations are defined: an unknown schema is dropped.
            warn!(from = version, to = SCHEMA_VERSION, "recreating forecast table");
            conn.execute_batch("DROP TABLE IF EXISTS weather;")?;
        }
        conn.execute_batch(&format!(
            "{CREATE_WEATHER}
             {CREATE_SETTINGS}
             PRAGMA user_version = {SCHEMA_VERSION};"
        ))?;
    }
    Ok(())
}

fn ensure_normalized(date: i64) -> Result<(), StoreError> {
    if is_normalized(date) {
        Ok(())
    } else {
        Err(StoreError::UnnormalizedDate(date))
    }
}

fn forecast_day_from_row(row: &rusqlite::Row) -> rusqlite::Result<ForecastDay> {
    Ok(ForecastDay {
        date: row.get(0)?,
        weather_id: row.get(1)?,
        temp_min: row.get(2)?,
        temp_max: row.get(3)?,
        humidity: row.get(4)?,
        pressure: row.get(5)?,
        wind_speed: row.get(6)?,
        wind_degrees: row.get(7)?,
    })
}

use anyhow::{Context, Result};

use crate::db::Database;
use crate::models::{Coordinates, Location, Units};

pub const DEFAULT_LOCATION: &str = "94043,USA";

const KEY_LOCATION: &str = "location";
const KEY_COORD_LAT: &str = "coord_lat";
const KEY_COORD_LON: &str = "coord_lon";
const KEY_UNITS: &str = "units";
const KEY_NOTIFICATIONS: &str = "notifications_enabled";
const KEY_LAST_NOTIFICATION: &str = "last_notification";

/// Typed view over the `settings` table.
#[derive(Clone, Copy)]
pub struct Preferences<'a> {
    db: &'a Database,
}

impl<'a> Preferences<'a> {
    #[must_use]
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Coordinates win over the place query when both are set.
    pub fn location(&self) -> Result<Location> {
        if let Some(coordinates) = self.coordinates()? {
            return Ok(Location::Coordinates(coordinates));
        }
        Ok(Location::Query {
            query: self.location_query()?,
        })
    }

    pub fn location_query(&self) -> Result<String> {
        Ok(self
            .db
            .get_setting(KEY_LOCATION)?
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()))
    }

    pub fn set_location_query(&self, query: &str) -> Result<()> {
        self.db.set_setting(KEY_LOCATION, query.trim())
    }

    pub fn coordinates(&self) -> Result<Option<Coordinates>> {
        let lat = self.get_f64(KEY_COORD_LAT)?;
        let lon = self.get_f64(KEY_COORD_LON)?;
        Ok(lat.zip(lon).map(|(lat, lon)| Coordinates { lat, lon }))
    }

    pub fn set_coordinates(&self, coordinates: Coordinates) -> Result<()> {
        self.db
            .set_setting(KEY_COORD_LAT, &coordinates.lat.to_string())?;
        self.db
            .set_setting(KEY_COORD_LON, &coordinates.lon.to_string())
    }

    pub fn reset_coordinates(&self) -> Result<()> {
        self.db.delete_setting(KEY_COORD_LAT)?;
        self.db.delete_setting(KEY_COORD_LON)?;
        Ok(())
    }

    pub fn units(&self) -> Result<Units> {
        self.db
            .get_setting(KEY_UNITS)?
            .map_or(Ok(Units::default()), |s| s.parse())
    }

    pub fn set_units(&self, units: Units) -> Result<()> {
        self.db.set_setting(KEY_UNITS, units.as_str())
    }

    pub fn notifications_enabled(&self) -> Result<bool> {
        Ok(self
            .db
            .get_setting(KEY_NOTIFICATIONS)?
            .is_none_or(|v| v == "true"))
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<()> {
        self.db
            .set_setting(KEY_NOTIFICATIONS, if enabled { "true" } else { "false" })
    }

    pub fn last_notification_millis(&self) -> Result<i64> {
        match self.db.get_setting(KEY_LAST_NOTIFICATION)? {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid stored notification time '{v}'")),
            None => Ok(0),
        }
    }

    pub fn set_last_notification_millis(&self, millis: i64) -> Result<()> {
        self.db
            .set_setting(KEY_LAST_NOTIFICATION, &millis.to_string())
    }

    pub fn elapsed_since_last_notification(&self, now_millis: i64) -> Result<i64> {
        Ok(now_millis - self.last_notification_millis()?)
    }

    fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.db
            .get_setting(key)?
            .map(|v| {
                v.parse::<f64>()
                    .with_context(|| format!("Invalid stored value for {key}: '{v}'"))
            })
            .transpose()
    }
}

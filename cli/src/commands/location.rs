use anyhow::{Result, bail};
use serde::Serialize;

use sunshine_core::changes::Resource;
use sunshine_core::db::Database;
use sunshine_core::models::{Coordinates, Location};
use sunshine_core::prefs::Preferences;

use super::helpers::print_json;

#[derive(Serialize)]
struct LocationReport {
    /// What the next sync will query.
    active: Location,
    query: String,
    coordinates: Option<Coordinates>,
}

#[derive(Serialize)]
struct LocationChanged {
    active: Location,
    cleared_days: usize,
}

pub(crate) fn cmd_location_show(db: &Database, json: bool) -> Result<()> {
    let prefs = Preferences::new(db);
    let report = LocationReport {
        active: prefs.location()?,
        query: prefs.location_query()?,
        coordinates: prefs.coordinates()?,
    };

    if json {
        print_json(&report)?;
    } else {
        println!("Location: {}", report.active);
        println!("  Query:       {}", report.query);
        match report.coordinates {
            Some(c) => println!("  Coordinates: {:.4}, {:.4}", c.lat, c.lon),
            None => println!("  Coordinates: (not set)"),
        }
    }

    Ok(())
}

pub(crate) fn cmd_location_set(db: &Database, query: &str, json: bool) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Location cannot be empty");
    }
    let prefs = Preferences::new(db);
    prefs.reset_coordinates()?;
    prefs.set_location_query(query)?;
    report_change(db, json)
}

pub(crate) fn cmd_location_coords(db: &Database, lat: f64, lon: f64, json: bool) -> Result<()> {
    let coordinates = validate_coordinates(lat, lon)?;
    Preferences::new(db).set_coordinates(coordinates)?;
    report_change(db, json)
}

pub(crate) fn cmd_location_reset(db: &Database, json: bool) -> Result<()> {
    Preferences::new(db).reset_coordinates()?;
    report_change(db, json)
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<Coordinates> {
    if !(-90.0..=90.0).contains(&lat) {
        bail!("Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&lon) {
        bail!("Longitude must be between -180 and 180");
    }
    Ok(Coordinates { lat, lon })
}

/// A new location invalidates the stored forecast.
fn report_change(db: &Database, json: bool) -> Result<()> {
    let cleared_days = db.delete(Resource::Forecast)?;
    let changed = LocationChanged {
        active: Preferences::new(db).location()?,
        cleared_days,
    };

    if json {
        print_json(&changed)?;
    } else {
        println!("Location set to {}", changed.active);
        if cleared_days > 0 {
            println!("  Cleared {cleared_days} cached days. Run `sunshine sync` to refresh.");
        }
    }

    Ok(())
}

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;

use sunshine_core::db::Database;
use sunshine_core::models::Units;
use sunshine_core::prefs::Preferences;

use super::helpers::{parse_switch, print_json};

#[derive(Serialize)]
struct SettingsReport {
    units: Units,
    notifications: bool,
    /// RFC 3339, absent when no notification was ever shown.
    last_notification: Option<String>,
}

pub(crate) fn cmd_settings_show(db: &Database, json: bool) -> Result<()> {
    let prefs = Preferences::new(db);
    let last = prefs.last_notification_millis()?;
    let report = SettingsReport {
        units: prefs.units()?,
        notifications: prefs.notifications_enabled()?,
        last_notification: (last > 0)
            .then(|| DateTime::from_timestamp_millis(last))
            .flatten()
            .map(|t| t.with_timezone(&Local).to_rfc3339()),
    };

    if json {
        print_json(&report)?;
    } else {
        println!("Units:             {}", report.units.as_str());
        println!(
            "Notifications:     {}",
            if report.notifications { "on" } else { "off" }
        );
        println!(
            "Last notification: {}",
            report.last_notification.as_deref().unwrap_or("never")
        );
    }

    Ok(())
}

pub(crate) fn cmd_settings_units(db: &Database, units: &str, json: bool) -> Result<()> {
    let units: Units = units.parse()?;
    Preferences::new(db).set_units(units)?;

    if json {
        println!("{}", serde_json::json!({ "units": units }));
    } else {
        println!("Units set to {}", units.as_str());
    }

    Ok(())
}

pub(crate) fn cmd_settings_notifications(db: &Database, value: &str, json: bool) -> Result<()> {
    let enabled = parse_switch(value)?;
    Preferences::new(db).set_notifications_enabled(enabled)?;

    if json {
        println!("{}", serde_json::json!({ "notifications": enabled }));
    } else {
        println!(
            "Notifications turned {}",
            if enabled { "on" } else { "off" }
        );
    }

    Ok(())
}

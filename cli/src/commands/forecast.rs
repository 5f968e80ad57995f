use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use sunshine_core::dates::{
    Clock, DayLabels, SystemClock, calendar_date, friendly_label, normalized_today,
};
use sunshine_core::db::Database;
use sunshine_core::models::{ForecastDay, Units};
use sunshine_core::prefs::Preferences;
use sunshine_core::weather::{
    ConditionArt, celsius_to_fahrenheit, condition_description, format_high_low, format_humidity,
    format_pressure, format_temperature, format_wind,
};

use super::helpers::{json_error, parse_day, print_json};

/// A stored day converted to the display units.
#[derive(Debug, Serialize)]
pub(crate) struct DayView {
    pub date: String,
    pub label: String,
    pub weather_id: i32,
    pub description: String,
    pub high: f64,
    pub low: f64,
    pub units: Units,
    pub humidity: f64,
    pub pressure: f64,
    pub wind: String,
    #[serde(skip)]
    pub icon: &'static str,
}

pub(crate) fn day_view(
    day: &ForecastDay,
    clock: &dyn Clock,
    units: Units,
    show_full_date: bool,
) -> DayView {
    let convert = |celsius: f64| match units {
        Units::Metric => celsius,
        Units::Imperial => celsius_to_fahrenheit(celsius),
    };
    DayView {
        date: calendar_date(day.date).format("%Y-%m-%d").to_string(),
        label: friendly_label(clock, &DayLabels::default(), day.date, show_full_date),
        weather_id: day.weather_id,
        description: condition_description(day.weather_id),
        high: convert(day.temp_max).round(),
        low: convert(day.temp_min).round(),
        units,
        humidity: day.humidity,
        pressure: day.pressure,
        wind: format_wind(day.wind_speed, day.wind_degrees, units),
        icon: ConditionArt::from_weather_id(day.weather_id).icon(),
    }
}

pub(crate) fn cmd_forecast(db: &Database, days: Option<u32>, json: bool) -> Result<()> {
    let clock = SystemClock;
    let units = Preferences::new(db).units()?;
    let stored = db.query_from_date(normalized_today(&clock))?;
    let limit = days.map_or(stored.len(), |d| usize::try_from(d).unwrap_or(usize::MAX));

    let views: Vec<DayView> = stored
        .iter()
        .take(limit)
        .map(|d| day_view(d, &clock, units, false))
        .collect();

    if json {
        print_json(&views)?;
    } else if views.is_empty() {
        eprintln!("No forecast stored. Use `sunshine sync` to fetch one.");
    } else {
        #[derive(Tabled)]
        struct ForecastRow {
            #[tabled(rename = "Day")]
            label: String,
            #[tabled(rename = "Conditions")]
            conditions: String,
            #[tabled(rename = "High")]
            high: String,
            #[tabled(rename = "Low")]
            low: String,
            #[tabled(rename = "Humidity")]
            humidity: String,
            #[tabled(rename = "Wind")]
            wind: String,
        }

        let rows: Vec<ForecastRow> = stored
            .iter()
            .zip(&views)
            .map(|(d, v)| ForecastRow {
                label: v.label.clone(),
                conditions: format!("{} {}", v.icon, v.description),
                high: format_temperature(d.temp_max.round(), units),
                low: format_temperature(d.temp_min.round(), units),
                humidity: format_humidity(d.humidity),
                wind: v.wind.clone(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..5)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_show(db: &Database, date: Option<&str>, json: bool) -> Result<()> {
    let clock = SystemClock;
    let key = parse_day(date, &clock)?;
    let units = Preferences::new(db).units()?;

    if let Some(day) = db.query_by_date(key)? {
        let view = day_view(&day, &clock, units, true);
        if json {
            print_json(&view)?;
        } else {
            println!("{} {}", view.icon, view.label);
            println!("  {}", view.description);
            println!(
                "  High / Low: {}",
                format_high_low(day.temp_max, day.temp_min, units)
            );
            println!("  Humidity:   {}", format_humidity(day.humidity));
            println!("  Pressure:   {}", format_pressure(day.pressure));
            println!("  Wind:       {}", view.wind);
        }
    } else {
        let date_str = calendar_date(key).format("%Y-%m-%d");
        let message = format!("No forecast stored for {date_str}");
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}");
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use sunshine_core::dates::{Clock, DAY_IN_MILLIS, normalized_from_date, normalized_today};

/// Resolve a day argument to its stored key.
/// Accepts: today (default), yesterday, tomorrow, or YYYY-MM-DD.
pub(crate) fn parse_day(date_str: Option<&str>, clock: &dyn Clock) -> Result<i64> {
    let today = normalized_today(clock);
    match date_str {
        None | Some("today") => Ok(today),
        Some("yesterday") => Ok(today - DAY_IN_MILLIS),
        Some("tomorrow") => Ok(today + DAY_IN_MILLIS),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(normalized_from_date)
            .with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
    }
}

pub(crate) fn parse_switch(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("Invalid value '{s}'. Use 'on' or 'off'"),
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! The forecast payload: request parameters and response parsing.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use crate::dates::DAY_IN_MILLIS;
use crate::models::{Coordinates, ForecastDay, ForecastQuery, Location};

pub const DEFAULT_API_URL: &str = "https://andfun-weather.udacity.com/weather";
pub const FORECAST_DAYS: u32 = 14;

const STATUS_OK: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub city: City,
    pub list: Vec<DayEntry>,
}

#[derive(Debug, Deserialize)]
pub struct City {
    pub coord: Coordinates,
}

#[derive(Debug, Deserialize)]
pub struct DayEntry {
    pub pressure: f64,
    pub humidity: f64,
    pub speed: f64,
    pub deg: f64,
    pub temp: Temperature,
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct Temperature {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedForecast {
    Forecast {
        coordinates: Coordinates,
        days: Vec<ForecastDay>,
    },
    /// The payload carried a status other than OK; there is no data.
    UpstreamStatus(i64),
}

/// Query parameters for a forecast request.
#[must_use]
pub fn query_pairs(query: &ForecastQuery) -> Vec<(&'static str, String)> {
    let mut pairs = match &query.location {
        Location::Coordinates(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        Location::Query { query } => vec![("q", query.clone())],
    };
    pairs.push(("mode", "json".to_string()));
    pairs.push(("units", query.units.as_str().to_string()));
    pairs.push(("cnt", query.days.to_string()));
    pairs
}

/// Parses a forecast payload. Entry `i` is keyed `today + i` days; the
/// per-entry timestamps in the payload are ignored.
pub fn parse_forecast(body: &str, today: i64) -> Result<ParsedForecast> {
    let value: Value = serde_json::from_str(body).context("Forecast payload is not JSON")?;

    if let Some(code) = value.get("cod") {
        let code = status_code(code)?;
        if code != STATUS_OK {
            return Ok(ParsedForecast::UpstreamStatus(code));
        }
    }

    let response: ForecastResponse =
        serde_json::from_value(value).context("Malformed forecast payload")?;

    let mut days = Vec::with_capacity(response.list.len());
    for (i, entry) in (0_i64..).zip(response.list) {
        let Some(condition) = entry.weather.first() else {
            bail!("Forecast entry {i} has no weather condition");
        };
        days.push(ForecastDay {
            date: today + i * DAY_IN_MILLIS,
            weather_id: condition.id,
            temp_min: entry.temp.min,
            temp_max: entry.temp.max,
            humidity: entry.humidity,
            pressure: entry.pressure,
            wind_speed: entry.speed,
            wind_degrees: entry.deg,
        });
    }

    Ok(ParsedForecast::Forecast {
        coordinates: response.city.coord,
        days,
    })
}

fn status_code(code: &Value) -> Result<i64> {
    let parsed = match code {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.with_context(|| format!("Invalid status code in forecast payload: {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Units;

    const TODAY: i64 = 1_791_936_000_000;

    fn payload(cod: &str, entries: usize) -> String {
        let entry = r#"{"dt":1,"temp":{"day":18.1,"min":9.5,"max":21.0},
            "pressure":1017.2,"humidity":81,"weather":[{"id":501,"main":"Rain"},{"id":800}],
            "speed":4.3,"deg":290}"#;
        let list = vec![entry; entries].join(",");
        format!(
            r#"{{"city":{{"name":"Mountain View","coord":{{"lat":37.4,"lon":-122.08}}}},
                "cod":{cod},"list":[{list}]}}"#
        )
    }

    #[test]
    fn test_parse_assigns_sequential_days() {
        let parsed = parse_forecast(&payload("\"200\"", 4), TODAY).unwrap();
        let ParsedForecast::Forecast { coordinates, days } = parsed else {
            panic!("expected forecast");
        };
        assert_eq!(coordinates, Coordinates { lat: 37.4, lon: -122.08 });
        let dates: Vec<i64> = days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            (0..4).map(|i| TODAY + i * DAY_IN_MILLIS).collect::<Vec<_>>()
        );
        assert_eq!(days[0].weather_id, 501);
        assert_eq!(days[0].temp_max, 21.0);
        assert_eq!(days[0].humidity, 81.0);
        assert_eq!(days[0].wind_degrees, 290.0);
    }

    #[test]
    fn test_parse_numeric_ok_code() {
        assert!(matches!(
            parse_forecast(&payload("200", 1), TODAY).unwrap(),
            ParsedForecast::Forecast { .. }
        ));
    }

    #[test]
    fn test_parse_without_code() {
        let body = r#"{"city":{"coord":{"lat":1.0,"lon":2.0}},"list":[]}"#;
        let parsed = parse_forecast(body, TODAY).unwrap();
        assert_eq!(
            parsed,
            ParsedForecast::Forecast {
                coordinates: Coordinates { lat: 1.0, lon: 2.0 },
                days: vec![]
            }
        );
    }

    #[test]
    fn test_parse_not_found() {
        let body = r#"{"cod":"404","message":"city not found"}"#;
        assert_eq!(
            parse_forecast(body, TODAY).unwrap(),
            ParsedForecast::UpstreamStatus(404)
        );
        assert_eq!(
            parse_forecast(r#"{"cod":500}"#, TODAY).unwrap(),
            ParsedForecast::UpstreamStatus(500)
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_forecast("not json", TODAY).is_err());
        assert!(parse_forecast(r#"{"cod":"200"}"#, TODAY).is_err());
        assert!(parse_forecast(r#"{"cod":true}"#, TODAY).is_err());
        let no_condition = r#"{"city":{"coord":{"lat":1.0,"lon":2.0}},"list":[
            {"temp":{"min":1.0,"max":2.0},"pressure":1.0,"humidity":1,"weather":[],"speed":1.0,"deg":1.0}]}"#;
        assert!(parse_forecast(no_condition, TODAY).is_err());
    }

    #[test]
    fn test_query_pairs() {
        let query = ForecastQuery {
            location: Location::Query {
                query: "94043,USA".to_string(),
            },
            days: FORECAST_DAYS,
            units: Units::Metric,
        };
        assert_eq!(
            query_pairs(&query),
            vec![
                ("q", "94043,USA".to_string()),
                ("mode", "json".to_string()),
                ("units", "metric".to_string()),
                ("cnt", "14".to_string()),
            ]
        );

        let query = ForecastQuery {
            location: Location::Coordinates(Coordinates { lat: 1.5, lon: -2.0 }),
            ..query
        };
        let pairs = query_pairs(&query);
        assert_eq!(pairs[0], ("lat", "1.5".to_string()));
        assert_eq!(pairs[1], ("lon", "-2".to_string()));
    }
}

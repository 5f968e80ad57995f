use serde::Serialize;
use tracing::warn;

use crate::models::Units;

const MPH_PER_KMH: f64 = 0.621_371_192_237_334;

/// Artwork family for a condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionArt {
    Storm,
    LightRain,
    Rain,
    Snow,
    Fog,
    Clear,
    LightClouds,
    Clouds,
}

impl ConditionArt {
    #[must_use]
    pub fn from_weather_id(weather_id: i32) -> Self {
        match weather_id {
            200..=232 | 771 | 781 | 900..=906 | 958..=962 => Self::Storm,
            300..=321 => Self::LightRain,
            500..=504 | 520..=531 => Self::Rain,
            511 | 600..=622 => Self::Snow,
            701..=761 => Self::Fog,
            800 | 951..=957 => Self::Clear,
            801 => Self::LightClouds,
            802..=804 => Self::Clouds,
            _ => {
                warn!(weather_id, "unknown weather condition");
                Self::Storm
            }
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Storm => "⛈",
            Self::LightRain => "🌦",
            Self::Rain => "🌧",
            Self::Snow => "🌨",
            Self::Fog => "🌫",
            Self::Clear => "☀",
            Self::LightClouds => "🌤",
            Self::Clouds => "☁",
        }
    }
}

/// Short description of a condition code.
#[must_use]
pub fn condition_description(weather_id: i32) -> String {
    let text = match weather_id {
        200..=232 => "Storm",
        300..=321 => "Drizzle",
        500 => "Light Rain",
        501 => "Moderate Rain",
        502 => "Heavy Rain",
        503 => "Intense Rain",
        504 => "Extreme Rain",
        511 => "Freezing Rain",
        520 => "Light Shower",
        521 => "Shower",
        522 => "Heavy Shower",
        531 => "Ragged Shower",
        600 => "Light Snow",
        601 => "Snow",
        602 => "Heavy Snow",
        611 => "Sleet",
        612 => "Shower Sleet",
        615 => "Light Rain and Snow",
        616 => "Rain and Snow",
        620 => "Light Shower Snow",
        621 => "Shower Snow",
        622 => "Heavy Shower Snow",
        701 => "Mist",
        711 => "Smoke",
        721 => "Haze",
        731 => "Sand, Dust",
        741 => "Fog",
        751 => "Sand",
        761 => "Dust",
        762 => "Volcanic Ash",
        771 => "Squalls",
        781 | 900 => "Tornado",
        800 => "Clear",
        801 => "Mostly Clear",
        802 => "Scattered Clouds",
        803 => "Broken Clouds",
        804 => "Overcast Clouds",
        901 => "Tropical Storm",
        902 | 962 => "Hurricane",
        903 => "Cold",
        904 => "Hot",
        905 => "Windy",
        906 => "Hail",
        951 => "Calm",
        952 => "Light Breeze",
        953 => "Gentle Breeze",
        954 => "Breeze",
        955 => "Fresh Breeze",
        956 => "Strong Breeze",
        957 => "High Wind",
        958 => "Gale",
        959 => "Severe Gale",
        960 => "Storm",
        961 => "Violent Storm",
        _ => return format!("Unknown ({weather_id})"),
    };
    text.to_string()
}

#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Formats a Celsius temperature in the requested units, e.g. "21°".
#[must_use]
pub fn format_temperature(celsius: f64, units: Units) -> String {
    let value = match units {
        Units::Metric => celsius,
        Units::Imperial => celsius_to_fahrenheit(celsius),
    };
    format!("{value:.0}°")
}

#[must_use]
pub fn format_high_low(high: f64, low: f64, units: Units) -> String {
    format!(
        "{} / {}",
        format_temperature(high.round(), units),
        format_temperature(low.round(), units)
    )
}

/// Eight-point compass direction for a bearing in degrees.
#[must_use]
pub fn compass_direction(degrees: f64) -> &'static str {
    if !(0.0..=360.0).contains(&degrees) {
        return "Unknown";
    }
    match degrees {
        d if !(22.5..337.5).contains(&d) => "N",
        d if d < 67.5 => "NE",
        d if d < 112.5 => "E",
        d if d < 157.5 => "SE",
        d if d < 202.5 => "S",
        d if d < 247.5 => "SW",
        d if d < 292.5 => "W",
        _ => "NW",
    }
}

/// Wind speed (stored in km/h) with direction, e.g. "14 km/h NW".
#[must_use]
pub fn format_wind(speed_kmh: f64, degrees: f64, units: Units) -> String {
    let direction = compass_direction(degrees);
    match units {
        Units::Metric => format!("{speed_kmh:.0} km/h {direction}"),
        Units::Imperial => format!("{:.0} mph {direction}", speed_kmh * MPH_PER_KMH),
    }
}

#[must_use]
pub fn format_humidity(humidity: f64) -> String {
    format!("{humidity:.0} %")
}

#[must_use]
pub fn format_pressure(pressure: f64) -> String {
    format!("{pressure:.0} hPa")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_description_ranges() {
        assert_eq!(condition_description(211), "Storm");
        assert_eq!(condition_description(301), "Drizzle");
        assert_eq!(condition_description(500), "Light Rain");
        assert_eq!(condition_description(800), "Clear");
        assert_eq!(condition_description(962), "Hurricane");
        assert_eq!(condition_description(42), "Unknown (42)");
    }

    #[test]
    fn test_condition_art() {
        assert_eq!(ConditionArt::from_weather_id(202), ConditionArt::Storm);
        assert_eq!(ConditionArt::from_weather_id(310), ConditionArt::LightRain);
        assert_eq!(ConditionArt::from_weather_id(511), ConditionArt::Snow);
        assert_eq!(ConditionArt::from_weather_id(525), ConditionArt::Rain);
        assert_eq!(ConditionArt::from_weather_id(741), ConditionArt::Fog);
        assert_eq!(ConditionArt::from_weather_id(781), ConditionArt::Storm);
        assert_eq!(ConditionArt::from_weather_id(801), ConditionArt::LightClouds);
        assert_eq!(ConditionArt::from_weather_id(804), ConditionArt::Clouds);
        assert_eq!(ConditionArt::from_weather_id(953), ConditionArt::Clear);
        assert_eq!(ConditionArt::from_weather_id(1), ConditionArt::Storm);
    }

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(21.4, Units::Metric), "21°");
        assert_eq!(format_temperature(0.0, Units::Imperial), "32°");
        assert_eq!(format_temperature(100.0, Units::Imperial), "212°");
    }

    #[test]
    fn test_format_high_low_rounds() {
        assert_eq!(format_high_low(21.6, 9.4, Units::Metric), "22° / 9°");
    }

    #[test]
    fn test_compass_direction() {
        assert_eq!(compass_direction(0.0), "N");
        assert_eq!(compass_direction(350.0), "N");
        assert_eq!(compass_direction(45.0), "NE");
        assert_eq!(compass_direction(90.0), "E");
        assert_eq!(compass_direction(135.0), "SE");
        assert_eq!(compass_direction(180.0), "S");
        assert_eq!(compass_direction(225.0), "SW");
        assert_eq!(compass_direction(270.0), "W");
        assert_eq!(compass_direction(315.0), "NW");
        assert_eq!(compass_direction(-4.0), "Unknown");
    }

    #[test]
    fn test_format_wind() {
        assert_eq!(format_wind(10.0, 90.0, Units::Metric), "10 km/h E");
        assert_eq!(format_wind(10.0, 90.0, Units::Imperial), "6 mph E");
    }
}

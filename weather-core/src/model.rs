use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit preference. Doubles as the provider-side unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Value of the provider's `units` query parameter.
    pub fn unit_system(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "metric",
            TemperatureUnit::Fahrenheit => "imperial",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn wind_speed_label(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "m/s",
            TemperatureUnit::Fahrenheit => "mph",
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemperatureUnit::Celsius => f.write_str("celsius"),
            TemperatureUnit::Fahrenheit => f.write_str("fahrenheit"),
        }
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

/// Clock style used for sunrise/sunset strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12hour")]
    TwelveHour,
    #[serde(rename = "24hour")]
    TwentyFourHour,
}

impl std::fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFormat::TwelveHour => f.write_str("12hour"),
            TimeFormat::TwentyFourHour => f.write_str("24hour"),
        }
    }
}

impl TryFrom<&str> for TimeFormat {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "12hour" | "12h" | "12" => Ok(TimeFormat::TwelveHour),
            "24hour" | "24h" | "24" => Ok(TimeFormat::TwentyFourHour),
            _ => Err(anyhow::anyhow!(
                "Unknown time format '{value}'. Supported formats: 12hour, 24hour."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// What a fetch is about: a city name or a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    City(String),
    Coordinates(Coordinates),
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::City(name) => f.write_str(name),
            Query::Coordinates(c) => write!(f, "{:.4},{:.4}", c.lat, c.lon),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub query: Query,
    pub unit: TemperatureUnit,
    pub time_format: TimeFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub event: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Current conditions for one location, in the unit system it was requested with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub condition: String,
    pub feels_like: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    /// Meteorological bearing the wind blows from, when reported.
    #[serde(default)]
    pub wind_deg: Option<f64>,
    pub sunrise: String,
    pub sunset: String,
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

impl CurrentWeather {
    /// Canonical favorites key, `"<city>, <country>"`.
    pub fn city_key(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

/// One raw forecast sample as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: String,
}

/// Provider forecast: samples plus the location's offset from UTC,
/// which decides where calendar days begin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastSeries {
    pub utc_offset_secs: i32,
    pub samples: Vec<ForecastSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: String,
    pub date: String,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: String,
}

impl ForecastDay {
    pub fn temp_range(&self) -> String {
        format!("{}° / {}°", self.temp_min, self.temp_max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub city_key: String,
    pub city: String,
    pub country: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub temperature_unit: TemperatureUnit,
    pub time_format: TimeFormat,
    pub theme: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::default(),
            time_format: TimeFormat::default(),
            theme: "default".to_string(),
        }
    }
}

/// Partial preferences record. Absent fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<TemperatureUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<TimeFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl PreferencesUpdate {
    pub fn merged_over(self, base: UserPreferences) -> UserPreferences {
        UserPreferences {
            temperature_unit: self.temperature_unit.unwrap_or(base.temperature_unit),
            time_format: self.time_format.unwrap_or(base.time_format),
            theme: self.theme.unwrap_or(base.theme),
        }
    }
}

impl From<UserPreferences> for PreferencesUpdate {
    fn from(p: UserPreferences) -> Self {
        Self {
            temperature_unit: Some(p.temperature_unit),
            time_format: Some(p.time_format),
            theme: Some(p.theme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_maps_to_provider_unit_system() {
        assert_eq!(TemperatureUnit::Celsius.unit_system(), "metric");
        assert_eq!(TemperatureUnit::Fahrenheit.unit_system(), "imperial");
    }

    #[test]
    fn preferences_serialize_with_camel_case_keys() {
        let json = serde_json::to_string(&UserPreferences::default()).unwrap();
        assert_eq!(
            json,
            r#"{"temperatureUnit":"celsius","timeFormat":"12hour","theme":"default"}"#
        );
    }

    #[test]
    fn partial_record_merges_over_defaults() {
        let partial: PreferencesUpdate = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        let merged = partial.merged_over(UserPreferences::default());

        assert_eq!(merged.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(merged.time_format, TimeFormat::TwelveHour);
        assert_eq!(merged.theme, "dark");
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let err = TemperatureUnit::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown temperature unit"));
    }

    #[test]
    fn forecast_day_range_string() {
        let day = ForecastDay {
            day: "Mon".into(),
            date: "5/19/2023".into(),
            temperature: 15.0,
            temp_min: 12.0,
            temp_max: 18.0,
            condition: "Rain".into(),
        };
        assert_eq!(day.temp_range(), "12° / 18°");
    }
}

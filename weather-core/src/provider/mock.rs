//! Bundled demo data for a handful of cities.
//!
//! Selected explicitly through configuration (`default_provider = "mock"`).
//! Any city outside the bundled set is reported as not found.

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    error::WeatherError,
    format::{format_time, unix_to_utc},
    model::{
        Coordinates, CurrentWeather, ForecastSample, ForecastSeries, Query, TemperatureUnit,
        WeatherRequest,
    },
    units::{WindSpeedUnit, convert_temperature, convert_wind_speed},
};

use super::WeatherProvider;

/// 2023-05-19 00:00:00 UTC, the day the demo data describes.
const BASE_DAY: i64 = 1_684_454_400;

/// How close (in degrees) a coordinate query must be to match a bundled city.
const COORDINATE_MATCH_DEGREES: f64 = 0.5;

#[derive(Debug)]
struct MockCity {
    city: &'static str,
    country: &'static str,
    lat: f64,
    lon: f64,
    utc_offset_secs: i32,
    temperature: f64,
    condition: &'static str,
    feels_like: f64,
    min_temp: f64,
    max_temp: f64,
    humidity: u8,
    wind_speed_mps: f64,
    wind_deg: f64,
    /// Local wall-clock (hour, minute).
    sunrise: (i64, i64),
    sunset: (i64, i64),
    /// (temperature, min, max, condition) per day, starting at `BASE_DAY`.
    forecast: [(f64, f64, f64, &'static str); 5],
}

const CITIES: &[MockCity] = &[
    MockCity {
        city: "New York",
        country: "US",
        lat: 40.7128,
        lon: -74.006,
        utc_offset_secs: -4 * 3600,
        temperature: 22.0,
        condition: "Partly Cloudy",
        feels_like: 23.0,
        min_temp: 19.0,
        max_temp: 24.0,
        humidity: 65,
        wind_speed_mps: 5.2,
        wind_deg: 210.0,
        sunrise: (5, 37),
        sunset: (20, 8),
        forecast: [
            (22.0, 19.0, 24.0, "Partly Cloudy"),
            (24.0, 20.0, 26.0, "Sunny"),
            (25.0, 21.0, 27.0, "Clear Sky"),
            (23.0, 19.0, 25.0, "Light Rain"),
            (20.0, 18.0, 22.0, "Moderate Rain"),
        ],
    },
    MockCity {
        city: "London",
        country: "GB",
        lat: 51.5074,
        lon: -0.1278,
        utc_offset_secs: 3600,
        temperature: 15.0,
        condition: "Light Rain",
        feels_like: 13.0,
        min_temp: 12.0,
        max_temp: 18.0,
        humidity: 78,
        wind_speed_mps: 3.1,
        wind_deg: 250.0,
        sunrise: (5, 5),
        sunset: (20, 45),
        forecast: [
            (15.0, 12.0, 18.0, "Light Rain"),
            (17.0, 14.0, 20.0, "Partly Cloudy"),
            (19.0, 16.0, 22.0, "Sunny"),
            (16.0, 13.0, 19.0, "Cloudy"),
            (14.0, 11.0, 17.0, "Heavy Rain"),
        ],
    },
    MockCity {
        city: "Tokyo",
        country: "JP",
        lat: 35.6762,
        lon: 139.6503,
        utc_offset_secs: 9 * 3600,
        temperature: 28.0,
        condition: "Sunny",
        feels_like: 31.0,
        min_temp: 25.0,
        max_temp: 32.0,
        humidity: 55,
        wind_speed_mps: 2.8,
        wind_deg: 160.0,
        sunrise: (4, 35),
        sunset: (18, 40),
        forecast: [
            (28.0, 25.0, 32.0, "Sunny"),
            (30.0, 27.0, 34.0, "Clear Sky"),
            (26.0, 23.0, 29.0, "Partly Cloudy"),
            (24.0, 21.0, 27.0, "Light Rain"),
            (27.0, 24.0, 30.0, "Sunny"),
        ],
    },
];

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    latency: Duration,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to exercise loading states.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Names of the bundled cities.
    pub fn cities() -> impl Iterator<Item = &'static str> {
        CITIES.iter().map(|c| c.city)
    }

    fn lookup(query: &Query) -> Result<&'static MockCity, WeatherError> {
        let found = match query {
            Query::City(name) => {
                let wanted = name.trim();
                CITIES.iter().find(|c| c.city.eq_ignore_ascii_case(wanted))
            }
            Query::Coordinates(Coordinates { lat, lon }) => CITIES.iter().find(|c| {
                (c.lat - lat).abs() <= COORDINATE_MATCH_DEGREES
                    && (c.lon - lon).abs() <= COORDINATE_MATCH_DEGREES
            }),
        };

        found.ok_or_else(|| WeatherError::CityNotFound(query.to_string()))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn temperature_in(value: f64, unit: TemperatureUnit) -> f64 {
    convert_temperature(value, TemperatureUnit::Celsius, unit).round()
}

fn wind_in(mps: f64, unit: TemperatureUnit) -> f64 {
    let converted = match unit {
        TemperatureUnit::Celsius => mps,
        TemperatureUnit::Fahrenheit => {
            convert_wind_speed(
                mps,
                WindSpeedUnit::MetersPerSecond,
                WindSpeedUnit::MilesPerHour,
            )
        }
    };
    (converted * 10.0).round() / 10.0
}

fn local_instant(city: &MockCity, (hour, minute): (i64, i64)) -> i64 {
    BASE_DAY + hour * 3600 + minute * 60 - i64::from(city.utc_offset_secs)
}

#[async_trait]
impl WeatherProvider for MockProvider {
    async fn current(&self, request: &WeatherRequest) -> Result<CurrentWeather, WeatherError> {
        self.simulate_latency().await;
        let c = Self::lookup(&request.query)?;
        let unit = request.unit;

        let time = |hm| {
            unix_to_utc(local_instant(c, hm))
                .map(|at| format_time(at, c.utc_offset_secs, request.time_format))
                .unwrap_or_default()
        };

        Ok(CurrentWeather {
            city: c.city.to_string(),
            country: c.country.to_string(),
            temperature: temperature_in(c.temperature, unit),
            condition: c.condition.to_string(),
            feels_like: temperature_in(c.feels_like, unit),
            min_temp: temperature_in(c.min_temp, unit),
            max_temp: temperature_in(c.max_temp, unit),
            humidity: c.humidity,
            wind_speed: wind_in(c.wind_speed_mps, unit),
            wind_deg: Some(c.wind_deg),
            sunrise: time(c.sunrise),
            sunset: time(c.sunset),
            coordinates: Some(Coordinates {
                lat: c.lat,
                lon: c.lon,
            }),
            alerts: Vec::new(),
        })
    }

    async fn forecast(&self, request: &WeatherRequest) -> Result<ForecastSeries, WeatherError> {
        self.simulate_latency().await;
        let c = Self::lookup(&request.query)?;
        let unit = request.unit;

        let samples = c
            .forecast
            .iter()
            .zip(0i64..)
            .filter_map(|(&(temp, min, max, condition), day)| {
                let noon = local_instant(c, (12, 0)) + day * 86_400;
                Some(ForecastSample {
                    timestamp: unix_to_utc(noon)?,
                    temperature: temperature_in(temp, unit),
                    temp_min: temperature_in(min, unit),
                    temp_max: temperature_in(max, unit),
                    condition: condition.to_string(),
                })
            })
            .collect();

        Ok(ForecastSeries {
            utc_offset_secs: c.utc_offset_secs,
            samples,
        })
    }
}

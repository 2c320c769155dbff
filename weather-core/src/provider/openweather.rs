use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::WeatherError,
    format::{format_time, unix_to_utc},
    model::{
        Coordinates, CurrentWeather, ForecastSample, ForecastSeries, Query, WeatherAlert,
        WeatherRequest,
    },
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// GET `endpoint` for the request's location and unit system.
    /// Returns the status and raw body; mapping statuses is up to the caller.
    async fn get(
        &self,
        endpoint: &str,
        request: &WeatherRequest,
    ) -> Result<(StatusCode, String), WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut params: Vec<(&str, String)> = match &request.query {
            Query::City(name) => vec![("q", name.clone())],
            Query::Coordinates(c) => {
                vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())]
            }
        };
        params.push(("units", request.unit.unit_system().to_string()));
        params.push(("appid", self.api_key.clone()));

        tracing::debug!(
            endpoint,
            query = %request.query,
            units = request.unit.unit_system(),
            "OpenWeather request"
        );

        let res = self.http.get(&url).query(&params).send().await?;
        let status = res.status();
        let body = res.text().await?;

        Ok((status, body))
    }

    fn parse<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, WeatherError> {
        serde_json::from_str(body)
            .map_err(|e| WeatherError::MalformedResponse(format!("{what}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwAlert {
    event: String,
    #[serde(default)]
    description: String,
    start: i64,
    end: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: Option<OwCoord>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
    #[serde(default)]
    timezone: i32,
    #[serde(default)]
    alerts: Vec<OwAlert>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

impl OwCurrentResponse {
    /// Checked conversion: missing identity or instants reject the whole response.
    fn into_weather(self, request: &WeatherRequest) -> Result<CurrentWeather, WeatherError> {
        let city = self.name.trim().to_string();
        if city.is_empty() {
            return Err(WeatherError::MalformedResponse(
                "response has no location name".into(),
            ));
        }

        let country = self
            .sys
            .country
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| WeatherError::MalformedResponse(format!("no country for '{city}'")))?;

        let condition = self
            .weather
            .into_iter()
            .next()
            .map(|w| w.main)
            .ok_or_else(|| {
                WeatherError::MalformedResponse(format!("no condition for '{city}'"))
            })?;

        let sunrise = unix_to_utc(self.sys.sunrise)
            .ok_or_else(|| WeatherError::MalformedResponse("sunrise out of range".into()))?;
        let sunset = unix_to_utc(self.sys.sunset)
            .ok_or_else(|| WeatherError::MalformedResponse("sunset out of range".into()))?;

        let alerts = self
            .alerts
            .into_iter()
            .filter_map(|a| {
                Some(WeatherAlert {
                    start: unix_to_utc(a.start)?,
                    end: unix_to_utc(a.end)?,
                    event: a.event,
                    description: a.description,
                })
            })
            .collect();

        Ok(CurrentWeather {
            city,
            country,
            temperature: self.main.temp.round(),
            condition,
            feels_like: self.main.feels_like.round(),
            min_temp: self.main.temp_min.round(),
            max_temp: self.main.temp_max.round(),
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            wind_deg: self.wind.deg,
            sunrise: format_time(sunrise, self.timezone, request.time_format),
            sunset: format_time(sunset, self.timezone, request.time_format),
            coordinates: self.coord.map(|c| Coordinates {
                lat: c.lat,
                lon: c.lon,
            }),
            alerts,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, request: &WeatherRequest) -> Result<CurrentWeather, WeatherError> {
        let (status, body) = self.get("weather", request).await?;

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(WeatherError::CityNotFound(request.query.to_string()));
            }
            s => {
                return Err(WeatherError::Api {
                    status: s.as_u16(),
                    message: truncate_body(&body),
                });
            }
        }

        let parsed: OwCurrentResponse = Self::parse(&body, "current weather")?;
        parsed.into_weather(request)
    }

    async fn forecast(&self, request: &WeatherRequest) -> Result<ForecastSeries, WeatherError> {
        let (status, body) = self.get("forecast", request).await?;

        if !status.is_success() {
            return Err(WeatherError::ForecastUnavailable(format!(
                "status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        let parsed: OwForecastResponse = Self::parse(&body, "forecast")?;

        let samples = parsed
            .list
            .into_iter()
            .filter_map(|entry| {
                Some(ForecastSample {
                    timestamp: unix_to_utc(entry.dt)?,
                    temperature: entry.main.temp,
                    temp_min: entry.main.temp_min,
                    temp_max: entry.main.temp_max,
                    condition: entry
                        .weather
                        .into_iter()
                        .next()
                        .map(|w| w.main)
                        .unwrap_or_else(|| "Unknown".to_string()),
                })
            })
            .collect();

        Ok(ForecastSeries {
            utc_offset_secs: parsed.city.map(|c| c.timezone).unwrap_or_default(),
            samples,
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

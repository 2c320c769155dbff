//! Fetch coordination and the UI-facing weather state.
//!
//! Each fetch takes a sequence token before it starts. Results are committed
//! only if their token is still the latest one when they resolve, so a slow
//! response for an older query can never overwrite a newer one. Requests are
//! not aborted; superseded results are simply dropped.
//!
//! Current conditions and forecast have separate token sequences: a
//! standalone forecast refresh does not invalidate an in-flight weather fetch.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::watch;

use crate::{
    config::Config,
    error::WeatherError,
    forecast::{DEFAULT_FORECAST_DAYS, reduce_to_daily},
    geolocation::Geolocator,
    model::{
        Coordinates, CurrentWeather, ForecastDay, ForecastSeries, PreferencesUpdate, Query,
        TemperatureUnit, WeatherRequest,
    },
    provider::WeatherProvider,
    store::Store,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherState {
    pub status: FetchStatus,
    pub weather: Option<CurrentWeather>,
    pub forecast: Vec<ForecastDay>,
    /// User-facing message of the last failed fetch.
    pub error: Option<String>,
    /// Query behind the weather on display.
    pub query: Option<Query>,
    /// Unit system the displayed values are in.
    pub unit: TemperatureUnit,
}

impl WeatherState {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

/// How a fetch call ended from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Blank input; nothing happened.
    Skipped,
    Ready,
    Failed,
    /// A newer fetch started before this one resolved; its result was dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub forecast_days: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            forecast_days: DEFAULT_FORECAST_DAYS,
        }
    }
}

impl From<&Config> for FetchSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout(),
            forecast_days: config.fetch.forecast_days,
        }
    }
}

#[derive(Debug)]
pub struct WeatherOrchestrator {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<Store>,
    settings: FetchSettings,
    state: watch::Sender<WeatherState>,
    weather_seq: AtomicU64,
    forecast_seq: AtomicU64,
}

impl WeatherOrchestrator {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Arc<Store>,
        settings: FetchSettings,
    ) -> Self {
        let initial = WeatherState {
            unit: store.get_user_preferences().temperature_unit,
            ..WeatherState::default()
        };

        Self {
            provider,
            store,
            settings,
            state: watch::Sender::new(initial),
            weather_seq: AtomicU64::new(0),
            forecast_seq: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Copy of the current state.
    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every committed state change.
    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    /// Current conditions for `city`. Blank input is ignored without touching state.
    pub async fn fetch_weather(&self, city: &str) -> FetchOutcome {
        let Some(query) = city_query(city) else {
            return FetchOutcome::Skipped;
        };
        let request = self.request_for(query, None);

        let token = next_token(&self.weather_seq);
        self.enter_loading();

        let result = self.timed(self.provider.current(&request)).await;
        self.commit(token, None, &request, result, None)
    }

    /// Forecast for `city`. Failures are logged and leave an empty forecast;
    /// they never set the error or change the status.
    pub async fn fetch_forecast(&self, city: &str) -> FetchOutcome {
        let Some(query) = city_query(city) else {
            return FetchOutcome::Skipped;
        };
        let request = self.request_for(query, None);

        let token = next_token(&self.forecast_seq);
        let result = self.timed(self.provider.forecast(&request)).await;

        let committed = self.state.send_if_modified(|s| {
            if !is_latest(&self.forecast_seq, token) {
                return false;
            }
            s.forecast = self.daily_forecast(&request, result);
            true
        });

        if committed {
            FetchOutcome::Ready
        } else {
            tracing::debug!(query = %request.query, "discarding superseded forecast");
            FetchOutcome::Superseded
        }
    }

    /// Current conditions and forecast for `city`, requested concurrently.
    pub async fn fetch_weather_and_forecast(&self, city: &str) -> FetchOutcome {
        let Some(query) = city_query(city) else {
            return FetchOutcome::Skipped;
        };
        let request = self.request_for(query, None);
        self.fetch_both(request).await
    }

    /// Like [`fetch_weather_and_forecast`](Self::fetch_weather_and_forecast),
    /// for a coordinate pair and an explicit unit system.
    pub async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
        unit: TemperatureUnit,
    ) -> FetchOutcome {
        let request = self.request_for(Query::Coordinates(Coordinates { lat, lon }), Some(unit));
        self.fetch_both(request).await
    }

    /// Locate the user, then fetch weather for that position in the preferred unit.
    pub async fn fetch_current_location(&self, geolocator: &dyn Geolocator) -> FetchOutcome {
        let token = next_token(&self.weather_seq);
        self.enter_loading();

        let located =
            tokio::time::timeout(self.settings.timeout, geolocator.current_position()).await;
        let position = match located {
            Ok(Ok(position)) => position,
            Ok(Err(e)) => return self.commit_failure(token, &e.into()),
            Err(_) => return self.commit_failure(token, &WeatherError::Timeout),
        };

        if !is_latest(&self.weather_seq, token) {
            return FetchOutcome::Superseded;
        }

        let unit = self.store.get_user_preferences().temperature_unit;
        self.fetch_by_coordinates(position.lat, position.lon, unit).await
    }

    /// Persist a new unit preference and re-fetch whatever is on display in it.
    ///
    /// The last displayed query is preferred; otherwise the last searched city
    /// from the store. With neither, only the unit changes.
    pub async fn change_unit(&self, unit: TemperatureUnit) -> FetchOutcome {
        self.store.save_user_preferences(PreferencesUpdate {
            temperature_unit: Some(unit),
            ..Default::default()
        });

        let query = self
            .state
            .borrow()
            .query
            .clone()
            .or_else(|| city_query(&self.store.get_last_searched()));

        match query {
            Some(Query::Coordinates(c)) => self.fetch_by_coordinates(c.lat, c.lon, unit).await,
            Some(Query::City(city)) => self.fetch_weather_and_forecast(&city).await,
            None => {
                self.state.send_modify(|s| s.unit = unit);
                FetchOutcome::Skipped
            }
        }
    }

    /// Drop the error message, keep everything else.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Back to `Idle` with nothing on display. In-flight fetches are invalidated.
    pub fn reset_weather_data(&self) {
        next_token(&self.weather_seq);
        next_token(&self.forecast_seq);
        let unit = self.store.get_user_preferences().temperature_unit;
        self.state.send_replace(WeatherState {
            unit,
            ..WeatherState::default()
        });
    }

    async fn fetch_both(&self, request: WeatherRequest) -> FetchOutcome {
        let weather_token = next_token(&self.weather_seq);
        let forecast_token = next_token(&self.forecast_seq);
        self.enter_loading();

        // Both calls settle before anything is committed.
        let (current, forecast) = tokio::join!(
            self.timed(self.provider.current(&request)),
            self.timed(self.provider.forecast(&request)),
        );

        self.commit(
            weather_token,
            Some(forecast_token),
            &request,
            current,
            Some(forecast),
        )
    }

    fn commit(
        &self,
        token: u64,
        forecast_token: Option<u64>,
        request: &WeatherRequest,
        current: Result<CurrentWeather, WeatherError>,
        forecast: Option<Result<ForecastSeries, WeatherError>>,
    ) -> FetchOutcome {
        let weather = match current {
            Ok(weather) => weather,
            Err(e) => {
                tracing::warn!(query = %request.query, error = %e, "weather fetch failed");
                return self.commit_failure(token, &e);
            }
        };

        let last_searched = match &request.query {
            Query::City(name) => name.clone(),
            Query::Coordinates(_) => weather.city.clone(),
        };
        let city_key = weather.city_key();

        let committed = self.state.send_if_modified(|s| {
            if !is_latest(&self.weather_seq, token) {
                return false;
            }

            s.status = FetchStatus::Ready;
            s.error = None;
            s.weather = Some(weather);
            s.query = Some(request.query.clone());
            s.unit = request.unit;

            if let (Some(ft), Some(forecast)) = (forecast_token, forecast) {
                if is_latest(&self.forecast_seq, ft) {
                    s.forecast = self.daily_forecast(request, forecast);
                }
            }
            true
        });

        if !committed {
            tracing::debug!(query = %request.query, "discarding superseded weather response");
            return FetchOutcome::Superseded;
        }

        self.store.save_last_searched(&last_searched);
        tracing::info!(
            query = %request.query,
            city = %city_key,
            unit = %request.unit,
            "weather updated"
        );
        FetchOutcome::Ready
    }

    /// Failed transition: nothing stale stays on display next to the error.
    fn commit_failure(&self, token: u64, error: &WeatherError) -> FetchOutcome {
        let committed = self.state.send_if_modified(|s| {
            if !is_latest(&self.weather_seq, token) {
                return false;
            }

            s.status = FetchStatus::Failed;
            s.weather = None;
            s.forecast.clear();
            s.error = Some(error.user_message().to_string());
            true
        });

        if committed {
            FetchOutcome::Failed
        } else {
            tracing::debug!(error = %error, "discarding superseded failure");
            FetchOutcome::Superseded
        }
    }

    fn daily_forecast(
        &self,
        request: &WeatherRequest,
        forecast: Result<ForecastSeries, WeatherError>,
    ) -> Vec<ForecastDay> {
        match forecast {
            Ok(series) => reduce_to_daily(&series, self.settings.forecast_days),
            Err(e) => {
                tracing::warn!(query = %request.query, error = %e, "forecast unavailable");
                Vec::new()
            }
        }
    }

    fn enter_loading(&self) {
        self.state.send_modify(|s| {
            s.status = FetchStatus::Loading;
            s.error = None;
        });
    }

    fn request_for(&self, query: Query, unit: Option<TemperatureUnit>) -> WeatherRequest {
        let prefs = self.store.get_user_preferences();
        WeatherRequest {
            query,
            unit: unit.unwrap_or(prefs.temperature_unit),
            time_format: prefs.time_format,
        }
    }

    async fn timed<T>(
        &self,
        fut: impl Future<Output = Result<T, WeatherError>>,
    ) -> Result<T, WeatherError> {
        tokio::time::timeout(self.settings.timeout, fut)
            .await
            .unwrap_or(Err(WeatherError::Timeout))
    }
}

fn city_query(city: &str) -> Option<Query> {
    let city = city.trim();
    (!city.is_empty()).then(|| Query::City(city.to_string()))
}

fn next_token(seq: &AtomicU64) -> u64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

fn is_latest(seq: &AtomicU64, token: u64) -> bool {
    seq.load(Ordering::SeqCst) == token
}

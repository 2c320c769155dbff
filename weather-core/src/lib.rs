//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers (OpenWeather, bundled demo data)
//! - The favorites & preferences store with its in-memory fallback
//! - The fetch orchestrator owning the UI-facing weather state
//! - Shared domain models, formatting and unit helpers
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod advice;
pub mod config;
pub mod error;
pub mod forecast;
pub mod format;
pub mod geolocation;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod store;
pub mod units;

pub use config::{Config, FetchConfig, MockConfig, ProviderConfig};
pub use error::{GeolocationError, StorageError, WeatherError};
pub use model::{
    Coordinates, CurrentWeather, FavoriteEntry, ForecastDay, PreferencesUpdate, Query,
    TemperatureUnit, TimeFormat, UserPreferences, WeatherAlert, WeatherRequest,
};
pub use orchestrator::{FetchOutcome, FetchSettings, FetchStatus, WeatherOrchestrator, WeatherState};
pub use provider::{ProviderId, WeatherProvider};
pub use store::{FileMedium, MemoryMedium, StorageMedium, Store};

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use weather_core::{
    Config, CurrentWeather, FetchOutcome, FetchSettings, FileMedium, PreferencesUpdate, ProviderId,
    TemperatureUnit, TimeFormat, WeatherOrchestrator, WeatherProvider,
    geolocation::{FixedPosition, Geolocator, IpGeolocator},
    model::Coordinates,
    provider::{default_provider_from_config, provider_from_config},
    store::Store,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// Provider to use instead of the configured default ("openweather" or "mock").
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Keep favorites and preferences in memory for this run only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "mock".
        provider: String,
    },

    /// Show current weather and forecast for a city.
    Show {
        /// City name; defaults to the last searched city.
        city: Option<String>,

        /// Switch to this unit first ("celsius" or "fahrenheit"); saved as preference.
        #[arg(long)]
        unit: Option<String>,

        /// Skip the multi-day forecast.
        #[arg(long)]
        no_forecast: bool,
    },

    /// Show weather for your current position.
    Locate {
        /// Latitude; when omitted the position is derived from your IP address.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Change the temperature unit and refresh the last query.
    Unit {
        /// "celsius" or "fahrenheit".
        unit: String,
    },

    /// Manage favorite cities.
    #[command(subcommand)]
    Favorites(FavoritesCommand),

    /// Show or change preferences.
    #[command(subcommand)]
    Prefs(PrefsCommand),

    /// Print everything that is stored.
    Info,

    /// Delete favorites, last searched city and preferences.
    Clear {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List favorites.
    List,
    /// Look a city up and add it.
    Add { city: String },
    /// Remove by key, e.g. "London, GB".
    Remove { city_key: String },
    /// Add the city if missing, remove it otherwise.
    Toggle { city: String },
    /// Remove every favorite.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    Show,
    Set {
        #[arg(long)]
        unit: Option<String>,
        /// "12hour" or "24hour".
        #[arg(long)]
        time_format: Option<String>,
        #[arg(long)]
        theme: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match &self.command {
            Command::Configure { provider } => configure(config, provider),
            Command::Show { city, unit, no_forecast } => {
                let dashboard = self.dashboard(&config)?;
                if let Some(unit) = unit {
                    let unit = TemperatureUnit::try_from(unit.as_str())?;
                    dashboard.store().save_user_preferences(PreferencesUpdate {
                        temperature_unit: Some(unit),
                        ..Default::default()
                    });
                }

                let city = match city {
                    Some(city) => city.clone(),
                    None => dashboard.store().get_last_searched(),
                };
                if city.trim().is_empty() {
                    bail!(
                        "No city given and no previous search recorded. \
                         Try `weather show <city>`."
                    );
                }

                let outcome = if *no_forecast {
                    dashboard.fetch_weather(&city).await
                } else {
                    dashboard.fetch_weather_and_forecast(&city).await
                };
                report(&dashboard, outcome)
            }
            Command::Locate { lat, lon } => {
                let dashboard = self.dashboard(&config)?;
                let geolocator: Box<dyn Geolocator> = match (lat, lon) {
                    (Some(lat), Some(lon)) => Box::new(FixedPosition(Coordinates {
                        lat: *lat,
                        lon: *lon,
                    })),
                    _ => Box::new(IpGeolocator::new()?),
                };
                let outcome = dashboard.fetch_current_location(geolocator.as_ref()).await;
                report(&dashboard, outcome)
            }
            Command::Unit { unit } => {
                let dashboard = self.dashboard(&config)?;
                let unit = TemperatureUnit::try_from(unit.as_str())?;
                match dashboard.change_unit(unit).await {
                    FetchOutcome::Skipped => {
                        println!("Temperature unit set to {unit}.");
                        Ok(())
                    }
                    outcome => report(&dashboard, outcome),
                }
            }
            Command::Favorites(cmd) => self.favorites(&config, cmd).await,
            Command::Prefs(cmd) => {
                let store = self.open_store(&config);
                prefs(&store, cmd)
            }
            Command::Info => {
                let store = self.open_store(&config);
                output::print_storage_info(&store.storage_info());
                Ok(())
            }
            Command::Clear { yes } => {
                let confirmed = *yes
                    || inquire::Confirm::new("Delete all favorites and preferences?")
                        .with_default(false)
                        .prompt()?;
                if confirmed {
                    self.open_store(&config).clear_all_data();
                    println!("All stored data cleared.");
                }
                Ok(())
            }
        }
    }

    async fn favorites(&self, config: &Config, cmd: &FavoritesCommand) -> anyhow::Result<()> {
        match cmd {
            FavoritesCommand::List => {
                output::print_favorites(&self.open_store(config).get_favorites());
            }
            FavoritesCommand::Remove { city_key } => {
                let store = self.open_store(config);
                if !store.is_favorite(city_key) {
                    println!("'{city_key}' is not a favorite.");
                }
                output::print_favorites(&store.remove_favorite(city_key));
            }
            FavoritesCommand::Clear => {
                self.open_store(config).clear_favorites();
                println!("Favorites cleared.");
            }
            FavoritesCommand::Add { city } | FavoritesCommand::Toggle { city } => {
                let dashboard = self.dashboard(config)?;
                let outcome = dashboard.fetch_weather(city).await;
                let state = dashboard.state();

                let weather = match (outcome, state.weather) {
                    (FetchOutcome::Ready, Some(weather)) => weather,
                    _ => bail!(
                        "{}",
                        state.error.unwrap_or_else(|| "Nothing to add.".to_string())
                    ),
                };

                let key = weather.city_key();
                let store = dashboard.store();
                let toggle = matches!(cmd, FavoritesCommand::Toggle { .. });
                if update_favorite(store, &weather, toggle) {
                    println!("Added {key} to favorites.");
                } else {
                    println!("Removed {key} from favorites.");
                }
                output::print_favorites(&store.get_favorites());
            }
        }
        Ok(())
    }

    fn dashboard(&self, config: &Config) -> anyhow::Result<WeatherOrchestrator> {
        let provider: Box<dyn WeatherProvider> = match &self.provider {
            Some(id) => provider_from_config(ProviderId::try_from(id.as_str())?, config)?,
            None => default_provider_from_config(config)?,
        };

        let store = Arc::new(self.open_store(config));
        Ok(WeatherOrchestrator::new(Arc::from(provider), store, FetchSettings::from(config)))
    }

    fn open_store(&self, config: &Config) -> Store {
        if self.ephemeral {
            return Store::in_memory();
        }

        match config.data_dir() {
            Ok(dir) => {
                let medium = FileMedium::new(dir);
                tracing::debug!(dir = %medium.dir().display(), "opening store");
                Store::open(Box::new(medium))
            }
            Err(e) => {
                tracing::warn!(error = %e, "no data directory, favorites will not persist");
                Store::in_memory()
            }
        }
    }
}

/// Add `weather` to favorites, or flip its membership when `toggle` is set.
/// Returns whether it is a favorite afterwards.
fn update_favorite(store: &Store, weather: &CurrentWeather, toggle: bool) -> bool {
    let key = weather.city_key();
    if toggle {
        store.toggle_favorite(&key, weather)
    } else {
        store.add_favorite(&key, weather);
        true
    }
}

fn report(dashboard: &WeatherOrchestrator, outcome: FetchOutcome) -> anyhow::Result<()> {
    let state = dashboard.state();

    if outcome == FetchOutcome::Failed {
        let message = state
            .error
            .unwrap_or_else(|| "Failed to fetch weather data. Please try again.".to_string());
        bail!("{message}");
    }

    let prefs = dashboard.store().get_user_preferences();
    let is_favorite = state
        .weather
        .as_ref()
        .is_some_and(|w| dashboard.store().is_favorite(&w.city_key()));

    output::print_state(&state, &prefs, is_favorite);
    Ok(())
}

fn configure(mut config: Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    if id.requires_api_key() {
        let api_key = inquire::Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        if api_key.trim().is_empty() {
            bail!("API key must not be empty.");
        }
        config.upsert_provider_api_key(id, api_key.trim().to_string());
    }

    let make_default = config.default_provider_id().ok() == Some(id)
        || inquire::Confirm::new(&format!("Use {id} by default?")).with_default(true).prompt()?;
    if make_default {
        config.set_default_provider(id);
    }

    config.fetch.timeout_secs = inquire::CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.fetch.timeout_secs)
        .prompt()?;

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn prefs(store: &Store, cmd: &PrefsCommand) -> anyhow::Result<()> {
    let prefs = match cmd {
        PrefsCommand::Show => store.get_user_preferences(),
        PrefsCommand::Set { unit, time_format, theme } => {
            let update = PreferencesUpdate {
                temperature_unit: unit.as_deref().map(TemperatureUnit::try_from).transpose()?,
                time_format: time_format.as_deref().map(TimeFormat::try_from).transpose()?,
                theme: theme.clone(),
            };
            store.save_user_preferences(update)
        }
    };

    output::print_preferences(&prefs);
    Ok(())
}

//! Plain-text rendering of the dashboard state.

use std::fmt::Write as _;

use chrono::Local;
use weather_core::{
    CurrentWeather, FavoriteEntry, ForecastDay, TemperatureUnit, UserPreferences, WeatherState,
    advice::clothing_recommendation,
    store::StorageInfo,
    units::{convert_temperature, heat_index, wind_direction},
};

pub fn print_state(state: &WeatherState, prefs: &UserPreferences, is_favorite: bool) {
    print!("{}", render_state(state, prefs, is_favorite));
}

pub fn print_favorites(favorites: &[FavoriteEntry]) {
    print!("{}", render_favorites(favorites));
}

pub fn print_preferences(prefs: &UserPreferences) {
    println!("Temperature unit: {}", prefs.temperature_unit);
    println!("Time format:      {}", prefs.time_format);
    println!("Theme:            {}", prefs.theme);
}

pub fn print_storage_info(info: &StorageInfo) {
    let medium = if info.durable_available {
        "on disk"
    } else {
        "memory only"
    };
    println!("Storage: {medium}");
    let last = if info.last_searched.is_empty() {
        "-"
    } else {
        info.last_searched.as_str()
    };
    println!("Last searched: {last}");
    println!();
    print_preferences(&info.preferences);
    println!();
    print_favorites(&info.favorites);
}

fn render_state(state: &WeatherState, prefs: &UserPreferences, is_favorite: bool) -> String {
    let mut out = String::new();

    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }

    if let Some(weather) = &state.weather {
        render_weather(&mut out, weather, state.unit, is_favorite);
    }

    if !state.forecast.is_empty() {
        let _ = writeln!(out);
        render_forecast(&mut out, &state.forecast, state.unit);
    }

    if state.weather.is_none() && state.forecast.is_empty() && state.error.is_none() {
        let _ = writeln!(out, "No weather to show. Theme: {}", prefs.theme);
    }

    out
}

fn render_weather(
    out: &mut String,
    weather: &CurrentWeather,
    unit: TemperatureUnit,
    is_favorite: bool,
) {
    let symbol = unit.symbol();
    let star = if is_favorite { " ★" } else { "" };

    let _ = writeln!(out, "{}{star}", weather.city_key());
    let _ = writeln!(
        out,
        "  {}{symbol}  {}",
        weather.temperature,
        weather.condition
    );
    let _ = writeln!(out, "  Feels like {}{symbol}", weather.feels_like);
    let _ = writeln!(
        out,
        "  Low {}{symbol} / High {}{symbol}",
        weather.min_temp,
        weather.max_temp
    );
    let _ = writeln!(out, "  Humidity {}%", weather.humidity);
    let _ = write!(
        out,
        "  Wind {} {}",
        weather.wind_speed,
        unit.wind_speed_label()
    );
    if let Some(deg) = weather.wind_deg {
        let _ = write!(out, " {}", wind_direction(deg));
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  Sunrise {}  Sunset {}",
        weather.sunrise,
        weather.sunset
    );

    let temp_c = convert_temperature(weather.temperature, unit, TemperatureUnit::Celsius);
    let felt_c = heat_index(temp_c, f64::from(weather.humidity));
    if (felt_c - temp_c).abs() >= 1.0 {
        let felt = convert_temperature(felt_c, TemperatureUnit::Celsius, unit).round();
        let _ = writeln!(out, "  Heat index {felt}{symbol}");
    }
    let _ = writeln!(
        out,
        "  {}",
        clothing_recommendation(temp_c, &weather.condition)
    );

    for alert in &weather.alerts {
        let start = alert.start.with_timezone(&Local).format("%b %-d %H:%M");
        let end = alert.end.with_timezone(&Local).format("%b %-d %H:%M");
        let _ = writeln!(out, "  ⚠ {} ({start} - {end})", alert.event);
        if !alert.description.is_empty() {
            let _ = writeln!(out, "    {}", alert.description);
        }
    }
}

fn render_forecast(out: &mut String, days: &[ForecastDay], unit: TemperatureUnit) {
    let _ = writeln!(out, "{}-day forecast ({})", days.len(), unit.symbol());
    for day in days {
        let _ = writeln!(
            out,
            "  {:<4}{:<11}{:>14}  {}",
            day.day,
            day.date,
            day.temp_range(),
            day.condition
        );
    }
}

fn render_favorites(favorites: &[FavoriteEntry]) -> String {
    if favorites.is_empty() {
        return "No favorites yet.\n".to_string();
    }

    let mut out = format!("Favorites ({})\n", favorites.len());
    for fav in favorites {
        let added = fav.added_at.with_timezone(&Local).format("%Y-%m-%d");
        let _ = writeln!(out, "  {:<30} added {added}", fav.city_key);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use weather_core::FetchStatus;

    fn london() -> CurrentWeather {
        CurrentWeather {
            city: "London".to_string(),
            country: "GB".to_string(),
            temperature: 15.0,
            condition: "Cloudy".to_string(),
            feels_like: 14.0,
            min_temp: 12.0,
            max_temp: 18.0,
            humidity: 70,
            wind_speed: 3.6,
            wind_deg: None,
            sunrise: "05:12 AM".to_string(),
            sunset: "08:45 PM".to_string(),
            coordinates: None,
            alerts: Vec::new(),
        }
    }

    #[test]
    fn weather_card_shows_unit_and_favorite_marker() {
        let state = WeatherState {
            status: FetchStatus::Ready,
            weather: Some(london()),
            ..Default::default()
        };
        let text = render_state(&state, &UserPreferences::default(), true);

        assert!(text.starts_with("London, GB ★\n"));
        assert!(text.contains("15°C  Cloudy"));
        assert!(text.contains("Wind 3.6 m/s"));
        assert!(!text.contains("Heat index"));
    }

    #[test]
    fn wind_line_includes_compass_point_when_bearing_known() {
        let mut weather = london();
        weather.wind_deg = Some(250.0);
        let mut out = String::new();
        render_weather(&mut out, &weather, TemperatureUnit::Celsius, false);

        assert!(out.contains("  Wind 3.6 m/s W\n"));
    }

    #[test]
    fn error_is_shown_without_weather() {
        let state = WeatherState {
            status: FetchStatus::Failed,
            error: Some("City not found. Please try again.".to_string()),
            ..Default::default()
        };
        let text = render_state(&state, &UserPreferences::default(), false);
        assert_eq!(text, "! City not found. Please try again.\n");
    }

    #[test]
    fn forecast_rows_use_temp_range() {
        let day = ForecastDay {
            day: "Sat".to_string(),
            date: "5/20/2023".to_string(),
            temperature: 16.0,
            temp_min: 12.0,
            temp_max: 18.0,
            condition: "Rain".to_string(),
        };
        let mut out = String::new();
        render_forecast(&mut out, &[day], TemperatureUnit::Celsius);

        assert!(out.starts_with("1-day forecast (°C)\n"));
        assert!(out.contains("12° / 18°"));
        assert!(out.contains("Rain"));
    }

    #[test]
    fn empty_favorites() {
        assert_eq!(render_favorites(&[]), "No favorites yet.\n");

        let fav = FavoriteEntry {
            city_key: "Tokyo, JP".to_string(),
            city: "Tokyo".to_string(),
            country: "JP".to_string(),
            added_at: Utc::now(),
        };
        assert!(render_favorites(&[fav]).contains("Tokyo, JP"));
    }
}

//! Favorites, last-searched city and user preferences.
//!
//! Records live in a [`StorageMedium`]. Every medium failure is logged and
//! absorbed: the store keeps an in-memory copy of each record, updated on
//! every write, and serves reads from it whenever the medium cannot.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{CurrentWeather, FavoriteEntry, PreferencesUpdate, UserPreferences};

pub mod medium;

pub use medium::{FileMedium, MemoryMedium, StorageMedium};

pub const FAVORITES_KEY: &str = "weather_favorites";
pub const LAST_SEARCHED_KEY: &str = "weather_last_searched";
pub const USER_PREFERENCES_KEY: &str = "weather_user_preferences";

const ALL_KEYS: [&str; 3] = [FAVORITES_KEY, LAST_SEARCHED_KEY, USER_PREFERENCES_KEY];

#[derive(Debug, Clone)]
struct CachedRecord {
    /// `None` marks a record removed in memory but still present on the medium.
    value: Option<Value>,
    /// False when the last write only reached memory; the medium is stale.
    durable: bool,
}

#[derive(Debug)]
pub struct Store {
    medium: Box<dyn StorageMedium>,
    cache: Mutex<HashMap<&'static str, CachedRecord>>,
}

/// Snapshot of everything the store holds, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageInfo {
    pub durable_available: bool,
    pub favorites: Vec<FavoriteEntry>,
    pub last_searched: String,
    pub preferences: UserPreferences,
}

impl Store {
    /// Open a store over `medium`, loading whatever records it already holds.
    pub fn open(medium: Box<dyn StorageMedium>) -> Self {
        let store = Self {
            medium,
            cache: Mutex::new(HashMap::new()),
        };

        for key in ALL_KEYS {
            match store.medium.get(key) {
                Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => {
                        let record = CachedRecord {
                            value: Some(value),
                            durable: true,
                        };
                        store.cache.lock().insert(key, record);
                    }
                    Err(e) => {
                        tracing::warn!(key, error = %e, "ignoring unreadable stored record")
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key, error = %e, "storage medium unreadable, using memory")
                }
            }
        }

        tracing::debug!(medium = ?store.medium, "store opened");
        store
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryMedium::default()))
    }

    pub fn is_durable_available(&self) -> bool {
        self.medium.is_available()
    }

    // Favorites

    pub fn get_favorites(&self) -> Vec<FavoriteEntry> {
        self.get_item(FAVORITES_KEY).unwrap_or_default()
    }

    /// Add `city_key` unless it is already a favorite. Returns the full list.
    pub fn add_favorite(&self, city_key: &str, snapshot: &CurrentWeather) -> Vec<FavoriteEntry> {
        let mut favorites = self.get_favorites();

        if !favorites.iter().any(|f| f.city_key == city_key) {
            favorites.push(FavoriteEntry {
                city_key: city_key.to_string(),
                city: snapshot.city.clone(),
                country: snapshot.country.clone(),
                added_at: Utc::now(),
            });
            self.set_item(FAVORITES_KEY, &favorites);
            tracing::info!(city_key, "favorite added");
        }

        favorites
    }

    pub fn remove_favorite(&self, city_key: &str) -> Vec<FavoriteEntry> {
        let mut favorites = self.get_favorites();
        favorites.retain(|f| f.city_key != city_key);
        self.set_item(FAVORITES_KEY, &favorites);
        favorites
    }

    pub fn is_favorite(&self, city_key: &str) -> bool {
        self.get_favorites().iter().any(|f| f.city_key == city_key)
    }

    /// Flip membership of `city_key`. Returns whether it is a favorite afterwards.
    pub fn toggle_favorite(&self, city_key: &str, snapshot: &CurrentWeather) -> bool {
        if self.is_favorite(city_key) {
            self.remove_favorite(city_key);
            false
        } else {
            self.add_favorite(city_key, snapshot);
            true
        }
    }

    pub fn get_favorite(&self, city_key: &str) -> Option<FavoriteEntry> {
        self.get_favorites().into_iter().find(|f| f.city_key == city_key)
    }

    /// City part of every favorite key, in insertion order.
    pub fn favorite_city_names(&self) -> Vec<String> {
        self.get_favorites()
            .iter()
            .map(|f| f.city_key.split(',').next().unwrap_or_default().trim().to_string())
            .collect()
    }

    pub fn clear_favorites(&self) {
        self.set_item(FAVORITES_KEY, &Vec::<FavoriteEntry>::new());
    }

    // Last searched city

    /// Empty when nothing has been recorded.
    pub fn get_last_searched(&self) -> String {
        self.get_item(LAST_SEARCHED_KEY).unwrap_or_default()
    }

    pub fn save_last_searched(&self, city: &str) {
        self.set_item(LAST_SEARCHED_KEY, &city);
    }

    // Preferences

    pub fn get_user_preferences(&self) -> UserPreferences {
        self.get_item::<PreferencesUpdate>(USER_PREFERENCES_KEY)
            .unwrap_or_default()
            .merged_over(UserPreferences::default())
    }

    pub fn save_user_preferences(&self, update: PreferencesUpdate) -> UserPreferences {
        let merged = update.merged_over(self.get_user_preferences());
        self.set_item(
            USER_PREFERENCES_KEY,
            &PreferencesUpdate::from(merged.clone()),
        );
        merged
    }

    // Whole store

    /// Remove every record. A record the medium refuses to drop is masked in
    /// memory so it reads as absent for the rest of the session.
    pub fn clear_all_data(&self) {
        let mut cache = self.cache.lock();
        for key in ALL_KEYS {
            match self.medium.remove(key) {
                Ok(()) => {
                    cache.remove(key);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "failed to remove stored record");
                    cache.insert(
                        key,
                        CachedRecord {
                            value: None,
                            durable: false,
                        },
                    );
                }
            }
        }
        tracing::info!("all stored data cleared");
    }

    pub fn storage_info(&self) -> StorageInfo {
        StorageInfo {
            durable_available: self.is_durable_available(),
            favorites: self.get_favorites(),
            last_searched: self.get_last_searched(),
            preferences: self.get_user_preferences(),
        }
    }

    fn get_item<T: DeserializeOwned>(&self, key: &'static str) -> Option<T> {
        let value = self.read_value(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored record has unexpected shape");
                None
            }
        }
    }

    fn read_value(&self, key: &'static str) -> Option<Value> {
        if let Some(pending) = self.cache.lock().get(key).filter(|r| !r.durable) {
            return pending.value.clone();
        }

        match self.medium.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    let record = CachedRecord {
                        value: Some(value.clone()),
                        durable: true,
                    };
                    self.cache.lock().insert(key, record);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "unreadable stored record, using memory copy");
                    self.cached_value(key)
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, using memory copy");
                self.cached_value(key)
            }
        }
    }

    fn cached_value(&self, key: &'static str) -> Option<Value> {
        self.cache.lock().get(key).and_then(|r| r.value.clone())
    }

    fn set_item<T: Serialize + ?Sized>(&self, key: &'static str, item: &T) {
        let value = match serde_json::to_value(item) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize record, not stored");
                return;
            }
        };

        let durable = match self.medium.set(key, &value.to_string()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage write failed, keeping record in memory");
                false
            }
        };

        let record = CachedRecord {
            value: Some(value),
            durable,
        };
        self.cache.lock().insert(key, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::model::{TemperatureUnit, TimeFormat};
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    /// Medium that fails every call.
    #[derive(Debug)]
    struct BrokenMedium;

    impl StorageMedium for BrokenMedium {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".into()))
        }
    }

    /// Memory medium whose writes and removals can be switched off.
    /// Reads always succeed.
    #[derive(Debug, Default)]
    struct FlakyMedium {
        inner: MemoryMedium,
        writes_fail: Arc<AtomicBool>,
    }

    impl StorageMedium for FlakyMedium {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.writes_fail.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("quota exceeded".into()));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            if self.writes_fail.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("read-only".into()));
            }
            self.inner.remove(key)
        }
    }

    fn flaky() -> (FlakyMedium, Arc<AtomicBool>) {
        let writes_fail = Arc::new(AtomicBool::new(false));
        let medium = FlakyMedium {
            inner: MemoryMedium::default(),
            writes_fail: writes_fail.clone(),
        };
        (medium, writes_fail)
    }

    fn snapshot(city: &str, country: &str) -> CurrentWeather {
        CurrentWeather {
            city: city.into(),
            country: country.into(),
            temperature: 18.0,
            condition: "Clouds".into(),
            feels_like: 17.0,
            min_temp: 15.0,
            max_temp: 20.0,
            humidity: 60,
            wind_speed: 3.0,
            wind_deg: None,
            sunrise: "06:00 AM".into(),
            sunset: "09:00 PM".into(),
            coordinates: None,
            alerts: vec![],
        }
    }

    #[test]
    fn adding_twice_keeps_one_entry() {
        let store = Store::in_memory();
        let paris = snapshot("Paris", "FR");

        store.add_favorite("Paris, FR", &paris);
        let favorites = store.add_favorite("Paris, FR", &paris);

        assert_eq!(
            favorites.iter().filter(|f| f.city_key == "Paris, FR").count(),
            1
        );
        assert_eq!(favorites[0].city, "Paris");
        assert_eq!(favorites[0].country, "FR");
    }

    #[test]
    fn remove_restores_previous_collection() {
        let store = Store::in_memory();
        store.add_favorite("Oslo, NO", &snapshot("Oslo", "NO"));
        let before = store.get_favorites();

        store.add_favorite("Rome, IT", &snapshot("Rome", "IT"));
        let after = store.remove_favorite("Rome, IT");

        assert_eq!(after, before);
        assert!(!store.is_favorite("Rome, IT"));
    }

    #[test]
    fn removing_unknown_key_is_a_noop() {
        let store = Store::in_memory();
        store.add_favorite("Oslo, NO", &snapshot("Oslo", "NO"));
        assert_eq!(store.remove_favorite("Nowhere, XX").len(), 1);
    }

    #[test]
    fn toggle_and_lookup_helpers() {
        let store = Store::in_memory();
        let cairo = snapshot("Cairo", "EG");

        assert!(store.toggle_favorite("Cairo, EG", &cairo));
        assert_eq!(
            store.get_favorite("Cairo, EG").map(|f| f.city),
            Some("Cairo".to_string())
        );
        assert_eq!(store.favorite_city_names(), vec!["Cairo".to_string()]);

        assert!(!store.toggle_favorite("Cairo, EG", &cairo));
        assert!(store.get_favorites().is_empty());
    }

    #[test]
    fn preferences_merge_with_defaults() {
        let store = Store::in_memory();
        store.save_user_preferences(PreferencesUpdate {
            theme: Some("dark".into()),
            ..Default::default()
        });

        let prefs = store.get_user_preferences();
        assert_eq!(prefs.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(prefs.time_format, TimeFormat::TwelveHour);
        assert_eq!(prefs.theme, "dark");

        let prefs = store.save_user_preferences(PreferencesUpdate {
            temperature_unit: Some(TemperatureUnit::Fahrenheit),
            ..Default::default()
        });
        assert_eq!(prefs.theme, "dark");
        assert_eq!(prefs.temperature_unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn partial_preferences_record_on_medium_is_merged() {
        let medium = MemoryMedium::default();
        medium.set(USER_PREFERENCES_KEY, r#"{"timeFormat":"24hour"}"#).unwrap();

        let prefs = Store::open(Box::new(medium)).get_user_preferences();
        assert_eq!(prefs.time_format, TimeFormat::TwentyFourHour);
        assert_eq!(prefs.theme, "default");
    }

    #[test]
    fn malformed_records_read_as_defaults() {
        let medium = MemoryMedium::default();
        medium.set(FAVORITES_KEY, r#"{"not":"a list"}"#).unwrap();
        medium.set(LAST_SEARCHED_KEY, "not json at all").unwrap();
        medium.set(USER_PREFERENCES_KEY, r#"{"temperatureUnit":"kelvin"}"#).unwrap();

        let store = Store::open(Box::new(medium));
        assert!(store.get_favorites().is_empty());
        assert_eq!(store.get_last_searched(), "");
        assert_eq!(store.get_user_preferences(), UserPreferences::default());
    }

    #[test]
    fn broken_medium_falls_back_to_memory() {
        let store = Store::open(Box::new(BrokenMedium));
        assert!(!store.is_durable_available());

        store.add_favorite("Paris, FR", &snapshot("Paris", "FR"));
        store.save_last_searched("Paris");

        let favorites = store.get_favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].city_key, "Paris, FR");
        assert_eq!(store.get_last_searched(), "Paris");

        store.clear_all_data();
        assert!(store.get_favorites().is_empty());
        assert_eq!(store.get_last_searched(), "");
    }

    #[test]
    fn failed_write_is_not_shadowed_by_stale_medium() {
        let (medium, writes_fail) = flaky();
        let store = Store::open(Box::new(medium));

        store.save_last_searched("Rome");
        writes_fail.store(true, Ordering::SeqCst);
        store.save_last_searched("Oslo");
        assert_eq!(store.get_last_searched(), "Oslo");

        writes_fail.store(false, Ordering::SeqCst);
        store.save_last_searched("Lima");
        assert_eq!(store.get_last_searched(), "Lima");
    }

    #[test]
    fn cleared_records_stay_cleared_on_read_only_medium() {
        let (medium, writes_fail) = flaky();
        let rome = serde_json::json!([{
            "cityKey": "Rome, IT",
            "city": "Rome",
            "country": "IT",
            "addedAt": "2023-05-19T12:00:00Z"
        }]);
        medium.inner.set(FAVORITES_KEY, &rome.to_string()).unwrap();
        medium.inner.set(LAST_SEARCHED_KEY, r#""Rome""#).unwrap();
        writes_fail.store(true, Ordering::SeqCst);

        let store = Store::open(Box::new(medium));
        assert!(store.is_favorite("Rome, IT"));

        store.clear_all_data();
        assert!(store.get_favorites().is_empty());
        assert_eq!(store.get_last_searched(), "");
        assert_eq!(store.get_user_preferences(), UserPreferences::default());

        writes_fail.store(false, Ordering::SeqCst);
        store.save_last_searched("Lima");
        assert_eq!(store.get_last_searched(), "Lima");
        assert!(store.get_favorites().is_empty());
    }

    #[test]
    fn records_survive_reopen_on_file_medium() {
        let dir = tempfile::tempdir().unwrap();

        let store = Store::open(Box::new(FileMedium::new(dir.path())));
        store.add_favorite("Tokyo, JP", &snapshot("Tokyo", "JP"));
        store.save_last_searched("Tokyo");
        drop(store);

        let store = Store::open(Box::new(FileMedium::new(dir.path())));
        assert!(store.is_favorite("Tokyo, JP"));
        assert_eq!(store.get_last_searched(), "Tokyo");

        let raw = std::fs::read_to_string(dir.path().join("weather_favorites.json")).unwrap();
        assert!(raw.contains("\"cityKey\":\"Tokyo, JP\""));
        assert!(raw.contains("\"addedAt\""));
    }

    #[test]
    fn clear_all_data_resets_every_record() {
        let store = Store::in_memory();
        store.add_favorite("Lima, PE", &snapshot("Lima", "PE"));
        store.save_last_searched("Lima");
        store.save_user_preferences(PreferencesUpdate {
            theme: Some("dark".into()),
            ..Default::default()
        });

        store.clear_all_data();

        let info = store.storage_info();
        assert!(info.durable_available);
        assert!(info.favorites.is_empty());
        assert_eq!(info.last_searched, "");
        assert_eq!(info.preferences, UserPreferences::default());
    }

    #[test]
    fn clear_favorites_keeps_other_records() {
        let store = Store::in_memory();
        store.add_favorite("Lima, PE", &snapshot("Lima", "PE"));
        store.save_last_searched("Lima");

        store.clear_favorites();
        assert!(store.get_favorites().is_empty());
        assert_eq!(store.get_last_searched(), "Lima");
    }
}

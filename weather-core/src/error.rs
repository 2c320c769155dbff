use thiserror::Error;

/// Failures of weather queries. Raw details stay in `Display` (for logs);
/// what the user sees comes from [`WeatherError::user_message`].
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("city not found: {0}")]
    CityNotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("forecast unavailable: {0}")]
    ForecastUnavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::CityNotFound(_) => "City not found. Please try again.",
            WeatherError::Timeout => "Request timed out. Please try again.",
            WeatherError::Geolocation(e) => e.user_message(),
            WeatherError::Network(_)
            | WeatherError::Api { .. }
            | WeatherError::MalformedResponse(_)
            | WeatherError::ForecastUnavailable(_) => {
                "Failed to fetch weather data. Please try again."
            }
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WeatherError::Timeout
        } else if e.is_decode() {
            WeatherError::MalformedResponse(e.to_string())
        } else {
            WeatherError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location unavailable: {0}")]
    Denied(String),

    #[error("geolocation is not supported")]
    Unsupported,
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::Denied(_) => {
                "Failed to get your location. Please allow location access or search by city."
            }
            GeolocationError::Unsupported => "Geolocation is not supported by your browser.",
        }
    }
}

/// Durable medium failures. These never leave the store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

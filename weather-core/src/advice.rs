/// Coarse grouping of free-text condition labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCategory {
    Clear,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Other,
}

impl WeatherCategory {
    /// Keyword match on the label, checked in order.
    pub fn from_condition(condition: &str) -> Self {
        let c = condition.to_lowercase();

        if c.contains("sunny") || c.contains("clear") {
            WeatherCategory::Clear
        } else if c.contains("cloud") {
            WeatherCategory::Cloudy
        } else if c.contains("rain") || c.contains("drizzle") {
            WeatherCategory::Rainy
        } else if c.contains("snow") || c.contains("blizzard") {
            WeatherCategory::Snowy
        } else if c.contains("thunder") || c.contains("storm") {
            WeatherCategory::Stormy
        } else {
            WeatherCategory::Other
        }
    }
}

/// What to wear for a Celsius temperature and condition label.
pub fn clothing_recommendation(temp_c: f64, condition: &str) -> String {
    let base = if temp_c <= 0.0 {
        "Heavy winter coat, warm layers, gloves, and hat"
    } else if temp_c <= 10.0 {
        "Warm jacket or coat, long sleeves"
    } else if temp_c <= 20.0 {
        "Light jacket or sweater, long pants"
    } else if temp_c <= 30.0 {
        "T-shirt and jeans or shorts"
    } else {
        "Light clothing, shorts, and a hat"
    };

    let extra = match WeatherCategory::from_condition(condition) {
        WeatherCategory::Rainy => Some("and don't forget an umbrella or raincoat"),
        WeatherCategory::Snowy => Some("waterproof boots recommended"),
        WeatherCategory::Stormy => Some("stay indoors if possible"),
        WeatherCategory::Clear if temp_c > 25.0 => Some("sunglasses and sunscreen advised"),
        _ => None,
    };

    match extra {
        Some(extra) => format!("{base}, {extra}"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(
            WeatherCategory::from_condition("Sunny"),
            WeatherCategory::Clear
        );
        assert_eq!(
            WeatherCategory::from_condition("Partly Cloudy"),
            WeatherCategory::Cloudy
        );
        assert_eq!(
            WeatherCategory::from_condition("light rain"),
            WeatherCategory::Rainy
        );
        assert_eq!(
            WeatherCategory::from_condition("Snow"),
            WeatherCategory::Snowy
        );
        assert_eq!(
            WeatherCategory::from_condition("Thunderstorm"),
            WeatherCategory::Stormy
        );
        assert_eq!(
            WeatherCategory::from_condition("Mist"),
            WeatherCategory::Other
        );
    }

    #[test]
    fn recommendation_adds_condition_hint() {
        assert_eq!(
            clothing_recommendation(15.0, "Light Rain"),
            "Light jacket or sweater, long pants, and don't forget an umbrella or raincoat"
        );
        assert_eq!(
            clothing_recommendation(28.0, "Clear"),
            "T-shirt and jeans or shorts, sunglasses and sunscreen advised"
        );
        assert_eq!(
            clothing_recommendation(-5.0, "Mist"),
            "Heavy winter coat, warm layers, gloves, and hat"
        );
    }
}

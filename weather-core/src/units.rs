//! Unit conversions and derived quantities.

use crate::model::TemperatureUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindSpeedUnit {
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
}

pub fn convert_temperature(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (value - 32.0) * 5.0 / 9.0,
        _ => value,
    }
}

pub fn convert_wind_speed(value: f64, from: WindSpeedUnit, to: WindSpeedUnit) -> f64 {
    if from == to {
        return value;
    }

    let mps = match from {
        WindSpeedUnit::MetersPerSecond => value,
        WindSpeedUnit::KilometersPerHour => value / 3.6,
        WindSpeedUnit::MilesPerHour => value / 2.237,
    };

    match to {
        WindSpeedUnit::MetersPerSecond => mps,
        WindSpeedUnit::KilometersPerHour => mps * 3.6,
        WindSpeedUnit::MilesPerHour => mps * 2.237,
    }
}

/// Eight-point compass direction for a bearing in degrees.
pub fn wind_direction(degrees: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = (degrees.rem_euclid(360.0) / 45.0).round() as usize % 8;
    DIRECTIONS[index]
}

/// Rothfusz heat index in Celsius.
///
/// The regression only holds at 80°F and above with at least 40% relative
/// humidity; outside that range the air temperature is returned unchanged.
pub fn heat_index(temp_c: f64, humidity: f64) -> f64 {
    let t = convert_temperature(
        temp_c,
        TemperatureUnit::Celsius,
        TemperatureUnit::Fahrenheit,
    );
    let rh = humidity;

    if t < 80.0 || rh < 40.0 {
        return temp_c;
    }

    let hi = -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 6.837_83e-3 * t * t
        - 5.481_717e-2 * rh * rh
        + 1.228_74e-3 * t * t * rh
        + 8.528_2e-4 * t * rh * rh
        - 1.99e-6 * t * t * rh * rh;

    convert_temperature(hi, TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn temperature_conversion() {
        use TemperatureUnit::*;
        assert!(approx(convert_temperature(100.0, Celsius, Fahrenheit), 212.0));
        assert!(approx(convert_temperature(-40.0, Fahrenheit, Celsius), -40.0));
        assert!(approx(convert_temperature(21.5, Celsius, Celsius), 21.5));
    }

    #[test]
    fn wind_speed_conversion() {
        use WindSpeedUnit::*;
        assert!(approx(convert_wind_speed(10.0, MetersPerSecond, KilometersPerHour), 36.0));
        assert!(approx(convert_wind_speed(36.0, KilometersPerHour, MetersPerSecond), 10.0));
        assert!(approx(convert_wind_speed(1.0, MetersPerSecond, MilesPerHour), 2.237));
    }

    #[test]
    fn compass_points() {
        assert_eq!(wind_direction(0.0), "N");
        assert_eq!(wind_direction(44.0), "NE");
        assert_eq!(wind_direction(180.0), "S");
        assert_eq!(wind_direction(350.0), "N");
        assert_eq!(wind_direction(-90.0), "W");
    }

    #[test]
    fn heat_index_applies_only_when_hot_and_humid() {
        assert_eq!(heat_index(20.0, 90.0), 20.0);
        assert_eq!(heat_index(35.0, 20.0), 35.0);

        // 90°F at 70% RH is about 106°F.
        let hi = heat_index(32.22, 70.0);
        assert!((hi - 41.0).abs() < 0.6, "got {hi}");
    }
}

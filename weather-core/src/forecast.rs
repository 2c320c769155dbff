use chrono::NaiveDate;

use crate::{
    format::{forecast_labels, offset_from_secs},
    model::{ForecastDay, ForecastSeries},
};

/// Number of days kept when no horizon is configured.
pub const DEFAULT_FORECAST_DAYS: usize = 5;

/// Collapse provider samples into at most `horizon` calendar days.
///
/// Days are taken in the location's own offset. Samples are ordered by time
/// first; the earliest sample of each day represents it and later samples of
/// the same day are dropped.
pub fn reduce_to_daily(series: &ForecastSeries, horizon: usize) -> Vec<ForecastDay> {
    let offset = offset_from_secs(series.utc_offset_secs);

    let mut samples: Vec<_> = series.samples.iter().collect();
    samples.sort_by_key(|s| s.timestamp);

    let mut days = Vec::with_capacity(horizon);
    let mut last_day: Option<NaiveDate> = None;

    for sample in samples {
        if days.len() >= horizon {
            break;
        }

        let local_day = sample.timestamp.with_timezone(&offset).date_naive();
        if last_day == Some(local_day) {
            continue;
        }
        last_day = Some(local_day);

        let (day, date) = forecast_labels(sample.timestamp, series.utc_offset_secs);
        days.push(ForecastDay {
            day,
            date,
            temperature: sample.temperature.round(),
            temp_min: sample.temp_min.round(),
            temp_max: sample.temp_max.round(),
            condition: sample.condition.clone(),
        });
    }

    days
}

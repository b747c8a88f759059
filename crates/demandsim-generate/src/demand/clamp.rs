use demandsim_config::ClampConfig;
use demandsim_core::CalendarDay;

/// `exp(median(ln v))` over positive values; `None` when none are positive.
pub fn geometric_median(values: &[f64]) -> Option<f64> {
    let mut logs: Vec<f64> = values
        .iter()
        .filter(|value| **value > 0.0 && value.is_finite())
        .map(|value| value.ln())
        .collect();
    if logs.is_empty() {
        return None;
    }
    logs.sort_by(f64::total_cmp);
    let mid = logs.len() / 2;
    let median = if logs.len() % 2 == 0 {
        (logs[mid - 1] + logs[mid]) / 2.0
    } else {
        logs[mid]
    };
    Some(median.exp())
}

/// Soft clamp pulling quiet-day samples toward a recent reference level.
#[derive(Debug, Clone)]
pub struct QuietDayClamp<'a> {
    config: &'a ClampConfig,
    demand_scale: f64,
}

impl<'a> QuietDayClamp<'a> {
    pub fn new(config: &'a ClampConfig, demand_scale: f64) -> Self {
        Self {
            config,
            demand_scale,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// A day without material promotional or special-calendar pressure.
    pub fn is_quiet(&self, campaign_pct: f64, offer_pct: f64, day: &CalendarDay) -> bool {
        if campaign_pct > self.config.max_campaign_pct {
            return false;
        }
        if offer_pct > self.config.max_offer_pressure_pct {
            return false;
        }
        !(self.config.skip_specials && day.is_special())
    }

    /// Reference level for day `index` from earlier pre-latent means.
    ///
    /// Same-weekday mode looks back at most `7 * window_days` days and keeps
    /// the latest `window_days` positive means on the same weekday.
    pub fn reference(&self, means: &[f64], days: &[CalendarDay], index: usize) -> Option<f64> {
        let window = self.config.window_days as usize;
        if window == 0 || index == 0 {
            return None;
        }
        let samples: Vec<f64> = if self.config.same_weekday {
            let weekday = days.get(index)?.weekday;
            let earliest = index.saturating_sub(window * 7);
            (earliest..index)
                .rev()
                .filter(|j| days.get(*j).is_some_and(|day| day.weekday == weekday))
                .filter_map(|j| means.get(j).copied())
                .filter(|value| *value > 0.0)
                .take(window)
                .collect()
        } else {
            let end = index.min(means.len());
            means[end.saturating_sub(window)..end]
                .iter()
                .copied()
                .filter(|value| *value > 0.0)
                .collect()
        };
        geometric_median(&samples).map(|median| median * self.demand_scale)
    }

    /// Pull a sample outside `reference * (1 ± band)` toward the reference.
    ///
    /// The rounded blend is bounded to the integers inside the band. A band
    /// holding no integer falls back to the rounded blend, floored at zero.
    pub fn apply(&self, sample: u64, reference: f64) -> u64 {
        let band = self.config.band_pct;
        let lower = ((1.0 - band) * reference).max(0.0);
        let upper = ((1.0 + band) * reference).max(0.0);
        let value = sample as f64;
        if value >= lower && value <= upper {
            return sample;
        }
        let blended = (reference + self.config.soft_lambda * (value - reference)).round();
        let (low, high) = (lower.ceil(), upper.floor());
        if low <= high {
            blended.clamp(low, high) as u64
        } else {
            blended.max(0.0) as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use demandsim_core::Season;

    use super::*;

    fn days(n: usize) -> Vec<CalendarDay> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("start");
        (0..n)
            .map(|idx| {
                let date = start + Duration::days(idx as i64);
                CalendarDay {
                    date,
                    year: 2024,
                    month: 1,
                    day: idx as u32 + 1,
                    weekday: (idx % 7) as u32,
                    is_weekend: idx % 7 >= 5,
                    season: Season::Winter,
                    is_official_holiday: idx == 0,
                    holiday_names: String::new(),
                    is_ramadan: false,
                    is_eid_fitr: false,
                    is_eid_adha: false,
                    is_valentines: false,
                    is_mothers_day: false,
                    is_teachers_day: false,
                    is_ataturk_memorial: false,
                    is_black_friday: false,
                    is_back_to_school: false,
                }
            })
            .collect()
    }

    #[test]
    fn geometric_median_of_logs() {
        assert_eq!(geometric_median(&[]), None);
        assert_eq!(geometric_median(&[0.0, -1.0]), None);
        let value = geometric_median(&[1.0, 4.0]).expect("median");
        assert!((value - 2.0).abs() < 1e-12);
        let value = geometric_median(&[1.0, 100.0, 10.0]).expect("median");
        assert!((value - 10.0).abs() < 1e-9);
    }

    #[test]
    fn same_weekday_reference() {
        let config = ClampConfig::default();
        let clamp = QuietDayClamp::new(&config, 2.0);
        let days = days(22);
        let mut means = vec![1.0; 22];
        means[7] = 4.0;
        means[14] = 4.0;
        let reference = clamp.reference(&means, &days, 21).expect("reference");
        // Mondays 0, 7 and 14 hold 1, 4, 4
        assert!((reference - 8.0).abs() < 1e-9);
        assert!(clamp.reference(&means, &days, 0).is_none());
    }

    #[test]
    fn trailing_reference() {
        let config = ClampConfig {
            same_weekday: false,
            window_days: 3,
            ..ClampConfig::default()
        };
        let clamp = QuietDayClamp::new(&config, 1.0);
        let days = days(10);
        let means = vec![9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 2.0, 3.0, 0.0, 5.0];
        let reference = clamp.reference(&means, &days, 9).expect("reference");
        assert!((reference - 6.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn samples_inside_band_are_kept() {
        let config = ClampConfig::default();
        let clamp = QuietDayClamp::new(&config, 1.0);
        assert_eq!(clamp.apply(10, 10.0), 10);
        assert_eq!(clamp.apply(11, 10.0), 11);
    }

    #[test]
    fn outliers_shrink_into_band() {
        let config = ClampConfig::default();
        let clamp = QuietDayClamp::new(&config, 1.0);
        assert_eq!(clamp.apply(12, 10.0), 11);
        assert_eq!(clamp.apply(40, 10.0), 11);
        assert_eq!(clamp.apply(0, 10.0), 9);

        // band [4.5, 5.5] holds only 5
        assert_eq!(clamp.apply(6, 5.0), 5);
        assert_eq!(clamp.apply(9, 5.0), 5);
        assert_eq!(clamp.apply(40, 5.0), 5);
        assert_eq!(clamp.apply(0, 5.0), 5);

        let loose = ClampConfig {
            band_pct: 1.0,
            ..ClampConfig::default()
        };
        let clamp = QuietDayClamp::new(&loose, 1.0);
        assert_eq!(clamp.apply(30, 10.0), 20);
    }

    #[test]
    fn band_without_integer_rounds_blend() {
        let config = ClampConfig::default();
        let clamp = QuietDayClamp::new(&config, 1.0);
        // band [0.27, 0.33]; blend of 4 is 2.15
        assert_eq!(clamp.apply(4, 0.3), 2);
        assert_eq!(clamp.apply(0, 0.3), 0);
    }

    #[test]
    fn quiet_day_rules() {
        let config = ClampConfig {
            skip_specials: true,
            ..ClampConfig::default()
        };
        let clamp = QuietDayClamp::new(&config, 1.0);
        let days = days(2);
        assert!(!clamp.is_quiet(0.0, 0.0, &days[0]));
        assert!(clamp.is_quiet(0.0, 0.0, &days[1]));
        assert!(!clamp.is_quiet(10.0, 0.0, &days[1]));
        assert!(!clamp.is_quiet(0.0, 2.5, &days[1]));
    }
}

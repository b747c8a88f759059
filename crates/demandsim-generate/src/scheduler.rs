use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;

use demandsim_core::DateWindow;

use crate::errors::GenerationError;

const ALL_MONTHS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// Outcome of one placement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Placement {
    Placed(DateWindow),
    Exhausted { attempts: u32 },
}

impl Placement {
    pub fn window(self) -> Option<DateWindow> {
        match self {
            Placement::Placed(window) => Some(window),
            Placement::Exhausted { .. } => None,
        }
    }
}

/// Rejection sampler for non-overlapping windows inside a date range.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    range: DateWindow,
    min_days: u32,
    max_days: u32,
    max_attempts: u32,
    bias_probability: f64,
}

impl IntervalScheduler {
    pub fn new(range: DateWindow, min_days: u32, max_days: u32) -> Result<Self, GenerationError> {
        if min_days == 0 || min_days > max_days {
            return Err(GenerationError::InvalidConfig(format!(
                "window length bounds [{min_days}, {max_days}] are invalid"
            )));
        }
        Ok(Self {
            range,
            min_days,
            max_days,
            max_attempts: 500,
            bias_probability: 0.7,
        })
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_bias_probability(mut self, probability: f64) -> Self {
        self.bias_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn range(&self) -> DateWindow {
        self.range
    }

    /// Try to place one window that avoids every window in `accepted`.
    ///
    /// With `preferred_months`, the target month is drawn from them with the
    /// bias probability and from all months otherwise.
    pub fn place(
        &self,
        rng: &mut impl Rng,
        accepted: &[DateWindow],
        preferred_months: Option<&[u32]>,
    ) -> Placement {
        let total_days = self.range.len_days();
        let preferred = preferred_months.filter(|months| !months.is_empty());

        for _ in 0..self.max_attempts {
            let duration = i64::from(rng.random_range(self.min_days..=self.max_days));

            let months: &[u32] = match preferred {
                Some(months) if rng.random::<f64>() < self.bias_probability => months,
                _ => &ALL_MONTHS,
            };

            let mut start = self.range.start + Duration::days(rng.random_range(0..total_days));
            let target = months[rng.random_range(0..months.len())];
            if start.month() != target {
                start = snap_to_month(start, target, self.range);
            }

            let end = start + Duration::days(duration - 1);
            if end > self.range.end {
                continue;
            }
            let window = DateWindow { start, end };
            if accepted.iter().any(|other| other.overlaps(&window)) {
                continue;
            }
            return Placement::Placed(window);
        }

        Placement::Exhausted {
            attempts: self.max_attempts,
        }
    }

    /// Place up to `count` mutually disjoint windows; returns the placed
    /// windows and the number of exhausted requests.
    pub fn place_many(
        &self,
        rng: &mut impl Rng,
        count: usize,
        preferred_months: Option<&[u32]>,
    ) -> (Vec<DateWindow>, usize) {
        let mut accepted = Vec::with_capacity(count);
        let mut exhausted = 0;
        for _ in 0..count {
            match self.place(rng, &accepted, preferred_months) {
                Placement::Placed(window) => accepted.push(window),
                Placement::Exhausted { .. } => exhausted += 1,
            }
        }
        (accepted, exhausted)
    }
}

/// First day of `month`, in the candidate's year when that lands in range,
/// else in the range's start or end year, clamped into the range.
fn snap_to_month(candidate: NaiveDate, month: u32, range: DateWindow) -> NaiveDate {
    let years = [candidate.year(), range.start.year(), range.end.year()];
    let snapped = years
        .iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(*year, month, 1))
        .find(|date| range.contains(*date))
        .or_else(|| NaiveDate::from_ymd_opt(candidate.year(), month, 1));
    match snapped {
        Some(date) => date.clamp(range.start, range.end),
        None => candidate,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn year_2024() -> DateWindow {
        DateWindow::new(date(2024, 1, 1), date(2024, 12, 31)).expect("range")
    }

    #[test]
    fn placed_windows_respect_bounds_and_each_other() {
        let scheduler = IntervalScheduler::new(year_2024(), 7, 21).expect("scheduler");
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let (windows, exhausted) = scheduler.place_many(&mut rng, 8, None);
        assert_eq!(exhausted, 0);
        assert_eq!(windows.len(), 8);
        for (idx, window) in windows.iter().enumerate() {
            assert!((7..=21).contains(&window.len_days()));
            assert!(window.start >= year_2024().start && window.end <= year_2024().end);
            for other in &windows[idx + 1..] {
                assert!(!window.overlaps(other));
            }
        }
    }

    #[test]
    fn preferred_months_pull_starts() {
        let scheduler = IntervalScheduler::new(year_2024(), 1, 1)
            .expect("scheduler")
            .with_bias_probability(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let window = scheduler
                .place(&mut rng, &[], Some(&[3]))
                .window()
                .expect("placed");
            assert_eq!(window.start.month(), 3);
        }
    }

    #[test]
    fn crowded_range_exhausts_instead_of_failing() {
        let range = DateWindow::new(date(2024, 1, 1), date(2024, 1, 10)).expect("range");
        let scheduler = IntervalScheduler::new(range, 7, 7)
            .expect("scheduler")
            .with_max_attempts(20);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let taken = [range];
        assert_eq!(
            scheduler.place(&mut rng, &taken, None),
            Placement::Exhausted { attempts: 20 }
        );
    }

    #[test]
    fn window_longer_than_range_never_places() {
        let range = DateWindow::new(date(2024, 1, 1), date(2024, 1, 5)).expect("range");
        let scheduler = IntervalScheduler::new(range, 7, 21).expect("scheduler");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(scheduler.place(&mut rng, &[], None).window().is_none());
    }

    #[test]
    fn same_seed_same_decisions() {
        let scheduler = IntervalScheduler::new(year_2024(), 7, 21).expect("scheduler");
        let first = scheduler.place_many(&mut ChaCha8Rng::seed_from_u64(9), 5, Some(&[1, 2]));
        let second = scheduler.place_many(&mut ChaCha8Rng::seed_from_u64(9), 5, Some(&[1, 2]));
        assert_eq!(first, second);
    }

    #[test]
    fn snapping_stays_in_range() {
        let range = DateWindow::new(date(2024, 3, 10), date(2024, 5, 20)).expect("range");
        assert_eq!(snap_to_month(date(2024, 3, 15), 4, range), date(2024, 4, 1));
        assert_eq!(snap_to_month(date(2024, 4, 15), 3, range), date(2024, 3, 10));
        assert_eq!(snap_to_month(date(2024, 4, 15), 9, range), date(2024, 5, 20));
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        assert!(IntervalScheduler::new(year_2024(), 0, 3).is_err());
        assert!(IntervalScheduler::new(year_2024(), 5, 3).is_err());
    }
}

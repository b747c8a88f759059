use demandsim_config::{TuningConfig, WorldConfig};
use demandsim_core::{CalendarDay, ProductDemandProfile};

use crate::calendar::Calendar;
use crate::campaigns::OfferIndex;

/// Detects national civic holidays by name.
#[derive(Debug, Clone)]
pub struct CivicDayDetector {
    keywords: Vec<String>,
}

impl Default for CivicDayDetector {
    fn default() -> Self {
        Self::new(&[
            "republic day",
            "victory day",
            "youth and sports",
            "children's day",
            "democracy and national unity",
        ])
    }
}

impl CivicDayDetector {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|kw| kw.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, holiday_names: &str) -> bool {
        if holiday_names.is_empty() {
            return false;
        }
        let lowered = holiday_names.to_lowercase();
        self.keywords.iter().any(|kw| lowered.contains(kw.as_str()))
    }
}

/// `1 + strength * pct / 100`, or 1 without a promotion.
pub fn promo_multiplier(percent_off: f64, strength: f64) -> f64 {
    if percent_off <= 0.0 {
        return 1.0;
    }
    1.0 + strength * percent_off / 100.0
}

/// Offer-pressure lift, capped at `1 + cap / 100`.
pub fn offer_multiplier(effective_pct: f64, alpha: f64, cap_pct: f64) -> f64 {
    (1.0 + alpha * effective_pct / 100.0).min(1.0 + cap_pct / 100.0)
}

/// Product of event multipliers active on a day.
pub fn event_multiplier(
    profile: &ProductDemandProfile,
    day: &CalendarDay,
    civic: &CivicDayDetector,
) -> f64 {
    let mut multiplier: f64 = day
        .events()
        .into_iter()
        .map(|event| profile.events.for_event(event))
        .product();
    if civic.matches(&day.holiday_names) {
        multiplier *= profile.events.national_day;
    }
    multiplier
}

/// Pre-smoothing expected demand of a product on one day.
pub fn expected_mean(
    profile: &ProductDemandProfile,
    day: &CalendarDay,
    campaign_pct: f64,
    offer_pct: f64,
    tuning: &TuningConfig,
    civic: &CivicDayDetector,
) -> f64 {
    let mut mean = profile.base_rate;
    mean *= profile.seasons.for_season(day.season);
    if day.is_weekend {
        mean *= profile.weekend_mult;
    }
    mean *= event_multiplier(profile, day, civic);
    mean *= promo_multiplier(campaign_pct, profile.promo_strength * tuning.promo_effect_alpha);
    mean *= offer_multiplier(
        offer_pct,
        tuning.offer_effect_alpha,
        tuning.offer_effect_cap_pct,
    );
    mean
}

/// Segment-weighted average of active personal offers, per calendar day.
pub fn offer_pressure_by_day(world: &WorldConfig, calendar: &Calendar, offers: &OfferIndex<'_>) -> Vec<f64> {
    calendar
        .days()
        .iter()
        .map(|day| {
            let mut total_weight = 0.0;
            let mut weighted = 0.0;
            for customer in &world.customers {
                let weight = world.segment(&customer.segment).weight(day.is_weekend);
                total_weight += weight;
                weighted += weight * offers.active_percent(customer.id, day.date);
            }
            if total_weight > 0.0 {
                weighted / total_weight
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use demandsim_core::{Customer, CustomerOffer, DateWindow, SegmentBehavior};

    use super::*;
    use crate::calendar::CalendarBuilder;
    use crate::holidays::{StaticHolidays, TurkeyHolidays};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn january() -> Calendar {
        let provider = StaticHolidays::new("XX");
        CalendarBuilder::new(&provider)
            .build(date(2024, 1, 1), date(2024, 1, 31))
            .expect("calendar")
    }

    #[test]
    fn neutral_profile_yields_base_rate() {
        let calendar = january();
        let profile = ProductDemandProfile::flat(4.25);
        let tuning = TuningConfig::default();
        let civic = CivicDayDetector::default();
        for day in calendar.days() {
            assert_eq!(expected_mean(&profile, day, 0.0, 0.0, &tuning, &civic), 4.25);
        }
    }

    #[test]
    fn promo_and_offer_multipliers() {
        assert_eq!(promo_multiplier(0.0, 2.0), 1.0);
        assert!((promo_multiplier(20.0, 1.5) - 1.3).abs() < 1e-12);
        assert!((offer_multiplier(10.0, 0.6, 30.0) - 1.06).abs() < 1e-12);
        assert!((offer_multiplier(100.0, 1.0, 30.0) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn civic_days_lift_flag_profiles() {
        let provider = TurkeyHolidays;
        let calendar = CalendarBuilder::new(&provider)
            .build(date(2024, 10, 28), date(2024, 10, 30))
            .expect("calendar");
        let civic = CivicDayDetector::default();
        let mut profile = ProductDemandProfile::flat(1.0);
        profile.events.national_day = 3.0;

        let republic_day = calendar.day(date(2024, 10, 29)).expect("day");
        assert!(civic.matches(&republic_day.holiday_names));
        assert_eq!(event_multiplier(&profile, republic_day, &civic), 3.0);
        let plain = calendar.day(date(2024, 10, 30)).expect("day");
        assert_eq!(event_multiplier(&profile, plain, &civic), 1.0);
    }

    #[test]
    fn offer_pressure_weights_segments() {
        let calendar = january();
        let mut world = WorldConfig::new(date(2024, 1, 1), date(2024, 1, 31), "XX", 1);
        world.customers = vec![
            Customer {
                id: 1,
                name: String::new(),
                segment: "retail".to_string(),
            },
            Customer {
                id: 2,
                name: String::new(),
                segment: "mystery".to_string(),
            },
        ];
        world.segments.insert(
            "retail".to_string(),
            SegmentBehavior {
                base_rate: 0.6,
                weekend_mult: 1.0,
            },
        );
        let offers = vec![CustomerOffer {
            id: 30001,
            customer_id: 1,
            percent_off: 10.0,
            window: DateWindow {
                start: date(2024, 1, 2),
                end: date(2024, 1, 2),
            },
        }];
        let index = OfferIndex::new(&offers);
        let pressure = offer_pressure_by_day(&world, &calendar, &index);
        assert_eq!(pressure.len(), 31);
        assert_eq!(pressure[0], 0.0);
        // retail 0.6 vs unknown segment default 0.2
        assert!((pressure[1] - 7.5).abs() < 1e-9);
    }
}

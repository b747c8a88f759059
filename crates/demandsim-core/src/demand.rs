use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarEvent, Season};

/// Per-season demand multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SeasonMultipliers {
    pub winter: f64,
    pub spring: f64,
    pub summer: f64,
    pub autumn: f64,
}

impl Default for SeasonMultipliers {
    fn default() -> Self {
        Self {
            winter: 1.0,
            spring: 1.0,
            summer: 1.0,
            autumn: 1.0,
        }
    }
}

impl SeasonMultipliers {
    pub fn for_season(&self, season: Season) -> f64 {
        match season {
            Season::Winter => self.winter,
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
        }
    }

    fn values(&self) -> [f64; 4] {
        [self.winter, self.spring, self.summer, self.autumn]
    }
}

/// Per-event demand multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EventMultipliers {
    pub valentines: f64,
    pub mothers_day: f64,
    pub teachers_day: f64,
    pub back_to_school: f64,
    pub ramadan: f64,
    pub eid_fitr: f64,
    pub eid_adha: f64,
    pub ataturk_memorial: f64,
    pub black_friday: f64,
    /// Applied on holidays whose name matches a national civic keyword.
    pub national_day: f64,
}

impl Default for EventMultipliers {
    fn default() -> Self {
        Self {
            valentines: 1.0,
            mothers_day: 1.0,
            teachers_day: 1.0,
            back_to_school: 1.0,
            ramadan: 1.0,
            eid_fitr: 1.0,
            eid_adha: 1.0,
            ataturk_memorial: 1.0,
            black_friday: 1.0,
            national_day: 1.0,
        }
    }
}

impl EventMultipliers {
    pub fn for_event(&self, event: CalendarEvent) -> f64 {
        match event {
            CalendarEvent::Valentines => self.valentines,
            CalendarEvent::MothersDay => self.mothers_day,
            CalendarEvent::TeachersDay => self.teachers_day,
            CalendarEvent::BackToSchool => self.back_to_school,
            CalendarEvent::Ramadan => self.ramadan,
            CalendarEvent::EidFitr => self.eid_fitr,
            CalendarEvent::EidAdha => self.eid_adha,
            CalendarEvent::AtaturkMemorial => self.ataturk_memorial,
            CalendarEvent::BlackFriday => self.black_friday,
        }
    }

    fn values(&self) -> [f64; 10] {
        [
            self.valentines,
            self.mothers_day,
            self.teachers_day,
            self.back_to_school,
            self.ramadan,
            self.eid_fitr,
            self.eid_adha,
            self.ataturk_memorial,
            self.black_friday,
            self.national_day,
        ]
    }
}

/// Static demand configuration of one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProductDemandProfile {
    /// Mean units per day before any multiplier.
    pub base_rate: f64,
    pub seasons: SeasonMultipliers,
    pub weekend_mult: f64,
    pub events: EventMultipliers,
    /// Demand lift per 100% off.
    pub promo_strength: f64,
    /// Negative-binomial shape `k`; larger means less variance.
    pub dispersion: f64,
    /// Scale of the latent AR(1) factor in log space.
    pub latent_amp: f64,
}

impl Default for ProductDemandProfile {
    fn default() -> Self {
        Self {
            base_rate: 2.0,
            seasons: SeasonMultipliers::default(),
            weekend_mult: 1.0,
            events: EventMultipliers::default(),
            promo_strength: 1.0,
            dispersion: 10.0,
            latent_amp: 0.15,
        }
    }
}

impl ProductDemandProfile {
    /// Profile with the given base rate and every multiplier at 1.
    pub fn flat(base_rate: f64) -> Self {
        Self {
            base_rate,
            ..Self::default()
        }
    }

    /// All multiplicative knobs, for domain checks.
    pub fn multipliers(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(16);
        values.extend(self.seasons.values());
        values.push(self.weekend_mult);
        values.extend(self.events.values());
        values
    }

    /// Built-in profile for the reference product archetypes (ids 1001-1012).
    pub fn archetype(product_id: u32) -> Option<Self> {
        let base = Self::default();
        let events = EventMultipliers::default();
        let seasons = SeasonMultipliers::default();
        let profile = match product_id {
            // sunscreen
            1001 => Self {
                base_rate: 0.6,
                seasons: SeasonMultipliers { summer: 2.2, ..seasons },
                weekend_mult: 1.05,
                promo_strength: 1.1,
                dispersion: 6.0,
                latent_amp: 0.35,
                ..base
            },
            // air conditioner
            1002 => Self {
                base_rate: 0.15,
                seasons: SeasonMultipliers { summer: 3.0, ..seasons },
                promo_strength: 1.6,
                dispersion: 4.0,
                latent_amp: 0.40,
                ..base
            },
            // ski board
            1003 => Self {
                base_rate: 0.08,
                seasons: SeasonMultipliers { winter: 2.5, ..seasons },
                weekend_mult: 1.15,
                promo_strength: 1.2,
                dispersion: 6.0,
                latent_amp: 0.30,
                ..base
            },
            // thermo flask
            1004 => Self {
                base_rate: 0.4,
                seasons: SeasonMultipliers { winter: 1.6, ..seasons },
                promo_strength: 1.0,
                dispersion: 8.0,
                latent_amp: 0.15,
                ..base
            },
            // dates
            1005 => Self {
                base_rate: 0.5,
                events: EventMultipliers {
                    ramadan: 6.0,
                    eid_fitr: 1.6,
                    ..events
                },
                promo_strength: 0.8,
                dispersion: 10.0,
                latent_amp: 0.4,
                ..base
            },
            // chocolates
            1006 => Self {
                base_rate: 1.4,
                events: EventMultipliers {
                    valentines: 2.1,
                    mothers_day: 1.6,
                    teachers_day: 1.2,
                    ..events
                },
                weekend_mult: 1.15,
                promo_strength: 1.3,
                dispersion: 10.0,
                latent_amp: 0.20,
                ..base
            },
            // perfume
            1007 => Self {
                base_rate: 0.5,
                events: EventMultipliers {
                    valentines: 1.8,
                    mothers_day: 2.0,
                    ..events
                },
                weekend_mult: 1.05,
                promo_strength: 1.4,
                dispersion: 8.0,
                latent_amp: 0.15,
                ..base
            },
            // potato chips
            1008 => Self {
                base_rate: 6.0,
                weekend_mult: 1.4,
                promo_strength: 1.5,
                dispersion: 12.0,
                latent_amp: 0.20,
                ..base
            },
            // energy drink
            1009 => Self {
                base_rate: 4.0,
                weekend_mult: 1.6,
                promo_strength: 1.4,
                dispersion: 12.0,
                latent_amp: 0.25,
                ..base
            },
            // notebook
            1010 => Self {
                base_rate: 0.9,
                events: EventMultipliers {
                    back_to_school: 4.0,
                    teachers_day: 1.2,
                    ..events
                },
                promo_strength: 0.9,
                dispersion: 10.0,
                latent_amp: 0.30,
                ..base
            },
            // national flag
            1011 => Self {
                base_rate: 0.06,
                events: EventMultipliers {
                    national_day: 6.0,
                    ..events
                },
                promo_strength: 0.8,
                dispersion: 6.0,
                latent_amp: 0.05,
                ..base
            },
            // tea
            1012 => Self {
                base_rate: 3.2,
                seasons: SeasonMultipliers { winter: 1.2, ..seasons },
                weekend_mult: 1.05,
                promo_strength: 0.8,
                dispersion: 14.0,
                latent_amp: 0.10,
                ..base
            },
            _ => return None,
        };
        Some(profile)
    }
}

/// One emitted demand row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDemandObservation {
    pub date: NaiveDate,
    pub product_id: u32,
    pub demand: u64,
    /// Active campaign percent-off equivalent that day, two decimals.
    pub promo_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_profile_has_unit_multipliers() {
        let profile = ProductDemandProfile::flat(3.5);
        assert_eq!(profile.base_rate, 3.5);
        assert!(profile.multipliers().iter().all(|value| *value == 1.0));
    }

    #[test]
    fn archetypes_cover_reference_catalog() {
        for id in 1001..=1012 {
            assert!(ProductDemandProfile::archetype(id).is_some(), "missing {id}");
        }
        assert!(ProductDemandProfile::archetype(999).is_none());

        let dates = ProductDemandProfile::archetype(1005).expect("dates profile");
        assert_eq!(dates.events.for_event(CalendarEvent::Ramadan), 6.0);
        assert_eq!(dates.events.for_event(CalendarEvent::Valentines), 1.0);

        let ac = ProductDemandProfile::archetype(1002).expect("ac profile");
        assert_eq!(ac.seasons.for_season(Season::Summer), 3.0);
        assert_eq!(ac.seasons.for_season(Season::Winter), 1.0);
    }
}

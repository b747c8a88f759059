use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, Duration, NaiveDate};

/// Official holidays keyed by date; coinciding names are joined with `"; "`.
pub type HolidayTable = BTreeMap<NaiveDate, String>;

/// Source of a country's official holiday table.
pub trait HolidayProvider: Send + Sync {
    /// ISO 3166-1 alpha-2 code served by this provider.
    fn country_code(&self) -> &str;

    /// Holidays falling in the given years.
    fn holidays(&self, years: RangeInclusive<i32>) -> HolidayTable;
}

/// Resolve a built-in provider for a country code.
pub fn provider_for_country(code: &str) -> Option<Box<dyn HolidayProvider>> {
    match code.trim().to_ascii_uppercase().as_str() {
        "TR" => Some(Box::new(TurkeyHolidays)),
        _ => None,
    }
}

/// Fixed table injected by the host.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidays {
    country: String,
    table: HolidayTable,
}

impl StaticHolidays {
    pub fn new(country: &str) -> Self {
        Self {
            country: country.to_ascii_uppercase(),
            table: HolidayTable::new(),
        }
    }

    pub fn with_holiday(mut self, date: NaiveDate, name: &str) -> Self {
        insert_holiday(&mut self.table, date, name);
        self
    }
}

impl HolidayProvider for StaticHolidays {
    fn country_code(&self) -> &str {
        &self.country
    }

    fn holidays(&self, years: RangeInclusive<i32>) -> HolidayTable {
        self.table
            .iter()
            .filter(|(date, _)| years.contains(&date.year()))
            .map(|(date, name)| (*date, name.clone()))
            .collect()
    }
}

/// Turkish public holidays with the religious feasts from an embedded table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurkeyHolidays;

// First days of Ramazan Bayramı and Kurban Bayramı as announced in Turkey.
const EID_AL_FITR: &[(i32, u32, u32)] = &[
    (2015, 7, 17),
    (2016, 7, 5),
    (2017, 6, 25),
    (2018, 6, 15),
    (2019, 6, 4),
    (2020, 5, 24),
    (2021, 5, 13),
    (2022, 5, 2),
    (2023, 4, 21),
    (2024, 4, 10),
    (2025, 3, 30),
    (2026, 3, 20),
    (2027, 3, 9),
    (2028, 2, 26),
    (2029, 2, 14),
];

const EID_AL_ADHA: &[(i32, u32, u32)] = &[
    (2015, 9, 24),
    (2016, 9, 12),
    (2017, 9, 1),
    (2018, 8, 21),
    (2019, 8, 11),
    (2020, 7, 31),
    (2021, 7, 20),
    (2022, 7, 9),
    (2023, 6, 28),
    (2024, 6, 16),
    (2025, 6, 6),
    (2026, 5, 27),
    (2027, 5, 16),
    (2028, 5, 5),
    (2029, 4, 24),
];

const ORDINALS: [&str; 4] = ["1st", "2nd", "3rd", "4th"];

impl TurkeyHolidays {
    fn fixed(year: i32, table: &mut HolidayTable) {
        let mut fixed = vec![
            (1, 1, "New Year's Day"),
            (4, 23, "National Sovereignty and Children's Day"),
            (5, 1, "Labour and Solidarity Day"),
            (5, 19, "Commemoration of Atatürk, Youth and Sports Day"),
            (8, 30, "Victory Day"),
            (10, 29, "Republic Day"),
        ];
        if year >= 2017 {
            fixed.push((7, 15, "Democracy and National Unity Day"));
        }
        for (month, day, name) in fixed {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                insert_holiday(table, date, name);
            }
        }
    }

    fn feast(
        year: i32,
        first_days: &[(i32, u32, u32)],
        name: &str,
        span: usize,
        table: &mut HolidayTable,
    ) {
        let Some(first) = first_days
            .iter()
            .find(|(y, _, _)| *y == year)
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(*y, *m, *d))
        else {
            return;
        };
        insert_holiday(table, first - Duration::days(1), &format!("{name} Eve"));
        for (offset, ordinal) in ORDINALS.iter().take(span).enumerate() {
            let date = first + Duration::days(offset as i64);
            insert_holiday(table, date, &format!("{name} ({ordinal} day)"));
        }
    }
}

impl HolidayProvider for TurkeyHolidays {
    fn country_code(&self) -> &str {
        "TR"
    }

    fn holidays(&self, years: RangeInclusive<i32>) -> HolidayTable {
        let mut table = HolidayTable::new();
        for year in years.clone() {
            Self::fixed(year, &mut table);
            Self::feast(year, EID_AL_FITR, "Eid al-Fitr", 3, &mut table);
            Self::feast(year, EID_AL_ADHA, "Eid al-Adha", 4, &mut table);
        }
        // Feast eves can fall into the previous year.
        table.retain(|date, _| years.contains(&date.year()));
        table
    }
}

fn insert_holiday(table: &mut HolidayTable, date: NaiveDate, name: &str) {
    table
        .entry(date)
        .and_modify(|names| {
            names.push_str("; ");
            names.push_str(name);
        })
        .or_insert_with(|| name.to_string());
}

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use demandsim_core::{CalendarDay, DateWindow, Season};

use crate::errors::GenerationError;
use crate::holidays::{HolidayProvider, HolidayTable};

/// Moving feasts detected from holiday names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feast {
    EidFitr,
    EidAdha,
}

impl Feast {
    /// Consecutive days flagged from the first day.
    pub fn span_days(self) -> i64 {
        match self {
            Feast::EidFitr => 3,
            Feast::EidAdha => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feast::EidFitr => "eid_fitr",
            Feast::EidAdha => "eid_adha",
        }
    }
}

/// Holiday-name keywords per feast, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct FeastKeywords {
    pub eid_fitr: Vec<String>,
    pub eid_adha: Vec<String>,
}

impl Default for FeastKeywords {
    fn default() -> Self {
        Self {
            eid_fitr: vec![
                "Ramazan Bayram".to_string(),
                "Şeker Bayram".to_string(),
                "Eid al-Fitr".to_string(),
            ],
            eid_adha: vec!["Kurban Bayram".to_string(), "Eid al-Adha".to_string()],
        }
    }
}

impl FeastKeywords {
    fn for_feast(&self, feast: Feast) -> &[String] {
        match feast {
            Feast::EidFitr => &self.eid_fitr,
            Feast::EidAdha => &self.eid_adha,
        }
    }
}

/// A year in range where a feast could not be found in the holiday table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFeast {
    pub year: i32,
    pub feast: Feast,
}

/// Contiguous daily calendar over the generation range.
#[derive(Debug, Clone)]
pub struct Calendar {
    range: DateWindow,
    days: Vec<CalendarDay>,
    missing_feasts: Vec<MissingFeast>,
}

impl Calendar {
    pub fn range(&self) -> DateWindow {
        self.range
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Position of a date in the day table.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if !self.range.contains(date) {
            return None;
        }
        usize::try_from((date - self.range.start).num_days()).ok()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.index_of(date).and_then(|idx| self.days.get(idx))
    }

    /// Years where feast and fasting flags were not set.
    pub fn missing_feasts(&self) -> &[MissingFeast] {
        &self.missing_feasts
    }
}

/// Builds the daily calendar from a holiday provider.
pub struct CalendarBuilder<'a> {
    provider: &'a dyn HolidayProvider,
    keywords: FeastKeywords,
}

impl<'a> CalendarBuilder<'a> {
    pub fn new(provider: &'a dyn HolidayProvider) -> Self {
        Self {
            provider,
            keywords: FeastKeywords::default(),
        }
    }

    pub fn with_keywords(mut self, keywords: FeastKeywords) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn build(&self, start: NaiveDate, end: NaiveDate) -> Result<Calendar, GenerationError> {
        if end < start {
            return Err(GenerationError::InvalidConfig(format!(
                "calendar end {end} precedes start {start}"
            )));
        }
        let range = DateWindow { start, end };
        let years = start.year()..=end.year();
        let table = self.provider.holidays(years.clone());

        let mut missing_feasts = Vec::new();
        let mut feast_windows: BTreeMap<Feast, Vec<DateWindow>> = BTreeMap::new();
        let mut fasting_windows = Vec::new();

        for feast in [Feast::EidFitr, Feast::EidAdha] {
            let first_days = find_feast_first_days(&table, self.keywords.for_feast(feast));
            for year in years.clone() {
                match first_days.get(&year) {
                    Some(first) => {
                        let window = DateWindow {
                            start: *first,
                            end: *first + Duration::days(feast.span_days() - 1),
                        };
                        feast_windows.entry(feast).or_default().push(window);
                        if feast == Feast::EidFitr {
                            fasting_windows.push(fasting_window(*first));
                        }
                    }
                    None => missing_feasts.push(MissingFeast { year, feast }),
                }
            }
        }

        let in_any = |windows: Option<&Vec<DateWindow>>, date: NaiveDate| {
            windows.is_some_and(|windows| windows.iter().any(|window| window.contains(date)))
        };

        let days = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| {
                let holiday = table.get(&date);
                let weekday = date.weekday().num_days_from_monday();
                CalendarDay {
                    date,
                    year: date.year(),
                    month: date.month(),
                    day: date.day(),
                    weekday,
                    is_weekend: weekday >= 5,
                    season: Season::from_month(date.month()),
                    is_official_holiday: holiday.is_some(),
                    holiday_names: holiday.cloned().unwrap_or_default(),
                    is_ramadan: fasting_windows.iter().any(|window| window.contains(date)),
                    is_eid_fitr: in_any(feast_windows.get(&Feast::EidFitr), date),
                    is_eid_adha: in_any(feast_windows.get(&Feast::EidAdha), date),
                    is_valentines: date.month() == 2 && date.day() == 14,
                    is_mothers_day: second_sunday(date.year(), 5) == Some(date),
                    is_teachers_day: date.month() == 11 && date.day() == 24,
                    is_ataturk_memorial: date.month() == 11 && date.day() == 10,
                    is_black_friday: last_weekday(date.year(), 11, Weekday::Fri) == Some(date),
                    is_back_to_school: is_back_to_school(date),
                }
            })
            .collect();

        Ok(Calendar {
            range,
            days,
            missing_feasts,
        })
    }
}

/// First feast day per year among holidays whose name matches a keyword.
///
/// Within a year an explicit day-one marker wins, then the earliest non-eve
/// entry, then the earliest match.
pub fn find_feast_first_days(table: &HolidayTable, keywords: &[String]) -> BTreeMap<i32, NaiveDate> {
    let keywords: Vec<String> = keywords.iter().map(|kw| kw.to_lowercase()).collect();
    let mut by_year: BTreeMap<i32, Vec<(NaiveDate, String)>> = BTreeMap::new();
    for (date, name) in table {
        let lowered = name.to_lowercase();
        if keywords.iter().any(|kw| lowered.contains(kw.as_str())) {
            by_year.entry(date.year()).or_default().push((*date, lowered));
        }
    }

    by_year
        .into_iter()
        .filter_map(|(year, matches)| {
            let day_one = matches
                .iter()
                .filter(|(_, name)| {
                    name.contains("1. gün") || (name.contains("1st") && name.contains("day"))
                })
                .map(|(date, _)| *date)
                .min();
            let non_eve = || {
                matches
                    .iter()
                    .filter(|(_, name)| !name.contains("arife") && !name.contains("eve"))
                    .map(|(date, _)| *date)
                    .min()
            };
            let earliest = || matches.iter().map(|(date, _)| *date).min();
            day_one
                .or_else(non_eve)
                .or_else(earliest)
                .map(|first| (year, first))
        })
        .collect()
}

/// Thirty days ending the day before the first day of Eid al-Fitr.
pub fn fasting_window(eid_first_day: NaiveDate) -> DateWindow {
    DateWindow {
        start: eid_first_day - Duration::days(30),
        end: eid_first_day - Duration::days(1),
    }
}

pub fn second_sunday(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let to_sunday = (7 - first.weekday().num_days_from_sunday()) % 7;
    Some(first + Duration::days(i64::from(to_sunday) + 7))
}

/// Last occurrence of `weekday` in a month, walking back from month end.
pub fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut date = next_month.pred_opt()?;
    while date.weekday() != weekday {
        date = date.pred_opt()?;
    }
    Some(date)
}

fn is_back_to_school(date: NaiveDate) -> bool {
    (date.month() == 8 && date.day() >= 30) || (date.month() == 9 && date.day() <= 15)
}

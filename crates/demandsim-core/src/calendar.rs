use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Meteorological season derived from fixed month triplets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Season for a calendar month (1-12).
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

/// Named calendar flags that can carry a demand multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CalendarEvent {
    Valentines,
    MothersDay,
    TeachersDay,
    BackToSchool,
    Ramadan,
    EidFitr,
    EidAdha,
    AtaturkMemorial,
    BlackFriday,
}

/// One row of the daily calendar table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Days since Monday (0 = Monday, 6 = Sunday).
    pub weekday: u32,
    pub is_weekend: bool,
    pub season: Season,
    pub is_official_holiday: bool,
    /// Official holiday name(s); empty when the day is not a holiday.
    pub holiday_names: String,
    pub is_ramadan: bool,
    pub is_eid_fitr: bool,
    pub is_eid_adha: bool,
    pub is_valentines: bool,
    pub is_mothers_day: bool,
    pub is_teachers_day: bool,
    pub is_ataturk_memorial: bool,
    pub is_black_friday: bool,
    pub is_back_to_school: bool,
}

impl CalendarDay {
    /// Events flagged on this day, in a stable order.
    pub fn events(&self) -> Vec<CalendarEvent> {
        let flags = [
            (self.is_valentines, CalendarEvent::Valentines),
            (self.is_mothers_day, CalendarEvent::MothersDay),
            (self.is_teachers_day, CalendarEvent::TeachersDay),
            (self.is_back_to_school, CalendarEvent::BackToSchool),
            (self.is_ramadan, CalendarEvent::Ramadan),
            (self.is_eid_fitr, CalendarEvent::EidFitr),
            (self.is_eid_adha, CalendarEvent::EidAdha),
            (self.is_ataturk_memorial, CalendarEvent::AtaturkMemorial),
            (self.is_black_friday, CalendarEvent::BlackFriday),
        ];
        flags
            .into_iter()
            .filter_map(|(set, event)| set.then_some(event))
            .collect()
    }

    /// True when the day carries an official holiday or any event flag.
    pub fn is_special(&self) -> bool {
        self.is_official_holiday || !self.events().is_empty()
    }
}

use chrono::NaiveDate;

use demandsim_core::Season;
use demandsim_generate::holidays::StaticHolidays;
use demandsim_generate::{CalendarBuilder, Feast, GenerationError, provider_for_country};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn turkish_january_2024() {
    let provider = provider_for_country("TR").expect("TR provider");
    let calendar = CalendarBuilder::new(provider.as_ref())
        .build(date(2024, 1, 1), date(2024, 1, 31))
        .expect("build calendar");

    assert_eq!(calendar.len(), 31);
    for day in calendar.days() {
        assert_eq!(day.season, Season::Winter, "{} should be winter", day.date);
        assert_eq!(day.is_weekend, day.weekday >= 5);
    }
    assert!(calendar.day(date(2024, 1, 6)).expect("saturday").is_weekend);
    assert!(calendar.day(date(2024, 1, 7)).expect("sunday").is_weekend);
    assert!(!calendar.day(date(2024, 1, 8)).expect("monday").is_weekend);

    let new_year = calendar.day(date(2024, 1, 1)).expect("new year");
    assert!(new_year.is_official_holiday);
    assert!(!new_year.holiday_names.is_empty());
    assert!(
        calendar
            .days()
            .iter()
            .skip(1)
            .all(|day| !day.is_official_holiday)
    );
}

#[test]
fn feast_and_fasting_flags_follow_holiday_table() {
    let provider = provider_for_country("tr").expect("lowercase code resolves");
    let calendar = CalendarBuilder::new(provider.as_ref())
        .build(date(2024, 1, 1), date(2024, 12, 31))
        .expect("build calendar");

    let flagged = |pick: fn(&demandsim_core::CalendarDay) -> bool| -> Vec<NaiveDate> {
        calendar
            .days()
            .iter()
            .filter(|day| pick(day))
            .map(|day| day.date)
            .collect()
    };

    assert_eq!(
        flagged(|day| day.is_eid_fitr),
        vec![date(2024, 4, 10), date(2024, 4, 11), date(2024, 4, 12)]
    );
    assert_eq!(flagged(|day| day.is_eid_adha).len(), 4);
    assert_eq!(flagged(|day| day.is_eid_adha)[0], date(2024, 6, 16));

    let ramadan = flagged(|day| day.is_ramadan);
    assert_eq!(ramadan.len(), 30);
    assert_eq!(ramadan.first(), Some(&date(2024, 3, 11)));
    assert_eq!(ramadan.last(), Some(&date(2024, 4, 9)));

    assert!(calendar.missing_feasts().is_empty());
    assert!(calendar.day(date(2024, 11, 29)).expect("black friday").is_black_friday);
    assert!(calendar.day(date(2024, 5, 12)).expect("mothers day").is_mothers_day);
}

#[test]
fn missing_feasts_degrade_flags() {
    let provider = StaticHolidays::new("XX").with_holiday(date(2024, 1, 1), "New Year's Day");
    let calendar = CalendarBuilder::new(&provider)
        .build(date(2024, 1, 1), date(2024, 12, 31))
        .expect("build calendar");

    let missing: Vec<Feast> = calendar
        .missing_feasts()
        .iter()
        .map(|missing| missing.feast)
        .collect();
    assert_eq!(missing, vec![Feast::EidFitr, Feast::EidAdha]);
    assert!(
        calendar
            .days()
            .iter()
            .all(|day| !day.is_ramadan && !day.is_eid_fitr && !day.is_eid_adha)
    );
}

#[test]
fn single_day_and_reversed_ranges() {
    let provider = provider_for_country("TR").expect("TR provider");
    let builder = CalendarBuilder::new(provider.as_ref());

    let single = builder
        .build(date(2024, 2, 14), date(2024, 2, 14))
        .expect("single day");
    assert_eq!(single.len(), 1);
    assert!(single.days()[0].is_valentines);

    let err = builder
        .build(date(2024, 2, 14), date(2024, 2, 13))
        .expect_err("reversed range");
    assert!(matches!(err, GenerationError::InvalidConfig(_)));
}

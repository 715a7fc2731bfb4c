use chrono::{NaiveTime, TimeDelta, TimeZone, Timelike};
use chrono_tz::{Europe::Paris, Tz};
use proptest::prelude::*;
use proptest_arbitrary_interop::arb;

use super::*;

fn paris(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
    Paris.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn new_year_morning() -> DateTime<Tz> {
    // Monday
    paris(2024, 1, 1, 8, 0)
}

fn parse(text: &str) -> Option<TimeMatch> {
    EnglishTimeParser.parse(text, new_year_morning())
}

#[test]
fn tomorrow_at_clock_time() {
    let text = "buy milk tomorrow at 9am";
    let result = parse(text).unwrap();

    assert_eq!(result.task_text(text), "buy milk");
    assert_eq!(result.time, paris(2024, 1, 2, 9, 0));
    assert_eq!(result.time.to_rfc3339(), "2024-01-02T09:00:00+01:00");
    assert_eq!(&text[result.start..result.end], "tomorrow at 9am");
}

#[test]
fn relative_offset_keeps_current_clock() {
    let text = "call mom in 3 hours";
    let result = parse(text).unwrap();

    assert_eq!(result.task_text(text), "call mom");
    assert_eq!(result.time, paris(2024, 1, 1, 11, 0));
}

#[test]
fn spelled_out_amounts_are_understood() {
    assert_eq!(parse("stretch in an hour").unwrap().time, paris(2024, 1, 1, 9, 0));
    assert_eq!(
        parse("tea in half an hour").unwrap().time,
        paris(2024, 1, 1, 8, 30)
    );
    assert_eq!(parse("water plants in two days").unwrap().time, paris(2024, 1, 3, 8, 0));
}

#[test]
fn yesterday_resolves_to_the_past() {
    let text = "walk the dog yesterday";
    let result = parse(text).unwrap();

    assert_eq!(result.task_text(text), "walk the dog");
    assert!(result.time < new_year_morning());
}

#[test]
fn past_offset_resolves_to_the_past() {
    let result = parse("feed the cat 2 hours ago").unwrap();

    assert_eq!(result.time, paris(2024, 1, 1, 6, 0));
}

#[test]
fn bare_weekday_naming_today_means_next_week() {
    let text = "call mom monday";
    let result = parse(text).unwrap();

    assert_eq!(result.task_text(text), "call mom");
    assert_eq!(result.time, paris(2024, 1, 8, 8, 0));
}

#[test]
fn weekday_naming_today_with_later_clock_stays_today() {
    assert_eq!(parse("gym monday at 6pm").unwrap().time, paris(2024, 1, 1, 18, 0));
}

#[test]
fn weekday_modifiers() {
    assert_eq!(
        parse("standup next monday at 10:30").unwrap().time,
        paris(2024, 1, 8, 10, 30)
    );
    assert_eq!(
        parse("dentist on friday at 2:15pm").unwrap().time,
        paris(2024, 1, 5, 14, 15)
    );
    assert_eq!(
        parse("retro this monday at 5pm").unwrap().time,
        paris(2024, 1, 1, 17, 0)
    );
}

#[test]
fn explicit_dates() {
    assert_eq!(
        parse("pay rent on March 3rd at noon").unwrap().time,
        paris(2024, 3, 3, 12, 0)
    );
    assert_eq!(
        parse("renew passport 15th of june 2025 at 9:00").unwrap().time,
        paris(2025, 6, 15, 9, 0)
    );
    assert_eq!(
        parse("taxes 2024-04-30 at 18:00").unwrap().time,
        // CEST
        Paris.with_ymd_and_hms(2024, 4, 30, 18, 0, 0).unwrap()
    );
}

#[test]
fn date_without_year_that_already_passed_rolls_to_next_year() {
    let now = paris(2024, 6, 1, 8, 0);
    let result = EnglishTimeParser.parse("party march 3 at 8pm", now).unwrap();

    assert_eq!(result.time.date_naive(), paris(2025, 3, 3, 0, 0).date_naive());
}

#[test]
fn tonight_defaults_to_late_evening() {
    assert_eq!(parse("take out trash tonight").unwrap().time, paris(2024, 1, 1, 23, 0));
}

#[test]
fn trailing_separator_is_stripped_from_task() {
    let text = "send invoice, tomorrow at 10am";
    let result = parse(text).unwrap();

    assert_eq!(result.task_text(text), "send invoice");
}

#[test]
fn phrase_at_the_start_leaves_empty_task() {
    let text = "tomorrow at 9am buy milk";
    let result = parse(text).unwrap();

    assert_eq!(result.start, 0);
    assert_eq!(result.task_text(text), "");
}

#[test]
fn text_without_time_phrase_does_not_match() {
    assert_eq!(parse("buy 2 bottles of milk"), None);
    assert_eq!(parse(""), None);
}

#[test]
fn only_first_phrase_is_used() {
    let text = "move car tomorrow at 8am then call bob on friday";
    let result = parse(text).unwrap();

    assert_eq!(result.task_text(text), "move car");
    assert_eq!(result.time, paris(2024, 1, 2, 8, 0));
}

#[test]
fn matching_is_case_insensitive() {
    assert_eq!(
        parse("Buy milk TOMORROW at 9AM").unwrap().time,
        paris(2024, 1, 2, 9, 0)
    );
}

#[test]
fn clock_time_skipped_by_dst_moves_forward() {
    let now = paris(2024, 3, 30, 12, 0);
    let result = EnglishTimeParser
        .parse("check clocks tomorrow at 2:30am", now)
        .unwrap();

    assert_eq!(result.time.hour(), 3);
    assert_eq!(result.time.minute(), 30);
}

proptest! {
    #[test]
    fn minutes_offset_is_added_to_now(minutes in 1i64..100_000) {
        let text = format!("ping in {minutes} minutes");
        let result = parse(&text).unwrap();

        prop_assert_eq!(result.time, new_year_morning() + TimeDelta::minutes(minutes));
        prop_assert_eq!(result.task_text(&text), "ping");
    }

    #[test]
    fn tomorrow_at_any_clock_time(time in arb::<NaiveTime>()) {
        let text = format!("stand up tomorrow at {}", time.format("%H:%M"));
        let result = parse(&text).unwrap();
        let expected = paris(2024, 1, 2, time.hour(), time.minute());

        prop_assert_eq!(result.time, expected);
        prop_assert_eq!(result.task_text(&text), "stand up");
    }

    #[test]
    fn resolved_time_has_no_subsecond_part(hours in 1i64..48) {
        let now = new_year_morning().with_nanosecond(123_456_789).unwrap();
        let result = EnglishTimeParser.parse(&format!("x in {hours} hours"), now).unwrap();

        prop_assert_eq!(result.time.nanosecond(), 0);
    }
}

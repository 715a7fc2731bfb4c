mod rules;

use std::cmp::Reverse;
use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Weekday,
};
use chrono_tz::Tz;
use regex::Regex;

use rules::{Fragment, FragmentMatch, WeekdayModifier};

/// Text allowed between two fragments of the same time phrase.
static CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\s,]*(?:(?:at|on|and)\b[\s,]*)?$").expect("Connector pattern is static.")
});

const TASK_SEPARATORS: &[char] = &[',', '-', ':', ';'];

/// A time phrase recognized inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMatch {
    pub time: DateTime<Tz>,
    pub start: usize,
    pub end: usize,
}

impl TimeMatch {
    /// Task text is whatever precedes the time phrase.
    pub fn task_text<'a>(&self, text: &'a str) -> &'a str {
        text[..self.start]
            .trim()
            .trim_end_matches(TASK_SEPARATORS)
            .trim_end()
    }
}

pub trait TimeExpressionParser: Send + Sync {
    fn parse(&self, text: &str, now: DateTime<Tz>) -> Option<TimeMatch>;
}

/// Rule based recognizer for English time phrases.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishTimeParser;

impl TimeExpressionParser for EnglishTimeParser {
    fn parse(&self, text: &str, now: DateTime<Tz>) -> Option<TimeMatch> {
        let phrase = first_phrase(text)?;
        let start = phrase.first()?.start;
        let end = phrase.last()?.end;
        let fragments: Vec<Fragment> = phrase.iter().map(|m| m.fragment).collect();
        let time = resolve(&fragments, now)?;

        Some(TimeMatch { time, start, end })
    }
}

fn first_phrase(text: &str) -> Option<Vec<FragmentMatch>> {
    let mut matches = rules::find_fragments(text);
    matches.sort_by_key(|m| (m.start, Reverse(m.end)));

    let mut fragments: Vec<FragmentMatch> = Vec::with_capacity(matches.len());
    for m in matches {
        if fragments.last().is_none_or(|last| m.start >= last.end) {
            fragments.push(m);
        }
    }

    let mut fragments = fragments.into_iter();
    let mut phrase = vec![fragments.next()?];
    for m in fragments {
        let previous_end = phrase.last().map(|p| p.end).unwrap_or(m.start);
        if !CONNECTOR.is_match(&text[previous_end..m.start]) {
            break;
        }
        phrase.push(m);
    }

    Some(phrase)
}

fn resolve(fragments: &[Fragment], now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut date: Option<NaiveDate> = None;
    let mut clock: Option<NaiveTime> = None;
    let mut default_clock: Option<NaiveTime> = None;
    let mut offset = TimeDelta::zero();
    let mut upcoming_today = false;

    for fragment in fragments {
        match *fragment {
            Fragment::Day {
                offset: days,
                default_time,
            } => {
                date = Some(today.checked_add_signed(TimeDelta::try_days(days)?)?);
                default_clock = default_time.or(default_clock);
                upcoming_today = false;
            }
            Fragment::Weekday { weekday, modifier } => {
                let resolved = resolve_weekday(today, weekday, modifier)?;
                upcoming_today = modifier == WeekdayModifier::Upcoming && resolved == today;
                date = Some(resolved);
            }
            Fragment::Date { month, day, year } => {
                date = Some(resolve_date(today, month, day, year)?);
                upcoming_today = false;
            }
            Fragment::Clock(time) => clock = Some(time),
            Fragment::Offset(delta) => offset = offset.checked_add(&delta)?,
        }
    }

    // Today's weekday without a clock time means the same day next week.
    if upcoming_today && clock.or(default_clock).is_none() {
        date = Some(today.checked_add_signed(TimeDelta::try_days(7)?)?);
    }

    let base = match (date, clock.or(default_clock)) {
        (None, None) => now,
        (date, time) => {
            let date = date.unwrap_or(today);
            let time = time.unwrap_or_else(|| now.time());
            localize(&tz, date.and_time(time))?
        }
    };

    let resolved = base.checked_add_signed(offset)?;
    Some(resolved.with_nanosecond(0).unwrap_or(resolved))
}

fn resolve_weekday(today: NaiveDate, weekday: Weekday, modifier: WeekdayModifier) -> Option<NaiveDate> {
    let current = i64::from(today.weekday().num_days_from_monday());
    let target = i64::from(weekday.num_days_from_monday());
    let ahead = (target - current).rem_euclid(7);

    let shift = match modifier {
        WeekdayModifier::Upcoming => ahead,
        WeekdayModifier::Next if ahead == 0 => 7,
        WeekdayModifier::Next => ahead,
        WeekdayModifier::Last => {
            let back = (current - target).rem_euclid(7);
            if back == 0 { -7 } else { -back }
        }
    };

    today.checked_add_signed(TimeDelta::try_days(shift)?)
}

fn resolve_date(today: NaiveDate, month: u32, day: u32, year: Option<i32>) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    match NaiveDate::from_ymd_opt(today.year(), month, day) {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

/// Local times skipped by a DST jump are moved forward by an hour.
fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

#[cfg(test)]
mod tests;

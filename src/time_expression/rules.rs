use std::sync::LazyLock;

use chrono::{NaiveTime, TimeDelta, Weekday};
use regex::{Captures, Regex};

const MONTH: &str = "(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)";
const AMOUNT: &str = r"(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)";
const UNIT: &str = r"(minutes?|mins?|hours?|hrs?|days?|weeks?)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WeekdayModifier {
    Upcoming,
    Next,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Fragment {
    Day {
        offset: i64,
        default_time: Option<NaiveTime>,
    },
    Weekday {
        weekday: Weekday,
        modifier: WeekdayModifier,
    },
    Date {
        month: u32,
        day: u32,
        year: Option<i32>,
    },
    Clock(NaiveTime),
    Offset(TimeDelta),
}

#[derive(Debug, Clone, Copy)]
pub(super) struct FragmentMatch {
    pub start: usize,
    pub end: usize,
    pub fragment: Fragment,
}

struct Rule {
    pattern: Regex,
    extract: fn(&Captures) -> Option<Fragment>,
}

impl Rule {
    fn new(pattern: &str, extract: fn(&Captures) -> Option<Fragment>) -> Self {
        let pattern = Regex::new(&format!("(?i){pattern}")).expect("Rule patterns are static.");
        Self { pattern, extract }
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(r"\b(today|tonight|tomorrow|tmrw|yesterday)\b", casual_day),
        Rule::new(
            r"\b(?:on\s+)?(?:(this|next|last)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            weekday,
        ),
        Rule::new(
            &format!(
                r"\b(?:on\s+)?(?:the\s+)?(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+of)?\s+{MONTH}\b(?:,?\s+(\d{{4}})\b)?"
            ),
            day_month,
        ),
        Rule::new(
            &format!(
                r"\b(?:on\s+)?{MONTH}\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
            ),
            month_day,
        ),
        Rule::new(r"\b(?:on\s+)?(\d{4})-(\d{2})-(\d{2})\b", iso_date),
        Rule::new(
            r"\b(?:at\s+)?(1[0-2]|0?[1-9])(?:[:.]([0-5]\d))?\s*(am|pm)\b",
            meridiem_clock,
        ),
        Rule::new(r"\b(?:at\s+)?([01]?\d|2[0-3]):([0-5]\d)\b", clock_24h),
        Rule::new(r"\bat\s+([01]?\d|2[0-3])\b", bare_hour),
        Rule::new(r"\b(?:at\s+)?(noon|midday|midnight)\b", named_time),
        Rule::new(r"\bin\s+half\s+an\s+hour\b", |_| {
            Some(Fragment::Offset(TimeDelta::minutes(30)))
        }),
        Rule::new(&format!(r"\b(?:in|within)\s+{AMOUNT}\s+{UNIT}\b"), |caps| {
            offset(caps).map(Fragment::Offset)
        }),
        Rule::new(&format!(r"\b{AMOUNT}\s+{UNIT}\s+ago\b"), |caps| {
            offset(caps).map(|delta| Fragment::Offset(-delta))
        }),
    ]
});

/// Every fragment any rule recognizes in `text`, possibly overlapping.
pub(super) fn find_fragments(text: &str) -> Vec<FragmentMatch> {
    RULES
        .iter()
        .flat_map(|rule| {
            rule.pattern.captures_iter(text).filter_map(|caps| {
                let whole = caps.get(0)?;
                (rule.extract)(&caps).map(|fragment| FragmentMatch {
                    start: whole.start(),
                    end: whole.end(),
                    fragment,
                })
            })
        })
        .collect()
}

fn casual_day(caps: &Captures) -> Option<Fragment> {
    let (offset, default_time) = match caps[1].to_lowercase().as_str() {
        "today" => (0, None),
        "tonight" => (0, NaiveTime::from_hms_opt(23, 0, 0)),
        "tomorrow" | "tmrw" => (1, None),
        "yesterday" => (-1, None),
        _ => return None,
    };

    Some(Fragment::Day {
        offset,
        default_time,
    })
}

fn weekday(caps: &Captures) -> Option<Fragment> {
    let modifier = match caps.get(1).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("next") => WeekdayModifier::Next,
        Some("last") => WeekdayModifier::Last,
        _ => WeekdayModifier::Upcoming,
    };
    let weekday = caps[2].parse::<Weekday>().ok()?;

    Some(Fragment::Weekday { weekday, modifier })
}

fn day_month(caps: &Captures) -> Option<Fragment> {
    Some(Fragment::Date {
        day: caps[1].parse().ok()?,
        month: month_number(&caps[2])?,
        year: year(caps.get(3)),
    })
}

fn month_day(caps: &Captures) -> Option<Fragment> {
    Some(Fragment::Date {
        month: month_number(&caps[1])?,
        day: caps[2].parse().ok()?,
        year: year(caps.get(3)),
    })
}

fn iso_date(caps: &Captures) -> Option<Fragment> {
    Some(Fragment::Date {
        year: Some(caps[1].parse().ok()?),
        month: caps[2].parse().ok()?,
        day: caps[3].parse().ok()?,
    })
}

fn meridiem_clock(caps: &Captures) -> Option<Fragment> {
    let hour: u32 = caps[1].parse().ok()?;
    let minute = minute(caps.get(2))?;
    let hour = match (hour, caps[3].to_lowercase().as_str()) {
        (12, "am") => 0,
        (12, _) => 12,
        (hour, "pm") => hour + 12,
        (hour, _) => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).map(Fragment::Clock)
}

fn clock_24h(caps: &Captures) -> Option<Fragment> {
    let hour = caps[1].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute(caps.get(2))?, 0).map(Fragment::Clock)
}

fn bare_hour(caps: &Captures) -> Option<Fragment> {
    NaiveTime::from_hms_opt(caps[1].parse().ok()?, 0, 0).map(Fragment::Clock)
}

fn named_time(caps: &Captures) -> Option<Fragment> {
    let hour = match caps[1].to_lowercase().as_str() {
        "midnight" => 0,
        _ => 12,
    };

    NaiveTime::from_hms_opt(hour, 0, 0).map(Fragment::Clock)
}

fn offset(caps: &Captures) -> Option<TimeDelta> {
    let amount = amount(&caps[1])?;
    let unit = caps[2].to_lowercase();

    if unit.starts_with('m') {
        TimeDelta::try_minutes(amount)
    } else if unit.starts_with('h') {
        TimeDelta::try_hours(amount)
    } else if unit.starts_with('d') {
        TimeDelta::try_days(amount)
    } else {
        TimeDelta::try_weeks(amount)
    }
}

fn amount(value: &str) -> Option<i64> {
    let value = value.to_lowercase();
    let amount = match value.as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => return digits.parse().ok(),
    };

    Some(amount)
}

fn minute(value: Option<regex::Match>) -> Option<u32> {
    value.map_or(Some(0), |m| m.as_str().parse().ok())
}

fn year(value: Option<regex::Match>) -> Option<i32> {
    value.and_then(|m| m.as_str().parse().ok())
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };

    Some(month)
}

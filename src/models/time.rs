//! Time and week primitives.
//!
//! Sessions recur weekly on a fixed weekday and clock range, over a subset
//! of the 13 teaching weeks of a semester. This module provides the parsed
//! forms of those fields and the overlap tests the constraint checker uses.
//!
//! # Overlap Semantics
//! Clock ranges are half-open `[start, end)`: a session ending at 12:00
//! does not clash with one starting at 12:00. Week sets overlap iff their
//! intersection is non-empty.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Number of teaching weeks in a semester.
pub const TEACHING_WEEKS: u8 = 13;

/// A malformed time range, week list, day, or slot token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    field: &'static str,
    input: String,
}

impl FormatError {
    pub fn new(field: &'static str, input: impl Into<String>) -> Self {
        Self {
            field,
            input: input.into(),
        }
    }

    /// Name of the field that failed to parse.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed {}: '{}'", self.field, self.input)
    }
}

impl std::error::Error for FormatError {}

/// Teaching weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Day {
    /// Upper-case wire token (`"MON"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Mon => "MON",
            Day::Tue => "TUE",
            Day::Wed => "WED",
            Day::Thu => "THU",
            Day::Fri => "FRI",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MON" => Ok(Day::Mon),
            "TUE" => Ok(Day::Tue),
            "WED" => Ok(Day::Wed),
            "THU" => Ok(Day::Thu),
            "FRI" => Ok(Day::Fri),
            _ => Err(FormatError::new("day", s)),
        }
    }
}

/// A clock range within one day, `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    start: u16,
    end: u16,
}

impl TimeRange {
    /// Creates a range from `(hour, minute)` pairs.
    pub fn new(start: (u8, u8), end: (u8, u8)) -> Self {
        Self {
            start: start.0 as u16 * 60 + start.1 as u16,
            end: end.0 as u16 * 60 + end.1 as u16,
        }
    }

    /// Parses `"HHMM-HHMM"`.
    ///
    /// Fails unless the input is exactly two 4-digit tokens joined by `-`
    /// with valid clock values.
    pub fn parse(s: &str) -> Result<Self, FormatError> {
        let err = || FormatError::new("time range", s);
        let (a, b) = s.trim().split_once('-').ok_or_else(err)?;
        let start = parse_clock(a).ok_or_else(err)?;
        let end = parse_clock(b).ok_or_else(err)?;
        Ok(Self::new(start, end))
    }

    /// Start minute since midnight.
    #[inline]
    pub fn start_minutes(&self) -> u16 {
        self.start
    }

    /// End minute since midnight.
    #[inline]
    pub fn end_minutes(&self) -> u16 {
        self.end
    }

    /// Start as `(hour, minute)`.
    pub fn start_hm(&self) -> (u8, u8) {
        ((self.start / 60) as u8, (self.start % 60) as u8)
    }

    /// End as `(hour, minute)`.
    pub fn end_hm(&self) -> (u8, u8) {
        ((self.end / 60) as u8, (self.end % 60) as u8)
    }

    /// Half-open overlap test.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Morning or afternoon, by start hour.
    pub fn half_day(&self) -> HalfDay {
        if self.start_hm().0 < 12 {
            HalfDay::Am
        } else {
            HalfDay::Pm
        }
    }
}

fn parse_clock(token: &str) -> Option<(u8, u8)> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u8 = token[..2].parse().ok()?;
    let minute: u8 = token[2..].parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sh, sm) = self.start_hm();
        let (eh, em) = self.end_hm();
        write!(f, "{sh:02}{sm:02}-{eh:02}{em:02}")
    }
}

impl FromStr for TimeRange {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeRange {
    type Error = FormatError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TimeRange> for String {
    fn from(t: TimeRange) -> Self {
        t.to_string()
    }
}

/// Odd/even classification of a week set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Odd,
    Even,
}

/// A set of teaching weeks (1..=13), stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekSet(u16);

impl WeekSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Weeks 1 through 13.
    pub fn full() -> Self {
        Self::range(1, TEACHING_WEEKS)
    }

    /// Weeks `from..=to`, clamped to the semester.
    pub fn range(from: u8, to: u8) -> Self {
        let mut set = Self::empty();
        for w in from.max(1)..=to.min(TEACHING_WEEKS) {
            set.0 |= 1 << w;
        }
        set
    }

    /// Builds a set from week numbers, rejecting weeks outside 1..=13.
    pub fn from_weeks<I: IntoIterator<Item = u8>>(weeks: I) -> Result<Self, FormatError> {
        let mut set = Self::empty();
        for w in weeks {
            if !(1..=TEACHING_WEEKS).contains(&w) {
                return Err(FormatError::new("teaching week", w.to_string()));
            }
            set.0 |= 1 << w;
        }
        Ok(set)
    }

    #[inline]
    pub fn contains(&self, week: u8) -> bool {
        week <= TEACHING_WEEKS && self.0 & (1 << week) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the two sets share a week.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Weeks in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=TEACHING_WEEKS).filter(move |w| self.contains(*w))
    }

    /// `Some(Odd)` if every week is odd, `Some(Even)` if every week is even.
    ///
    /// Mixed and empty sets have no parity and never pair.
    pub fn parity(&self) -> Option<Parity> {
        const ODD: u16 = 0b10_1010_1010_1010;
        const EVEN: u16 = 0b01_0101_0101_0100;
        if self.is_empty() {
            None
        } else if self.0 & !ODD == 0 {
            Some(Parity::Odd)
        } else if self.0 & !EVEN == 0 {
            Some(Parity::Even)
        } else {
            None
        }
    }
}

impl fmt::Display for WeekSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weeks: Vec<String> = self.iter().map(|w| w.to_string()).collect();
        f.write_str(&weeks.join(", "))
    }
}

impl TryFrom<Vec<u8>> for WeekSet {
    type Error = FormatError;

    fn try_from(weeks: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_weeks(weeks)
    }
}

impl From<WeekSet> for Vec<u8> {
    fn from(set: WeekSet) -> Self {
        set.iter().collect()
    }
}

/// Morning or afternoon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HalfDay {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

/// A day + AM/PM token a person has blacked out (`"MON-AM"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlackoutSlot {
    pub day: Day,
    pub half: HalfDay,
}

impl BlackoutSlot {
    pub fn new(day: Day, half: HalfDay) -> Self {
        Self { day, half }
    }

    /// Slot occupied by a session starting at `time` on `day`.
    pub fn of(day: Day, time: &TimeRange) -> Self {
        Self::new(day, time.half_day())
    }
}

impl fmt::Display for BlackoutSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let half = match self.half {
            HalfDay::Am => "AM",
            HalfDay::Pm => "PM",
        };
        write!(f, "{}-{}", self.day, half)
    }
}

impl FromStr for BlackoutSlot {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FormatError::new("blackout slot", s);
        let (day, half) = s.trim().split_once('-').ok_or_else(err)?;
        let day = day.parse::<Day>().map_err(|_| err())?;
        let half = match half.to_ascii_uppercase().as_str() {
            "AM" => HalfDay::Am,
            "PM" => HalfDay::Pm,
            _ => return Err(err()),
        };
        Ok(Self::new(day, half))
    }
}

impl TryFrom<String> for BlackoutSlot {
    type Error = FormatError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BlackoutSlot> for String {
    fn from(slot: BlackoutSlot) -> Self {
        slot.to_string()
    }
}

static WEEK_REMARK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:teaching\s*)?wk?([\d,-]+)").expect("week remark pattern is valid")
});

static BARE_WEEKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[\d,\s-]*$").expect("week list pattern is valid"));

/// Parses a free-text timetable remark such as `"Teaching Wk2-13"` or
/// `"wk1,3,5"` into a week set.
///
/// A blank remark, or one without a week list, means every teaching week.
pub fn parse_teaching_weeks(remark: &str) -> Result<WeekSet, FormatError> {
    let lower = remark.trim().to_lowercase();
    if lower.is_empty() {
        return Ok(WeekSet::full());
    }
    // The `wk` marker wins; a bare list only counts as the whole remark.
    let list = match WEEK_REMARK.captures(&lower).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None if BARE_WEEKS.is_match(&lower) => lower.split_whitespace().collect(),
        None => return Ok(WeekSet::full()),
    };

    let err = || FormatError::new("teaching weeks", remark);
    let mut weeks = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        match part.split_once('-') {
            Some((a, b)) => {
                let from: u8 = a.trim().parse().map_err(|_| err())?;
                let to: u8 = b.trim().parse().map_err(|_| err())?;
                if from > to {
                    return Err(err());
                }
                weeks.extend(from..=to);
            }
            None => weeks.push(part.parse().map_err(|_| err())?),
        }
    }
    WeekSet::from_weeks(weeks).map_err(|_| err())
}

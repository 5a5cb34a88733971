use std::fmt;
use std::str::FromStr;

use jiff::Zoned;
use thiserror::Error;

/// Offset into a schedule's period, counted in ideal microseconds.
///
/// Daily offsets are measured from midnight, yearly offsets from an idealized
/// Jan-1 00:00 in which every month is exactly 30 days. Arithmetic is plain
/// integer math; calendar fields only enter through the normalization
/// functions below and leave through [`month_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdealTime(i64);

impl IdealTime {
    pub const ZERO: IdealTime = IdealTime(0);
    pub const MICROSECOND: IdealTime = IdealTime(1);
    pub const SECOND: IdealTime = IdealTime(1_000_000);
    pub const MINUTE: IdealTime = IdealTime(60 * Self::SECOND.0);
    pub const HOUR: IdealTime = IdealTime(60 * Self::MINUTE.0);
    pub const DAY: IdealTime = IdealTime(24 * Self::HOUR.0);
    pub const WEEK: IdealTime = IdealTime(7 * Self::DAY.0);
    /// Layout month used by yearly schedules. Not a calendar month.
    pub const MONTH: IdealTime = IdealTime(30 * Self::DAY.0);
    pub const YEAR: IdealTime = IdealTime(12 * Self::MONTH.0);

    pub fn raw(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn add(self, other: IdealTime) -> IdealTime {
        IdealTime(self.0 + other.0)
    }

    #[must_use]
    pub fn subtract(self, other: IdealTime) -> IdealTime {
        IdealTime(self.0 - other.0)
    }

    #[must_use]
    pub fn times(self, n: i64) -> IdealTime {
        IdealTime(self.0 * n)
    }
}

/// Time-of-day offset for a daily schedule; the date side of `now` is
/// discarded.
pub fn daily_offset(now: &Zoned) -> IdealTime {
    IdealTime::HOUR
        .times(now.hour() as i64)
        .add(IdealTime::MINUTE.times(now.minute() as i64))
}

/// Offset into the idealized 360-day year. Month and day-of-month are both
/// zero-based so the offset of a day agrees with the bootstrap grid.
pub fn yearly_offset(now: &Zoned) -> IdealTime {
    IdealTime::MONTH
        .times(now.month() as i64 - 1)
        .add(IdealTime::DAY.times(now.day() as i64 - 1))
        .add(IdealTime::HOUR.times(now.hour() as i64))
        .add(IdealTime::MINUTE.times(now.minute() as i64))
}

/// Split a yearly offset back into its `(month, day)` grid coordinates,
/// both zero-based. Offsets past Dec wrap back into the year.
pub fn month_day(offset: IdealTime) -> (i64, i64) {
    let days = offset.0.div_euclid(IdealTime::DAY.0);
    let day = days.rem_euclid(30);
    let month = days.div_euclid(30).rem_euclid(12);
    (month, day)
}

#[derive(Debug, Error)]
#[error("invalid time offset '{0}'")]
pub struct ParseOffsetError(String);

/// Offsets serialize as `D.HH:MM:SS.UUUUUU`: whole schedule days, then time
/// of day. Daily schedules always write day 0; yearly schedules count up to
/// day 359.
impl fmt::Display for IdealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, total) = if self.0 < 0 { ("-", -self.0) } else { ("", self.0) };
        let days = total / Self::DAY.0;
        let rem = total % Self::DAY.0;
        let hours = rem / Self::HOUR.0;
        let rem = rem % Self::HOUR.0;
        let minutes = rem / Self::MINUTE.0;
        let rem = rem % Self::MINUTE.0;
        let seconds = rem / Self::SECOND.0;
        let micros = rem % Self::SECOND.0;
        write!(
            f,
            "{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
        )
    }
}

impl FromStr for IdealTime {
    type Err = ParseOffsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseOffsetError(s.to_string());

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (days, clock) = body.split_once('.').ok_or_else(err)?;
        let days: i64 = days.parse().map_err(|_| err())?;

        let (hms, micros) = match clock.split_once('.') {
            Some((hms, micros)) => (hms, micros),
            None => (clock, "0"),
        };
        let micros: i64 = micros.parse().map_err(|_| err())?;

        let mut fields = hms.splitn(3, ':');
        let mut next = || -> Result<i64, ParseOffsetError> {
            fields.next().ok_or_else(err)?.parse().map_err(|_| err())
        };
        let hours = next()?;
        let minutes = next()?;
        let seconds = next()?;

        let total = days * Self::DAY.0
            + hours * Self::HOUR.0
            + minutes * Self::MINUTE.0
            + seconds * Self::SECOND.0
            + micros;
        Ok(IdealTime(if negative { -total } else { total }))
    }
}

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

/// A day with no time component, written `yyyy-MM-dd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(Date);

impl CalendarDate {
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn year_month(self) -> YearMonth {
        YearMonth {
            year: self.0.year(),
            month: self.0.month(),
        }
    }

    pub fn day(self) -> u8 {
        self.0.day()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for CalendarDate {
    type Err = CalendarError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| CalendarError::InvalidDate(value.to_string()))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DateVisitor;

        impl Visitor<'_> for DateVisitor {
            type Value = CalendarDate;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a yyyy-MM-dd date")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(DateVisitor)
    }
}

/// The `yyyy-MM` scope used by reporting, grids and month-wide deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    pub fn new(year: i32, month: u8) -> Result<Self, CalendarError> {
        let month = Month::try_from(month)
            .map_err(|_| CalendarError::InvalidMonth(format!("{year:04}-{month:02}")))?;
        Ok(Self { year, month })
    }

    pub fn current() -> Self {
        CalendarDate::today().year_month()
    }

    pub fn days_in_month(self) -> u8 {
        self.month.length(self.year)
    }

    pub fn days(self) -> impl Iterator<Item = u8> {
        1..=self.days_in_month()
    }

    pub fn date(self, day: u8) -> Result<CalendarDate, CalendarError> {
        Date::from_calendar_date(self.year, self.month, day)
            .map(CalendarDate)
            .map_err(|_| CalendarError::DayOutOfRange { month: self, day })
    }

    pub fn first_day(self) -> CalendarDate {
        self.bounded_date(1)
    }

    pub fn last_day(self) -> CalendarDate {
        self.bounded_date(self.days_in_month())
    }

    pub fn previous(self) -> Self {
        match self.month {
            Month::January => Self {
                year: self.year - 1,
                month: Month::December,
            },
            month => Self {
                year: self.year,
                month: month.previous(),
            },
        }
    }

    pub fn next(self) -> Self {
        match self.month {
            Month::December => Self {
                year: self.year + 1,
                month: Month::January,
            },
            month => Self {
                year: self.year,
                month: month.next(),
            },
        }
    }

    fn bounded_date(self, day: u8) -> CalendarDate {
        self.date(day)
            .expect("day within 1..=days_in_month should always form a valid date")
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for YearMonth {
    type Err = CalendarError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidMonth(value.to_string());
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u8>().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    InvalidDate(String),
    InvalidMonth(String),
    DayOutOfRange { month: YearMonth, day: u8 },
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::InvalidDate(value) => {
                write!(f, "invalid date '{}', expected yyyy-MM-dd", value)
            }
            CalendarError::InvalidMonth(value) => {
                write!(f, "invalid month '{}', expected yyyy-MM", value)
            }
            CalendarError::DayOutOfRange { month, day } => {
                write!(f, "day {} is outside {}", day, month)
            }
        }
    }
}

impl Error for CalendarError {}

#[cfg(test)]
mod tests {
    use super::{CalendarDate, CalendarError, YearMonth};

    #[test]
    fn dates_round_trip_through_text() {
        let date: CalendarDate = "2024-02-26".parse().expect("date should parse");
        assert_eq!(date.to_string(), "2024-02-26");
        assert_eq!(date.day(), 26);
        assert_eq!(date.year_month().to_string(), "2024-02");
        assert!("2024-02-30".parse::<CalendarDate>().is_err());
        assert!("26/02/2024".parse::<CalendarDate>().is_err());
    }

    #[test]
    fn months_know_their_length_including_leap_years() {
        let feb_2024: YearMonth = "2024-02".parse().expect("month should parse");
        assert_eq!(feb_2024.days_in_month(), 29);
        assert_eq!(feb_2024.days().count(), 29);
        assert_eq!(feb_2024.last_day().to_string(), "2024-02-29");
        assert_eq!(feb_2024.first_day().to_string(), "2024-02-01");

        let feb_2023 = YearMonth::new(2023, 2).expect("valid month");
        assert_eq!(feb_2023.days_in_month(), 28);
    }

    #[test]
    fn navigation_wraps_year_boundaries() {
        let january = YearMonth::new(2024, 1).expect("valid month");
        assert_eq!(january.previous().to_string(), "2023-12");
        assert_eq!(january.previous().next(), january);
        let december = YearMonth::new(2024, 12).expect("valid month");
        assert_eq!(december.next().to_string(), "2025-01");
    }

    #[test]
    fn rejects_malformed_months_and_days() {
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-2".parse::<YearMonth>().is_err());
        assert!("202402".parse::<YearMonth>().is_err());

        let april = YearMonth::new(2024, 4).expect("valid month");
        assert!(matches!(
            april.date(31),
            Err(CalendarError::DayOutOfRange { day: 31, .. })
        ));
        assert_eq!(april.date(30).expect("valid day").to_string(), "2024-04-30");
    }

    #[test]
    fn dates_know_their_month() {
        let feb: YearMonth = "2024-02".parse().expect("month should parse");
        let in_month: CalendarDate = "2024-02-29".parse().expect("date");
        let next_month: CalendarDate = "2024-03-01".parse().expect("date");
        let other_year: CalendarDate = "2023-02-10".parse().expect("date");
        assert_eq!(in_month.year_month(), feb);
        assert_ne!(next_month.year_month(), feb);
        assert_ne!(other_year.year_month(), feb);
    }
}

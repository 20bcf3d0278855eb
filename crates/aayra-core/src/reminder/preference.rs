//! User reminder preferences: which weekdays to study and when.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A day of the week, serialized by its English name (`"Monday"`).
///
/// Ordered Sunday-first to match the week boundaries used by the stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StudyDay {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl StudyDay {
    pub const ALL: [StudyDay; 7] = [
        StudyDay::Sunday,
        StudyDay::Monday,
        StudyDay::Tuesday,
        StudyDay::Wednesday,
        StudyDay::Thursday,
        StudyDay::Friday,
        StudyDay::Saturday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StudyDay::Sunday => "Sunday",
            StudyDay::Monday => "Monday",
            StudyDay::Tuesday => "Tuesday",
            StudyDay::Wednesday => "Wednesday",
            StudyDay::Thursday => "Thursday",
            StudyDay::Friday => "Friday",
            StudyDay::Saturday => "Saturday",
        }
    }

    pub fn to_weekday(self) -> Weekday {
        match self {
            StudyDay::Sunday => Weekday::Sun,
            StudyDay::Monday => Weekday::Mon,
            StudyDay::Tuesday => Weekday::Tue,
            StudyDay::Wednesday => Weekday::Wed,
            StudyDay::Thursday => Weekday::Thu,
            StudyDay::Friday => Weekday::Fri,
            StudyDay::Saturday => Weekday::Sat,
        }
    }
}

impl From<Weekday> for StudyDay {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Sun => StudyDay::Sunday,
            Weekday::Mon => StudyDay::Monday,
            Weekday::Tue => StudyDay::Tuesday,
            Weekday::Wed => StudyDay::Wednesday,
            Weekday::Thu => StudyDay::Thursday,
            Weekday::Fri => StudyDay::Friday,
            Weekday::Sat => StudyDay::Saturday,
        }
    }
}

impl fmt::Display for StudyDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StudyDay {
    type Err = ValidationError;

    /// Accepts full names and three-letter abbreviations, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        StudyDay::ALL
            .into_iter()
            .find(|day| {
                let name = day.name().to_ascii_lowercase();
                name == needle || name[..3] == needle
            })
            .ok_or_else(|| ValidationError::UnknownWeekday(s.to_string()))
    }
}

/// Parse `"HH:MM"` (seconds optional) into a time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTimeOfDay(s.to_string()))
}

mod hh_mm {
    use super::*;

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Weekdays plus a start time. Owned by the user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPreference {
    pub weekdays: BTreeSet<StudyDay>,
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
}

impl ReminderPreference {
    pub fn new(weekdays: impl IntoIterator<Item = StudyDay>, start_time: NaiveTime) -> Self {
        Self {
            weekdays: weekdays.into_iter().collect(),
            start_time,
        }
    }

    /// Build from the raw strings stored on the user profile.
    pub fn parse<S: AsRef<str>>(weekdays: &[S], start_time: &str) -> Result<Self, ValidationError> {
        let days = weekdays
            .iter()
            .map(|d| d.as_ref().parse::<StudyDay>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            weekdays: days,
            start_time: parse_time_of_day(start_time)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.weekdays.is_empty()
    }

    pub fn includes(&self, day: Weekday) -> bool {
        self.weekdays.contains(&StudyDay::from(day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_names_parse_case_insensitively() {
        assert_eq!("monday".parse::<StudyDay>().unwrap(), StudyDay::Monday);
        assert_eq!("Sat".parse::<StudyDay>().unwrap(), StudyDay::Saturday);
        assert!("Funday".parse::<StudyDay>().is_err());
    }

    #[test]
    fn preference_serializes_like_the_profile_columns() {
        let pref = ReminderPreference::parse(&["Wednesday", "Monday"], "18:30").unwrap();
        let json = serde_json::to_value(&pref).unwrap();
        assert_eq!(json["weekdays"], serde_json::json!(["Monday", "Wednesday"]));
        assert_eq!(json["start_time"], "18:30");
        let back: ReminderPreference = serde_json::from_value(json).unwrap();
        assert_eq!(back, pref);
    }

    #[test]
    fn time_accepts_seconds_from_the_database() {
        let t = parse_time_of_day("07:05:00").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert!(parse_time_of_day("7pm").is_err());
    }

    #[test]
    fn includes_maps_chrono_weekdays() {
        let pref = ReminderPreference::new([StudyDay::Friday], NaiveTime::MIN);
        assert!(pref.includes(Weekday::Fri));
        assert!(!pref.includes(Weekday::Thu));
    }
}

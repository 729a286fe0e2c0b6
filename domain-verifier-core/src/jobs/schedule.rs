//! When a periodic job fires.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Firing rule of a [`PeriodicJob`](super::PeriodicJob).
///
/// Textual form (used in configuration files):
/// - `"every 5m"`: fixed delay between the end of one tick and the next
/// - `"daily 00:00"`: once a day at the given UTC time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobSchedule {
    Every(Duration),
    DailyAt(NaiveTime),
}

impl JobSchedule {
    /// Every 5 minutes
    pub const DEFAULT_VERIFIER: Self = Self::Every(Duration::from_secs(300));
    /// Daily at midnight UTC
    pub const DEFAULT_RESCHEDULER: Self = Self::DailyAt(NaiveTime::MIN);

    /// Time to wait from `now` until the next firing.
    #[must_use]
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Every(interval) => *interval,
            Self::DailyAt(time) => {
                let today = now.date_naive().and_time(*time).and_utc();
                let next = if today > now {
                    today
                } else {
                    today + chrono::Duration::days(1)
                };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}

impl fmt::Display for JobSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Every(interval) => write!(f, "every {}", humantime::format_duration(*interval)),
            Self::DailyAt(time) => write!(f, "daily {}", time.format("%H:%M")),
        }
    }
}

impl FromStr for JobSchedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, arg) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let arg = arg.trim();

        match kind {
            "every" => {
                let interval = humantime::parse_duration(arg)
                    .map_err(|e| format!("invalid schedule '{s}': {e}"))?;
                if interval.is_zero() {
                    return Err(format!("invalid schedule '{s}': interval must be positive"));
                }
                Ok(Self::Every(interval))
            }
            "daily" if arg.is_empty() => Ok(Self::DailyAt(NaiveTime::MIN)),
            "daily" => NaiveTime::parse_from_str(arg, "%H:%M")
                .map(Self::DailyAt)
                .map_err(|e| format!("invalid schedule '{s}': {e}")),
            _ => Err(format!(
                "invalid schedule '{s}': expected 'every <duration>' or 'daily <HH:MM>'"
            )),
        }
    }
}

impl TryFrom<String> for JobSchedule {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobSchedule> for String {
    fn from(value: JobSchedule) -> Self {
        value.to_string()
    }
}

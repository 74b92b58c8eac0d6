//! Market calendar and watch-loop scheduling.
//!
//! Every decision is a function of a local wall-clock time passed in by
//! the caller, so the loop itself only sleeps and asks "what is due now?".

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tide_core::error::ScanError;

/// Schedule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Exchange offset from UTC, in minutes (IST is 330)
    pub utc_offset_minutes: i32,
    /// Exchange holidays, "YYYY-MM-DD"
    pub holidays: Vec<NaiveDate>,
    /// Local time of the daily crossover scan, "HH:MM"
    pub daily_scan_time: String,
    /// First intraday check, "HH:MM"
    pub intraday_start: String,
    /// Last intraday check, "HH:MM"
    pub intraday_end: String,
    pub intraday_interval_minutes: u32,
    /// Symbol of the index checked intraday
    pub index_symbol: String,
    /// Sleep between polls on a trading day
    pub poll_seconds: u64,
    /// Sleep between polls when the market is closed for the day
    pub closed_sleep_seconds: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 330,
            holidays: Vec::new(),
            daily_scan_time: "15:00".to_string(),
            intraday_start: "09:30".to_string(),
            intraday_end: "15:15".to_string(),
            intraday_interval_minutes: 15,
            index_symbol: "^NSEI".to_string(),
            poll_seconds: 60,
            closed_sleep_seconds: 1800,
        }
    }
}

impl ScheduleSettings {
    pub fn validate(&self) -> Result<(), ScanError> {
        MarketSchedule::from_settings(self).map(|_| ())
    }
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, ScanError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| ScanError::Config(format!("{} '{}': {}", field, value, e)))
}

/// Trading days of one exchange.
#[derive(Debug, Clone)]
pub struct MarketCalendar {
    offset: FixedOffset,
    holidays: BTreeSet<NaiveDate>,
}

impl MarketCalendar {
    pub fn new(utc_offset_minutes: i32, holidays: &[NaiveDate]) -> Result<Self, ScanError> {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            ScanError::Config(format!("utc_offset_minutes {} out of range", utc_offset_minutes))
        })?;
        Ok(Self {
            offset,
            holidays: holidays.iter().copied().collect(),
        })
    }

    /// Exchange-local time of `instant`.
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    pub fn local_now(&self) -> NaiveDateTime {
        self.to_local(Utc::now())
    }

    /// Weekday that is not a listed holiday.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

/// Work the watch loop should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    IntradayCheck,
    DailyScan,
}

/// Decides when the intraday check and the daily scan run.
///
/// The intraday check runs once per slot (window start plus a multiple of
/// the interval, up to the window end). The daily scan runs once per
/// trading day, at the first poll on or after its time.
#[derive(Debug, Clone)]
pub struct MarketSchedule {
    calendar: MarketCalendar,
    daily_scan: NaiveTime,
    window_start: NaiveTime,
    window_end: NaiveTime,
    interval_minutes: i64,
    poll: Duration,
    closed_sleep: Duration,
    last_slot: Option<NaiveDateTime>,
    last_daily: Option<NaiveDate>,
}

impl MarketSchedule {
    pub fn from_settings(settings: &ScheduleSettings) -> Result<Self, ScanError> {
        let calendar = MarketCalendar::new(settings.utc_offset_minutes, &settings.holidays)?;
        let daily_scan = parse_hhmm("daily_scan_time", &settings.daily_scan_time)?;
        let window_start = parse_hhmm("intraday_start", &settings.intraday_start)?;
        let window_end = parse_hhmm("intraday_end", &settings.intraday_end)?;

        if window_start >= window_end {
            return Err(ScanError::Config(
                "intraday_start must be before intraday_end".into(),
            ));
        }
        if settings.intraday_interval_minutes == 0 {
            return Err(ScanError::Config(
                "intraday_interval_minutes must be positive".into(),
            ));
        }
        if settings.poll_seconds == 0 || settings.closed_sleep_seconds == 0 {
            return Err(ScanError::Config("sleep intervals must be positive".into()));
        }

        Ok(Self {
            calendar,
            daily_scan,
            window_start,
            window_end,
            interval_minutes: i64::from(settings.intraday_interval_minutes),
            poll: Duration::from_secs(settings.poll_seconds),
            closed_sleep: Duration::from_secs(settings.closed_sleep_seconds),
            last_slot: None,
            last_daily: None,
        })
    }

    pub fn calendar(&self) -> &MarketCalendar {
        &self.calendar
    }

    /// Start of the intraday slot containing `now`, if inside the window.
    fn intraday_slot(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let time = now.time();
        if time < self.window_start || time > self.window_end {
            return None;
        }
        let elapsed = (time - self.window_start).num_minutes();
        let offset = chrono::Duration::minutes(elapsed - elapsed % self.interval_minutes);
        Some(now.date().and_time(self.window_start) + offset)
    }

    /// Tasks due at `now`, marking them done.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<ScheduledTask> {
        let date = now.date();
        if !self.calendar.is_trading_day(date) {
            return Vec::new();
        }

        let mut tasks = Vec::new();

        if let Some(slot) = self.intraday_slot(now) {
            if self.last_slot != Some(slot) {
                self.last_slot = Some(slot);
                tasks.push(ScheduledTask::IntradayCheck);
            }
        }

        if now.time() >= self.daily_scan && self.last_daily != Some(date) {
            self.last_daily = Some(date);
            tasks.push(ScheduledTask::DailyScan);
        }

        tasks
    }

    /// How long to sleep before the next poll.
    pub fn sleep_for(&self, now: NaiveDateTime) -> Duration {
        if self.calendar.is_trading_day(now.date()) {
            self.poll
        } else {
            self.closed_sleep
        }
    }
}

//! Timers for background jobs.

use std::future::Future;

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, macros::time};

use crate::{Error, timezone::get_local_offset};

/// Decides how long to wait before the next run of a job.
pub trait Schedule: Send {
    /// The time to sleep from `now` until the job should run next.
    fn duration_until_next(&mut self, now: OffsetDateTime) -> std::time::Duration;
}

/// Runs on a fixed day of every month at a local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySchedule {
    day: u8,
    time: Time,
    timezone: String,
}

impl MonthlySchedule {
    /// Create a schedule that fires on `day` of each month at `hour:minute`
    /// in `timezone`.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `day` is not between 1 and 28 or the
    /// time of day is not valid.
    pub fn new(day: u8, hour: u8, minute: u8, timezone: &str) -> Result<Self, Error> {
        if !(1..=28).contains(&day) {
            return Err(Error::Validation(format!(
                "day of month must be between 1 and 28, got {day}"
            )));
        }

        let time = Time::from_hms(hour, minute, 0)
            .map_err(|error| Error::Validation(format!("invalid time of day: {error}")))?;

        Ok(Self {
            day,
            time,
            timezone: timezone.to_owned(),
        })
    }

    /// The schedule for monthly receipts: the first of the month at 00:01.
    pub fn receipts(timezone: &str) -> Self {
        Self {
            day: 1,
            time: time!(00:01),
            timezone: timezone.to_owned(),
        }
    }

    /// The first scheduled run strictly after `now`.
    pub fn next_run_after(&self, now: OffsetDateTime) -> OffsetDateTime {
        let offset = get_local_offset(&self.timezone).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown timezone \"{}\", scheduling in UTC instead",
                self.timezone
            );
            UtcOffset::UTC
        });
        let local_now = now.to_offset(offset);

        let (mut year, mut month) = (local_now.year(), local_now.month());

        loop {
            match self.run_in(year, month, offset) {
                Some(candidate) if candidate > local_now => return candidate,
                _ => {}
            }

            if month == Month::December {
                year += 1;
            }
            month = month.next();
        }
    }

    fn run_in(&self, year: i32, month: Month, offset: UtcOffset) -> Option<OffsetDateTime> {
        let date = Date::from_calendar_date(year, month, self.day).ok()?;

        Some(PrimitiveDateTime::new(date, self.time).assume_offset(offset))
    }
}

impl Schedule for MonthlySchedule {
    fn duration_until_next(&mut self, now: OffsetDateTime) -> std::time::Duration {
        let wait = self.next_run_after(now) - now;

        wait.try_into().unwrap_or_default()
    }
}

/// Runs every `interval`, starting straight away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSchedule {
    interval: std::time::Duration,
    started: bool,
}

impl IntervalSchedule {
    /// A schedule that fires now and then after every `interval`.
    pub fn new(interval: std::time::Duration) -> Self {
        Self {
            interval,
            started: false,
        }
    }
}

impl Schedule for IntervalSchedule {
    fn duration_until_next(&mut self, _now: OffsetDateTime) -> std::time::Duration {
        if self.started {
            self.interval
        } else {
            self.started = true;
            std::time::Duration::ZERO
        }
    }
}

/// Run `job` forever according to `schedule`.
///
/// The result of each run is logged. A failed run does not stop the loop.
pub async fn run_on_schedule<F, Fut, T>(mut schedule: Box<dyn Schedule>, name: &str, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    T: std::fmt::Debug,
{
    loop {
        let wait = schedule.duration_until_next(OffsetDateTime::now_utc());
        tracing::debug!("Next run of {name} in {wait:?}");
        tokio::time::sleep(wait).await;

        match job().await {
            Ok(outcome) => tracing::info!("{name} finished: {outcome:?}"),
            Err(error) => tracing::error!("{name} failed: {error}"),
        }
    }
}

//! Reminder policy translation
//!
//! Turns the human-facing timing policies into backend triggers and
//! computes when a trigger fires next.

use crate::config::{
    HOURLY_INTERVAL_SECS, IMMEDIATE_DELAY_SECS, WINDOW_END_HOUR, WINDOW_INTERVAL_SECS,
    WINDOW_START_HOUR,
};
use crate::error::{AppError, Result};
use crate::models::{ScheduleKind, TimeOfDay, Trigger};
use chrono::{DateTime, Days, Duration, Local, TimeZone};

impl ScheduleKind {
    /// Test notification after the short fixed delay
    pub fn immediate() -> Self {
        ScheduleKind::Immediate {
            delay_seconds: IMMEDIATE_DELAY_SECS,
        }
    }

    /// Reminder every hour, around the clock
    pub fn hourly() -> Self {
        ScheduleKind::RecurringInterval {
            interval_seconds: HOURLY_INTERVAL_SECS,
        }
    }

    /// Reminder every two hours between 08:00 and 22:00
    pub fn every_two_hours() -> Self {
        ScheduleKind::WindowedRecurring {
            interval_seconds: WINDOW_INTERVAL_SECS,
            start_hour: WINDOW_START_HOUR,
            end_hour: WINDOW_END_HOUR,
        }
    }

    /// Backend triggers implementing this policy, one per backend request
    pub fn triggers(&self) -> Result<Vec<Trigger>> {
        match *self {
            ScheduleKind::Immediate { delay_seconds } => {
                if delay_seconds == 0 {
                    return Err(AppError::InvalidInterval(delay_seconds));
                }
                Ok(vec![Trigger::TimeInterval {
                    seconds: delay_seconds,
                    repeats: false,
                }])
            }
            ScheduleKind::DailyAt { hour, minute } => {
                let time = TimeOfDay::new(hour, minute)?;
                Ok(vec![daily(time)])
            }
            ScheduleKind::RecurringInterval { interval_seconds } => {
                if interval_seconds == 0 {
                    return Err(AppError::InvalidInterval(interval_seconds));
                }
                Ok(vec![Trigger::TimeInterval {
                    seconds: interval_seconds,
                    repeats: true,
                }])
            }
            ScheduleKind::WindowedRecurring {
                interval_seconds,
                start_hour,
                end_hour,
            } => Ok(window_fire_times(interval_seconds, start_hour, end_hour)?
                .into_iter()
                .map(daily)
                .collect()),
        }
    }
}

fn daily(time: TimeOfDay) -> Trigger {
    Trigger::Daily {
        hour: time.hour(),
        minute: time.minute(),
    }
}

/// Split the daily window `[start_hour:00, end_hour:00]` into fire times.
///
/// Both ends are inclusive. Stepping starts at `start_hour:00`; the last fire
/// time is the largest step not past `end_hour:00`. The interval must be a
/// whole number of minutes.
pub fn window_fire_times(
    interval_seconds: u64,
    start_hour: u32,
    end_hour: u32,
) -> Result<Vec<TimeOfDay>> {
    if interval_seconds == 0 || interval_seconds % 60 != 0 {
        return Err(AppError::InvalidInterval(interval_seconds));
    }
    if start_hour > 23 || end_hour > 23 || start_hour > end_hour {
        return Err(AppError::InvalidWindow {
            start_hour,
            end_hour,
        });
    }

    let step = interval_seconds / 60;
    let first = u64::from(start_hour) * 60;
    let last = u64::from(end_hour) * 60;

    let mut times = Vec::new();
    let mut at = first;
    while at <= last {
        times.push(TimeOfDay::new((at / 60) as u32, (at % 60) as u32)?);
        at += step;
    }
    Ok(times)
}

impl Trigger {
    /// First fire time strictly after `after`, for a request accepted at `scheduled_at`.
    ///
    /// Returns `None` when a one-shot trigger has already fired.
    pub fn next_fire_after(
        &self,
        scheduled_at: DateTime<Local>,
        after: DateTime<Local>,
    ) -> Option<DateTime<Local>> {
        match *self {
            Trigger::TimeInterval { seconds, repeats } => {
                let step = Duration::try_seconds(i64::try_from(seconds).ok()?)?;
                let first = scheduled_at.checked_add_signed(step)?;
                if first > after {
                    return Some(first);
                }
                if !repeats || seconds == 0 {
                    return None;
                }
                let elapsed = (after - scheduled_at).num_seconds();
                let steps = elapsed / step.num_seconds() + 1;
                let offset = Duration::try_seconds(steps.checked_mul(step.num_seconds())?)?;
                scheduled_at.checked_add_signed(offset)
            }
            Trigger::Daily { hour, minute } => {
                let time = TimeOfDay::new(hour, minute).ok()?.to_naive();
                let mut day = after.date_naive();
                // A DST gap can swallow the wall-clock time for a day; look a few days out.
                for _ in 0..3 {
                    if let Some(candidate) = Local.from_local_datetime(&day.and_time(time)).earliest()
                    {
                        if candidate > after {
                            return Some(candidate);
                        }
                    }
                    day = day.checked_add_days(Days::new(1))?;
                }
                None
            }
        }
    }
}

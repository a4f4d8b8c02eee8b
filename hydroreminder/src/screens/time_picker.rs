//! Hour / minute stepper state for the daily reminder picker

use crate::config::{DEFAULT_PICKER_HOUR, DEFAULT_PICKER_MINUTE, MINUTE_STEP};
use crate::error::Result;
use crate::models::TimeOfDay;

const LAST_HOUR: u32 = 23;
const LAST_MINUTE: u32 = 60 - MINUTE_STEP;

/// Picker that wraps around at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePicker {
    hour: u32,
    minute: u32,
}

impl Default for TimePicker {
    fn default() -> Self {
        Self {
            hour: DEFAULT_PICKER_HOUR,
            minute: DEFAULT_PICKER_MINUTE,
        }
    }
}

impl TimePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn increment_hour(&mut self) {
        self.hour = if self.hour < LAST_HOUR { self.hour + 1 } else { 0 };
    }

    pub fn decrement_hour(&mut self) {
        self.hour = if self.hour > 0 { self.hour - 1 } else { LAST_HOUR };
    }

    pub fn increment_minute(&mut self) {
        self.minute = if self.minute < LAST_MINUTE {
            self.minute + MINUTE_STEP
        } else {
            0
        };
    }

    pub fn decrement_minute(&mut self) {
        self.minute = if self.minute > 0 {
            self.minute - MINUTE_STEP
        } else {
            LAST_MINUTE
        };
    }

    pub fn time(&self) -> Result<TimeOfDay> {
        TimeOfDay::new(self.hour, self.minute)
    }

    /// Label of the schedule button, e.g. `9:00`
    pub fn label(&self) -> String {
        format!("{}:{:02}", self.hour, self.minute)
    }
}

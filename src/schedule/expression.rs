//! Six-field cron expressions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};

use super::ScheduleError;

/// A parsed `sec min hour day-of-month month day-of-week [year]` expression.
///
/// `?` is accepted in the day fields and means "any".
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: ::cron::Schedule,
}

impl CronSchedule {
    /// Parse an expression such as `0 0 12 ? * MON-FRI`.
    ///
    /// # Errors
    ///
    /// Returns an error if the field count is wrong or a field is invalid.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if !(6..=7).contains(&fields.len()) {
            return Err(ScheduleError::FieldCount {
                expression: expression.to_string(),
                found: fields.len(),
            });
        }

        let normalized = fields
            .iter()
            .map(|&field| if field == "?" { "*" } else { field })
            .collect::<Vec<_>>()
            .join(" ");

        let schedule =
            ::cron::Schedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidExpression {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First firing strictly after `after`.
    #[must_use]
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(after).next()
    }

    /// The next `count` firings in local time.
    #[must_use]
    pub fn upcoming(&self, count: usize) -> Vec<DateTime<Local>> {
        self.schedule.upcoming(Local).take(count).collect()
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl FromStr for CronSchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

//! Cron-driven re-arming of the file watch loop.

mod expression;
mod error;
mod trigger;

pub use expression::CronSchedule;
pub use error::ScheduleError;
pub use trigger::{ScheduleTrigger, TriggerReport, TriggerState};

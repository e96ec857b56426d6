//! Periodic tasks driven by cron expressions.
//!
//! Two schedules run for the life of the process: the sync task on the
//! configured expression, and an announcement every 30 minutes that logs when the
//! next sync is due. Both only log; neither touches the health gate. They are
//! spawned detached and cannot be cancelled.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local};
use cron::Schedule;

use crate::config::{AppConfig, ANNOUNCE_CRON, CRON_DISPLAY_FORMAT};

/// Parse a cron expression.
///
/// Standard five-field expressions (minute hour dom month dow) get a leading
/// seconds field of `0`; six and seven-field expressions are passed through.
pub fn parse_cron(expr: &str) -> Result<Schedule, cron::error::Error> {
    let fields = expr.split_whitespace().count();
    if fields == 5 {
        Schedule::from_str(&format!("0 {}", expr.trim()))
    } else {
        Schedule::from_str(expr.trim())
    }
}

/// Next local time at which `schedule` fires.
pub fn next_run(schedule: &Schedule) -> Option<DateTime<Local>> {
    schedule.upcoming(Local).next()
}

pub fn format_run(at: &DateTime<Local>) -> String {
    at.format(CRON_DISPLAY_FORMAT).to_string()
}

/// Spawn the sync and announcement tasks.
pub fn spawn_schedules(config: Arc<AppConfig>) {
    match parse_cron(&config.tasks.cron_sync) {
        Ok(schedule) => {
            let config = config.clone();
            tokio::spawn(async move {
                run_on_schedule(schedule, move || {
                    tracing::info!(
                        runtime = %format_run(&Local::now()),
                        schedule = %config.tasks.cron_sync,
                        repository = %config.app.repo_url(),
                        "Started cron to synchronize container with repository"
                    );
                })
                .await;
            });
        }
        Err(e) => {
            tracing::error!(
                schedule = %config.tasks.cron_sync,
                error = %e,
                "Sync cron expression is not valid; sync task not scheduled"
            );
        }
    }

    match parse_cron(ANNOUNCE_CRON) {
        Ok(schedule) => {
            tokio::spawn(async move {
                run_on_schedule(schedule, move || announce_next_sync(&config)).await;
            });
        }
        Err(e) => {
            tracing::error!(schedule = ANNOUNCE_CRON, error = %e, "Announcement cron is not valid");
        }
    }
}

fn announce_next_sync(config: &AppConfig) {
    match parse_cron(&config.tasks.cron_sync) {
        Ok(schedule) => match next_run(&schedule) {
            Some(next) => tracing::info!(
                schedule = %config.tasks.cron_sync,
                next_run = %format_run(&next),
                next_run_iso = %next.to_rfc3339(),
                "Next data refresh"
            ),
            None => tracing::warn!(
                schedule = %config.tasks.cron_sync,
                "Sync cron has no upcoming runs"
            ),
        },
        Err(e) => tracing::error!(
            env = "TASK_CRON_SYNC",
            schedule = %config.tasks.cron_sync,
            error = %e,
            "Specified cron timer value is not valid. Re-write the cron so that it is properly formatted"
        ),
    }
}

/// Sleep until each upcoming fire time and invoke `task`. Returns when the
/// schedule has no further runs.
async fn run_on_schedule<F>(schedule: Schedule, mut task: F)
where
    F: FnMut() + Send,
{
    while let Some(next) = next_run(&schedule) {
        let wait = (next - Local::now()).to_std().unwrap_or_default();
        tracing::trace!(next_run = %next.to_rfc3339(), wait_secs = wait.as_secs(), "Waiting for cron");
        tokio::time::sleep(wait).await;
        task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_five_field_expression() {
        let schedule = parse_cron("0 */12 * * *").unwrap();
        let next = next_run(&schedule).unwrap();
        assert_eq!(next.minute(), 0);
        assert_eq!(next.second(), 0);
        assert_eq!(next.hour() % 12, 0);
    }

    #[test]
    fn test_announcement_expression() {
        let schedule = parse_cron(ANNOUNCE_CRON).unwrap();
        let next = next_run(&schedule).unwrap();
        assert_eq!(next.minute() % 30, 0);
        assert!(next > Local::now());
    }

    #[test]
    fn test_six_field_expression_passes_through() {
        assert!(parse_cron("30 0 */12 * * *").is_ok());
    }

    #[test]
    fn test_invalid_expression() {
        assert!(parse_cron("every day at noon").is_err());
        assert!(parse_cron("").is_err());
    }

    #[test]
    fn test_format_run() {
        let at = Local.with_ymd_and_hms(2026, 10, 18, 18, 5, 0).unwrap();
        assert_eq!(format_run(&at), "10-18-2026 6:05 PM");
    }
}

//! Schedule expressions: `manual`, `rate(N unit)` and six-field `cron(...)`.
//!
//! Cron expressions use the `min hour day-of-month month day-of-week year`
//! layout with `?` allowed in either day field. They are normalized to the
//! `cron` crate's seven-field form (seconds first) before parsing.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use sweep_config::MANUAL_SCHEDULE;

use crate::schedule::errors::ScheduleError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone)]
pub enum ScheduleExpression {
    /// No rule is registered; runs happen only on request.
    Manual,
    Rate(Duration),
    Cron(Box<Schedule>),
}

impl ScheduleExpression {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let trimmed = expression.trim();
        let invalid = |reason: &str| ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.eq_ignore_ascii_case(MANUAL_SCHEDULE) {
            return Ok(ScheduleExpression::Manual);
        }
        if let Some(inner) = wrapped(trimmed, "rate") {
            return parse_rate(inner).map(ScheduleExpression::Rate).map_err(|r| invalid(&r));
        }
        if let Some(inner) = wrapped(trimmed, "cron") {
            let normalized = normalize_cron(inner).map_err(|r| invalid(&r))?;
            let schedule = Schedule::from_str(&normalized).map_err(|e| invalid(&e.to_string()))?;
            return Ok(ScheduleExpression::Cron(Box::new(schedule)));
        }
        Err(invalid("expected 'manual', 'rate(...)' or 'cron(...)'"))
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, ScheduleExpression::Manual)
    }

    /// Time from `now` until the next fire; `None` when nothing is scheduled.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            ScheduleExpression::Manual => None,
            ScheduleExpression::Rate(interval) => Some(*interval),
            ScheduleExpression::Cron(schedule) => {
                let next = schedule.after(&now).next()?;
                Some((next - now).to_std().unwrap_or(Duration::ZERO))
            }
        }
    }
}

fn wrapped<'a>(expression: &'a str, name: &str) -> Option<&'a str> {
    let open = expression.find('(')?;
    if !expression[..open].trim().eq_ignore_ascii_case(name) {
        return None;
    }
    expression[open + 1..].strip_suffix(')')
}

fn parse_rate(inner: &str) -> Result<Duration, String> {
    let mut parts = inner.split_whitespace();
    let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("rate must be 'rate(<value> <unit>)'".to_string());
    };
    let value: u64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", value))?;
    if value == 0 {
        return Err("rate value must be greater than zero".to_string());
    }
    let unit_secs = match unit.to_ascii_lowercase().as_str() {
        "minute" | "minutes" => MINUTE,
        "hour" | "hours" => HOUR,
        "day" | "days" => DAY,
        other => return Err(format!("unknown rate unit '{}'", other)),
    };
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| "rate is too large".to_string())
}

fn normalize_cron(inner: &str) -> Result<String, String> {
    let fields: Vec<&str> = inner.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(format!(
            "cron needs 6 fields (minute hour day-of-month month day-of-week year), got {}",
            fields.len()
        ));
    }
    let fields: Vec<&str> = fields
        .into_iter()
        .map(|f| if f == "?" { "*" } else { f })
        .collect();
    Ok(format!("0 {}", fields.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_disables_schedule() {
        let expression = ScheduleExpression::parse(" manual ").unwrap();
        assert!(expression.is_manual());
        assert_eq!(expression.next_delay(Utc::now()), None);
    }

    #[test]
    fn test_rate_units() {
        let cases = [
            ("rate(1 minute)", 60),
            ("rate(15 minutes)", 900),
            ("rate(2 hours)", 7200),
            ("rate(1 day)", 86_400),
        ];
        for (input, secs) in cases {
            let expression = ScheduleExpression::parse(input).unwrap();
            assert_eq!(
                expression.next_delay(Utc::now()),
                Some(Duration::from_secs(secs)),
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_invalid_rates() {
        for input in ["rate(0 minutes)", "rate(five minutes)", "rate(1 week)", "rate(1)"] {
            assert!(
                matches!(
                    ScheduleExpression::parse(input),
                    Err(ScheduleError::InvalidExpression { .. })
                ),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_cron_with_question_mark() {
        let expression = ScheduleExpression::parse("cron(0 3 ? * * *)").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 1, 30, 0).unwrap();
        assert_eq!(
            expression.next_delay(now),
            Some(Duration::from_secs(90 * 60))
        );
    }

    #[test]
    fn test_cron_next_day() {
        let expression = ScheduleExpression::parse("cron(0 3 * * ? *)").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 4, 0, 0).unwrap();
        assert_eq!(
            expression.next_delay(now),
            Some(Duration::from_secs(23 * 60 * 60))
        );
    }

    #[test]
    fn test_cron_field_count() {
        assert!(ScheduleExpression::parse("cron(0 3 * * *)").is_err());
        assert!(ScheduleExpression::parse("cron(not a cron at all)").is_err());
    }

    #[test]
    fn test_unknown_expression() {
        assert!(ScheduleExpression::parse("every day").is_err());
        assert!(ScheduleExpression::parse("").is_err());
    }

    #[test]
    fn test_normalize_cron() {
        assert_eq!(normalize_cron("0 3 ? * * *").unwrap(), "0 0 3 * * * *");
    }
}

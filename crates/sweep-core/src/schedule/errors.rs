use crate::errors::SweepError;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid schedule expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Scheduled runs need an account identity; set SWEEP_ACCOUNT_ID or account_id")]
    MissingAccount,
}

impl SweepError for ScheduleError {
    fn error_code(&self) -> &'static str {
        match self {
            ScheduleError::InvalidExpression { .. } => "SCHEDULE_INVALID_EXPRESSION",
            ScheduleError::MissingAccount => "SCHEDULE_MISSING_ACCOUNT",
        }
    }

    fn is_user_error(&self) -> bool {
        true
    }
}

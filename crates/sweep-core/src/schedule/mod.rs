pub mod errors;
pub mod expression;
pub mod trigger;

pub use errors::ScheduleError;
pub use expression::ScheduleExpression;
pub use trigger::ScheduleTrigger;

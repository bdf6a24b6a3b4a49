pub mod assessment_service;
pub mod attempt_service;
pub mod grading_service;
pub mod statistics_service;
pub mod user_service;

pub use assessment_service::AssessmentService;
pub use attempt_service::{AttemptContext, AttemptService};
pub use grading_service::GradingService;
pub use statistics_service::StatisticsService;
pub use user_service::UserService;

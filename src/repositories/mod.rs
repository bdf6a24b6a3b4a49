pub mod assessment_repository;
pub mod refresh_token_repository;
pub mod submission_repository;
pub mod user_repository;

pub use assessment_repository::{AssessmentRepository, MongoAssessmentRepository};
pub use refresh_token_repository::{MongoRefreshTokenRepository, RefreshTokenRepository};
pub use submission_repository::{MongoSubmissionRepository, SubmissionRepository};
pub use user_repository::{MongoUserRepository, UserRepository};

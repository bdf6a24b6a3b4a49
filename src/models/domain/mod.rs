pub mod assessment;
pub mod question;
pub mod refresh_token;
pub mod submission;
pub mod user;

pub use assessment::{Assessment, AssessmentStatus};
pub use question::{AnswerValue, Question, QuestionKind};
pub use submission::{Submission, SubmissionStatus};
pub use user::User;

use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AssessmentRepository, MongoAssessmentRepository, MongoRefreshTokenRepository,
        MongoSubmissionRepository, MongoUserRepository, RefreshTokenRepository,
        SubmissionRepository,
    },
    services::{AssessmentService, AttemptService, StatisticsService, UserService},
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub assessment_service: Arc<AssessmentService>,
    pub attempt_service: Arc<AttemptService>,
    pub statistics_service: Arc<StatisticsService>,
    pub jwt_service: Arc<JwtService>,
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
            config.refresh_expiration_hours,
        ));

        let user_repository = Arc::new(MongoUserRepository::new(&db));
        user_repository.ensure_indexes().await?;

        let refresh_token_repository = Arc::new(MongoRefreshTokenRepository::new(&db));
        refresh_token_repository.ensure_indexes().await?;
        let swept = refresh_token_repository.delete_expired().await?;
        if swept > 0 {
            log::info!("removed {} expired refresh token(s)", swept);
        }

        let assessment_repository = Arc::new(MongoAssessmentRepository::new(&db));
        assessment_repository.ensure_indexes().await?;
        let assessment_repository: Arc<dyn AssessmentRepository> = assessment_repository;

        let submission_repository = Arc::new(MongoSubmissionRepository::new(&db));
        submission_repository.ensure_indexes().await?;
        let submission_repository: Arc<dyn SubmissionRepository> = submission_repository;

        let user_service = Arc::new(UserService::new(
            user_repository,
            refresh_token_repository,
            Arc::clone(&jwt_service),
        ));
        let assessment_service = Arc::new(AssessmentService::new(Arc::clone(&assessment_repository)));
        let attempt_service = Arc::new(AttemptService::new(
            assessment_repository,
            Arc::clone(&submission_repository),
        ));
        let statistics_service = Arc::new(StatisticsService::new(submission_repository));

        Ok(Self {
            user_service,
            assessment_service,
            attempt_service,
            statistics_service,
            jwt_service,
            db,
            config: Arc::new(config),
        })
    }
}

use std::sync::Arc;

use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    auth::{password, JwtService},
    errors::{AppError, AppResult},
    models::domain::refresh_token::{hash_token, RefreshToken},
    models::domain::User,
    models::dto::request::{LoginRequest, RegisterRequest},
    models::dto::response::AuthResponse,
    repositories::{RefreshTokenRepository, UserRepository},
};

/// Registration, login, token refresh and logout. Provider failures carry a
/// classification code (`EMAIL_IN_USE`, `INVALID_CREDENTIAL`, `WEAK_PASSWORD`,
/// `ACCOUNT_DISABLED`) that the client translates into a user-facing message.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    jwt: Arc<JwtService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;
        password::check_strength(&request.password)?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::EmailInUse);
        }

        let hash = password::hash_password(&request.password)?;
        let user = User::new(&request.display_name, &request.email, &hash);
        let user = self.users.create(user).await?;

        log::info!("registered user {}", user.id);
        self.issue_tokens(&user).await
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AppError::InvalidCredential)?;

        if user.disabled {
            return Err(AppError::AccountDisabled);
        }
        if !password::verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::InvalidCredential);
        }

        self.issue_tokens(&user).await
    }

    /// Exchange a valid refresh token for a fresh token pair. The used token
    /// is revoked (rotation).
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;

        let stored = self
            .refresh_tokens
            .find_by_token_hash(&hash_token(refresh_token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Refresh token not recognized".to_string()))?;
        if !stored.is_valid() {
            return Err(AppError::Unauthorized(
                "Refresh token is revoked or expired".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::InvalidCredential)?;
        if user.disabled {
            return Err(AppError::AccountDisabled);
        }

        self.refresh_tokens
            .revoke_by_token_hash(&stored.token_hash)
            .await?;
        self.issue_tokens(&user).await
    }

    /// Sign out everywhere: revoke every live refresh token for the user.
    pub async fn logout(&self, user_id: &str) -> AppResult<u64> {
        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        log::info!("revoked {} refresh token(s) for user {}", revoked, user_id);
        Ok(revoked)
    }

    async fn issue_tokens(&self, user: &User) -> AppResult<AuthResponse> {
        let token = self.jwt.create_token(user)?;
        let refresh_token = self.jwt.create_refresh_token(&user.id)?;

        let expires_at = Utc::now() + Duration::hours(self.jwt.refresh_expiration_hours());
        self.refresh_tokens
            .create(RefreshToken::new(
                user.id.clone(),
                hash_token(&refresh_token),
                expires_at,
            ))
            .await?;

        Ok(AuthResponse {
            token,
            refresh_token,
            user_id: user.id.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::repositories::refresh_token_repository::MockRefreshTokenRepository;
    use crate::repositories::user_repository::MockUserRepository;

    fn jwt() -> Arc<JwtService> {
        let config = Config::test_config();
        Arc::new(JwtService::new(&config.jwt_secret, 1, 168))
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            display_name: "Ana Torres".to_string(),
            email: "ana@example.com".to_string(),
            password: "secret123".to_string(),
        }
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            email: "ana@example.com".to_string(),
            password: password.to_string(),
        }
    }

    fn service_with(
        users: MockUserRepository,
        refresh_tokens: MockRefreshTokenRepository,
    ) -> UserService {
        UserService::new(Arc::new(users), Arc::new(refresh_tokens), jwt())
    }

    #[actix_web::test]
    async fn register_issues_a_token_pair() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().returning(Ok);

        let mut refresh_tokens = MockRefreshTokenRepository::new();
        refresh_tokens.expect_create().returning(Ok);

        let response = service_with(users, refresh_tokens)
            .register(register_request())
            .await
            .unwrap();

        assert!(!response.token.is_empty());
        assert!(!response.refresh_token.is_empty());
        assert_eq!(response.email, "ana@example.com");
    }

    #[actix_web::test]
    async fn register_rejects_an_email_already_in_use() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(User::test_user("Ana", "ana@example.com"))));

        let result = service_with(users, MockRefreshTokenRepository::new())
            .register(register_request())
            .await;
        assert!(matches!(result, Err(AppError::EmailInUse)));
    }

    #[actix_web::test]
    async fn register_rejects_a_weak_password() {
        let mut request = register_request();
        request.password = "abc".to_string();

        let result = service_with(
            MockUserRepository::new(),
            MockRefreshTokenRepository::new(),
        )
        .register(request)
        .await;
        assert!(matches!(result, Err(AppError::WeakPassword)));
    }

    #[actix_web::test]
    async fn register_rejects_an_invalid_email() {
        let mut request = register_request();
        request.email = "not-an-email".to_string();

        let result = service_with(
            MockUserRepository::new(),
            MockRefreshTokenRepository::new(),
        )
        .register(request)
        .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[actix_web::test]
    async fn login_with_the_right_password_succeeds() {
        let hash = password::hash_password("secret123").unwrap();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(User::new("Ana", "ana@example.com", &hash))));

        let mut refresh_tokens = MockRefreshTokenRepository::new();
        refresh_tokens.expect_create().returning(Ok);

        let response = service_with(users, refresh_tokens)
            .login(login_request("secret123"))
            .await
            .unwrap();
        assert_eq!(response.display_name, "Ana");
    }

    #[actix_web::test]
    async fn login_with_a_wrong_password_is_an_invalid_credential() {
        let hash = password::hash_password("secret123").unwrap();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(User::new("Ana", "ana@example.com", &hash))));

        let result = service_with(users, MockRefreshTokenRepository::new())
            .login(login_request("wrong-password"))
            .await;
        assert!(matches!(result, Err(AppError::InvalidCredential)));
    }

    #[actix_web::test]
    async fn login_for_an_unknown_email_is_an_invalid_credential() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let result = service_with(users, MockRefreshTokenRepository::new())
            .login(login_request("secret123"))
            .await;
        assert!(matches!(result, Err(AppError::InvalidCredential)));
    }

    #[actix_web::test]
    async fn login_to_a_disabled_account_is_rejected() {
        let hash = password::hash_password("secret123").unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |_| {
            let mut user = User::new("Ana", "ana@example.com", &hash);
            user.disabled = true;
            Ok(Some(user))
        });

        let result = service_with(users, MockRefreshTokenRepository::new())
            .login(login_request("secret123"))
            .await;
        assert!(matches!(result, Err(AppError::AccountDisabled)));
    }

    #[actix_web::test]
    async fn refresh_rotates_the_token_pair() {
        let user = User::test_user("Ana", "ana@example.com");
        let user_id = user.id.clone();

        let service_jwt = jwt();
        let refresh_token = service_jwt.create_refresh_token(&user.id).unwrap();
        let stored_hash = hash_token(&refresh_token);

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));

        let mut refresh_tokens = MockRefreshTokenRepository::new();
        let expires_at = Utc::now() + Duration::days(7);
        refresh_tokens.expect_find_by_token_hash().returning(move |hash| {
            Ok(Some(RefreshToken::new(
                user_id.clone(),
                hash.to_string(),
                expires_at,
            )))
        });
        refresh_tokens
            .expect_revoke_by_token_hash()
            .times(1)
            .withf(move |hash| hash == stored_hash)
            .returning(|_| Ok(()));
        refresh_tokens.expect_create().returning(Ok);

        let service = UserService::new(Arc::new(users), Arc::new(refresh_tokens), service_jwt);
        let response = service.refresh(&refresh_token).await.unwrap();

        // The mock verifies the used token was revoked; the response carries a
        // freshly issued pair.
        assert_eq!(response.user_id, user.id);
        assert!(!response.token.is_empty());
        assert!(!response.refresh_token.is_empty());
    }

    #[actix_web::test]
    async fn refresh_with_a_revoked_token_is_rejected() {
        let user = User::test_user("Ana", "ana@example.com");
        let user_id = user.id.clone();

        let service_jwt = jwt();
        let refresh_token = service_jwt.create_refresh_token(&user.id).unwrap();

        let mut refresh_tokens = MockRefreshTokenRepository::new();
        refresh_tokens.expect_find_by_token_hash().returning(move |hash| {
            let mut token = RefreshToken::new(
                user_id.clone(),
                hash.to_string(),
                Utc::now() + Duration::days(7),
            );
            token.revoked = true;
            Ok(Some(token))
        });

        let service = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(refresh_tokens),
            service_jwt,
        );
        let result = service.refresh(&refresh_token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn refresh_with_garbage_is_rejected() {
        let result = service_with(
            MockUserRepository::new(),
            MockRefreshTokenRepository::new(),
        )
        .refresh("not.a.token")
        .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn logout_revokes_every_live_refresh_token() {
        let mut refresh_tokens = MockRefreshTokenRepository::new();
        refresh_tokens
            .expect_revoke_all_for_user()
            .times(1)
            .withf(|user_id| user_id == "user-1")
            .returning(|_| Ok(2));

        let revoked = service_with(MockUserRepository::new(), refresh_tokens)
            .logout("user-1")
            .await
            .unwrap();
        assert_eq!(revoked, 2);
    }
}

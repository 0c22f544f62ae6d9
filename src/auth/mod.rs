/*!
 * # Authentication and Authorization Module
 *
 * JWT-based staff authentication. A token is issued at login and
 * decoded exactly once per request, at the middleware boundary, into
 * an explicit [`SessionContext`] carried in request extensions —
 * handlers and services never decode tokens themselves.
 *
 * Role-based gating is layered onto routers via [`AuthRouterExt`].
 */

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // Subject (user ID)
    pub name: String,    // User's display name
    pub role: String,    // User's role
    pub jti: String,     // JWT ID (unique identifier for this token)
    pub iat: i64,        // Issued at time
    pub exp: i64,        // Expiration time
    pub nbf: i64,        // Not valid before time
    pub iss: String,     // Issuer
    pub aud: String,     // Audience
}

/// The authenticated staff member for the current request. Built once
/// from the decoded token and passed along explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl SessionContext {
    /// Admins pass every role gate; everyone else needs an exact match.
    pub fn allows(&self, required: &UserRole) -> bool {
        self.role == UserRole::Admin || self.role == *required
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            token_expiration,
        }
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingToken,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::AccountDeactivated => {
                ServiceError::AuthError(err.to_string())
            }
            AuthError::InvalidToken(msg) => ServiceError::JwtError(msg),
            AuthError::MissingToken => {
                ServiceError::Unauthorized("missing authorization header".to_string())
            }
            AuthError::InternalError(msg) => ServiceError::InternalError(msg),
            AuthError::DatabaseError(e) => ServiceError::DatabaseError(e),
        }
    }
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("password hashing failed: {}", e)))
}

/// Verifies a password against a stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::InternalError(format!("stored hash is malformed: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Authentication service that handles token issuance and validation
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Verifies credentials and issues a token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, AuthError> {
        let account = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !account.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        let token = self.issue_token(&account)?;
        debug!(user_id = %account.id, "login succeeded");

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs(),
            user: SessionContext {
                user_id: account.id,
                name: format!("{} {}", account.first_name, account.last_name),
                role: account.role,
            },
        })
    }

    /// Encodes a JWT for the given account.
    pub fn issue_token(&self, account: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            name: format!("{} {}", account.first_name, account.last_name),
            role: account.role.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::InternalError(format!("token encoding failed: {}", e)))
    }

    /// Decodes and validates a token into a session context. This is
    /// the single decode boundary; nothing downstream re-decodes.
    pub fn decode_session(&self, token: &str) -> Result<SessionContext, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);
        validation.set_audience(&[self.config.jwt_audience.clone()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))?;
        let role = match data.claims.role.as_str() {
            "Admin" => UserRole::Admin,
            "Cashier" => UserRole::Cashier,
            "Technician" => UserRole::Technician,
            other => {
                return Err(AuthError::InvalidToken(format!(
                    "unknown role '{}' in token",
                    other
                )))
            }
        };

        Ok(SessionContext {
            user_id,
            name: data.claims.name,
            role,
        })
    }
}

/// Decode-once middleware: when a bearer token is present it is
/// validated here and the resulting [`SessionContext`] is stored in
/// request extensions. A present-but-invalid token fails the request;
/// an absent one leaves authentication to each handler's extractor.
pub async fn session_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = bearer {
        match auth.decode_session(&token) {
            Ok(session) => {
                request.extensions_mut().insert(session);
            }
            Err(err) => {
                return ServiceError::from(err).into_response();
            }
        }
    }

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".to_string()))
    }
}

/// Router extension for role gating.
pub trait AuthRouterExt {
    /// Requires the session role to match (admins always pass).
    fn with_role(self, required: UserRole) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_role(self, required: UserRole) -> Self {
        self.route_layer(axum::middleware::from_fn(
            move |request: Request, next: Next| {
                let required = required.clone();
                async move {
                    let session = request.extensions().get::<SessionContext>().cloned();
                    match session {
                        Some(session) if session.allows(&required) => next.run(request).await,
                        Some(session) => ServiceError::Forbidden(format!(
                            "role '{}' may not perform this action",
                            session.role
                        ))
                        .into_response(),
                        None => {
                            ServiceError::Unauthorized("authentication required".to_string())
                                .into_response()
                        }
                    }
                }
            },
        ))
    }
}

/// Successful login payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: SessionContext,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

async fn login_handler(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    let tokens = auth.login(&payload.username, &payload.password).await?;
    Ok(Json(tokens))
}

async fn me_handler(session: SessionContext) -> Json<SessionContext> {
    Json(session)
}

/// Routes served under `/auth`.
pub fn auth_routes() -> Router<Arc<AuthService>> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/me", get(me_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> AuthConfig {
        AuthConfig::new(
            "unit_test_secret_that_is_long_enough_for_hs256_token_signing_0123456789".into(),
            "fixpoint-api".into(),
            "fixpoint-clients".into(),
            Duration::from_secs(1800),
        )
    }

    fn test_account() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            first_name: "Saman".into(),
            last_name: "Fernando".into(),
            username: "saman".into(),
            password_hash: hash_password("hunter2!").unwrap(),
            role: UserRole::Technician,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service(config: AuthConfig) -> AuthService {
        // Token tests never touch the database.
        AuthService::new(config, Arc::new(DatabaseConnection::Disconnected))
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn issued_tokens_decode_into_a_session() {
        let svc = service(test_config());
        let account = test_account();
        let token = svc.issue_token(&account).unwrap();

        let session = svc.decode_session(&token).unwrap();
        assert_eq!(session.user_id, account.id);
        assert_eq!(session.role, UserRole::Technician);
        assert_eq!(session.name, "Saman Fernando");
    }

    #[test]
    fn tokens_from_another_issuer_are_rejected() {
        let svc = service(test_config());
        let mut other_config = test_config();
        other_config.jwt_issuer = "someone-else".into();
        let other = service(other_config);

        let token = other.issue_token(&test_account()).unwrap();
        assert!(svc.decode_session(&token).is_err());
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let svc = service(test_config());
        assert!(svc.decode_session("not-a-jwt").is_err());
    }

    #[test]
    fn admin_passes_every_role_gate() {
        let session = SessionContext {
            user_id: Uuid::new_v4(),
            name: "Admin".into(),
            role: UserRole::Admin,
        };
        assert!(session.allows(&UserRole::Technician));
        assert!(session.allows(&UserRole::Cashier));
        assert!(session.allows(&UserRole::Admin));
    }

    #[test]
    fn non_admin_needs_exact_role() {
        let session = SessionContext {
            user_id: Uuid::new_v4(),
            name: "Tech".into(),
            role: UserRole::Technician,
        };
        assert!(session.allows(&UserRole::Technician));
        assert!(!session.allows(&UserRole::Admin));
        assert!(!session.allows(&UserRole::Cashier));
    }
}

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth,
    db::DbPool,
    entities::user::{self, UserRole},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Fields accepted when creating a staff account.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub role: UserRole,
}

/// Service for staff accounts and the technician directory
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl UserService {
    /// Creates a new user service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a staff account with a hashed password.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<user::Model, ServiceError> {
        if input.password.chars().count() < 8 {
            return Err(ServiceError::ValidationError(
                "password must be at least 8 characters".to_string(),
            ));
        }
        if input.username.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "username must not be empty".to_string(),
            ));
        }

        let password_hash = auth::hash_password(&input.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let db = self.db_pool.as_ref();
        let active = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            username: Set(input.username.trim().to_string()),
            password_hash: Set(password_hash),
            role: Set(input.role),
            is_active: Set(true),
            ..Default::default()
        };

        let created = active.insert(db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                ServiceError::Conflict("username is already taken".to_string())
            } else {
                ServiceError::db_error(e)
            }
        })?;

        self.event_sender
            .send_or_log(Event::UserCreated(created.id))
            .await;
        info!(user_id = %created.id, "staff account created");

        Ok(created)
    }

    /// Gets a staff account by ID
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &Uuid) -> Result<Option<user::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let found = user::Entity::find_by_id(*id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(found)
    }

    pub async fn list_users(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let total = user::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        let offset = page.saturating_sub(1) * limit;
        let users = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((users, total))
    }

    /// Active technicians, the only staff eligible for repair
    /// assignment.
    #[instrument(skip(self))]
    pub async fn list_technicians(&self) -> Result<Vec<user::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let technicians = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Technician))
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::FirstName)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(technicians)
    }

    /// Confirms `id` references an active technician; rejects
    /// anything else at ingestion so repairs always hold a normalized
    /// technician reference.
    #[instrument(skip(self))]
    pub async fn require_active_technician(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        let account = self
            .get_user(&id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Technician {} not found", id)))?;

        if account.role != UserRole::Technician {
            return Err(ServiceError::ValidationError(format!(
                "user {} is not a technician",
                id
            )));
        }
        if !account.is_active {
            return Err(ServiceError::ValidationError(format!(
                "technician {} is deactivated",
                id
            )));
        }
        Ok(account)
    }

    /// Updates names, role, or active flag.
    #[instrument(skip(self))]
    pub async fn update_user(
        &self,
        id: Uuid,
        first_name: Option<String>,
        last_name: Option<String>,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> Result<user::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = user::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(first_name) = first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = last_name {
            active.last_name = Set(last_name);
        }
        if let Some(role) = role {
            active.role = Set(role);
        }
        if let Some(is_active) = is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        Ok(updated)
    }

    /// Deactivates an account, keeping its history intact.
    #[instrument(skip(self))]
    pub async fn deactivate_user(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        let updated = self.update_user(id, None, None, None, Some(false)).await?;
        self.event_sender
            .send_or_log(Event::UserDeactivated(id))
            .await;
        Ok(updated)
    }
}

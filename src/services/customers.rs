use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::customer,
    errors::ServiceError,
    events::{Event, EventSender},
    resolution,
    validation,
};

const FRAGMENT_SEARCH_LIMIT: u64 = 10;

/// Service for managing customer identities
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    /// Creates a new customer service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Exact lookup on the unique phone key.
    #[instrument(skip(self))]
    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<customer::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let found = customer::Entity::find()
            .filter(customer::Column::Phone.eq(phone))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(found)
    }

    /// Fragment search for search-as-you-type. Fragments shorter than
    /// the guard length return empty without a database call.
    #[instrument(skip(self))]
    pub async fn search_by_phone_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<customer::Model>, ServiceError> {
        if !resolution::phone_fragment_ok(fragment) {
            return Ok(Vec::new());
        }

        let db = self.db_pool.as_ref();
        let matches = customer::Entity::find()
            .filter(customer::Column::Phone.contains(fragment.trim()))
            .order_by_asc(customer::Column::Phone)
            .limit(FRAGMENT_SEARCH_LIMIT)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(matches)
    }

    /// Resolves a customer by exact phone, creating one on not-found.
    ///
    /// Not-found is the only branch that triggers creation; any other
    /// lookup failure aborts. The unique phone index arbitrates
    /// concurrent creates for the same number: the loser surfaces as
    /// a conflict.
    #[instrument(skip(self))]
    pub async fn resolve_or_create(
        &self,
        name: &str,
        phone: &str,
        email: &str,
    ) -> Result<customer::Model, ServiceError> {
        if let Some(existing) = self.find_by_phone(phone).await? {
            return Ok(existing);
        }
        self.create_customer(name, phone, email).await
    }

    /// Creates a customer record.
    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        name: &str,
        phone: &str,
        email: &str,
    ) -> Result<customer::Model, ServiceError> {
        if !validation::is_valid_phone(phone) {
            return Err(ServiceError::ValidationError(format!(
                "'{}' is not a valid phone number",
                phone
            )));
        }
        if !validation::is_valid_email(email) {
            return Err(ServiceError::ValidationError(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        let db = self.db_pool.as_ref();
        let active = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            phone: Set(phone.trim().to_string()),
            email: Set(email.trim().to_string()),
            ..Default::default()
        };

        let created = active.insert(db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                ServiceError::Conflict(format!("a customer with phone {} already exists", phone))
            } else {
                ServiceError::db_error(e)
            }
        })?;

        self.event_sender
            .send_or_log(Event::CustomerCreated(created.id))
            .await;
        info!(customer_id = %created.id, "customer created");

        Ok(created)
    }

    /// Gets a customer by ID
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: &Uuid) -> Result<Option<customer::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let found = customer::Entity::find_by_id(*id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(found)
    }

    pub async fn list_customers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let total = customer::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        let offset = page.saturating_sub(1) * limit;

        let customers = customer::Entity::find()
            .order_by_desc(customer::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((customers, total))
    }

    /// Updates a customer's contact details.
    #[instrument(skip(self))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        name: Option<String>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<customer::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = customer::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))?;

        if let Some(phone) = &phone {
            if !validation::is_valid_phone(phone) {
                return Err(ServiceError::ValidationError(format!(
                    "'{}' is not a valid phone number",
                    phone
                )));
            }
        }
        if let Some(email) = &email {
            if !validation::is_valid_email(email) {
                return Err(ServiceError::ValidationError(format!(
                    "'{}' is not a valid email address",
                    email
                )));
            }
        }

        let mut active: customer::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(phone) = phone {
            active.phone = Set(phone);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        self.event_sender
            .send_or_log(Event::CustomerUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Deletes a customer record.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let result = customer::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Customer {} not found", id)));
        }

        self.event_sender
            .send_or_log(Event::CustomerDeleted(id))
            .await;
        Ok(())
    }
}

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::warranty_registration,
    errors::ServiceError,
    events::{Event, EventSender},
    resolution::{self, WarrantyInfo},
};

const FRAGMENT_SEARCH_LIMIT: u64 = 10;

/// One row of a serial fragment search.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SerialSearchHit {
    pub serial_number: String,
    pub product_name: String,
    pub is_under_warranty: bool,
    pub warranty_remaining_days: i64,
}

/// Fields captured when a sale is registered for warranty.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterWarrantyCommand {
    pub serial_number: String,
    pub product_name: String,
    pub category: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub purchase_date: NaiveDate,
    pub warranty_months: i32,
}

/// Service for warranty registrations and serial-number resolution
#[derive(Clone)]
pub struct WarrantyService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl WarrantyService {
    /// Creates a new warranty service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a sold product for warranty.
    #[instrument(skip(self))]
    pub async fn register(
        &self,
        command: RegisterWarrantyCommand,
    ) -> Result<warranty_registration::Model, ServiceError> {
        if command.warranty_months <= 0 {
            return Err(ServiceError::ValidationError(
                "warranty_months must be positive".to_string(),
            ));
        }
        if command.serial_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "serial_number must not be empty".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let active = warranty_registration::ActiveModel {
            id: Set(Uuid::new_v4()),
            serial_number: Set(command.serial_number.trim().to_string()),
            product_name: Set(command.product_name),
            category: Set(command.category),
            customer_name: Set(command.customer_name),
            customer_phone: Set(command.customer_phone),
            customer_email: Set(command.customer_email),
            purchase_date: Set(command.purchase_date),
            warranty_months: Set(command.warranty_months),
            ..Default::default()
        };

        let created = active.insert(db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                ServiceError::Conflict(format!(
                    "serial number {} is already registered",
                    command.serial_number
                ))
            } else {
                ServiceError::db_error(e)
            }
        })?;

        self.event_sender
            .send_or_log(Event::WarrantyRegistered {
                registration_id: created.id,
                serial_number: created.serial_number.clone(),
            })
            .await;
        info!(registration_id = %created.id, "warranty registered");

        Ok(created)
    }

    /// Resolves a serial number into derived warranty state. Missing
    /// serials are a NotFound branch, not a failure.
    #[instrument(skip(self))]
    pub async fn resolve_by_serial(&self, serial: &str) -> Result<WarrantyInfo, ServiceError> {
        let db = self.db_pool.as_ref();
        let registration = warranty_registration::Entity::find()
            .filter(warranty_registration::Column::SerialNumber.eq(serial.trim()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("no warranty registered for serial {}", serial))
            })?;

        Ok(Self::derive_info(registration))
    }

    /// Serial fragment search for search-as-you-type. Short fragments
    /// short-circuit to empty without a database call.
    #[instrument(skip(self))]
    pub async fn search_by_serial_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<SerialSearchHit>, ServiceError> {
        if !resolution::serial_fragment_ok(fragment) {
            return Ok(Vec::new());
        }

        let db = self.db_pool.as_ref();
        let matches = warranty_registration::Entity::find()
            .filter(warranty_registration::Column::SerialNumber.contains(fragment.trim()))
            .order_by_asc(warranty_registration::Column::SerialNumber)
            .limit(FRAGMENT_SEARCH_LIMIT)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(matches
            .into_iter()
            .map(|registration| {
                let info = Self::derive_info(registration);
                SerialSearchHit {
                    serial_number: info.serial_number,
                    product_name: info.product_name,
                    is_under_warranty: info.is_under_warranty,
                    warranty_remaining_days: info.warranty_remaining_days,
                }
            })
            .collect())
    }

    pub async fn list_registrations(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<warranty_registration::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let total = warranty_registration::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        let offset = page.saturating_sub(1) * limit;

        let registrations = warranty_registration::Entity::find()
            .order_by_desc(warranty_registration::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((registrations, total))
    }

    fn derive_info(registration: warranty_registration::Model) -> WarrantyInfo {
        WarrantyInfo::derive(
            registration.serial_number,
            registration.product_name,
            registration.category,
            registration.customer_name,
            registration.customer_phone,
            registration.customer_email,
            registration.purchase_date,
            registration.warranty_months,
            Utc::now().date_naive(),
        )
    }
}

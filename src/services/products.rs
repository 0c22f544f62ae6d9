use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::product,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price: Decimal,
    pub quantity_in_stock: i32,
    pub reorder_level: i32,
}

/// Service for the retail product catalog and its stock levels
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    /// Creates a new product service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a product.
    #[instrument(skip(self))]
    pub async fn create_product(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
        if input.quantity_in_stock < 0 || input.reorder_level < 0 {
            return Err(ServiceError::ValidationError(
                "stock quantities must not be negative".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let active = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            sku: Set(input.sku),
            category: Set(input.category),
            price: Set(input.price),
            quantity_in_stock: Set(input.quantity_in_stock),
            reorder_level: Set(input.reorder_level),
            ..Default::default()
        };

        let created = active.insert(db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                ServiceError::Conflict("a product with this SKU already exists".to_string())
            } else {
                ServiceError::db_error(e)
            }
        })?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        Ok(created)
    }

    /// Gets a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &Uuid) -> Result<Option<product::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let found = product::Entity::find_by_id(*id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(found)
    }

    /// Lists products, optionally filtered by a name/SKU search term.
    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = product::Entity::find();
        if let Some(term) = search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(term))
                    .add(product::Column::Sku.contains(term)),
            );
        }

        let total = query
            .clone()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        let offset = page.saturating_sub(1) * limit;
        let products = query
            .order_by_asc(product::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((products, total))
    }

    /// Replaces a product's editable fields.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let existing = product::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.sku = Set(input.sku);
        active.category = Set(input.category);
        active.price = Set(input.price);
        active.quantity_in_stock = Set(input.quantity_in_stock);
        active.reorder_level = Set(input.reorder_level);

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Applies a signed stock adjustment. Stock can never go below
    /// zero; an adjustment that would is rejected outright.
    #[instrument(skip(self), fields(product_id = %id, delta))]
    pub async fn adjust_stock(
        &self,
        id: Uuid,
        delta: i32,
        reason: String,
    ) -> Result<product::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let txn = db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::db_error(e)
        })?;

        let existing = product::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let old_quantity = existing.quantity_in_stock;
        let new_quantity = old_quantity + delta;
        if new_quantity < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "cannot remove {} units; only {} in stock",
                delta.abs(),
                old_quantity
            )));
        }

        let mut active: product::ActiveModel = existing.into();
        active.quantity_in_stock = Set(new_quantity);
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                product_id: id,
                old_quantity,
                new_quantity,
                reason,
            })
            .await;
        info!(product_id = %id, old_quantity, new_quantity, "stock adjusted");

        Ok(updated)
    }

    /// Active products at or below their reorder level.
    #[instrument(skip(self))]
    pub async fn low_stock_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(
                Expr::col(product::Column::QuantityInStock)
                    .lte(Expr::col(product::Column::ReorderLevel)),
            )
            .order_by_asc(product::Column::QuantityInStock)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(products)
    }

    /// Deletes a product.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let result = product::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Product {} not found", id)));
        }

        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        Ok(())
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::repair_order,
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::{self, RepairStatus},
    resolution::RepairDraft,
    services::{customers::CustomerService, users::UserService, warranties::WarrantyService},
    validation::{self, RepairSubmission},
};

const SEARCH_LIMIT: u64 = 20;

/// Optional filters for listing repair tickets.
#[derive(Debug, Default, Clone)]
pub struct RepairListFilter {
    pub status: Option<String>,
    pub technician_id: Option<Uuid>,
}

/// Non-workflow fields editable after creation. Status never moves
/// through here; it has its own monotonic path.
#[derive(Debug, Default, Clone)]
pub struct UpdateRepairInput {
    pub device_type: Option<String>,
    pub device_model: Option<String>,
    pub reported_issue: Option<String>,
    pub technician_id: Option<Uuid>,
    pub deadline: Option<NaiveDate>,
    pub estimated_cost: Option<String>,
    pub advance_payment: Option<String>,
    pub extra_expenses: Option<String>,
    pub notes: Option<String>,
}

/// Service for repair tickets and their lifecycle
#[derive(Clone)]
pub struct RepairService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    customers: Arc<CustomerService>,
    warranties: Arc<WarrantyService>,
    users: Arc<UserService>,
}

impl RepairService {
    /// Creates a new repair service instance
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        customers: Arc<CustomerService>,
        warranties: Arc<WarrantyService>,
        users: Arc<UserService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            customers,
            warranties,
            users,
        }
    }

    /// Validates a submission and persists it as a new ticket.
    ///
    /// The customer identity is resolved (exact phone match) or
    /// created before the ticket is written, so a repair always
    /// references a resolved `customer_id`. A warranty lookup failure
    /// other than not-found aborts the whole submission.
    #[instrument(skip(self, submission))]
    pub async fn create_repair(
        &self,
        submission: RepairSubmission,
    ) -> Result<repair_order::Model, ServiceError> {
        let today = Utc::now().date_naive();

        let errors = submission.validate_all(today);
        if !errors.is_empty() {
            return Err(field_errors(errors));
        }
        let charges = submission.charges().ok_or_else(|| {
            ServiceError::InternalError("charges unavailable after validation".to_string())
        })?;
        let (technician_id, deadline) = match (submission.technician_id, submission.deadline) {
            (Some(technician_id), Some(deadline)) => (technician_id, deadline),
            _ => {
                return Err(ServiceError::InternalError(
                    "required fields missing after validation".to_string(),
                ))
            }
        };

        // Normalize the technician reference at ingestion.
        self.users.require_active_technician(technician_id).await?;

        let customer = self
            .customers
            .resolve_or_create(
                &submission.customer_name,
                submission.customer_phone.trim(),
                submission.customer_email.trim(),
            )
            .await?;

        let serial_number = submission
            .serial_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let under_warranty = match &serial_number {
            Some(serial) => match self.warranties.resolve_by_serial(serial).await {
                Ok(info) => info.is_under_warranty,
                // Unregistered serials are a legitimate branch.
                Err(ServiceError::NotFound(_)) => false,
                Err(other) => return Err(other),
            },
            None => false,
        };

        let db = self.db_pool.as_ref();
        let active = repair_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_number: Set(generate_ticket_number()),
            customer_id: Set(customer.id),
            customer_name: Set(customer.name.clone()),
            customer_phone: Set(customer.phone.clone()),
            customer_email: Set(customer.email.clone()),
            device_type: Set(submission.device_type.trim().to_string()),
            device_model: Set(submission.device_model.trim().to_string()),
            serial_number: Set(serial_number),
            under_warranty: Set(under_warranty),
            reported_issue: Set(submission.reported_issue.trim().to_string()),
            technician_id: Set(technician_id),
            status: Set(RepairStatus::Pending.to_string()),
            estimated_cost: Set(charges.estimated_cost),
            advance_payment: Set(charges.advance_payment),
            extra_expenses: Set(charges.extra_expenses),
            date_received: Set(submission.date_received.unwrap_or(today)),
            deadline: Set(deadline),
            notes: Set(Some(submission.notes.trim().to_string()).filter(|n| !n.is_empty())),
            ..Default::default()
        };

        let created = active.insert(db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::RepairCreated(created.id))
            .await;
        info!(repair_id = %created.id, ticket = %created.ticket_number, "repair ticket created");

        Ok(created)
    }

    /// Gets a repair ticket by ID
    #[instrument(skip(self))]
    pub async fn get_repair(&self, id: &Uuid) -> Result<Option<repair_order::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let found = repair_order::Entity::find_by_id(*id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(found)
    }

    /// Lists tickets newest-first. A status filter outside the
    /// lifecycle table is rejected, not silently matched against
    /// nothing.
    pub async fn list_repairs(
        &self,
        page: u64,
        limit: u64,
        filter: RepairListFilter,
    ) -> Result<(Vec<repair_order::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = repair_order::Entity::find();
        if let Some(status) = &filter.status {
            let status = RepairStatus::parse(status).ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "'{}' is not a recognized repair status",
                    status
                ))
            })?;
            query = query.filter(repair_order::Column::Status.eq(status.to_string()));
        }
        if let Some(technician_id) = filter.technician_id {
            query = query.filter(repair_order::Column::TechnicianId.eq(technician_id));
        }

        let total = query
            .clone()
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        let offset = page.saturating_sub(1) * limit;
        let repairs = query
            .order_by_desc(repair_order::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((repairs, total))
    }

    /// Searches by ticket number or customer phone fragment.
    #[instrument(skip(self))]
    pub async fn search_repairs(
        &self,
        term: &str,
    ) -> Result<Vec<repair_order::Model>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let db = self.db_pool.as_ref();
        let repairs = repair_order::Entity::find()
            .filter(
                Condition::any()
                    .add(repair_order::Column::TicketNumber.contains(term))
                    .add(repair_order::Column::CustomerPhone.contains(term)),
            )
            .order_by_desc(repair_order::Column::CreatedAt)
            .limit(SEARCH_LIMIT)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(repairs)
    }

    /// Updates non-workflow fields, re-validating whatever changes.
    #[instrument(skip(self, input))]
    pub async fn update_repair(
        &self,
        id: Uuid,
        input: UpdateRepairInput,
    ) -> Result<repair_order::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = repair_order::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Repair order {} not found", id)))?;

        let mut errors = BTreeMap::new();

        let estimated_cost = match &input.estimated_cost {
            Some(raw) => match validation::parse_money(raw) {
                Ok(amount) if amount > rust_decimal::Decimal::ZERO => Some(amount),
                Ok(_) => {
                    errors.insert("estimated_cost", "must be greater than zero".to_string());
                    None
                }
                Err(message) => {
                    errors.insert("estimated_cost", message);
                    None
                }
            },
            None => Some(existing.estimated_cost),
        };
        let advance_payment = match &input.advance_payment {
            Some(raw) => match validation::parse_money(raw) {
                Ok(amount) => Some(amount),
                Err(message) => {
                    errors.insert("advance_payment", message);
                    None
                }
            },
            None => Some(existing.advance_payment),
        };
        let extra_expenses = match &input.extra_expenses {
            Some(raw) => match validation::parse_money(raw) {
                Ok(amount) => Some(amount),
                Err(message) => {
                    errors.insert("extra_expenses", message);
                    None
                }
            },
            None => Some(existing.extra_expenses),
        };

        if let (Some(estimated), Some(advance)) = (estimated_cost, advance_payment) {
            if advance > estimated {
                errors.insert(
                    "advance_payment",
                    "must not exceed the estimated cost".to_string(),
                );
            }
        }

        if let Some(deadline) = input.deadline {
            if deadline < existing.date_received {
                errors.insert(
                    "deadline",
                    "must not be earlier than the date received".to_string(),
                );
            }
        }

        if let Some(notes) = &input.notes {
            if notes.chars().count() > validation::NOTES_MAX_CHARS {
                errors.insert(
                    "notes",
                    format!("must be at most {} characters", validation::NOTES_MAX_CHARS),
                );
            }
        }

        if !errors.is_empty() {
            return Err(field_errors(errors));
        }

        if let Some(technician_id) = input.technician_id {
            self.users.require_active_technician(technician_id).await?;
        }

        let mut active: repair_order::ActiveModel = existing.into();
        if let Some(device_type) = input.device_type {
            active.device_type = Set(device_type);
        }
        if let Some(device_model) = input.device_model {
            active.device_model = Set(device_model);
        }
        if let Some(reported_issue) = input.reported_issue {
            active.reported_issue = Set(reported_issue);
        }
        if let Some(technician_id) = input.technician_id {
            active.technician_id = Set(technician_id);
        }
        if let Some(deadline) = input.deadline {
            active.deadline = Set(deadline);
        }
        if let (Some(_), Some(amount)) = (&input.estimated_cost, estimated_cost) {
            active.estimated_cost = Set(amount);
        }
        if let (Some(_), Some(amount)) = (&input.advance_payment, advance_payment) {
            active.advance_payment = Set(amount);
        }
        if let (Some(_), Some(amount)) = (&input.extra_expenses, extra_expenses) {
            active.extra_expenses = Set(amount);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes).filter(|n| !n.trim().is_empty()));
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        self.event_sender
            .send_or_log(Event::RepairUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Moves a ticket forward through its lifecycle. A rejected
    /// transition carries the validator's diagnostic and issues no
    /// update at all.
    #[instrument(skip(self), fields(repair_id = %id, new_status = %new_status))]
    pub async fn change_status(
        &self,
        id: Uuid,
        new_status: &str,
    ) -> Result<repair_order::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let txn = db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::db_error(e)
        })?;

        let order = repair_order::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Repair order {} not found", id)))?;

        let old_status = order.status.clone();
        let diagnostic = lifecycle::explain_invalid_transition(&old_status, new_status);
        if !diagnostic.is_empty() {
            error!(
                "Rejected status transition from '{}' to '{}': {}",
                old_status, new_status, diagnostic
            );
            return Err(ServiceError::InvalidTransition(diagnostic));
        }

        let mut active: repair_order::ActiveModel = order.into();
        active.status = Set(new_status.to_string());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::RepairStatusChanged {
                repair_id: id,
                old_status: old_status.clone(),
                new_status: new_status.to_string(),
            })
            .await;
        info!(
            "Repair {} status updated from '{}' to '{}'",
            id, old_status, new_status
        );

        Ok(updated)
    }

    /// Statuses the ticket can still move to, in lifecycle order.
    #[instrument(skip(self))]
    pub async fn next_statuses(&self, id: Uuid) -> Result<Vec<RepairStatus>, ServiceError> {
        let order = self
            .get_repair(&id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Repair order {} not found", id)))?;
        Ok(lifecycle::valid_next_statuses(RepairStatus::parse(
            &order.status,
        )))
    }

    /// Builds a prefilled draft from a warranty lookup. Not-found
    /// propagates so the caller knows nothing was filled in.
    #[instrument(skip(self))]
    pub async fn prefill_from_serial(&self, serial: &str) -> Result<RepairDraft, ServiceError> {
        let mut draft = RepairDraft::new();
        let token = draft.begin_serial_lookup(serial);

        match self.warranties.resolve_by_serial(serial).await {
            Ok(info) => {
                draft.apply_warranty_resolution(token, &info);
                Ok(draft)
            }
            Err(err @ ServiceError::NotFound(_)) => {
                draft.resolution_not_found(token);
                Err(err)
            }
            Err(other) => Err(other),
        }
    }

    /// Deletes a ticket. Terminal, staff-initiated.
    #[instrument(skip(self))]
    pub async fn delete_repair(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let result = repair_order::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Repair order {} not found",
                id
            )));
        }

        self.event_sender
            .send_or_log(Event::RepairDeleted(id))
            .await;
        Ok(())
    }
}

fn field_errors(errors: BTreeMap<&'static str, String>) -> ServiceError {
    ServiceError::FieldValidation(
        errors
            .into_iter()
            .map(|(field, message)| (field.to_string(), message))
            .collect(),
    )
}

fn generate_ticket_number() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..=999_999);
    format!("RPR-{}-{:06}", Utc::now().format("%Y"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_numbers_carry_the_year_and_a_six_digit_suffix() {
        let ticket = generate_ticket_number();
        let parts: Vec<&str> = ticket.split('-').collect();
        assert_eq!(parts[0], "RPR");
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[2].len(), 6);
    }
}

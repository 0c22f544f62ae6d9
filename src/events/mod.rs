//! Domain events emitted by the services and consumed by a background
//! processing loop. Event delivery is best-effort: a full or closed
//! channel is logged and never fails the originating operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating delivery failure.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

// The events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Repair ticket events
    RepairCreated(Uuid),
    RepairUpdated(Uuid),
    RepairStatusChanged {
        repair_id: Uuid,
        old_status: String,
        new_status: String,
    },
    RepairDeleted(Uuid),

    // Customer events
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),

    // Warranty events
    WarrantyRegistered {
        registration_id: Uuid,
        serial_number: String,
    },

    // Product / inventory events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    StockAdjusted {
        product_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
        reason: String,
    },

    // Staff events
    UserCreated(Uuid),
    UserDeactivated(Uuid),

    // Generic event data
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

/// Background consumer for the event channel. Handlers here are
/// logging-only today; anything heavier hangs off this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::RepairStatusChanged {
                repair_id,
                old_status,
                new_status,
            } => {
                info!(
                    repair_id = %repair_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Repair status changed"
                );
            }
            Event::StockAdjusted {
                product_id,
                old_quantity,
                new_quantity,
                reason,
            } => {
                if *new_quantity == 0 {
                    warn!(product_id = %product_id, reason = %reason, "Product is out of stock");
                }
                info!(
                    product_id = %product_id,
                    old_quantity,
                    new_quantity,
                    "Stock adjusted"
                );
            }
            Event::Generic { message, .. } => {
                info!("Event: {}", message);
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    error!("Event channel closed; event processing loop exiting");
}

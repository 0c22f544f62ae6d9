pub mod common;
pub mod customers;
pub mod inventory;
pub mod products;
pub mod repairs;
pub mod users;
pub mod warranties;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub warranties: Arc<crate::services::warranties::WarrantyService>,
    pub products: Arc<crate::services::products::ProductService>,
    pub users: Arc<crate::services::users::UserService>,
    pub repairs: Arc<crate::services::repairs::RepairService>,
}

impl AppServices {
    /// Wires every service onto the shared pool and event channel.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let customers = Arc::new(crate::services::customers::CustomerService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let warranties = Arc::new(crate::services::warranties::WarrantyService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let products = Arc::new(crate::services::products::ProductService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let users = Arc::new(crate::services::users::UserService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let repairs = Arc::new(crate::services::repairs::RepairService::new(
            db_pool,
            event_sender,
            customers.clone(),
            warranties.clone(),
            users.clone(),
        ));

        Self {
            customers,
            warranties,
            products,
            users,
            repairs,
        }
    }
}

//! In-progress repair form with warranty auto-fill.
//!
//! A draft tracks where each field group came from so that clearing a
//! serial number can cascade correctly: fields a serial lookup filled
//! in are cleared with it, fields the user typed are left alone.
//! Lookup results are applied through [`SearchToken`]s so a stale
//! response arriving late can never overwrite newer input.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{SearchSequence, SearchToken, WarrantyInfo};

/// What became of an arriving lookup result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The result belonged to the latest lookup and was applied.
    Applied,
    /// A newer lookup superseded this one; the result was discarded.
    Stale,
}

/// Attempted direct edit of a field locked by a warranty resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("field is locked by a warranty lookup; clear the serial number to edit it")]
pub struct FieldLocked;

/// A repair ticket form being assembled.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RepairDraft {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub device_type: String,
    pub device_model: String,
    pub serial_number: Option<String>,
    /// Derived from resolution; not independently editable once set.
    pub warranty_flag: bool,

    customer_locked: bool,
    device_locked: bool,
    /// Customer fields were populated by the current serial's lookup.
    customer_from_serial: bool,
    device_from_serial: bool,

    #[serde(skip)]
    lookups: SearchSequence,
}

impl RepairDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_locked(&self) -> bool {
        self.customer_locked
    }

    pub fn device_locked(&self) -> bool {
        self.device_locked
    }

    /// Registers a serial number keystroke and issues the token for
    /// its lookup. Any earlier in-flight lookup becomes stale.
    pub fn begin_serial_lookup(&mut self, serial: &str) -> SearchToken {
        self.serial_number = Some(serial.to_string());
        self.lookups.issue()
    }

    /// Applies a successful warranty resolution, unless a newer lookup
    /// has superseded it. Customer fields are always overwritten;
    /// device fields only when the user has not provided them.
    pub fn apply_warranty_resolution(
        &mut self,
        token: SearchToken,
        info: &WarrantyInfo,
    ) -> ResolutionOutcome {
        if !self.lookups.is_current(token) {
            return ResolutionOutcome::Stale;
        }

        self.customer_name = info.customer_name.clone();
        self.customer_phone = info.customer_phone.clone();
        self.customer_email = info.customer_email.clone();
        self.customer_locked = true;
        self.customer_from_serial = true;

        if self.device_type.trim().is_empty() && self.device_model.trim().is_empty() {
            self.device_type = info.category.clone();
            self.device_model = info.product_name.clone();
            self.device_locked = true;
            self.device_from_serial = true;
        }

        self.warranty_flag = info.is_under_warranty;
        ResolutionOutcome::Applied
    }

    /// Records that the lookup found nothing. Existing values stay
    /// untouched; fields locked by an earlier resolution unlock.
    pub fn resolution_not_found(&mut self, token: SearchToken) -> ResolutionOutcome {
        if !self.lookups.is_current(token) {
            return ResolutionOutcome::Stale;
        }
        self.customer_locked = false;
        self.device_locked = false;
        self.customer_from_serial = false;
        self.device_from_serial = false;
        ResolutionOutcome::Applied
    }

    /// Clears the serial number, cascading to everything it filled in:
    /// device fields and the warranty flag always, customer fields
    /// only when the same lookup populated them.
    pub fn clear_serial(&mut self) {
        self.serial_number = None;
        self.warranty_flag = false;

        if self.device_from_serial {
            self.device_type.clear();
            self.device_model.clear();
        }
        self.device_locked = false;
        self.device_from_serial = false;

        if self.customer_from_serial {
            self.customer_name.clear();
            self.customer_phone.clear();
            self.customer_email.clear();
        }
        self.customer_locked = false;
        self.customer_from_serial = false;
    }

    /// Clears customer fields only. Device fields are unaffected.
    pub fn clear_customer(&mut self) {
        self.customer_name.clear();
        self.customer_phone.clear();
        self.customer_email.clear();
        self.customer_locked = false;
        self.customer_from_serial = false;
    }

    pub fn set_customer_name(&mut self, value: &str) -> Result<(), FieldLocked> {
        if self.customer_locked {
            return Err(FieldLocked);
        }
        self.customer_name = value.to_string();
        Ok(())
    }

    pub fn set_customer_phone(&mut self, value: &str) -> Result<(), FieldLocked> {
        if self.customer_locked {
            return Err(FieldLocked);
        }
        self.customer_phone = value.to_string();
        Ok(())
    }

    pub fn set_customer_email(&mut self, value: &str) -> Result<(), FieldLocked> {
        if self.customer_locked {
            return Err(FieldLocked);
        }
        self.customer_email = value.to_string();
        Ok(())
    }

    pub fn set_device_type(&mut self, value: &str) -> Result<(), FieldLocked> {
        if self.device_locked {
            return Err(FieldLocked);
        }
        self.device_type = value.to_string();
        Ok(())
    }

    pub fn set_device_model(&mut self, value: &str) -> Result<(), FieldLocked> {
        if self.device_locked {
            return Err(FieldLocked);
        }
        self.device_model = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn warranty_info() -> WarrantyInfo {
        WarrantyInfo::derive(
            "SN-1001".to_string(),
            "ProBook 450".to_string(),
            "Laptop".to_string(),
            "Kamal Silva".to_string(),
            "0712345678".to_string(),
            "kamal@example.com".to_string(),
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            12,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    #[test]
    fn resolution_fills_and_locks_fields() {
        let mut draft = RepairDraft::new();
        let token = draft.begin_serial_lookup("SN-1001");
        assert_eq!(
            draft.apply_warranty_resolution(token, &warranty_info()),
            ResolutionOutcome::Applied
        );

        assert_eq!(draft.customer_name, "Kamal Silva");
        assert_eq!(draft.device_model, "ProBook 450");
        assert!(draft.warranty_flag);
        assert_eq!(draft.set_customer_name("someone else"), Err(FieldLocked));
        assert_eq!(draft.set_device_model("other model"), Err(FieldLocked));
    }

    #[test]
    fn user_entered_device_fields_survive_resolution() {
        let mut draft = RepairDraft::new();
        draft.set_device_type("Desktop").unwrap();
        draft.set_device_model("Custom build").unwrap();

        let token = draft.begin_serial_lookup("SN-1001");
        draft.apply_warranty_resolution(token, &warranty_info());

        assert_eq!(draft.device_type, "Desktop");
        assert_eq!(draft.device_model, "Custom build");
        assert!(!draft.device_locked());
        // Customer fields are still overwritten and locked.
        assert_eq!(draft.customer_name, "Kamal Silva");
        assert!(draft.customer_locked());
    }

    #[test]
    fn clearing_serial_cascades_to_auto_filled_customer() {
        let mut draft = RepairDraft::new();
        let token = draft.begin_serial_lookup("SN-1001");
        draft.apply_warranty_resolution(token, &warranty_info());

        draft.clear_serial();

        assert_eq!(draft.serial_number, None);
        assert!(draft.customer_name.is_empty());
        assert!(draft.device_model.is_empty());
        assert!(!draft.warranty_flag);
        assert!(!draft.customer_locked());
        assert!(draft.set_customer_name("typed by hand").is_ok());
    }

    #[test]
    fn clearing_serial_preserves_manually_entered_customer() {
        let mut draft = RepairDraft::new();
        draft.set_customer_name("Typed Customer").unwrap();
        draft.set_customer_phone("0779999999").unwrap();

        // Lookup that never resolved: customer stays manual.
        let token = draft.begin_serial_lookup("SN-UNKNOWN");
        draft.resolution_not_found(token);
        draft.clear_serial();

        assert_eq!(draft.customer_name, "Typed Customer");
        assert_eq!(draft.customer_phone, "0779999999");
    }

    #[test]
    fn clearing_customer_leaves_device_alone() {
        let mut draft = RepairDraft::new();
        let token = draft.begin_serial_lookup("SN-1001");
        draft.apply_warranty_resolution(token, &warranty_info());

        draft.clear_customer();

        assert!(draft.customer_name.is_empty());
        assert_eq!(draft.device_model, "ProBook 450");
        assert_eq!(draft.serial_number.as_deref(), Some("SN-1001"));
    }

    #[test]
    fn not_found_leaves_values_and_unlocks() {
        let mut draft = RepairDraft::new();
        let token = draft.begin_serial_lookup("SN-1001");
        draft.apply_warranty_resolution(token, &warranty_info());

        let retry = draft.begin_serial_lookup("SN-MISSING");
        assert_eq!(
            draft.resolution_not_found(retry),
            ResolutionOutcome::Applied
        );

        assert_eq!(draft.customer_name, "Kamal Silva");
        assert!(!draft.customer_locked());
        assert!(draft.set_customer_name("corrected by staff").is_ok());
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let mut draft = RepairDraft::new();
        let first = draft.begin_serial_lookup("SN-1");
        let _second = draft.begin_serial_lookup("SN-2");

        // The response for the first keystroke arrives late.
        assert_eq!(
            draft.apply_warranty_resolution(first, &warranty_info()),
            ResolutionOutcome::Stale
        );
        assert!(draft.customer_name.is_empty());
        assert!(!draft.warranty_flag);
    }
}

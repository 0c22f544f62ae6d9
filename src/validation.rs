//! Field validation for repair ticket submissions.
//!
//! Every validator here is pure and independent: `validate_all` runs
//! all of them without short-circuiting and returns a field→message
//! map whose emptiness decides submittability. Nothing in this module
//! touches the database.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Accepted literal for customers without an email address.
pub const EMAIL_NOT_AVAILABLE: &str = "Not Available";

/// Upper bound on free-text notes.
pub const NOTES_MAX_CHARS: usize = 500;

// Local numbers (07XXXXXXXX) or the international form (+947XXXXXXXX),
// checked after stripping whitespace.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(07\d{8}|\+947\d{8})$").expect("phone pattern compiles"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Validates a shop-region phone number.
pub fn is_valid_phone(raw: &str) -> bool {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&stripped)
}

/// Validates an email address, accepting the "Not Available" sentinel.
pub fn is_valid_email(raw: &str) -> bool {
    raw == EMAIL_NOT_AVAILABLE || EMAIL_RE.is_match(raw.trim())
}

/// Parses a monetary form field into a non-negative decimal,
/// tolerating thousands separators ("1,500.00") and whitespace.
pub fn parse_money(raw: &str) -> Result<Decimal, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Err("must be a number".to_string());
    }
    let amount: Decimal = cleaned
        .parse()
        .map_err(|_| format!("'{}' is not a valid amount", raw.trim()))?;
    if amount.is_sign_negative() {
        return Err("must not be negative".to_string());
    }
    Ok(amount)
}

/// Outstanding balance on a ticket. Derived, never stored.
pub fn due_amount(estimated_cost: Decimal, extra_expenses: Decimal, advance_payment: Decimal) -> Decimal {
    estimated_cost + extra_expenses - advance_payment
}

/// Monetary fields of a submission after normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepairCharges {
    pub estimated_cost: Decimal,
    pub advance_payment: Decimal,
    pub extra_expenses: Decimal,
}

/// A repair ticket as entered by staff, before persistence.
///
/// Monetary fields stay as the raw form text so validation can report
/// on exactly what was typed; `charges()` yields the parsed amounts
/// once the submission is clean.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RepairSubmission {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub device_type: String,
    pub device_model: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    pub reported_issue: String,
    pub technician_id: Option<Uuid>,
    pub date_received: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_cost: String,
    #[serde(default)]
    pub advance_payment: String,
    #[serde(default)]
    pub extra_expenses: String,
    #[serde(default)]
    pub notes: String,
}

impl RepairSubmission {
    /// Runs every field validator independently. Returns a map of
    /// field name to error message; an empty map means submittable.
    pub fn validate_all(&self, today: NaiveDate) -> BTreeMap<&'static str, String> {
        let mut errors = BTreeMap::new();

        for (field, value) in [
            ("customer_name", &self.customer_name),
            ("device_type", &self.device_type),
            ("device_model", &self.device_model),
            ("reported_issue", &self.reported_issue),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, "is required".to_string());
            }
        }

        if !is_valid_phone(&self.customer_phone) {
            errors.insert(
                "customer_phone",
                "must be a valid phone number (07XXXXXXXX or +947XXXXXXXX)".to_string(),
            );
        }

        if !is_valid_email(&self.customer_email) {
            errors.insert(
                "customer_email",
                format!("must be a valid email address or '{}'", EMAIL_NOT_AVAILABLE),
            );
        }

        if self.technician_id.is_none() {
            errors.insert("technician_id", "a technician must be assigned".to_string());
        }

        match self.deadline {
            None => {
                errors.insert("deadline", "is required".to_string());
            }
            Some(deadline) => {
                let received = self.date_received.unwrap_or(today);
                if deadline < received {
                    errors.insert(
                        "deadline",
                        "must not be earlier than the date received".to_string(),
                    );
                }
            }
        }

        let estimated = match parse_money(&self.estimated_cost) {
            Ok(amount) if amount > Decimal::ZERO => Some(amount),
            Ok(_) => {
                errors.insert("estimated_cost", "must be greater than zero".to_string());
                None
            }
            Err(message) => {
                errors.insert("estimated_cost", message);
                None
            }
        };

        let advance = match self.optional_money(&self.advance_payment) {
            Ok(amount) => Some(amount),
            Err(message) => {
                errors.insert("advance_payment", message);
                None
            }
        };

        if let Err(message) = self.optional_money(&self.extra_expenses) {
            errors.insert("extra_expenses", message);
        }

        if let (Some(estimated), Some(advance)) = (estimated, advance) {
            if advance > estimated {
                errors.insert(
                    "advance_payment",
                    "must not exceed the estimated cost".to_string(),
                );
            }
        }

        if self.notes.chars().count() > NOTES_MAX_CHARS {
            errors.insert(
                "notes",
                format!("must be at most {} characters", NOTES_MAX_CHARS),
            );
        }

        errors
    }

    /// Parsed monetary fields, available once `validate_all` is clean.
    pub fn charges(&self) -> Option<RepairCharges> {
        let estimated_cost = parse_money(&self.estimated_cost).ok()?;
        let advance_payment = self.optional_money(&self.advance_payment).ok()?;
        let extra_expenses = self.optional_money(&self.extra_expenses).ok()?;
        if estimated_cost <= Decimal::ZERO || advance_payment > estimated_cost {
            return None;
        }
        Some(RepairCharges {
            estimated_cost,
            advance_payment,
            extra_expenses,
        })
    }

    // Advance and extras default to zero when the field is left blank.
    fn optional_money(&self, raw: &str) -> Result<Decimal, String> {
        if raw.trim().is_empty() {
            Ok(Decimal::ZERO)
        } else {
            parse_money(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn submission() -> RepairSubmission {
        RepairSubmission {
            customer_name: "Nimal Perera".to_string(),
            customer_phone: "0712345678".to_string(),
            customer_email: "nimal@example.com".to_string(),
            device_type: "Laptop".to_string(),
            device_model: "ThinkPad T14".to_string(),
            serial_number: Some("SN-4411".to_string()),
            reported_issue: "No display on boot".to_string(),
            technician_id: Some(Uuid::new_v4()),
            date_received: Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            deadline: Some(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()),
            estimated_cost: "12,500.00".to_string(),
            advance_payment: "2,000".to_string(),
            extra_expenses: String::new(),
            notes: "Customer will call before pickup".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn complete_submission_passes() {
        assert!(submission().validate_all(today()).is_empty());
    }

    #[test]
    fn phone_validator_accepts_regional_formats() {
        assert!(is_valid_phone("0712345678"));
        assert!(is_valid_phone("+94712345678"));
        assert!(is_valid_phone("071 234 5678"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("0812345678"));
    }

    #[test]
    fn email_validator_accepts_sentinel() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email(EMAIL_NOT_AVAILABLE));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("not available"));
    }

    #[test]
    fn money_parser_strips_thousands_separators() {
        assert_eq!(parse_money("1,500.00"), Ok(dec!(1500.00)));
        assert_eq!(parse_money(" 250 "), Ok(dec!(250)));
        assert!(parse_money("-10").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("").is_err());
    }

    #[test]
    fn advance_exceeding_estimate_always_errors() {
        let mut sub = submission();
        sub.estimated_cost = "1,500.00".to_string();
        sub.advance_payment = "2,000.00".to_string();
        let errors = sub.validate_all(today());
        assert_eq!(
            errors.get("advance_payment").map(String::as_str),
            Some("must not exceed the estimated cost")
        );
        assert!(sub.charges().is_none());

        // Still reported when unrelated fields are broken too.
        sub.customer_name.clear();
        let errors = sub.validate_all(today());
        assert!(errors.contains_key("advance_payment"));
        assert!(errors.contains_key("customer_name"));
    }

    #[test]
    fn estimated_cost_must_be_positive() {
        let mut sub = submission();
        sub.estimated_cost = "0".to_string();
        sub.advance_payment = String::new();
        let errors = sub.validate_all(today());
        assert!(errors.contains_key("estimated_cost"));
    }

    #[test]
    fn deadline_before_date_received_is_rejected() {
        let mut sub = submission();
        sub.deadline = Some(NaiveDate::from_ymd_opt(2025, 2, 20).unwrap());
        let errors = sub.validate_all(today());
        assert!(errors.contains_key("deadline"));
    }

    #[test]
    fn notes_are_capped() {
        let mut sub = submission();
        sub.notes = "x".repeat(NOTES_MAX_CHARS + 1);
        assert!(sub.validate_all(today()).contains_key("notes"));

        sub.notes = "x".repeat(NOTES_MAX_CHARS);
        assert!(!sub.validate_all(today()).contains_key("notes"));
    }

    #[test]
    fn all_fields_validated_without_short_circuit() {
        let sub = RepairSubmission::default();
        let errors = sub.validate_all(today());
        for field in [
            "customer_name",
            "customer_phone",
            "customer_email",
            "device_type",
            "device_model",
            "reported_issue",
            "technician_id",
            "deadline",
            "estimated_cost",
        ] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn blank_advance_and_extras_default_to_zero() {
        let mut sub = submission();
        sub.advance_payment = String::new();
        sub.extra_expenses = String::new();
        let charges = sub.charges().expect("charges parse");
        assert_eq!(charges.advance_payment, Decimal::ZERO);
        assert_eq!(charges.extra_expenses, Decimal::ZERO);
    }

    #[test]
    fn due_amount_is_derived() {
        assert_eq!(
            due_amount(dec!(12500), dec!(750), dec!(2000)),
            dec!(11250)
        );
    }
}

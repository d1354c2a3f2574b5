//! # Validation Module
//!
//! Input validation for booking, checkout and catalog administration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI form)                                              │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Shape checks (length, charset, ranges)                             │
//! │  └── Returns trimmed / normalised values                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine + Database                                             │
//! │  ├── Referenced staff/service exist and are active                      │
//! │  ├── UNIQUE slot index, UNIQUE numbers                                  │
//! │  └── CHECK loyalty_points >= 0                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salon_core::validation::{validate_customer_name, validate_phone};
//!
//! assert_eq!(validate_customer_name("  Omar ").unwrap(), "Omar");
//! assert!(validate_phone("0300-1234567").is_ok());
//! assert!(validate_phone("12345").is_err());
//! ```

use crate::error::ValidationError;
use crate::requests::{CustomerInput, ServiceInput, StaffInput};
use crate::{MAX_NAME_LEN, MAX_NOTES_LEN, MAX_PRICE_CENTS, MAX_SESSION_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims optional free text; blank becomes `None`.
fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Validates a customer or staff display name (1-100 characters).
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    required_text("customer_name", name, MAX_NAME_LEN)
}

/// Validates a phone number.
///
/// ## Rules
/// - 8 to 20 characters after trimming
/// - Digits, `+`, `-` and spaces only
/// - At least one digit
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let len = phone.chars().count();
    if len < 8 {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: 8,
        });
    }
    if len > 20 {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: 20,
        });
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ')
        || !phone.chars().any(|c| c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, '+', '-' and spaces".to_string(),
        });
    }

    Ok(phone.to_string())
}

pub fn validate_email(email: Option<&str>) -> ValidationResult<Option<String>> {
    let email = optional_text("email", email, 254)?;
    if let Some(e) = &email {
        let valid = e
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "must look like name@domain.tld".to_string(),
            });
        }
    }
    Ok(email)
}

/// Validates free-text notes (at most 500 characters).
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    optional_text("notes", notes, MAX_NOTES_LEN)
}

/// Validates a payment method label ("cash", "card", "bank transfer", ...).
///
/// The label is stored as given; no payment is processed.
pub fn validate_payment_method(method: &str) -> ValidationResult<String> {
    required_text("payment_method", method, 50)
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string; empty means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price, cost, override or discount in cents. Zero is allowed,
/// anything above [`MAX_PRICE_CENTS`] is not.
///
/// ## Example
/// ```rust
/// use salon_core::validation::validate_price_cents;
/// use salon_core::MAX_PRICE_CENTS;
///
/// assert!(validate_price_cents("price", 4000).is_ok());
/// assert!(validate_price_cents("price", 0).is_ok());
/// assert!(validate_price_cents("price", -100).is_err());
/// assert!(validate_price_cents("price", MAX_PRICE_CENTS + 1).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a commission rate in basis points (0% to 100%).
pub fn validate_commission_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "commission_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a service duration (1 minute to 8 hours).
pub fn validate_duration(minutes: i64) -> ValidationResult<()> {
    if minutes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration_minutes".to_string(),
        });
    }
    if minutes > 480 {
        return Err(ValidationError::OutOfRange {
            field: "duration_minutes".to_string(),
            min: 1,
            max: 480,
        });
    }

    Ok(())
}

pub fn validate_rating(rating: u8) -> ValidationResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        });
    }

    Ok(())
}

/// Validates the number of lines in a checkout.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "service_ids".to_string(),
        });
    }
    if count > MAX_SESSION_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "service_ids".to_string(),
            min: 1,
            max: MAX_SESSION_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates and normalises a customer block.
pub fn validate_customer_input(input: &CustomerInput) -> ValidationResult<CustomerInput> {
    Ok(CustomerInput {
        name: validate_customer_name(&input.name)?,
        phone: validate_phone(&input.phone)?,
        email: validate_email(input.email.as_deref())?,
        notes: validate_notes(input.notes.as_deref())?,
    })
}

pub fn validate_service_input(input: &ServiceInput) -> ValidationResult<ServiceInput> {
    validate_duration(input.duration_minutes)?;
    validate_price_cents("price", input.price_cents)?;
    validate_price_cents("cost", input.cost_cents)?;
    if let Some(bps) = input.commission_rate_bps {
        validate_commission_rate_bps(bps)?;
    }

    Ok(ServiceInput {
        name: required_text("name", &input.name, MAX_NAME_LEN)?,
        category: required_text("category", &input.category, 50)?,
        description: optional_text("description", input.description.as_deref(), MAX_NOTES_LEN)?,
        ..input.clone()
    })
}

pub fn validate_staff_input(input: &StaffInput) -> ValidationResult<StaffInput> {
    if let Some(bps) = input.commission_rate_bps {
        validate_commission_rate_bps(bps)?;
    }
    let phone = match input.phone.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(p) => Some(validate_phone(p)?),
    };

    Ok(StaffInput {
        name: required_text("name", &input.name, MAX_NAME_LEN)?,
        phone,
        specialization: optional_text("specialization", input.specialization.as_deref(), 100)?,
        ..input.clone()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

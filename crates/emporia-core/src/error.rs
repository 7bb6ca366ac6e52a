//! # Error Types
//!
//! Domain-specific error types for emporia-core.
//!
//! Errors flow upward through the layers:
//! `ValidationError` → `CoreError` → `DbError` (emporia-db) →
//! `EngineError` (emporia-engine), which is what callers finally see.
//! Every variant maps to a user-visible message at the operation boundary;
//! none propagate as unhandled faults under correct input.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule violations.
///
/// These are recovered at the operation boundary and surfaced as a
/// user-visible message plus a return to a safe prior state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stock item cannot be found in the owner inventory.
    #[error("Stock item not found: {0}")]
    ItemNotFound(String),

    /// Shop cannot be found.
    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    /// User identity cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Order (online or POS) cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Requested quantity is zero or negative.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Requested more units than are available.
    ///
    /// Raised by transfers (owner quantity short), add-to-cart
    /// (availability after in-cart reconciliation is zero), checkout and
    /// POS sale (conditional decrement found fewer units than requested).
    #[error("Insufficient stock for {title}: available {available}, requested {requested}")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },

    /// A sale was submitted with no valid line items.
    #[error("No items selected")]
    NoItemsSelected,

    /// No resolvable current-user context where one is required.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Cart has exceeded maximum allowed unique items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

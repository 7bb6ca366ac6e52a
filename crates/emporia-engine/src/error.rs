//! # Engine Error Type
//!
//! Unified error type for engine operations.
//!
//! Every failure an operation can produce is folded into a single
//! serializable error with a machine-readable code and a human-readable
//! message. Callers surface the message and return the actor to a safe
//! prior screen; nothing here is retried automatically.

use serde::Serialize;
use emporia_core::CoreError;
use emporia_db::DbError;

/// Error returned from engine operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Oak Bookshelf: available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for engine responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (shop, item, order, user)
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Business rule violation
    BusinessLogic,

    /// Internal error
    Internal,

    /// Cart operation failed
    CartError,

    /// Requested more units than available
    InsufficientStock,

    /// Sale submitted with no valid line items
    NoItemsSelected,

    /// No resolvable current-user context
    Unauthorized,
}

impl EngineError {
    /// Creates a new engine error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        EngineError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        EngineError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::new(ErrorCode::Internal, message)
    }

    /// Creates an insufficient-stock error naming the short item.
    pub fn insufficient_stock(title: &str, available: i64, requested: i64) -> Self {
        EngineError::new(
            ErrorCode::InsufficientStock,
            format!(
                "Insufficient stock for {}: available {}, requested {}",
                title, available, requested
            ),
        )
    }
}

/// Converts database errors to engine errors.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => EngineError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                EngineError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                EngineError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                EngineError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                EngineError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                EngineError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                EngineError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                EngineError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to engine errors.
impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => EngineError::not_found("Stock item", &id),
            CoreError::ShopNotFound(id) => EngineError::not_found("Shop", &id),
            CoreError::UserNotFound(id) => EngineError::not_found("User", &id),
            CoreError::OrderNotFound(id) => EngineError::not_found("Order", &id),
            CoreError::InvalidQuantity(qty) => EngineError::new(
                ErrorCode::ValidationError,
                format!("Invalid quantity: {}", qty),
            ),
            CoreError::InsufficientStock {
                title,
                available,
                requested,
            } => EngineError::insufficient_stock(&title, available, requested),
            CoreError::NoItemsSelected => {
                EngineError::new(ErrorCode::NoItemsSelected, "No items selected")
            }
            CoreError::Unauthorized(reason) => EngineError::new(ErrorCode::Unauthorized, reason),
            CoreError::CartTooLarge { max } => EngineError::new(
                ErrorCode::CartError,
                format!("Cart cannot have more than {} items", max),
            ),
            CoreError::QuantityTooLarge { requested, max } => EngineError::new(
                ErrorCode::ValidationError,
                format!("Quantity {} exceeds maximum allowed ({})", requested, max),
            ),
            CoreError::Validation(e) => EngineError::validation(e.to_string()),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

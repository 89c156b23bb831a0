// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::policy::DenyReason;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to the JSON error envelope used by every non-2xx response
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        ApiError::forbidden(reason.message())
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::ConfigMissing(_) => {
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::manager::DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("DATABASE_URL could not be parsed");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::manager::DatabaseError::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("SQLx error: {}", err);
        ApiError::internal_server_error("Database error occurred")
    }
}

impl From<crate::services::tenant_service::TenantError> for ApiError {
    fn from(err: crate::services::tenant_service::TenantError) -> Self {
        use crate::services::tenant_service::TenantError;
        match err {
            TenantError::InvalidName(msg) => ApiError::bad_request(msg),
            TenantError::MailboxTaken => {
                ApiError::conflict("A tenant with this mailbox address already exists")
            }
            TenantError::ProfileExists(email) => {
                ApiError::conflict(format!("User '{}' already belongs to a tenant", email))
            }
            TenantError::Hash(msg) => {
                tracing::error!("Password hashing failed: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            TenantError::NotFound => ApiError::not_found("Tenant not found"),
            TenantError::DatabaseManager(e) => e.into(),
            TenantError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::user_service::UserError> for ApiError {
    fn from(err: crate::services::user_service::UserError) -> Self {
        use crate::services::user_service::UserError;
        match err {
            UserError::EmailTaken(email) => {
                ApiError::conflict(format!("An account for '{}' already exists", email))
            }
            UserError::ProfileExists(email) => {
                ApiError::conflict(format!("User '{}' already belongs to a tenant", email))
            }
            UserError::InvalidRole(role) => {
                ApiError::bad_request(format!("Role must be admin or member, got '{}'", role))
            }
            UserError::NotFound => ApiError::not_found("User not found in your tenant"),
            UserError::Identity(e) => e.into(),
            UserError::DatabaseManager(e) => e.into(),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::identity_service::IdentityError> for ApiError {
    fn from(err: crate::services::identity_service::IdentityError) -> Self {
        use crate::services::identity_service::IdentityError;
        match err {
            IdentityError::EmailTaken(email) => {
                ApiError::conflict(format!("An account for '{}' already exists", email))
            }
            IdentityError::Hash(msg) => {
                tracing::error!("Password hashing failed: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            IdentityError::NotFound => ApiError::not_found("Account not found"),
            IdentityError::DatabaseManager(e) => e.into(),
            IdentityError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::case_service::CaseError> for ApiError {
    fn from(err: crate::services::case_service::CaseError) -> Self {
        use crate::services::case_service::CaseError;
        match err {
            CaseError::NotFound => ApiError::not_found("Case not found"),
            CaseError::DatabaseManager(e) => e.into(),
            CaseError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::slot_service::SlotError> for ApiError {
    fn from(err: crate::services::slot_service::SlotError) -> Self {
        use crate::services::slot_service::SlotError;
        match err {
            SlotError::InvalidRange => {
                ApiError::bad_request("end_time must be after start_time")
            }
            SlotError::NotFound => ApiError::not_found("Slot not found"),
            SlotError::DatabaseManager(e) => e.into(),
            SlotError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::availability_service::AvailabilityError> for ApiError {
    fn from(err: crate::services::availability_service::AvailabilityError) -> Self {
        use crate::services::availability_service::AvailabilityError;
        match err {
            AvailabilityError::UnknownSlots => {
                ApiError::bad_request("One or more slots do not belong to this case")
            }
            AvailabilityError::AlreadyResponded => {
                ApiError::bad_request("This email address has already responded for a selected slot")
            }
            AvailabilityError::DatabaseManager(e) => e.into(),
            AvailabilityError::Database(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standardized error codes for the investigation core.
/// Technical bands are business-agnostic; the 10000-10999 band is the
/// investigation domain's own set of screening-specific failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General System Errors (1000-1999)
    InternalServerError = 1000,
    ConfigurationError = 1001,
    ServiceUnavailable = 1002,
    Timeout = 1003,
    ResourceExhausted = 1004,

    // Persistence Errors (2000-2999)
    DatabaseConnectionError = 2000,
    DatabaseConstraintViolation = 2001,
    DatabaseTransactionError = 2002,
    DatabaseQueryError = 2003,

    // Network & Provider Communication Errors (3000-3999)
    NetworkError = 3000,
    NetworkTimeout = 3001,
    NetworkConnectionRefused = 3002,
    ExternalServiceError = 3003,
    SerializationError = 3004,

    // Security Errors (4000-4999)
    AuthenticationRequired = 4000,
    AuthenticationFailed = 4001,
    AuthorizationFailed = 4005,
    PermissionDenied = 4006,
    SecurityPolicyViolation = 4007,
    InvalidSignature = 4008,

    // Input Validation Errors (5000-5999)
    ValidationFailed = 5000,
    InvalidInput = 5001,
    MissingRequiredField = 5002,
    InvalidFormat = 5003,
    ValueOutOfRange = 5004,
    DuplicateValue = 5005,

    // Resource Management Errors (6000-6999)
    ResourceNotFound = 6000,
    ResourceAlreadyExists = 6001,
    ResourceLocked = 6002,
    NotFound = 6005,
    NotImplemented = 6006,

    // Rate Limiting Errors (7000-7999)
    RateLimitExceeded = 7000,
    TooManyRequests = 7001,

    // Cache & Storage Errors (8000-8999)
    CacheError = 8000,
    CacheMiss = 8001,
    StorageError = 8002,

    // Investigation domain errors (10000-10999)
    ComplianceBlock = 10000,
    ConsentMissing = 10001,
    NoProvider = 10002,
    AllRateLimited = 10003,
    CircuitOpenError = 10004,
    InvalidCheckType = 10005,
    ScreeningCancelled = 10006,
    ScreeningDeadlineExceeded = 10007,
    ProviderError = 10008,
}

impl ErrorCode {
    /// HTTP status this error should surface as at the REST boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::DatabaseConnectionError
            | ErrorCode::DatabaseTransactionError
            | ErrorCode::DatabaseQueryError
            | ErrorCode::NetworkError
            | ErrorCode::ExternalServiceError
            | ErrorCode::SerializationError
            | ErrorCode::CacheError
            | ErrorCode::StorageError
            | ErrorCode::ProviderError => 500,

            ErrorCode::ServiceUnavailable
            | ErrorCode::NetworkConnectionRefused
            | ErrorCode::AllRateLimited
            | ErrorCode::CircuitOpenError => 503,

            ErrorCode::Timeout | ErrorCode::NetworkTimeout | ErrorCode::ScreeningDeadlineExceeded => 408,

            ErrorCode::AuthenticationRequired | ErrorCode::AuthenticationFailed | ErrorCode::InvalidSignature => 401,

            ErrorCode::AuthorizationFailed
            | ErrorCode::PermissionDenied
            | ErrorCode::SecurityPolicyViolation
            | ErrorCode::ConsentMissing => 403,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::ValueOutOfRange
            | ErrorCode::InvalidCheckType
            | ErrorCode::ComplianceBlock => 400,

            ErrorCode::ResourceNotFound | ErrorCode::CacheMiss | ErrorCode::NoProvider => 404,

            ErrorCode::ResourceAlreadyExists | ErrorCode::DuplicateValue | ErrorCode::DatabaseConstraintViolation => {
                409
            }

            ErrorCode::ScreeningCancelled => 409,

            ErrorCode::ResourceLocked => 423,

            ErrorCode::RateLimitExceeded | ErrorCode::TooManyRequests => 429,

            ErrorCode::ResourceExhausted => 507,

            ErrorCode::NotFound => 404,

            ErrorCode::NotImplemented => 501,
        }
    }

    /// Error category for metrics and logging grouping.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::ServiceUnavailable
            | ErrorCode::Timeout
            | ErrorCode::ResourceExhausted => "system",

            ErrorCode::DatabaseConnectionError
            | ErrorCode::DatabaseConstraintViolation
            | ErrorCode::DatabaseTransactionError
            | ErrorCode::DatabaseQueryError => "database",

            ErrorCode::NetworkError
            | ErrorCode::NetworkTimeout
            | ErrorCode::NetworkConnectionRefused
            | ErrorCode::ExternalServiceError
            | ErrorCode::SerializationError
            | ErrorCode::ProviderError => "network",

            ErrorCode::AuthenticationRequired
            | ErrorCode::AuthenticationFailed
            | ErrorCode::AuthorizationFailed
            | ErrorCode::PermissionDenied
            | ErrorCode::SecurityPolicyViolation
            | ErrorCode::InvalidSignature => "security",

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::ValueOutOfRange
            | ErrorCode::DuplicateValue
            | ErrorCode::InvalidCheckType => "validation",

            ErrorCode::ResourceNotFound | ErrorCode::ResourceAlreadyExists | ErrorCode::ResourceLocked => "resource",

            ErrorCode::RateLimitExceeded | ErrorCode::TooManyRequests | ErrorCode::AllRateLimited => "rate_limit",

            ErrorCode::CacheError | ErrorCode::CacheMiss | ErrorCode::StorageError => "storage",

            ErrorCode::ComplianceBlock
            | ErrorCode::ConsentMissing
            | ErrorCode::NoProvider
            | ErrorCode::CircuitOpenError
            | ErrorCode::ScreeningCancelled
            | ErrorCode::ScreeningDeadlineExceeded => "investigation",

            ErrorCode::NotFound => "resource",
            ErrorCode::NotImplemented => "system",
        }
    }

    /// Whether a caller should attempt a retry/fallback for this code.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkTimeout
                | ErrorCode::NetworkConnectionRefused
                | ErrorCode::ServiceUnavailable
                | ErrorCode::DatabaseConnectionError
                | ErrorCode::CacheError
                | ErrorCode::ResourceExhausted
                | ErrorCode::ProviderError
        )
    }

    /// Whether this error should be logged at error level (vs. warn/info).
    pub fn should_log_as_error(&self) -> bool {
        !matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidInput
                | ErrorCode::MissingRequiredField
                | ErrorCode::InvalidFormat
                | ErrorCode::ValueOutOfRange
                | ErrorCode::ResourceNotFound
                | ErrorCode::AuthenticationFailed
                | ErrorCode::PermissionDenied
                | ErrorCode::RateLimitExceeded
                | ErrorCode::TooManyRequests
                | ErrorCode::ComplianceBlock
                | ErrorCode::ConsentMissing
                | ErrorCode::ScreeningCancelled
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

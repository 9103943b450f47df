//! # Error Handling Framework
//!
//! Structured error management for the investigation core, shared by every
//! domain crate:
//!
//! - **Structured Error Types**: categorized error codes for consistent handling
//! - **Rich Context**: request/tenant/screening metadata for debugging
//! - **Severity Classification**: error categorization for appropriate responses
//! - **Metrics Integration**: error tracking and monitoring
//!
//! ## Error Categories
//!
//! - **Validation**: input validation and business rule violations
//! - **Security**: consent/authorization failures
//! - **Network**: provider communication failures
//! - **Investigation**: screening-domain failures (compliance blocks,
//!   missing consent, exhausted providers, open circuit breakers)
//! - **Internal**: unexpected system errors
//!
//! ## Usage Examples
//!
//! ```rust
//! use investigation_core::error::{Error, ErrorCode, Result};
//!
//! fn require_consent(has_consent: bool) -> Result<()> {
//!     if !has_consent {
//!         return Err(Error::new(ErrorCode::ConsentMissing, "consent not on file"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod context;
pub mod framework;
pub mod metrics;

pub use codes::ErrorCode;
pub use context::ErrorContext;
pub use framework::{Error, ErrorCategory, ErrorSeverity, Result};
pub use metrics::ErrorMetrics;

pub mod event;
pub mod logger;
pub mod traits;

pub use event::{AuditEvent, AuditEventBuilder, EventOutcome, EventSeverity};
pub use logger::AuditLogger;
pub use traits::{AuditBackend, Auditable};

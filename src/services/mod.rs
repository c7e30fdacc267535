//! Business services layer.
//!
//! Services orchestrate the mail provider, credential store, and audit
//! sink into the three user-facing operations:
//!
//! - [`ScanService`]: enumerate senders seen in the scan window
//! - [`UnsubscribeService`]: execute unsubscribe directives, throttled
//!   across multi-sender selections
//! - [`TrashService`]: bulk-trash messages from selected senders
//!
//! All three take their collaborators as explicit constructor arguments;
//! nothing here reads ambient session state.

mod audit;
mod scan_service;
mod trash_service;
mod unsubscribe_service;

pub use audit::{AuditError, AuditEvent, AuditSink, TracingAuditSink};
pub use scan_service::ScanService;
pub use trash_service::{TrashOutcome, TrashService};
pub use unsubscribe_service::{
    HttpTransport, TransportError, UnsubscribeOutcome, UnsubscribeSelection, UnsubscribeService,
    UnsubscribeTransport,
};

#[cfg(test)]
pub use audit::MockAuditSink;

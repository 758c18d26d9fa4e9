//! Internal requests: a department asks the store for stock or an asset.
//!
//! ```text
//! pending ──► department_approved ──► approved ──► fulfilled
//!    │               │                   ▲
//!    │               ▼                   │
//!    ├──────────► rejected               │
//!    └───────────────────────────────────┘  (approver may skip the department stage)
//! ```
//!
//! Fulfilment produces an immutable [`Receipt`].

pub mod receipt;
pub mod request;

pub use receipt::{Receipt, ReceiptId, ReceiptLine, receipt_number};
pub use request::{
    Actor, FulfillRequest, RejectRequest, Request, RequestCommand, RequestEvent, RequestId,
    RequestStatus, RequestSubject, ReviewRequest, SubmitRequest,
};

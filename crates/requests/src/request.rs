use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_assets::AssetId;
use innkeep_auth::{CommandAuthorization, Permission};
use innkeep_core::{Aggregate, AggregateRoot, DomainError, Entity, UserId};
use innkeep_events::Event;
use innkeep_inventory::InventoryItemId;

use crate::ReceiptId;

innkeep_core::typed_id!(RequestId, "Internal request identifier.");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    DepartmentApproved,
    Approved,
    Fulfilled,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::DepartmentApproved => "department_approved",
            RequestStatus::Approved => "approved",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Still waiting on someone.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            RequestStatus::Pending | RequestStatus::DepartmentApproved | RequestStatus::Approved
        )
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is being asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestSubject {
    Inventory {
        item_id: InventoryItemId,
        item_name: String,
        quantity: u64,
        unit: String,
    },
    Asset {
        asset_id: AssetId,
        asset_name: String,
    },
}

impl RequestSubject {
    pub fn describe(&self) -> String {
        match self {
            RequestSubject::Inventory { item_name, quantity, unit, .. } => {
                format!("{quantity} {unit} {item_name}")
            }
            RequestSubject::Asset { asset_name, .. } => asset_name.clone(),
        }
    }
}

/// Who did something to a request, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub name: String,
    pub at: DateTime<Utc>,
}

/// Aggregate root: Request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    request_number: String,
    requester: Option<Actor>,
    department: String,
    subject: Option<RequestSubject>,
    purpose: String,
    status: RequestStatus,
    #[serde(default)]
    department_approved_by: Option<Actor>,
    #[serde(default)]
    approved_by: Option<Actor>,
    #[serde(default)]
    rejected_by: Option<Actor>,
    #[serde(default)]
    rejection_reason: Option<String>,
    #[serde(default)]
    fulfilled_by: Option<Actor>,
    #[serde(default)]
    receipt_id: Option<ReceiptId>,
    version: u64,
    created: bool,
}

impl Request {
    /// Create an empty, not-yet-submitted aggregate instance.
    pub fn empty(id: RequestId) -> Self {
        Self {
            id,
            request_number: String::new(),
            requester: None,
            department: String::new(),
            subject: None,
            purpose: String::new(),
            status: RequestStatus::Pending,
            department_approved_by: None,
            approved_by: None,
            rejected_by: None,
            rejection_reason: None,
            fulfilled_by: None,
            receipt_id: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RequestId {
        self.id
    }

    pub fn request_number(&self) -> &str {
        &self.request_number
    }

    pub fn requester(&self) -> Option<&Actor> {
        self.requester.as_ref()
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn subject(&self) -> Option<&RequestSubject> {
        self.subject.as_ref()
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn department_approved_by(&self) -> Option<&Actor> {
        self.department_approved_by.as_ref()
    }

    pub fn approved_by(&self) -> Option<&Actor> {
        self.approved_by.as_ref()
    }

    pub fn rejected_by(&self) -> Option<&Actor> {
        self.rejected_by.as_ref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn fulfilled_by(&self) -> Option<&Actor> {
        self.fulfilled_by.as_ref()
    }

    pub fn receipt_id(&self) -> Option<ReceiptId> {
        self.receipt_id
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.requester.as_ref().map(|a| a.at)
    }
}

impl AggregateRoot for Request {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Entity for Request {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: SubmitRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub request_id: RequestId,
    pub request_number: String,
    pub requester: Actor,
    pub department: String,
    pub subject: RequestSubject,
    pub purpose: String,
}

/// Command body shared by department approval and final approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub request_id: RequestId,
    pub reviewer: Actor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRequest {
    pub request_id: RequestId,
    pub reviewer: Actor,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillRequest {
    pub request_id: RequestId,
    pub fulfilled_by: Actor,
    pub receipt_id: ReceiptId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestCommand {
    Submit(SubmitRequest),
    DepartmentApprove(ReviewRequest),
    Approve(ReviewRequest),
    Reject(RejectRequest),
    Fulfill(FulfillRequest),
}

impl CommandAuthorization for RequestCommand {
    fn required_permissions(&self) -> Vec<Permission> {
        match self {
            RequestCommand::Submit(_) => vec![Permission::REQUESTS_CREATE],
            // Anyone who may approve at either stage may also reject.
            RequestCommand::DepartmentApprove(_) | RequestCommand::Reject(_) => {
                vec![Permission::REQUESTS_APPROVE_DEPARTMENT]
            }
            RequestCommand::Approve(_) => vec![Permission::REQUESTS_APPROVE],
            RequestCommand::Fulfill(_) => vec![Permission::REQUESTS_FULFILL],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    Submitted(SubmitRequest),
    DepartmentApproved { request_id: RequestId, by: Actor },
    Approved { request_id: RequestId, by: Actor },
    Rejected { request_id: RequestId, by: Actor, reason: String },
    Fulfilled { request_id: RequestId, by: Actor, receipt_id: ReceiptId },
}

impl Event for RequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequestEvent::Submitted(_) => "requests.request.submitted",
            RequestEvent::DepartmentApproved { .. } => "requests.request.department_approved",
            RequestEvent::Approved { .. } => "requests.request.approved",
            RequestEvent::Rejected { .. } => "requests.request.rejected",
            RequestEvent::Fulfilled { .. } => "requests.request.fulfilled",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequestEvent::Submitted(e) => e.requester.at,
            RequestEvent::DepartmentApproved { by, .. }
            | RequestEvent::Approved { by, .. }
            | RequestEvent::Rejected { by, .. }
            | RequestEvent::Fulfilled { by, .. } => by.at,
        }
    }
}

impl Aggregate for Request {
    type Command = RequestCommand;
    type Event = RequestEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RequestEvent::Submitted(e) => {
                self.id = e.request_id;
                self.request_number = e.request_number.clone();
                self.requester = Some(e.requester.clone());
                self.department = e.department.clone();
                self.subject = Some(e.subject.clone());
                self.purpose = e.purpose.clone();
                self.status = RequestStatus::Pending;
                self.created = true;
            }
            RequestEvent::DepartmentApproved { by, .. } => {
                self.status = RequestStatus::DepartmentApproved;
                self.department_approved_by = Some(by.clone());
            }
            RequestEvent::Approved { by, .. } => {
                self.status = RequestStatus::Approved;
                self.approved_by = Some(by.clone());
            }
            RequestEvent::Rejected { by, reason, .. } => {
                self.status = RequestStatus::Rejected;
                self.rejected_by = Some(by.clone());
                self.rejection_reason = Some(reason.clone());
            }
            RequestEvent::Fulfilled { by, receipt_id, .. } => {
                self.status = RequestStatus::Fulfilled;
                self.fulfilled_by = Some(by.clone());
                self.receipt_id = Some(*receipt_id);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RequestCommand::Submit(cmd) => self.handle_submit(cmd),
            RequestCommand::DepartmentApprove(cmd) => self.handle_department_approve(cmd),
            RequestCommand::Approve(cmd) => self.handle_approve(cmd),
            RequestCommand::Reject(cmd) => self.handle_reject(cmd),
            RequestCommand::Fulfill(cmd) => self.handle_fulfill(cmd),
        }
    }
}

impl Request {
    fn ensure_request(&self, request_id: RequestId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("request"));
        }
        if self.id != request_id {
            return Err(DomainError::invariant("request_id mismatch"));
        }
        Ok(())
    }

    fn ensure_status(&self, allowed: &[RequestStatus], action: &str) -> Result<(), DomainError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "cannot {action} a request that is {}",
                self.status
            )))
        }
    }

    fn handle_submit(&self, cmd: &SubmitRequest) -> Result<Vec<RequestEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("request already exists"));
        }
        if cmd.department.trim().is_empty() {
            return Err(DomainError::validation("department is required"));
        }
        if let RequestSubject::Inventory { quantity: 0, .. } = cmd.subject {
            return Err(DomainError::validation("requested quantity must be positive"));
        }

        Ok(vec![RequestEvent::Submitted(SubmitRequest {
            department: cmd.department.trim().to_string(),
            purpose: cmd.purpose.trim().to_string(),
            ..cmd.clone()
        })])
    }

    fn handle_department_approve(&self, cmd: &ReviewRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_request(cmd.request_id)?;
        self.ensure_status(&[RequestStatus::Pending], "department-approve")?;

        Ok(vec![RequestEvent::DepartmentApproved {
            request_id: cmd.request_id,
            by: cmd.reviewer.clone(),
        }])
    }

    fn handle_approve(&self, cmd: &ReviewRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_request(cmd.request_id)?;
        self.ensure_status(
            &[RequestStatus::Pending, RequestStatus::DepartmentApproved],
            "approve",
        )?;

        Ok(vec![RequestEvent::Approved {
            request_id: cmd.request_id,
            by: cmd.reviewer.clone(),
        }])
    }

    fn handle_reject(&self, cmd: &RejectRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_request(cmd.request_id)?;
        self.ensure_status(
            &[RequestStatus::Pending, RequestStatus::DepartmentApproved],
            "reject",
        )?;
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason is required"));
        }

        Ok(vec![RequestEvent::Rejected {
            request_id: cmd.request_id,
            by: cmd.reviewer.clone(),
            reason: cmd.reason.trim().to_string(),
        }])
    }

    fn handle_fulfill(&self, cmd: &FulfillRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_request(cmd.request_id)?;
        self.ensure_status(&[RequestStatus::Approved], "fulfill")?;

        Ok(vec![RequestEvent::Fulfilled {
            request_id: cmd.request_id,
            by: cmd.fulfilled_by.clone(),
            receipt_id: cmd.receipt_id,
        }])
    }
}

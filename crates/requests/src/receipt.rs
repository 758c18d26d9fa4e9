use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult, Entity, Money};

use crate::request::{Actor, Request, RequestId, RequestStatus};

innkeep_core::typed_id!(ReceiptId, "Issue receipt identifier.");

/// Receipt number for the `sequence`-th receipt issued on `date`: `RCP-YYYYMMDD-NNNN`.
pub fn receipt_number(date: NaiveDate, sequence: u32) -> String {
    format!("RCP-{}-{sequence:04}", date.format("%Y%m%d"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub description: String,
    pub quantity: u64,
    pub unit: String,
    /// Book value of what was handed over, when known.
    #[serde(default)]
    pub value: Option<Money>,
}

/// Proof that a request was handed over. Never edited after issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    id: ReceiptId,
    receipt_number: String,
    request_id: RequestId,
    request_number: String,
    issued_at: DateTime<Utc>,
    issued_by: String,
    issued_to: String,
    department: String,
    lines: Vec<ReceiptLine>,
    #[serde(default)]
    notes: Option<String>,
}

impl Receipt {
    /// Build the receipt for an approved request being fulfilled by `issuer`.
    pub fn issue(
        id: ReceiptId,
        receipt_number: String,
        request: &Request,
        issuer: &Actor,
        lines: Vec<ReceiptLine>,
        notes: Option<String>,
    ) -> DomainResult<Receipt> {
        if request.status() != RequestStatus::Approved {
            return Err(DomainError::invariant(format!(
                "receipts are issued for approved requests, not {}",
                request.status()
            )));
        }
        if lines.is_empty() {
            return Err(DomainError::validation("receipt needs at least one line"));
        }
        let issued_to = request
            .requester()
            .map(|a| a.name.clone())
            .ok_or_else(|| DomainError::invariant("request has no requester"))?;

        Ok(Receipt {
            id,
            receipt_number,
            request_id: request.id_typed(),
            request_number: request.request_number().to_string(),
            issued_at: issuer.at,
            issued_by: issuer.name.clone(),
            issued_to,
            department: request.department().to_string(),
            lines,
            notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        })
    }

    pub fn id_typed(&self) -> ReceiptId {
        self.id
    }

    pub fn receipt_number(&self) -> &str {
        &self.receipt_number
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn request_number(&self) -> &str {
        &self.request_number
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn issued_by(&self) -> &str {
        &self.issued_by
    }

    pub fn issued_to(&self) -> &str {
        &self.issued_to
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Sum of the known line values.
    pub fn total_value(&self) -> Money {
        self.lines.iter().filter_map(|l| l.value).sum()
    }
}

impl Entity for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

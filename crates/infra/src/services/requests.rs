use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use innkeep_assets::{Asset, AssetId, AssetStatus};
use innkeep_auth::{AuthzError, Permission, Principal, authorize, authorize_command};
use innkeep_core::{Aggregate, DomainError, Money};
use innkeep_inventory::{InventoryItemId, StockTransaction, TransactionKind};
use innkeep_requests::{
    Actor, FulfillRequest, Receipt, ReceiptId, ReceiptLine, RejectRequest, Request, RequestCommand,
    RequestId, RequestStatus, RequestSubject, ReviewRequest, SubmitRequest, receipt_number,
};

use crate::error::ServiceError;
use crate::export;
use crate::services::assets::AssetService;
use crate::services::inventory::{InventoryService, StockBooking};
use crate::services::{execute, next_number, position_of};
use crate::snapshot::{Collection, Persistence, Snapshot};

/// What a new request asks for, by id. Names are resolved by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestTarget {
    Inventory { item_id: InventoryItemId, quantity: u64 },
    Asset { asset_id: AssetId },
}

/// Request form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub target: RequestTarget,
    pub purpose: String,
    /// Defaults to the requester's own department.
    #[serde(default)]
    pub department: Option<String>,
}

/// What fulfilment changed outside the request, kept until the request is written.
enum Handover {
    Stock(StockBooking),
    /// The asset as it was before checkout.
    Asset(Asset),
}

/// Internal requests and the receipts issued when they are fulfilled.
pub struct RequestService {
    persistence: Arc<Persistence>,
    requests: Snapshot<Request>,
    receipts: Snapshot<Receipt>,
    inventory: Arc<InventoryService>,
    assets: Arc<AssetService>,
}

impl RequestService {
    pub fn new(
        persistence: Arc<Persistence>,
        requests: Snapshot<Request>,
        receipts: Snapshot<Receipt>,
        inventory: Arc<InventoryService>,
        assets: Arc<AssetService>,
    ) -> Self {
        Self {
            persistence,
            requests,
            receipts,
            inventory,
            assets,
        }
    }

    /// Requests the principal may see: everything for approvers and the store,
    /// otherwise their department's requests and their own.
    pub fn list(&self, principal: &Principal) -> Result<Vec<Request>, ServiceError> {
        authorize(principal, &Permission::REQUESTS_READ)?;
        let sees_all = principal.has(&Permission::REQUESTS_APPROVE) || principal.has(&Permission::REQUESTS_FULFILL);
        Ok(self
            .requests
            .read()?
            .iter()
            .filter(|r| {
                sees_all
                    || principal.belongs_to(r.department())
                    || r.requester().is_some_and(|a| a.user_id == principal.user_id)
            })
            .cloned()
            .collect())
    }

    /// Requests waiting on something the principal is allowed to do.
    pub fn actionable(&self, principal: &Principal) -> Result<Vec<Request>, ServiceError> {
        authorize(principal, &Permission::REQUESTS_READ)?;
        let can_approve = principal.has(&Permission::REQUESTS_APPROVE);
        let can_approve_department = principal.has(&Permission::REQUESTS_APPROVE_DEPARTMENT);
        let can_fulfill = principal.has(&Permission::REQUESTS_FULFILL);

        Ok(self
            .requests
            .read()?
            .iter()
            .filter(|r| match r.status() {
                RequestStatus::Pending => {
                    can_approve || (can_approve_department && principal.belongs_to(r.department()))
                }
                RequestStatus::DepartmentApproved => can_approve,
                RequestStatus::Approved => can_fulfill,
                RequestStatus::Fulfilled | RequestStatus::Rejected => false,
            })
            .cloned()
            .collect())
    }

    pub fn get(&self, principal: &Principal, id: RequestId) -> Result<Request, ServiceError> {
        authorize(principal, &Permission::REQUESTS_READ)?;
        let requests = self.requests.read()?;
        let idx = position_of(requests.as_slice(), &id, "request")?;
        Ok(requests[idx].clone())
    }

    pub fn submit(&self, principal: &Principal, form: NewRequest) -> Result<Request, ServiceError> {
        authorize(principal, &Permission::REQUESTS_CREATE)?;

        let department = form
            .department
            .or_else(|| principal.department.clone())
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| DomainError::validation("department is required"))?;
        let subject = self.resolve(&form.target)?;

        let request = self.requests.mutate(&self.persistence, |requests| {
            let request_id = RequestId::generate();
            let command = RequestCommand::Submit(SubmitRequest {
                request_id,
                request_number: next_number("REQ", requests.iter().map(|r| r.request_number())),
                requester: actor(principal, Utc::now()),
                department,
                subject,
                purpose: form.purpose,
            });
            let mut request = Request::empty(request_id);
            execute(principal, &mut request, &command)?;
            requests.push(request.clone());
            Ok::<_, ServiceError>(request)
        })?;

        tracing::info!(
            request = %request.request_number(),
            department = %request.department(),
            by = %principal.display_name,
            "request submitted"
        );
        Ok(request)
    }

    /// First-stage approval inside the request's department.
    pub fn department_approve(&self, principal: &Principal, id: RequestId) -> Result<Request, ServiceError> {
        let command = RequestCommand::DepartmentApprove(ReviewRequest {
            request_id: id,
            reviewer: actor(principal, Utc::now()),
        });
        self.review(principal, id, command, true)
    }

    /// Final approval. Allowed straight from `pending`.
    pub fn approve(&self, principal: &Principal, id: RequestId) -> Result<Request, ServiceError> {
        let command = RequestCommand::Approve(ReviewRequest {
            request_id: id,
            reviewer: actor(principal, Utc::now()),
        });
        self.review(principal, id, command, false)
    }

    pub fn reject(&self, principal: &Principal, id: RequestId, reason: &str) -> Result<Request, ServiceError> {
        let command = RequestCommand::Reject(RejectRequest {
            request_id: id,
            reviewer: actor(principal, Utc::now()),
            reason: reason.to_string(),
        });
        self.review(principal, id, command, true)
    }

    /// Hand over what an approved request asked for.
    ///
    /// Inventory requests book a `used` transaction and are refused when the item has
    /// less stock than requested. Asset requests check the asset out to the
    /// requester. Either way an immutable receipt is issued.
    ///
    /// When the request write fails, the receipt is withdrawn and the hand-over
    /// reverted. A receipt that could not be withdrawn is picked up by the next
    /// attempt, which finishes the request without handing anything over again.
    pub fn fulfill(
        &self,
        principal: &Principal,
        id: RequestId,
        notes: Option<String>,
    ) -> Result<(Request, Receipt), ServiceError> {
        let now = Utc::now();
        let fulfiller = actor(principal, now);
        let command = |receipt_id| {
            RequestCommand::Fulfill(FulfillRequest {
                request_id: id,
                fulfilled_by: fulfiller.clone(),
                receipt_id,
            })
        };
        authorize_command(principal, &command(ReceiptId::generate()))?;

        let mut uncommitted: Option<(ReceiptId, Handover)> = None;
        // Lock order: requests, receipts, then inventory or assets.
        let result = self.requests.mutate(&self.persistence, |requests| {
            let idx = position_of(requests, &id, "request")?;
            let request = requests[idx].clone();

            let issued = self.receipts.read()?.iter().find(|r| r.request_id() == id).cloned();
            let (events, receipt) = match issued {
                Some(receipt) => {
                    let events = request.handle(&command(receipt.id_typed()))?;
                    tracing::warn!(
                        request = %request.request_number(),
                        receipt = %receipt.receipt_number(),
                        "completing fulfilment from an existing receipt"
                    );
                    (events, receipt)
                }
                None => {
                    let receipt_id = ReceiptId::generate();
                    let events = request.handle(&command(receipt_id))?;
                    let (line, handover) = self.hand_over(&request, &fulfiller)?;
                    let issued = self.receipts.mutate(&self.persistence, |receipts| {
                        let today = now.date_naive();
                        let number = next_receipt_number(today, receipts.iter().map(|r| r.receipt_number()));
                        let receipt = Receipt::issue(receipt_id, number, &request, &fulfiller, vec![line], notes)?;
                        receipts.push(receipt.clone());
                        Ok::<_, ServiceError>(receipt)
                    });
                    let receipt = match issued {
                        Ok(receipt) => receipt,
                        Err(error) => {
                            self.undo(handover);
                            return Err(error);
                        }
                    };
                    uncommitted = Some((receipt_id, handover));
                    (events, receipt)
                }
            };

            for event in &events {
                requests[idx].apply(event);
            }
            Ok::<_, ServiceError>((requests[idx].clone(), receipt))
        });

        match &result {
            Ok((request, receipt)) => tracing::info!(
                request = %request.request_number(),
                receipt = %receipt.receipt_number(),
                by = %principal.display_name,
                "request fulfilled"
            ),
            Err(error) => {
                tracing::warn!(request_id = %id, %error, "request fulfilment rejected");
                // Set only when the hand-over and receipt were written but the request was not.
                if let Some((receipt_id, handover)) = uncommitted {
                    self.roll_back(receipt_id, handover);
                }
            }
        }
        result
    }

    pub fn list_receipts(&self, principal: &Principal) -> Result<Vec<Receipt>, ServiceError> {
        authorize(principal, &Permission::REQUESTS_READ)?;
        Ok(self.receipts.all()?)
    }

    pub fn get_receipt(&self, principal: &Principal, id: ReceiptId) -> Result<Receipt, ServiceError> {
        authorize(principal, &Permission::REQUESTS_READ)?;
        let receipts = self.receipts.read()?;
        let idx = position_of(receipts.as_slice(), &id, "receipt")?;
        Ok(receipts[idx].clone())
    }

    /// Printable HTML document for a receipt.
    pub fn receipt_html(&self, principal: &Principal, id: ReceiptId) -> Result<String, ServiceError> {
        let receipt = self.get_receipt(principal, id)?;
        Ok(export::receipt_html(&receipt))
    }

    pub(crate) fn reload(&self, collection: Collection) -> Result<bool, ServiceError> {
        Ok(match collection {
            Collection::Requests => self.requests.reload(&self.persistence)?,
            Collection::Receipts => self.receipts.reload(&self.persistence)?,
            _ => false,
        })
    }

    fn review(
        &self,
        principal: &Principal,
        id: RequestId,
        command: RequestCommand,
        department_scoped: bool,
    ) -> Result<Request, ServiceError> {
        let result = self.requests.mutate(&self.persistence, |requests| {
            let idx = position_of(requests, &id, "request")?;
            authorize_command(principal, &command)?;
            if department_scoped {
                ensure_department_scope(principal, &requests[idx])?;
            }
            execute(principal, &mut requests[idx], &command)?;
            Ok::<_, ServiceError>(requests[idx].clone())
        });

        match &result {
            Ok(request) => tracing::info!(
                request = %request.request_number(),
                status = %request.status(),
                by = %principal.display_name,
                "request reviewed"
            ),
            Err(error) => tracing::warn!(request_id = %id, %error, "request review rejected"),
        }
        result
    }

    fn resolve(&self, target: &RequestTarget) -> Result<RequestSubject, ServiceError> {
        match *target {
            RequestTarget::Inventory { item_id, quantity } => {
                let item = self
                    .inventory
                    .find_item(item_id)?
                    .ok_or_else(|| DomainError::not_found("inventory item"))?;
                Ok(RequestSubject::Inventory {
                    item_id,
                    item_name: item.name,
                    quantity,
                    unit: item.unit,
                })
            }
            RequestTarget::Asset { asset_id } => {
                let asset = self
                    .assets
                    .find(asset_id)?
                    .ok_or_else(|| DomainError::not_found("asset"))?;
                if asset.status == AssetStatus::Retired {
                    return Err(DomainError::validation(format!("asset '{}' is retired", asset.name)).into());
                }
                Ok(RequestSubject::Asset {
                    asset_id,
                    asset_name: asset.name,
                })
            }
        }
    }

    fn roll_back(&self, receipt_id: ReceiptId, handover: Handover) {
        let withdrawn = self.receipts.mutate(&self.persistence, |receipts| {
            receipts.retain(|r| r.id_typed() != receipt_id);
            Ok::<_, ServiceError>(())
        });
        match withdrawn {
            Ok(()) => self.undo(handover),
            Err(error) => tracing::error!(
                %receipt_id,
                %error,
                "receipt kept after a failed fulfilment; the next attempt completes the request"
            ),
        }
    }

    fn undo(&self, handover: Handover) {
        let reverted = match handover {
            Handover::Stock(booking) => self.inventory.revert(booking),
            Handover::Asset(before) => self.assets.restore(before),
        };
        if let Err(error) = reverted {
            tracing::error!(%error, "hand-over could not be reverted");
        }
    }

    /// Move stock or an asset to the requester and describe it for the receipt.
    fn hand_over(&self, request: &Request, fulfiller: &Actor) -> Result<(ReceiptLine, Handover), ServiceError> {
        let subject = request
            .subject()
            .ok_or_else(|| DomainError::invariant("request has no subject"))?;
        let requester = request.requester().map(|a| a.name.as_str()).unwrap_or_default();

        match subject {
            RequestSubject::Inventory { item_id, quantity, .. } => {
                let item = self
                    .inventory
                    .find_item(*item_id)?
                    .ok_or_else(|| DomainError::not_found("inventory item"))?;
                if item.quantity < *quantity {
                    return Err(DomainError::validation(format!(
                        "only {} {} of '{}' in stock; {} requested",
                        item.quantity, item.unit, item.name, quantity
                    ))
                    .into());
                }

                let value = item
                    .current_value
                    .per_unit(item.quantity)
                    .map(|per_unit| Money::new(per_unit * Decimal::from(*quantity)));
                let units = i64::try_from(*quantity)
                    .map_err(|_| DomainError::validation("requested quantity is too large"))?;
                let tx = StockTransaction::new(
                    item.id,
                    &item.name,
                    TransactionKind::Used,
                    units,
                    &fulfiller.name,
                    fulfiller.at,
                )
                .with_notes(format!(
                    "{} for {} ({})",
                    request.request_number(),
                    requester,
                    request.department()
                ));
                let booking = self.inventory.apply_transactions(vec![tx])?;

                let line = ReceiptLine {
                    description: item.name,
                    quantity: *quantity,
                    unit: item.unit,
                    value,
                };
                Ok((line, Handover::Stock(booking)))
            }
            RequestSubject::Asset { asset_id, .. } => {
                let asset = self
                    .assets
                    .find(*asset_id)?
                    .ok_or_else(|| DomainError::not_found("asset"))?;
                if !asset.is_available() {
                    return Err(DomainError::validation(format!(
                        "asset '{}' is {} and cannot be handed over",
                        asset.name, asset.status
                    ))
                    .into());
                }
                self.assets.check_out_unchecked(*asset_id, requester, fulfiller.at)?;

                let line = ReceiptLine {
                    description: asset.name.clone(),
                    quantity: 1,
                    unit: "unit".to_string(),
                    value: Some(asset.purchase_value),
                };
                Ok((line, Handover::Asset(asset)))
            }
        }
    }
}

fn actor(principal: &Principal, at: DateTime<Utc>) -> Actor {
    Actor {
        user_id: principal.user_id,
        name: principal.display_name.clone(),
        at,
    }
}

/// Department-level reviewers only act inside their own department.
fn ensure_department_scope(principal: &Principal, request: &Request) -> Result<(), AuthzError> {
    if principal.has(&Permission::REQUESTS_APPROVE) || principal.belongs_to(request.department()) {
        return Ok(());
    }
    Err(AuthzError::OutOfScope(format!(
        "request belongs to {}",
        request.department()
    )))
}

/// Next receipt number for `date`; the sequence restarts every day.
fn next_receipt_number<'a>(date: NaiveDate, existing: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = format!("RCP-{}-", date.format("%Y%m%d"));
    let highest = existing
        .into_iter()
        .filter_map(|n| n.strip_prefix(prefix.as_str())?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    receipt_number(date, highest.saturating_add(1))
}

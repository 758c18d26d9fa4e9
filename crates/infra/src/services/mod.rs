//! Application services: authorization, domain rules and write-through persistence
//! for each collection.
//!
//! Every mutating operation follows the same shape:
//!
//! ```text
//! principal + input
//!   ↓ authorize (one capability check)
//!   ↓ domain rule on a copy of the collection
//!   ↓ write the copy through the storage strategy
//!   ↓ swap it in, touch the sentinel key, publish a change notice
//! ```

pub mod assets;
pub mod inventory;
pub mod purchasing;
pub mod requests;
pub mod users;

use innkeep_auth::{CommandAuthorization, Principal, authorize_command};
use innkeep_core::{Aggregate, DomainError, Entity};

use crate::error::ServiceError;

pub use assets::AssetService;
pub use inventory::InventoryService;
pub use purchasing::PurchasingService;
pub use requests::{NewRequest, RequestService, RequestTarget};
pub use users::UserService;

/// Authorize a command, then let the aggregate decide and evolve.
pub(crate) fn execute<A>(
    principal: &Principal,
    aggregate: &mut A,
    command: &A::Command,
) -> Result<Vec<A::Event>, ServiceError>
where
    A: Aggregate<Error = DomainError>,
    A::Command: CommandAuthorization,
{
    authorize_command(principal, command)?;
    Ok(aggregate.execute(command)?)
}

/// Position of the record with `id`, or `NotFound` naming `what`.
pub(crate) fn position_of<T>(records: &[T], id: &T::Id, what: &str) -> Result<usize, DomainError>
where
    T: Entity,
    T::Id: PartialEq,
{
    records
        .iter()
        .position(|r| r.id() == id)
        .ok_or_else(|| DomainError::not_found(what))
}

/// Next `PREFIX-NNNN` number after the highest one already issued.
pub(crate) fn next_number<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|n| n.strip_prefix(prefix)?.strip_prefix('-')?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}-{:04}", highest.saturating_add(1))
}

//! Domain events and change notifications.
//!
//! - [`Event`]: facts emitted by aggregates (`handle` → events → `apply`).
//! - [`ChangeNotice`]: "collection X was rewritten" signal sent to other sessions.
//! - [`EventBus`]: pub/sub transport for notices; [`InMemoryEventBus`] for one process.

pub mod bus;
pub mod change;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use change::{ChangeNotice, SessionId};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};

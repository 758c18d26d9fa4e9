//! Aggregate traits for records with a command/event lifecycle.
//!
//! Purchase orders and requests move through explicit states. Each state change is
//! decided by `handle` (pure, returns events) and recorded by `apply`. The services
//! persist the resulting snapshot, not the events.

/// Aggregate root: identity plus a version counter bumped on every applied event.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied to this snapshot.
    fn version(&self) -> u64;
}

/// Decision/evolution split for a state machine.
///
/// - `handle(&self, cmd)` validates a command against current state and returns events.
/// - `apply(&mut self, event)` evolves state; it must not fail.
///
/// Neither method performs IO.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Handle a command and apply the resulting events in one step.
    ///
    /// State is only touched when `handle` succeeds.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }
}

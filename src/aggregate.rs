use std::fmt::Debug;

use crate::Event;

/// The `Aggregate` trait defines the unit of identity and invariant enforcement.
///
/// Aggregates validate their business rules when they are created or changed, and record every
/// resulting fact as an [`Event`] in a private pending buffer. Nothing outside the aggregate can
/// read or touch that buffer: the only way to get at it is [`Aggregate::pull_events`], which hands
/// the buffered events over by value.
///
/// ## Implementing the `Aggregate` Trait
///
/// Keep the buffer as a private `Vec<Event>` field and implement `pull_events` with
/// `std::mem::take`, so draining swaps in an empty buffer and returns the old one in one step.
/// Do not derive `Clone` on an aggregate with pending events: a copy would hand out the same
/// events a second time.
pub trait Aggregate: Debug + Send + Sync {
    /// The type of the aggregate's identity, used as the repository key.
    type Id: Clone + Debug + Eq + std::hash::Hash + Send + Sync;

    /// Returns the aggregate's ID.
    fn aggregate_id(&self) -> &Self::Id;

    /// Drains the pending events.
    ///
    /// This is not idempotent: a second call without new changes returns an empty vector.
    fn pull_events(&mut self) -> Vec<Event>;
}

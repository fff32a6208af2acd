pub mod event_store;
pub mod seed;
pub mod types;

pub use event_store::EventStore;
pub use types::{EventFilter, EventType, NewPolicyEvent, PolicyEvent};

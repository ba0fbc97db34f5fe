//! `kasir-events`: event primitives and in-process fan-out.
//!
//! The gateway's authentication state changes are delivered as a stream of
//! [`AuthEvent`]s; the session holder subscribes to that stream.

pub mod auth_event;
pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use auth_event::AuthEvent;
pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};

use chrono::{DateTime, Utc};

/// Something that happened, as carried on an [`EventBus`](crate::EventBus).
pub trait Event: Clone + core::fmt::Debug + Send + 'static {
    /// Dotted name used in logs, e.g. `auth.signed_in`.
    fn event_type(&self) -> &'static str;

    fn occurred_at(&self) -> DateTime<Utc>;
}

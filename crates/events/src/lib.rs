//! Kitasuro event bus and notification dispatch.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`NotificationDispatcher`]: background task turning events into
//!   agency notifications through a [`Notifier`].

pub mod bus;
pub mod notifier;

pub use bus::{EventBus, PlatformEvent};
pub use notifier::{LogNotifier, Notification, NotificationDispatcher, Notifier, NotifyError};

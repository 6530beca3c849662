// src/alerts/mod.rs
pub mod channels;
pub mod dispatcher;

pub use channels::{AlertChannel, ConfiguredChannel, LogAlertChannel, WebhookAlertChannel};
pub use dispatcher::{AlertDispatcher, DispatchReport};

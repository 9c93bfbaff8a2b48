//! Business layer of the storedesk admin console.
//!
//! Holds the users screen model and the commands that talk to the admin REST
//! backend. Front ends own a [`storedesk_states::StateCtx`], call
//! [`register_users`] once, then drive it with the request helpers and
//! `sync_computes`.

mod config;
pub mod http;
mod notification;
pub mod users;

#[cfg(test)]
mod test_utils;

pub use config::{BusinessConfig, ConfigError, DEFAULT_API_BASE_URL};
pub use notification::{Notification, NotificationLevel};
pub use users::register_users;

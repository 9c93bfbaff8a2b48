//! Command implementations for the storedesk CLI.

pub mod completions;
pub mod users;

pub use completions::generate_completions;
pub use users::run_users;

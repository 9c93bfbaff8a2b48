//! In-memory state container for storedesk front ends.
//!
//! The container owns every `State` and `Compute` value. Front-end code edits
//! states in place through [`StateCtx::update`]; async [`Command`]s only ever
//! see a cloned [`CommandSnapshot`] and publish their results through an
//! [`Updater`]. Published updates are applied on the owner's side by
//! [`StateCtx::sync_computes`], which keeps every mutation boundary explicit.

mod command;
mod ctx;
mod snapshot;
mod state;
mod task;
mod updater;

pub use command::{Command, CommandFuture};
pub use ctx::StateCtx;
pub use snapshot::CommandSnapshot;
pub use state::{Compute, State};
pub use task::TaskHandle;
pub use updater::Updater;

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::{CommandSnapshot, Updater};

/// Future returned by [`Command::run`].
pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A manual-only unit of work, usually network IO.
///
/// Commands never run implicitly: the owner enqueues them with
/// `StateCtx::enqueue_command` and spawns them with `StateCtx::flush_commands`.
/// A command reads its inputs from the snapshot and reports through the updater.
pub trait Command: Send + Sync + 'static {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture;

    /// When true, spawning this command cancels the previous run and discards
    /// any of its updates that have not been synced yet.
    fn latest_only(&self) -> bool {
        false
    }
}

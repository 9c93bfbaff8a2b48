use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::Sender;

use crate::Compute;

pub(crate) type ModifyFn = Box<dyn FnOnce(&mut (dyn Any + Send)) + Send>;

pub(crate) enum Op {
    Set(Box<dyn Any + Send>),
    Modify(ModifyFn),
}

/// Generation guard of a latest-only command.
#[derive(Debug, Clone)]
pub(crate) struct Guard {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl Guard {
    pub(crate) fn new(current: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            current,
            generation,
        }
    }

    pub(crate) fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }
}

pub(crate) struct Update {
    pub(crate) target: TypeId,
    pub(crate) target_name: &'static str,
    pub(crate) op: Op,
    pub(crate) guard: Option<Guard>,
}

/// Publishes compute updates from a running command back to its `StateCtx`.
///
/// Updates are queued and applied by `StateCtx::sync_computes`. An updater
/// handed to a latest-only command stops publishing once a newer run of the
/// same command has been spawned; anything it queued before that is dropped
/// at sync time.
#[derive(Clone)]
pub struct Updater {
    send: Sender<Update>,
    guard: Option<Guard>,
}

impl Updater {
    pub(crate) fn new(send: Sender<Update>) -> Self {
        Self { send, guard: None }
    }

    pub(crate) fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Whether updates from this updater will still be applied.
    pub fn is_current(&self) -> bool {
        self.guard.as_ref().is_none_or(Guard::is_current)
    }

    /// Replace the value of `T`.
    pub fn set<T: Compute>(&self, value: T) {
        self.publish::<T>(Op::Set(Box::new(value)));
    }

    /// Modify `T` in place once the owner syncs.
    ///
    /// Prefer this over `set` when several commands touch the same compute
    /// concurrently: each closure sees the value left by the previous one.
    pub fn update<T: Compute>(&self, f: impl FnOnce(&mut T) + Send + 'static) {
        let modify: ModifyFn = Box::new(move |any: &mut (dyn Any + Send)| {
            if let Some(value) = any.downcast_mut::<T>() {
                f(value);
            }
        });
        self.publish::<T>(Op::Modify(modify));
    }

    fn publish<T: Compute>(&self, op: Op) {
        if !self.is_current() {
            log::debug!("Discarding stale update for {}", type_name::<T>());
            return;
        }

        let update = Update {
            target: TypeId::of::<T>(),
            target_name: type_name::<T>(),
            op,
            guard: self.guard.clone(),
        };

        if self.send.send(update).is_err() {
            log::warn!(
                "StateCtx is gone, dropping update for {}",
                type_name::<T>()
            );
        }
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("latest_only", &self.guard.is_some())
            .field("is_current", &self.is_current())
            .finish()
    }
}

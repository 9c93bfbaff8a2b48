use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::snapshot::{CloneFn, clone_boxed};
use crate::updater::{Guard, Op, Update};
use crate::{Command, CommandSnapshot, Compute, State, TaskHandle, Updater};

struct Slot {
    value: Box<dyn Any + Send>,
    clone: CloneFn,
}

struct RecordedCommand {
    name: &'static str,
    command: Arc<dyn Command>,
    generation: Arc<AtomicU64>,
    latest: Option<TaskHandle>,
}

/// Owner of all states, computes and commands of one front end.
///
/// Typical cycle:
/// 1. edit inputs with `update`
/// 2. `enqueue_command` + `flush_commands` (or `dispatch`) to spawn commands
/// 3. await `task_set_mut().join_next()` and call `sync_computes` after each
/// 4. read results with `compute`
pub struct StateCtx {
    slots: BTreeMap<TypeId, Slot>,
    commands: BTreeMap<TypeId, RecordedCommand>,
    queue: Vec<TypeId>,
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    send: Sender<Update>,
    recv: Receiver<Update>,
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            slots: BTreeMap::new(),
            commands: BTreeMap::new(),
            queue: Vec::new(),
            tasks: JoinSet::new(),
            cancel: CancellationToken::new(),
            send,
            recv,
        }
    }

    pub fn add_state<T: State>(&mut self, state: T) {
        self.insert_slot(state);
    }

    pub fn record_compute<T: Compute>(&mut self, compute: T) {
        self.insert_slot(compute);
    }

    fn insert_slot<T: State>(&mut self, value: T) {
        let slot = Slot {
            value: Box::new(value),
            clone: clone_boxed::<T>,
        };
        if self.slots.insert(TypeId::of::<T>(), slot).is_some() {
            log::debug!("Replaced registered value of {}", type_name::<T>());
        }
    }

    pub fn record_command<C: Command>(&mut self, command: C) {
        self.commands.insert(
            TypeId::of::<C>(),
            RecordedCommand {
                name: type_name::<C>(),
                command: Arc::new(command),
                generation: Arc::new(AtomicU64::new(0)),
                latest: None,
            },
        );
    }

    pub fn try_state<T: State>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_ref::<T>())
    }

    /// # Panics
    /// Panics if `T` was never registered.
    pub fn state<T: State>(&self) -> &T {
        self.try_state::<T>()
            .unwrap_or_else(|| panic!("State {} is not registered", type_name::<T>()))
    }

    /// # Panics
    /// Panics if `T` was never recorded.
    pub fn compute<T: Compute>(&self) -> &T {
        self.try_state::<T>()
            .unwrap_or_else(|| panic!("Compute {} is not recorded", type_name::<T>()))
    }

    /// Edit a registered value in place.
    pub fn update<T: State>(&mut self, f: impl FnOnce(&mut T)) {
        match self
            .slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_mut::<T>())
        {
            Some(value) => f(value),
            None => log::warn!("Ignoring update of unregistered {}", type_name::<T>()),
        }
    }

    /// An updater that is not tied to any command run.
    pub fn updater(&self) -> Updater {
        Updater::new(self.send.clone())
    }

    pub fn enqueue_command<C: Command>(&mut self) {
        self.queue.push(TypeId::of::<C>());
    }

    /// Enqueue and immediately spawn `C` against the current state.
    pub fn dispatch<C: Command>(&mut self) {
        self.enqueue_command::<C>();
        self.flush_commands();
    }

    /// Spawn every enqueued command, in enqueue order.
    ///
    /// Each command gets a snapshot taken at its own spawn, so inputs changed
    /// between two `dispatch` calls are seen by the respective run only.
    pub fn flush_commands(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for type_id in queued {
            self.spawn_command(type_id);
        }
    }

    fn snapshot(&self) -> CommandSnapshot {
        let inner = self
            .slots
            .iter()
            .filter_map(|(id, slot)| (slot.clone)(&*slot.value).map(|value| (*id, value)))
            .collect();
        CommandSnapshot::new(inner)
    }

    fn spawn_command(&mut self, type_id: TypeId) {
        let snap = self.snapshot();
        let cancel = self.cancel.child_token();
        let mut updater = Updater::new(self.send.clone());

        let Some(recorded) = self.commands.get_mut(&type_id) else {
            log::error!("Command {type_id:?} was enqueued but never recorded");
            return;
        };

        let generation = recorded.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if recorded.command.latest_only() {
            if let Some(previous) = recorded.latest.take() {
                log::debug!(
                    "Cancelling {} generation {}",
                    recorded.name,
                    previous.generation()
                );
                previous.cancel();
            }
            let guard = Guard::new(Arc::clone(&recorded.generation), generation);
            updater = updater.with_guard(guard);
        }
        recorded.latest = Some(TaskHandle::new(generation, cancel.clone()));

        log::debug!("Spawning {} generation {generation}", recorded.name);
        let future = recorded.command.run(snap, updater, cancel.clone());
        self.tasks.spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = future => {}
            }
        });
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_set_mut(&mut self) -> &mut JoinSet<()> {
        &mut self.tasks
    }

    /// Apply every update published so far. Returns how many were applied.
    pub fn sync_computes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.recv.try_recv() {
            if update.guard.as_ref().is_some_and(|guard| !guard.is_current()) {
                log::debug!("Dropping superseded update for {}", update.target_name);
                continue;
            }
            let Some(slot) = self.slots.get_mut(&update.target) else {
                log::warn!("Dropping update for unrecorded {}", update.target_name);
                continue;
            };
            match update.op {
                Op::Set(value) => slot.value = value,
                Op::Modify(modify) => modify(&mut *slot.value),
            }
            applied += 1;
        }
        applied
    }

    /// Cancel every running command, wait for them to stop and discard
    /// whatever they published without syncing it.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        while self.tasks.join_next().await.is_some() {}

        let dropped = self.recv.drain().count();
        if dropped > 0 {
            log::debug!("Discarded {dropped} unsynced update(s) on shutdown");
        }

        self.queue.clear();
        for recorded in self.commands.values_mut() {
            recorded.latest = None;
        }
        self.cancel = CancellationToken::new();
    }
}

impl std::fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCtx")
            .field("values", &self.slots.len())
            .field(
                "commands",
                &self.commands.values().map(|c| c.name).collect::<Vec<_>>(),
            )
            .field("queued", &self.queue.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;

use crate::{Compute, State};

pub(crate) type CloneFn = fn(&(dyn Any + Send)) -> Option<Box<dyn Any + Send>>;

pub(crate) fn clone_boxed<T: State>(value: &(dyn Any + Send)) -> Option<Box<dyn Any + Send>> {
    value
        .downcast_ref::<T>()
        .map(|value| Box::new(value.clone()) as Box<dyn Any + Send>)
}

/// Owned copy of every registered state and compute, taken when a command is spawned.
#[derive(Default)]
pub struct CommandSnapshot {
    inner: BTreeMap<TypeId, Box<dyn Any + Send>>,
}

impl CommandSnapshot {
    pub(crate) fn new(inner: BTreeMap<TypeId, Box<dyn Any + Send>>) -> Self {
        Self { inner }
    }

    /// Returns the snapshot of `T`, if it was registered.
    pub fn get<T: State>(&self) -> Option<&T> {
        self.inner
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Returns the snapshot of a state.
    ///
    /// # Panics
    /// Panics if `T` was never registered with the originating `StateCtx`.
    pub fn state<T: State>(&self) -> &T {
        self.get::<T>()
            .unwrap_or_else(|| panic!("State snapshot for {} is missing", type_name::<T>()))
    }

    /// Returns the snapshot of a compute.
    ///
    /// # Panics
    /// Panics if `T` was never recorded with the originating `StateCtx`.
    pub fn compute<T: Compute>(&self) -> &T {
        self.get::<T>()
            .unwrap_or_else(|| panic!("Compute snapshot for {} is missing", type_name::<T>()))
    }
}

impl std::fmt::Debug for CommandSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSnapshot")
            .field("entries", &self.inner.len())
            .finish()
    }
}

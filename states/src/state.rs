use std::any::Any;

/// A value stored in `StateCtx`.
///
/// States are cloned into a `CommandSnapshot` every time a command is spawned,
/// so they should stay cheap to clone (interned ids, small vectors).
pub trait State: Any + Send + Clone {}

/// A cached value that commands publish through an `Updater`.
///
/// Every compute is also a `State`, so front-end code can read it with
/// `StateCtx::compute` and, when it owns local edits (filters, dialogs),
/// mutate it with `StateCtx::update`.
pub trait Compute: State {}

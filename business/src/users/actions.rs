//! Status, role and delete mutations.
//!
//! Each mutation follows the same row lifecycle: the front end marks the user
//! as in flight (`Idle -> Updating`), a command calls the backend, and only
//! after an acknowledgment is the cached user changed. Either way the row goes
//! back to `Idle` and a notification is queued. A second request for a user
//! that is still updating is refused with [`DispatchOutcome::Busy`]; other
//! users are unaffected.

use storedesk_states::{Command, CommandFuture, CommandSnapshot, State, StateCtx, Updater};
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use super::api::{self, ApiResult};
use super::model::{UserRole, UserStatus};
use super::store::UserListStore;
use crate::BusinessConfig;
use crate::notification::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserActionKind {
    Status,
    Role,
    Delete,
}

impl UserActionKind {
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Status => "User status updated successfully",
            Self::Role => "User role updated successfully",
            Self::Delete => "User deleted successfully",
        }
    }

    /// Used when the backend gives no message of its own.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Status => "Failed to update user status",
            Self::Role => "Failed to update user role",
            Self::Delete => "Failed to delete user",
        }
    }
}

/// Arguments for the next mutation command.
///
/// Commands read it from their spawn-time snapshot, so overwriting it for the
/// next request does not affect runs already spawned.
#[derive(Debug, Clone, Default)]
pub struct UserActionInput {
    pub target: Option<Ustr>,
    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
}

impl State for UserActionInput {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    /// A mutation for this user is already running; nothing was sent.
    Busy,
    /// `confirm_delete` without an open dialog.
    NothingToConfirm,
}

fn begin(ctx: &mut StateCtx, id: Ustr) -> bool {
    let mut accepted = false;
    ctx.update::<UserListStore>(|store| accepted = store.try_begin_mutation(id));
    if !accepted {
        log::debug!("User {id} already has a mutation in flight");
    }
    accepted
}

pub fn request_status_update(
    ctx: &mut StateCtx,
    id: Ustr,
    status: UserStatus,
) -> DispatchOutcome {
    if !begin(ctx, id) {
        return DispatchOutcome::Busy;
    }
    ctx.update::<UserActionInput>(|input| {
        input.target = Some(id);
        input.status = Some(status);
    });
    ctx.dispatch::<UpdateUserStatusCommand>();
    DispatchOutcome::Dispatched
}

pub fn request_role_update(ctx: &mut StateCtx, id: Ustr, role: UserRole) -> DispatchOutcome {
    if !begin(ctx, id) {
        return DispatchOutcome::Busy;
    }
    ctx.update::<UserActionInput>(|input| {
        input.target = Some(id);
        input.role = Some(role);
    });
    ctx.dispatch::<UpdateUserRoleCommand>();
    DispatchOutcome::Dispatched
}

/// Open the confirmation dialog for deleting `id`.
pub fn request_delete(ctx: &mut StateCtx, id: Ustr) {
    ctx.update::<UserListStore>(|store| store.open_delete_dialog(id));
}

pub fn cancel_delete(ctx: &mut StateCtx) {
    ctx.update::<UserListStore>(UserListStore::cancel_delete);
}

/// Send the delete for the user in the open dialog.
///
/// The dialog stays open until the backend acknowledges, so a failed delete
/// can be retried or cancelled.
pub fn confirm_delete(ctx: &mut StateCtx) -> DispatchOutcome {
    let Some(id) = ctx.compute::<UserListStore>().pending_delete() else {
        return DispatchOutcome::NothingToConfirm;
    };
    if !begin(ctx, id) {
        return DispatchOutcome::Busy;
    }
    ctx.update::<UserActionInput>(|input| input.target = Some(id));
    ctx.dispatch::<DeleteUserCommand>();
    DispatchOutcome::Dispatched
}

/// Report the backend's answer back to the store.
fn settle(
    updater: &Updater,
    id: Ustr,
    kind: UserActionKind,
    result: ApiResult<()>,
    apply: impl FnOnce(&mut UserListStore) + Send + 'static,
) {
    match result {
        Ok(()) => {
            log::info!("{kind:?} mutation for user {id} acknowledged");
            updater.update::<UserListStore>(move |store| {
                apply(store);
                store.finish_mutation(id);
                store.notify(Notification::success(kind.success_message()));
            });
        }
        Err(err) => {
            log::error!("{kind:?} mutation for user {id} failed: {err}");
            let message = err.user_message(kind.failure_message());
            updater.update::<UserListStore>(move |store| {
                store.finish_mutation(id);
                store.notify(Notification::error(message));
            });
        }
    }
}

#[derive(Debug, Default)]
pub struct UpdateUserStatusCommand;

impl Command for UpdateUserStatusCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let config = snap.state::<BusinessConfig>().clone();
        let input = snap.state::<UserActionInput>().clone();

        Box::pin(async move {
            let (Some(id), Some(status)) = (input.target, input.status) else {
                log::warn!("UpdateUserStatusCommand dispatched without a target");
                return;
            };
            let result = api::update_status(&config, id, status).await;
            settle(&updater, id, UserActionKind::Status, result, move |store| {
                store.apply_status(id, status);
            });
        })
    }
}

#[derive(Debug, Default)]
pub struct UpdateUserRoleCommand;

impl Command for UpdateUserRoleCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let config = snap.state::<BusinessConfig>().clone();
        let input = snap.state::<UserActionInput>().clone();

        Box::pin(async move {
            let (Some(id), Some(role)) = (input.target, input.role) else {
                log::warn!("UpdateUserRoleCommand dispatched without a target");
                return;
            };
            let result = api::update_role(&config, id, role).await;
            settle(&updater, id, UserActionKind::Role, result, move |store| {
                store.apply_role(id, role);
            });
        })
    }
}

#[derive(Debug, Default)]
pub struct DeleteUserCommand;

impl Command for DeleteUserCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let config = snap.state::<BusinessConfig>().clone();
        let target = snap.state::<UserActionInput>().target;

        Box::pin(async move {
            let Some(id) = target else {
                log::warn!("DeleteUserCommand dispatched without a target");
                return;
            };
            let result = api::delete_user(&config, id).await;
            settle(&updater, id, UserActionKind::Delete, result, move |store| {
                store.remove_user(id);
            });
        })
    }
}

//! Fetch the users list.
//!
//! `RefreshUsersCommand` is manual-only network IO. It reads the active
//! filters from the `UserListStore` snapshot, forwards them as query
//! parameters and replaces the collection with whatever the backend returns.
//! Only the newest refresh may land: dispatching again cancels the previous
//! run and drops any result it already published.

use storedesk_states::{Command, CommandFuture, CommandSnapshot, StateCtx, Updater};
use tokio_util::sync::CancellationToken;

use super::api;
use super::store::UserListStore;
use crate::BusinessConfig;

pub const FETCH_USERS_FAILED: &str = "Failed to fetch users";

#[derive(Debug, Default)]
pub struct RefreshUsersCommand;

impl Command for RefreshUsersCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let config = snap.state::<BusinessConfig>().clone();
        let criteria = snap.compute::<UserListStore>().criteria().clone();

        Box::pin(async move {
            match api::list_users(&config, &criteria).await {
                Ok(users) => {
                    log::info!("Fetched {} users", users.len());
                    updater.update::<UserListStore>(move |store| store.replace_users(users));
                }
                Err(err) => {
                    log::error!("{FETCH_USERS_FAILED}: {err}");
                    let message = err.user_message(FETCH_USERS_FAILED);
                    updater.update::<UserListStore>(move |store| store.fail_loading(message));
                }
            }
        })
    }

    fn latest_only(&self) -> bool {
        true
    }
}

/// Mark the list as loading and spawn a refresh.
pub fn refresh_users(ctx: &mut StateCtx) {
    ctx.update::<UserListStore>(UserListStore::begin_loading);
    ctx.dispatch::<RefreshUsersCommand>();
}

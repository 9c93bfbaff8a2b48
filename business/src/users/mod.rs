//! Users management: list, filter, sort, mutate, summarize and export.

mod actions;
pub mod api;
mod export;
mod filter;
mod list_users;
mod model;
mod sort;
mod stats;
mod store;


pub use actions::{
    DeleteUserCommand, DispatchOutcome, UpdateUserRoleCommand, UpdateUserStatusCommand,
    UserActionInput, UserActionKind, cancel_delete, confirm_delete, request_delete,
    request_role_update, request_status_update,
};
pub use api::{ApiResult, UsersApiError};
pub use export::{CSV_HEADER, export_file_name, users_to_csv};
pub use filter::{FilterCriteria, RoleFilter, StatusFilter, filter_users};
pub use list_users::{FETCH_USERS_FAILED, RefreshUsersCommand, refresh_users};
pub use model::{ParseEnumError, User, UserRole, UserStats, UserStatus};
pub use sort::{SortConfig, SortDirection, SortKey, compare_by_key, sort_users};
pub use stats::{RefreshStatsCommand, StatsSource, UserStatsCompute, refresh_stats};
pub use store::{ListStatus, RowState, UserListStore};

use storedesk_states::StateCtx;

use crate::BusinessConfig;

/// Register every state, compute and command of the users screen.
pub fn register_users(ctx: &mut StateCtx, config: BusinessConfig) {
    ctx.add_state(config);
    ctx.add_state(UserActionInput::default());

    ctx.record_compute(UserListStore::default());
    ctx.record_compute(UserStatsCompute::default());

    ctx.record_command(RefreshUsersCommand);
    ctx.record_command(RefreshStatsCommand);
    ctx.record_command(UpdateUserStatusCommand);
    ctx.record_command(UpdateUserRoleCommand);
    ctx.record_command(DeleteUserCommand);
}

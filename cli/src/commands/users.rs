//! `storedesk users ...` subcommands.
//!
//! Every subcommand loads the list first, the same way the dashboard screen
//! does on mount, then works on the loaded rows.

use std::io::IsTerminal as _;
use std::path::Path;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Local, Utc};
use inquire::Confirm;
use storedesk_business::users::{
    DispatchOutcome, FilterCriteria, RowState, SortConfig, SortDirection, StatsSource, User,
    UserListStore, UserRole, UserStatsCompute, UserStatus, cancel_delete, confirm_delete,
    export_file_name, refresh_stats, refresh_users, request_delete, request_role_update,
    request_status_update, users_to_csv,
};
use storedesk_states::StateCtx;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;
use ustr::Ustr;

use crate::cli::{UsersCommand, ViewArgs};
use crate::context::flush_and_await;
use crate::output::Output;

pub async fn run_users(ctx: &mut StateCtx, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List { view, json } => run_list(ctx, &view, json).await,
        UsersCommand::Show { id, json } => run_show(ctx, &id, json).await,
        UsersCommand::Stats => run_stats(ctx).await,
        UsersCommand::SetStatus { id, status } => run_set_status(ctx, &id, status).await,
        UsersCommand::SetRole { id, role } => run_set_role(ctx, &id, role).await,
        UsersCommand::Delete { id, yes } => run_delete(ctx, &id, yes).await,
        UsersCommand::Export { view, out } => run_export(ctx, &view, &out).await,
    }
}

impl ViewArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::default()
            .with_search(self.search.clone())
            .with_status(self.status)
            .with_role(self.role)
    }

    pub fn sort_config(&self) -> Option<SortConfig> {
        self.sort.map(|key| SortConfig {
            key,
            direction: if self.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        })
    }
}

/// Print queued notifications; true when one of them is an error.
fn report(ctx: &mut StateCtx, out: &Output) -> bool {
    let mut notifications = Vec::new();
    ctx.update::<UserListStore>(|store| notifications = store.take_notifications());
    notifications.iter().fold(false, |failed, notification| {
        out.notification(notification);
        failed || notification.is_error()
    })
}

/// Fetch the list with `view` applied, failing when the backend did.
#[instrument(skip_all, name = "load_users")]
pub async fn load_users(ctx: &mut StateCtx, view: &ViewArgs, out: &Output) -> Result<()> {
    let criteria = view.criteria();
    ctx.update::<UserListStore>(|store| store.set_criteria(criteria));

    refresh_users(ctx);
    flush_and_await(ctx).await;

    if report(ctx, out) {
        bail!("could not load users");
    }

    // Header clicks: toggling from nothing twice gives a descending sort.
    if let Some(config) = view.sort_config() {
        ctx.update::<UserListStore>(|store| {
            store.request_sort(config.key);
            if config.direction == SortDirection::Descending {
                store.request_sort(config.key);
            }
        });
    }
    Ok(())
}

fn find_user(ctx: &StateCtx, id: &str) -> Result<User> {
    ctx.compute::<UserListStore>()
        .user(Ustr::from(id))
        .cloned()
        .with_context(|| format!("user {id} not found"))
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_owned(), |at| at.format("%Y-%m-%d").to_string())
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Role")]
    role: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Joined")]
    joined: String,
    #[tabled(rename = "Last Login")]
    last_login: String,
    #[tabled(rename = "Orders")]
    orders: usize,
    #[tabled(rename = "Verified")]
    verified: &'static str,
}

impl UserRow {
    fn new(user: &User, row_state: RowState) -> Self {
        let status = match row_state {
            RowState::Updating => "Updating",
            RowState::Idle => user.status_label(),
        };
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.mobile.clone().unwrap_or_default(),
            role: user.role_label(),
            status,
            joined: format_date(user.created_at),
            last_login: user
                .last_login
                .map_or_else(|| "Never".to_owned(), |at| at.format("%Y-%m-%d").to_string()),
            orders: user.order_count(),
            verified: if user.email_verified { "Yes" } else { "No" },
        }
    }
}

fn users_table(store: &UserListStore) -> String {
    let rows: Vec<UserRow> = store
        .view()
        .iter()
        .map(|user| UserRow::new(user, store.row_state(user.id)))
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[instrument(skip_all, name = "list")]
async fn run_list(ctx: &mut StateCtx, view: &ViewArgs, json: bool) -> Result<()> {
    let out = Output::new();
    load_users(ctx, view, &out).await?;

    let store = ctx.compute::<UserListStore>();
    if json {
        out.print(serde_json::to_string_pretty(store.view())?);
        return Ok(());
    }
    if store.view().is_empty() {
        out.dim("No users match.");
        return Ok(());
    }

    out.print(users_table(store));
    out.count("Showing", store.view().len(), store.users().len());
    Ok(())
}

#[instrument(skip_all, name = "show", fields(id = %id))]
async fn run_show(ctx: &mut StateCtx, id: &str, json: bool) -> Result<()> {
    let out = Output::new();
    load_users(ctx, &ViewArgs::default(), &out).await?;
    let user = find_user(ctx, id)?;

    if json {
        out.print(serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    out.header(if user.name.is_empty() { user.id.as_str() } else { user.name.as_str() });
    out.divider(40);
    out.labeled_indent("ID", user.id, 2);
    out.labeled_indent("Email", &user.email, 2);
    out.labeled_indent("Phone", user.mobile.as_deref().unwrap_or("-"), 2);
    out.labeled_indent("Role", user.role_label(), 2);
    out.labeled_indent("Status", user.status_label(), 2);
    out.labeled_indent("Joined", format_date(user.created_at), 2);
    out.labeled_indent(
        "Last login",
        user.last_login
            .map_or_else(|| "Never".to_owned(), |at| at.to_rfc3339()),
        2,
    );
    out.labeled_indent("Orders", user.order_count(), 2);
    out.labeled_indent("Email verified", if user.email_verified { "Yes" } else { "No" }, 2);
    if let Some(avatar) = &user.avatar {
        out.labeled_indent("Avatar", avatar, 2);
    }
    Ok(())
}

#[instrument(skip_all, name = "stats")]
async fn run_stats(ctx: &mut StateCtx) -> Result<()> {
    let out = Output::new();

    // List and stats are independent; both go out together.
    refresh_users(ctx);
    refresh_stats(ctx);
    flush_and_await(ctx).await;
    let list_failed = report(ctx, &out);

    let (stats, source) = ctx
        .compute::<UserStatsCompute>()
        .resolve(ctx.compute::<UserListStore>());

    out.header("Users");
    out.stat_card("Total", stats.total);
    out.stat_card("Active", stats.active);
    out.stat_card("Customers", stats.customers);
    out.stat_card("Admins", stats.admins);

    if source == StatsSource::Derived {
        if list_failed {
            bail!("neither stats nor the user list could be loaded");
        }
        out.dim("Counted from the loaded users; the stats endpoint did not answer.");
    }
    Ok(())
}

/// Dispatch through `request` and report how it went.
async fn run_mutation(
    ctx: &mut StateCtx,
    out: &Output,
    request: impl FnOnce(&mut StateCtx) -> DispatchOutcome,
) -> Result<()> {
    match request(ctx) {
        DispatchOutcome::Dispatched => {}
        DispatchOutcome::Busy => bail!("an update for this user is already running"),
        DispatchOutcome::NothingToConfirm => {
            out.warning("Nothing to confirm");
            return Ok(());
        }
    }
    flush_and_await(ctx).await;

    if report(ctx, out) {
        bail!("the backend rejected the change");
    }
    Ok(())
}

#[instrument(skip_all, name = "set_status", fields(id = %id, status = status.as_str()))]
async fn run_set_status(ctx: &mut StateCtx, id: &str, status: UserStatus) -> Result<()> {
    let out = Output::new();
    load_users(ctx, &ViewArgs::default(), &out).await?;
    let user = find_user(ctx, id)?;

    if user.status == Some(status) {
        out.dim(format!("{} is already {status}", user.email));
        return Ok(());
    }
    run_mutation(ctx, &out, |ctx| request_status_update(ctx, user.id, status)).await
}

#[instrument(skip_all, name = "set_role", fields(id = %id, role = role.as_str()))]
async fn run_set_role(ctx: &mut StateCtx, id: &str, role: UserRole) -> Result<()> {
    let out = Output::new();
    load_users(ctx, &ViewArgs::default(), &out).await?;
    let user = find_user(ctx, id)?;

    if user.role == Some(role) {
        out.dim(format!("{} is already {role}", user.email));
        return Ok(());
    }
    run_mutation(ctx, &out, |ctx| request_role_update(ctx, user.id, role)).await
}

#[instrument(skip_all, name = "delete", fields(id = %id))]
async fn run_delete(ctx: &mut StateCtx, id: &str, yes: bool) -> Result<()> {
    let out = Output::new();
    load_users(ctx, &ViewArgs::default(), &out).await?;
    let user = find_user(ctx, id)?;

    request_delete(ctx, user.id);

    if !yes {
        if !std::io::stdin().is_terminal() {
            cancel_delete(ctx);
            bail!("refusing to delete without --yes when stdin is not a terminal");
        }
        let confirmed = Confirm::new(&format!("Delete {} <{}>?", user.name, user.email))
            .with_default(false)
            .with_help_message("This cannot be undone")
            .prompt()
            .context("Failed to read confirmation")?;
        if !confirmed {
            cancel_delete(ctx);
            out.dim("Cancelled.");
            return Ok(());
        }
    }

    run_mutation(ctx, &out, confirm_delete).await
}

/// Writes the CSV for the current view into `dir`; returns the file path.
pub fn write_export(
    store: &UserListStore,
    dir: &Path,
    today: chrono::NaiveDate,
) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(export_file_name(today));
    std::fs::write(&path, users_to_csv(store.view()))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[instrument(skip_all, name = "export")]
async fn run_export(ctx: &mut StateCtx, view: &ViewArgs, dir: &Path) -> Result<()> {
    let out = Output::new();
    load_users(ctx, view, &out).await?;

    let store = ctx.compute::<UserListStore>();
    let path = write_export(store, dir, Local::now().date_naive())?;
    out.success(format!(
        "Exported {} user(s) to {}",
        store.view().len(),
        path.display()
    ));
    Ok(())
}

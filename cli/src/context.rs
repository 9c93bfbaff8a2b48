//! State context initialization and task management utilities.

use storedesk_business::{BusinessConfig, register_users};
use storedesk_states::StateCtx;
use tracing::instrument;

/// Initialize `StateCtx` with the users screen states, computes, and commands.
pub fn build_state_ctx(config: BusinessConfig) -> StateCtx {
    let mut ctx = StateCtx::new();
    register_users(&mut ctx, config);
    ctx
}

/// Environment first, then explicit flags on top.
pub fn resolve_config(
    api_url: Option<String>,
    token: Option<String>,
) -> anyhow::Result<BusinessConfig> {
    let mut config = BusinessConfig::from_env()?;
    if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
        config.api_base_url = url;
    }
    if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
        config.auth_token = Some(token);
    }
    log::debug!("Using API at {}", config.api_url());
    Ok(config)
}

/// Await all pending tasks in the `JoinSet` and sync computes.
#[instrument(skip_all, name = "await_tasks")]
pub async fn await_pending_tasks(ctx: &mut StateCtx) {
    while ctx.task_count() > 0 {
        if ctx.task_set_mut().join_next().await.is_some() {
            ctx.sync_computes();
        }
    }
}

/// Flush commands and await all spawned tasks.
#[instrument(skip_all, name = "flush")]
pub async fn flush_and_await(ctx: &mut StateCtx) {
    ctx.sync_computes();
    ctx.flush_commands();
    await_pending_tasks(ctx).await;
    ctx.sync_computes();
}

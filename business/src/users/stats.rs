//! Summary card counts, fetched independently of the list.

use chrono::{DateTime, Utc};
use storedesk_states::{
    Command, CommandFuture, CommandSnapshot, Compute, State, StateCtx, Updater,
};
use tokio_util::sync::CancellationToken;

use super::api;
use super::model::UserStats;
use super::store::UserListStore;
use crate::BusinessConfig;

/// Last counts reported by `/admin/users/stats`.
///
/// A failed fetch never clears this; the previous value stays on screen.
#[derive(Debug, Clone, Default)]
pub struct UserStatsCompute {
    stats: Option<UserStats>,
    fetched_at: Option<DateTime<Utc>>,
}

impl State for UserStatsCompute {}
impl Compute for UserStatsCompute {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Backend,
    /// Counted from the loaded users because the backend never answered.
    Derived,
}

impl UserStatsCompute {
    pub fn stats(&self) -> Option<UserStats> {
        self.stats
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn record(&mut self, stats: UserStats) {
        self.stats = Some(stats);
        self.fetched_at = Some(Utc::now());
    }

    /// Backend counts when available, else counts derived from `store`.
    pub fn resolve(&self, store: &UserListStore) -> (UserStats, StatsSource) {
        match self.stats {
            Some(stats) => (stats, StatsSource::Backend),
            None => (store.derived_stats(), StatsSource::Derived),
        }
    }
}

#[derive(Debug, Default)]
pub struct RefreshStatsCommand;

impl Command for RefreshStatsCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let config = snap.state::<BusinessConfig>().clone();

        Box::pin(async move {
            match api::fetch_stats(&config).await {
                Ok(stats) => {
                    log::debug!("Fetched user stats: {stats:?}");
                    updater.update::<UserStatsCompute>(move |compute| compute.record(stats));
                }
                Err(err) => log::warn!("Failed to fetch user stats: {err}"),
            }
        })
    }
}

pub fn refresh_stats(ctx: &mut StateCtx) {
    ctx.dispatch::<RefreshStatsCommand>();
}

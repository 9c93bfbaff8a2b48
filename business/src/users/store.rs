//! The users screen state: loaded collection, derived view and row locks.
//!
//! `UserListStore` is a compute-shaped cache. The front end edits it through
//! `StateCtx::update` (filters, sort, dialogs) and commands reconcile it through
//! `Updater::update` once the backend has answered. Every edit that can change
//! which users are visible re-derives `view` from `users`, so the view is always
//! `sort(filter(users))`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use storedesk_states::{Compute, State};
use ustr::Ustr;

use super::filter::{FilterCriteria, RoleFilter, StatusFilter, filter_users};
use super::model::{User, UserRole, UserStats, UserStatus};
use super::sort::{SortConfig, SortKey, sort_users};
use crate::notification::Notification;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; the collection was cleared.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Idle,
    /// A mutation for this user is waiting on the backend.
    Updating,
}

#[derive(Debug, Clone, Default)]
pub struct UserListStore {
    users: Vec<User>,
    view: Vec<User>,
    criteria: FilterCriteria,
    sort: Option<SortConfig>,
    status: ListStatus,
    in_flight: BTreeSet<Ustr>,
    pending_delete: Option<Ustr>,
    notifications: Vec<Notification>,
    last_fetch: Option<DateTime<Utc>>,
}

impl State for UserListStore {}
impl Compute for UserListStore {}

impl UserListStore {
    /// Full collection in backend order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Filtered and sorted rows, as displayed.
    pub fn view(&self) -> &[User] {
        &self.view
    }

    pub fn user(&self, id: Ustr) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn sort(&self) -> Option<SortConfig> {
        self.sort
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    pub fn begin_loading(&mut self) {
        self.status = ListStatus::Loading;
    }

    pub fn replace_users(&mut self, users: Vec<User>) {
        log::debug!("Loaded {} users", users.len());
        self.users = users;
        self.status = ListStatus::Loaded;
        self.last_fetch = Some(Utc::now());
        self.refresh_view();
    }

    /// A failed fetch leaves an empty table rather than stale rows. An open
    /// delete dialog closes with it since its target is gone.
    pub fn fail_loading(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.users.clear();
        self.view.clear();
        self.pending_delete = None;
        self.notify(Notification::error(message.clone()));
        self.status = ListStatus::Error(message);
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.criteria.search = search.into();
        self.refresh_view();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.criteria.status = status;
        self.refresh_view();
    }

    pub fn set_role_filter(&mut self, role: RoleFilter) {
        self.criteria.role = role;
        self.refresh_view();
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refresh_view();
    }

    /// Header click on `key`. Returns the configuration now in effect.
    pub fn request_sort(&mut self, key: SortKey) -> SortConfig {
        let config = SortConfig::toggle(self.sort, key);
        self.sort = Some(config);
        self.refresh_view();
        config
    }

    pub fn refresh_view(&mut self) {
        let mut view = filter_users(&self.users, &self.criteria);
        if let Some(config) = self.sort {
            sort_users(&mut view, config);
        }
        self.view = view;
    }

    pub fn row_state(&self, id: Ustr) -> RowState {
        if self.in_flight.contains(&id) {
            RowState::Updating
        } else {
            RowState::Idle
        }
    }

    /// Marks `id` as updating. False if a mutation for it is already running.
    pub fn try_begin_mutation(&mut self, id: Ustr) -> bool {
        self.in_flight.insert(id)
    }

    pub fn finish_mutation(&mut self, id: Ustr) {
        self.in_flight.remove(&id);
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns false when `id` is not loaded.
    pub fn apply_status(&mut self, id: Ustr, status: UserStatus) -> bool {
        self.modify_user(id, |user| user.status = Some(status))
    }

    pub fn apply_role(&mut self, id: Ustr, role: UserRole) -> bool {
        self.modify_user(id, |user| user.role = Some(role))
    }

    fn modify_user(&mut self, id: Ustr, f: impl FnOnce(&mut User)) -> bool {
        let Some(user) = self.users.iter_mut().find(|user| user.id == id) else {
            log::debug!("User {id} is not loaded, nothing to update locally");
            return false;
        };
        f(user);
        self.refresh_view();
        true
    }

    /// Drops `id` from the collection and the view, closing its delete dialog.
    pub fn remove_user(&mut self, id: Ustr) -> bool {
        let before = self.users.len();
        self.users.retain(|user| user.id != id);
        self.view.retain(|user| user.id != id);
        if self.pending_delete == Some(id) {
            self.pending_delete = None;
        }
        self.users.len() != before
    }

    pub fn open_delete_dialog(&mut self, id: Ustr) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// User awaiting delete confirmation, if the dialog is open.
    pub fn pending_delete(&self) -> Option<Ustr> {
        self.pending_delete
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Summary counts computed from the loaded collection.
    pub fn derived_stats(&self) -> UserStats {
        UserStats::from_users(&self.users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationLevel;

    fn store() -> UserListStore {
        let mut store = UserListStore::default();
        store.replace_users(vec![
            User::new("u1", "Ann", "ann@x.io")
                .with_status(UserStatus::Active)
                .with_role(UserRole::User),
            User::new("u2", "Bob", "bob@x.io")
                .with_status(UserStatus::Suspended)
                .with_role(UserRole::Admin),
            User::new("u3", "Cal", "cal@x.io")
                .with_status(UserStatus::Active)
                .with_role(UserRole::User),
        ]);
        store
    }

    fn view_ids(store: &UserListStore) -> Vec<&str> {
        store.view().iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn starts_idle_without_sort() {
        let store = UserListStore::default();
        assert_eq!(store.status(), &ListStatus::Idle);
        assert_eq!(store.sort(), None);
        assert!(store.view().is_empty());
    }

    #[test]
    fn replace_users_derives_view() {
        let store = store();
        assert_eq!(store.status(), &ListStatus::Loaded);
        assert!(store.last_fetch().is_some());
        assert_eq!(view_ids(&store), vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn filters_and_sort_compose() {
        let mut store = store();
        store.set_status_filter(StatusFilter::Only(UserStatus::Active));
        assert_eq!(view_ids(&store), vec!["u1", "u3"]);

        store.request_sort(SortKey::Name);
        let config = store.request_sort(SortKey::Name);
        assert_eq!(config.direction, crate::users::sort::SortDirection::Descending);
        assert_eq!(view_ids(&store), vec!["u3", "u1"]);

        store.set_search("ann");
        assert_eq!(view_ids(&store), vec!["u1"]);
        assert_eq!(store.users().len(), 3);
    }

    #[test]
    fn status_change_drops_user_from_filtered_view() {
        let mut store = store();
        store.set_status_filter(StatusFilter::Only(UserStatus::Active));

        assert!(store.apply_status(Ustr::from("u1"), UserStatus::Inactive));
        assert_eq!(view_ids(&store), vec!["u3"]);
        assert_eq!(
            store.user(Ustr::from("u1")).and_then(|u| u.status),
            Some(UserStatus::Inactive)
        );
    }

    #[test]
    fn unknown_user_updates_are_ignored() {
        let mut store = store();
        assert!(!store.apply_role(Ustr::from("nobody"), UserRole::Admin));
        assert!(!store.remove_user(Ustr::from("nobody")));
        assert_eq!(store.users().len(), 3);
    }

    #[test]
    fn in_flight_is_per_user() {
        let mut store = store();
        let ann = Ustr::from("u1");
        let bob = Ustr::from("u2");

        assert!(store.try_begin_mutation(ann));
        assert!(!store.try_begin_mutation(ann));
        assert!(store.try_begin_mutation(bob));
        assert_eq!(store.row_state(ann), RowState::Updating);

        store.finish_mutation(ann);
        assert_eq!(store.row_state(ann), RowState::Idle);
        assert_eq!(store.in_flight_count(), 1);
    }

    #[test]
    fn remove_user_closes_dialog() {
        let mut store = store();
        let bob = Ustr::from("u2");
        store.open_delete_dialog(bob);

        assert!(store.remove_user(bob));
        assert_eq!(store.pending_delete(), None);
        assert!(store.user(bob).is_none());
        assert_eq!(view_ids(&store), vec!["u1", "u3"]);
    }

    #[test]
    fn failed_fetch_clears_and_notifies() {
        let mut store = store();
        store.fail_loading("Failed to fetch users");

        assert!(store.users().is_empty());
        assert!(store.view().is_empty());
        assert_eq!(
            store.status(),
            &ListStatus::Error("Failed to fetch users".to_owned())
        );

        let notes = store.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert!(store.notifications().is_empty());
    }

    #[test]
    fn failed_fetch_closes_open_delete_dialog() {
        let mut store = store();
        store.open_delete_dialog(Ustr::from("u2"));

        store.fail_loading("Failed to fetch users");

        assert_eq!(store.pending_delete(), None);
        assert!(store.user(Ustr::from("u2")).is_none());
    }

    #[test]
    fn derived_stats_follow_collection() {
        let store = store();
        let stats = store.derived_stats();
        assert_eq!(
            (stats.total, stats.active, stats.customers, stats.admins),
            (3, 2, 2, 1)
        );
    }
}

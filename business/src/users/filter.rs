//! Search, status and role predicates over the loaded users.

use std::fmt;
use std::str::FromStr;

use super::model::{ParseEnumError, User, UserRole, UserStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(UserStatus),
}

impl StatusFilter {
    /// A user without a known status only passes `All`.
    pub fn matches(self, status: Option<UserStatus>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => status == Some(wanted),
        }
    }

    /// Value sent as the `status` query parameter; empty means no filter.
    pub fn query_value(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Only(status) => status.as_str(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Role filter in display terms. Operators see "Customer" where the backend
/// stores `user`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Admin,
    Customer,
}

impl RoleFilter {
    pub fn storage_role(self) -> Option<UserRole> {
        match self {
            Self::All => None,
            Self::Admin => Some(UserRole::Admin),
            Self::Customer => Some(UserRole::User),
        }
    }

    pub fn matches(self, role: Option<UserRole>) -> bool {
        match self.storage_role() {
            None => true,
            Some(wanted) => role == Some(wanted),
        }
    }

    pub fn query_value(self) -> &'static str {
        self.storage_role().map_or("", UserRole::as_str)
    }
}

impl fmt::Display for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "All",
            Self::Admin => "Admin",
            Self::Customer => "Customer",
        })
    }
}

impl FromStr for RoleFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Ok(match s.parse::<UserRole>()? {
            UserRole::Admin => Self::Admin,
            UserRole::User => Self::Customer,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub status: StatusFilter,
    pub role: RoleFilter,
}

impl FilterCriteria {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_role(mut self, role: RoleFilter) -> Self {
        self.role = role;
        self
    }

    /// Any non-empty term, whitespace included, is a real search.
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.status == StatusFilter::All
            && self.role == RoleFilter::All
    }

    pub fn matches(&self, user: &User) -> bool {
        matches_search(user, &self.search.to_lowercase())
            && self.status.matches(user.status)
            && self.role.matches(user.role)
    }
}

// `needle` is already lowercased.
fn matches_search(user: &User, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |field: &str| field.to_lowercase().contains(needle);

    contains(&user.name)
        || contains(&user.email)
        || user.mobile.as_deref().is_some_and(contains)
        || contains(user.id.as_str())
}

/// Users passing every predicate, in input order.
pub fn filter_users(users: &[User], criteria: &FilterCriteria) -> Vec<User> {
    if criteria.is_empty() {
        return users.to_vec();
    }
    users
        .iter()
        .filter(|user| criteria.matches(user))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann_and_bob() -> Vec<User> {
        vec![
            User::new("u1", "Ann", "ann@x.io")
                .with_status(UserStatus::Active)
                .with_role(UserRole::User)
                .with_mobile("5551234"),
            User::new("u2", "Bob", "bob@x.io")
                .with_status(UserStatus::Suspended)
                .with_role(UserRole::Admin),
        ]
    }

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn status_active_keeps_only_ann() {
        let criteria =
            FilterCriteria::default().with_status(StatusFilter::Only(UserStatus::Active));
        assert_eq!(names(&filter_users(&ann_and_bob(), &criteria)), vec!["Ann"]);
    }

    #[test]
    fn whitespace_term_is_a_real_search() {
        let users = vec![
            User::new("u1", "Ann Lee", "ann@x.io").with_status(UserStatus::Active),
            User::new("u2", "Bob", "bob@x.io").with_status(UserStatus::Active),
        ];
        let alone = FilterCriteria::default().with_search(" ");
        let combined = alone
            .clone()
            .with_status(StatusFilter::Only(UserStatus::Active));

        assert!(!alone.is_empty());
        assert_eq!(names(&filter_users(&users, &alone)), vec!["Ann Lee"]);
        assert_eq!(names(&filter_users(&users, &combined)), vec!["Ann Lee"]);
    }

    #[test]
    fn empty_criteria_keeps_everything() {
        let users = ann_and_bob();
        assert_eq!(filter_users(&users, &FilterCriteria::default()), users);
    }

    #[test]
    fn search_is_case_insensitive_over_any_field() {
        let users = ann_and_bob();
        for term in ["ANN", "bob@", "555", "u2"] {
            let criteria = FilterCriteria::default().with_search(term);
            let found = filter_users(&users, &criteria);
            assert_eq!(found.len(), 1, "term {term} should match exactly one user");
        }
    }

    #[test]
    fn search_results_always_contain_the_term() {
        let users = ann_and_bob();
        let needle = "o";
        let found = filter_users(&users, &FilterCriteria::default().with_search(needle));

        for user in &users {
            let has_term = [
                Some(user.name.as_str()),
                Some(user.email.as_str()),
                user.mobile.as_deref(),
                Some(user.id.as_str()),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle));
            assert_eq!(found.contains(user), has_term, "user {} misfiltered", user.id);
        }
    }

    #[test]
    fn role_filter_maps_display_to_storage() {
        let users = ann_and_bob();
        let customers = FilterCriteria::default().with_role(RoleFilter::Customer);
        let admins = FilterCriteria::default().with_role(RoleFilter::Admin);

        assert_eq!(names(&filter_users(&users, &customers)), vec!["Ann"]);
        assert_eq!(names(&filter_users(&users, &admins)), vec!["Bob"]);
    }

    #[test]
    fn predicates_are_anded() {
        let criteria = FilterCriteria::default()
            .with_search("bob")
            .with_status(StatusFilter::Only(UserStatus::Active));
        assert!(filter_users(&ann_and_bob(), &criteria).is_empty());
    }

    #[test]
    fn user_without_status_only_passes_all() {
        let users = vec![User::new("u3", "Cid", "cid@x.io")];
        for status in UserStatus::ALL {
            let criteria = FilterCriteria::default().with_status(StatusFilter::Only(status));
            assert!(
                filter_users(&users, &criteria).is_empty(),
                "{status} matched an absent status"
            );
        }
        assert_eq!(filter_users(&users, &FilterCriteria::default()).len(), 1);
    }

    #[test]
    fn filters_parse_from_cli_words() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "inactive".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(UserStatus::Inactive))
        );
        assert_eq!("customer".parse::<RoleFilter>(), Ok(RoleFilter::Customer));
        assert_eq!("user".parse::<RoleFilter>(), Ok(RoleFilter::Customer));
        assert_eq!(RoleFilter::Customer.query_value(), "user");
        assert_eq!(StatusFilter::All.query_value(), "");
    }
}

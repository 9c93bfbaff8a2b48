//! Column sorting with the header-click toggle rule.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::model::{ParseEnumError, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Name,
    Email,
    Mobile,
    Role,
    Status,
    CreatedAt,
    LastLogin,
    OrderCount,
    EmailVerified,
}

impl SortKey {
    pub const ALL: [Self; 10] = [
        Self::Id,
        Self::Name,
        Self::Email,
        Self::Mobile,
        Self::Role,
        Self::Status,
        Self::CreatedAt,
        Self::LastLogin,
        Self::OrderCount,
        Self::EmailVerified,
    ];

    /// Field name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::Mobile => "mobile",
            Self::Role => "role",
            Self::Status => "status",
            Self::CreatedAt => "createdAt",
            Self::LastLogin => "lastLogin",
            Self::OrderCount => "orderCount",
            Self::EmailVerified => "emailVerified",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    /// Matches wire names ignoring case, `-` and `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| ParseEnumError::new("sort key", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Same key flips the direction; a new key starts ascending.
    pub fn toggle(current: Option<Self>, key: SortKey) -> Self {
        match current {
            Some(config) if config.key == key => Self {
                key,
                direction: config.direction.flipped(),
            },
            _ => Self::ascending(key),
        }
    }
}

/// Ascending comparison of two users on one key.
///
/// Missing timestamps sort as the Unix epoch and a missing order history as
/// zero orders. Other absent values sort before present ones.
pub fn compare_by_key(a: &User, b: &User, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.as_str().cmp(b.id.as_str()),
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Email => a.email.cmp(&b.email),
        SortKey::Mobile => a.mobile.cmp(&b.mobile),
        SortKey::Role => a.role.map(|r| r.as_str()).cmp(&b.role.map(|r| r.as_str())),
        SortKey::Status => a
            .status
            .map(|s| s.as_str())
            .cmp(&b.status.map(|s| s.as_str())),
        SortKey::CreatedAt => a.created_at_or_epoch().cmp(&b.created_at_or_epoch()),
        SortKey::LastLogin => a.last_login_or_epoch().cmp(&b.last_login_or_epoch()),
        SortKey::OrderCount => a.order_count().cmp(&b.order_count()),
        SortKey::EmailVerified => a.email_verified.cmp(&b.email_verified),
    }
}

/// Stable in both directions: ties keep their input order.
pub fn sort_users(users: &mut [User], config: SortConfig) {
    users.sort_by(|a, b| {
        let ordering = compare_by_key(a, b, config.key);
        match config.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{UserRole, UserStatus};
    use chrono::{TimeZone, Utc};

    fn ids(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    fn dated(id: &str, year: i32) -> User {
        User::new(id, id, format!("{id}@x.io"))
            .with_created_at(Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn toggle_rule() {
        let first = SortConfig::toggle(None, SortKey::Name);
        assert_eq!(first, SortConfig::ascending(SortKey::Name));

        let second = SortConfig::toggle(Some(first), SortKey::Name);
        assert_eq!(second.direction, SortDirection::Descending);

        let other = SortConfig::toggle(Some(second), SortKey::Email);
        assert_eq!(other, SortConfig::ascending(SortKey::Email));
    }

    #[test]
    fn created_at_round_trip_returns_to_ascending_order() {
        let mut users = vec![dated("b", 2022), dated("a", 2020), dated("c", 2024)];

        let asc = SortConfig::toggle(None, SortKey::CreatedAt);
        sort_users(&mut users, asc);
        let ascending = ids(&users).join(",");
        assert_eq!(ascending, "a,b,c");

        let desc = SortConfig::toggle(Some(asc), SortKey::CreatedAt);
        sort_users(&mut users, desc);
        assert_eq!(ids(&users), vec!["c", "b", "a"]);

        let asc_again = SortConfig::toggle(Some(desc), SortKey::CreatedAt);
        sort_users(&mut users, asc_again);
        assert_eq!(ids(&users).join(","), ascending);
    }

    #[test]
    fn missing_timestamp_sorts_as_epoch() {
        let mut users = vec![
            dated("new", 2024),
            User::new("none", "none", "n@x.io"),
            dated("old", 1999),
        ];
        sort_users(&mut users, SortConfig::ascending(SortKey::CreatedAt));
        assert_eq!(ids(&users), vec!["none", "old", "new"]);
    }

    #[test]
    fn order_count_is_monotonic_with_missing_history_as_zero() {
        let mut users = vec![
            User::new("three", "c", "c@x").with_orders(3),
            User::new("none", "n", "n@x"),
            User::new("one", "o", "o@x").with_orders(1),
            User::new("zero", "z", "z@x").with_orders(0),
        ];
        sort_users(&mut users, SortConfig::ascending(SortKey::OrderCount));

        let counts: Vec<usize> = users.iter().map(User::order_count).collect();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]), "counts {counts:?} not ascending");
        assert_eq!(ids(&users), vec!["none", "zero", "one", "three"]);
    }

    #[test]
    fn sorting_twice_inverts_distinct_keys() {
        let mut users = vec![
            User::new("2", "Bea", "b@x"),
            User::new("1", "Ann", "a@x"),
            User::new("3", "Cal", "c@x"),
        ];
        let asc = SortConfig::toggle(None, SortKey::Name);
        sort_users(&mut users, asc);
        let forward: Vec<String> = users.iter().map(|u| u.name.clone()).collect();

        sort_users(&mut users, SortConfig::toggle(Some(asc), SortKey::Name));
        let backward: Vec<String> = users.iter().rev().map(|u| u.name.clone()).collect();
        assert_eq!(forward, backward);
    }

    #[test]
    fn ties_keep_input_order_in_both_directions() {
        let users = vec![
            User::new("a", "x", "a@x").with_role(UserRole::User),
            User::new("b", "x", "b@x").with_role(UserRole::Admin),
            User::new("c", "x", "c@x").with_role(UserRole::User),
        ];

        let mut asc = users.clone();
        sort_users(&mut asc, SortConfig::ascending(SortKey::Role));
        assert_eq!(ids(&asc), vec!["b", "a", "c"]);

        let mut desc = users;
        sort_users(
            &mut desc,
            SortConfig {
                key: SortKey::Role,
                direction: SortDirection::Descending,
            },
        );
        assert_eq!(ids(&desc), vec!["a", "c", "b"]);
    }

    #[test]
    fn absent_values_sort_first() {
        let mut users = vec![
            User::new("a", "a", "a@x").with_status(UserStatus::Active),
            User::new("b", "b", "b@x"),
            User::new("c", "c", "c@x").with_email_verified(true).with_mobile("1"),
        ];
        sort_users(&mut users, SortConfig::ascending(SortKey::Status));
        assert_eq!(ids(&users)[0], "b");

        sort_users(&mut users, SortConfig::ascending(SortKey::Mobile));
        assert_eq!(ids(&users).last(), Some(&"c"));

        sort_users(&mut users, SortConfig::ascending(SortKey::EmailVerified));
        assert_eq!(ids(&users).last(), Some(&"c"));
    }

    #[test]
    fn sort_key_parses_loosely() {
        assert_eq!("created-at".parse::<SortKey>(), Ok(SortKey::CreatedAt));
        assert_eq!("order_count".parse::<SortKey>(), Ok(SortKey::OrderCount));
        assert_eq!("Name".parse::<SortKey>(), Ok(SortKey::Name));
        assert!("age".parse::<SortKey>().is_err());
    }
}

//! User records as served by `/admin/users`.
//!
//! The backend is loose about shapes (`_id` vs `id`, numeric phone numbers,
//! unknown enum strings), so every field is decoded leniently: anything that
//! does not fit becomes `None` or a default instead of failing the whole list.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use ustr::Ustr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    /// Storage value used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Label shown to operators; plain users are customers of the shop.
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "Customer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    /// Accepts the storage values and the display labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" | "customer" => Ok(Self::User),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Suspended];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = ParseEnumError;

    /// Case-insensitive on input; the wire form is always capitalized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            _ => Err(ParseEnumError::new("status", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(serialize_with = "ser_id")]
    pub id: Ustr,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(serialize_with = "ser_role", skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(serialize_with = "ser_status", skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_history: Option<Vec<Value>>,
    #[serde(rename = "isEmailVerified")]
    pub email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A user record exactly as the backend may send it. `_id` and `id` are kept
/// apart because Mongo documents with virtuals carry both.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    #[serde(rename = "_id", default, deserialize_with = "de_opt_text")]
    object_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    name: String,
    #[serde(default, deserialize_with = "de_text")]
    email: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    mobile: Option<String>,
    #[serde(default, deserialize_with = "de_enum")]
    role: Option<UserRole>,
    #[serde(default, deserialize_with = "de_enum")]
    status: Option<UserStatus>,
    #[serde(default, deserialize_with = "de_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_timestamp")]
    last_login: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_orders")]
    order_history: Option<Vec<Value>>,
    #[serde(rename = "isEmailVerified", default, deserialize_with = "de_flag")]
    email_verified: bool,
    #[serde(default, deserialize_with = "de_opt_text")]
    avatar: Option<String>,
}

impl<'de> Deserialize<'de> for User {
    /// Fails only when the record has no usable id; `_id` wins over `id`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireUser::deserialize(deserializer)?;
        let id = wire
            .object_id
            .or(wire.id)
            .ok_or_else(|| serde::de::Error::custom("user record has no usable id"))?;

        Ok(Self {
            id: Ustr::from(&id),
            name: wire.name,
            email: wire.email,
            mobile: wire.mobile,
            role: wire.role,
            status: wire.status,
            created_at: wire.created_at,
            last_login: wire.last_login,
            order_history: wire.order_history,
            email_verified: wire.email_verified,
            avatar: wire.avatar,
        })
    }
}

impl User {
    pub fn new(id: &str, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Ustr::from(id),
            name: name.into(),
            email: email.into(),
            mobile: None,
            role: None,
            status: None,
            created_at: None,
            last_login: None,
            order_history: None,
            email_verified: false,
            avatar: None,
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = Some(mobile.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_last_login(mut self, at: DateTime<Utc>) -> Self {
        self.last_login = Some(at);
        self
    }

    pub fn with_orders(mut self, count: usize) -> Self {
        self.order_history = Some(
            (0..count)
                .map(|i| Value::from(format!("order-{i}")))
                .collect(),
        );
        self
    }

    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }

    /// Length of the order history; a missing history counts as zero.
    pub fn order_count(&self) -> usize {
        self.order_history.as_ref().map_or(0, Vec::len)
    }

    pub fn created_at_or_epoch(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn last_login_or_epoch(&self) -> DateTime<Utc> {
        self.last_login.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn role_label(&self) -> &'static str {
        self.role.map_or("Unknown", UserRole::label)
    }

    pub fn status_label(&self) -> &'static str {
        self.status.map_or("Unknown", UserStatus::as_str)
    }
}

/// Aggregate counts for the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UserStats {
    #[serde(alias = "totalUsers")]
    pub total: u64,
    #[serde(alias = "activeUsers")]
    pub active: u64,
    #[serde(alias = "totalCustomers")]
    pub customers: u64,
    #[serde(alias = "totalAdmins")]
    pub admins: u64,
}

impl UserStats {
    /// Counts derived by scanning a loaded collection.
    pub fn from_users(users: &[User]) -> Self {
        users.iter().fold(Self::default(), |mut stats, user| {
            stats.total += 1;
            if user.status == Some(UserStatus::Active) {
                stats.active += 1;
            }
            match user.role {
                Some(UserRole::User) => stats.customers += 1,
                Some(UserRole::Admin) => stats.admins += 1,
                None => {}
            }
            stats
        })
    }
}

/// `GET /admin/users` answers either a bare array or `{ "users": [...] }`.
///
/// Records are decoded one by one so a single bad record is skipped instead
/// of failing the whole list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListUsersResponse {
    Bare(Vec<Value>),
    Wrapped { users: Vec<Value> },
}

impl ListUsersResponse {
    pub(crate) fn into_users(self) -> Vec<User> {
        let records = match self {
            Self::Bare(records) | Self::Wrapped { users: records } => records,
        };
        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<User>(record) {
                Ok(user) => Some(user),
                Err(err) => {
                    log::warn!("Skipping user record {index}: {err}");
                    None
                }
            })
            .collect()
    }
}

/// `GET /admin/users/stats` may nest the counts under `stats`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StatsResponse {
    Wrapped { stats: UserStats },
    Bare(UserStats),
}

impl StatsResponse {
    pub(crate) fn into_stats(self) -> UserStats {
        match self {
            Self::Wrapped { stats } | Self::Bare(stats) => stats,
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn ser_id<S: Serializer>(id: &Ustr, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(id.as_str())
}

fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string).unwrap_or_default())
}

fn de_opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(scalar_to_string)
        .filter(|s| !s.trim().is_empty()))
}

fn de_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok()))
}

fn ser_role<S: Serializer>(role: &Option<UserRole>, serializer: S) -> Result<S::Ok, S::Error> {
    match role {
        Some(role) => serializer.serialize_str(role.as_str()),
        None => serializer.serialize_none(),
    }
}

fn ser_status<S: Serializer>(
    status: &Option<UserStatus>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match status {
        Some(status) => serializer.serialize_str(status.as_str()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn de_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp))
}

fn de_orders<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Value>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(orders)) => Some(orders),
        _ => None,
    })
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

//! Admin users API client helpers.
//!
//! Performs network IO against `/admin/users*` and is meant to be called from
//! commands. Callers map results into store updates; nothing here touches
//! state.

use serde::{Deserialize, Serialize};
use ustr::Ustr;

use super::filter::FilterCriteria;
use super::model::{ListUsersResponse, StatsResponse, User, UserRole, UserStats, UserStatus};
use crate::BusinessConfig;
use crate::http::{Client, HttpError, RequestBuilder, Response};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsersApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API returned status {status}")]
    Status {
        status: u16,
        /// `message` from the error body, when the backend sent one.
        message: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl UsersApiError {
    /// Text for the operator: the backend's own message, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}

impl From<HttpError> for UsersApiError {
    fn from(err: HttpError) -> Self {
        Self::Transport(err.message)
    }
}

pub type ApiResult<T> = Result<T, UsersApiError>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct RoleBody {
    role: &'static str,
}

fn user_url(config: &BusinessConfig, id: Ustr, suffix: &str) -> String {
    format!(
        "{}/admin/users/{}{suffix}",
        config.api_url(),
        urlencoding::encode(id.as_str())
    )
}

fn authorize(request: RequestBuilder, config: &BusinessConfig) -> RequestBuilder {
    match config.auth_token() {
        Some(token) => request.header("authorization", format!("Bearer {token}")),
        None => request,
    }
}

fn check_status(response: &Response) -> ApiResult<()> {
    if response.is_success() {
        return Ok(());
    }
    let message = response
        .json::<ErrorBody>()
        .ok()
        .and_then(|body| body.message);
    Err(UsersApiError::Status {
        status: response.status,
        message,
    })
}

/// GET `/admin/users?search=&status=&role=`
pub async fn list_users(
    config: &BusinessConfig,
    criteria: &FilterCriteria,
) -> ApiResult<Vec<User>> {
    let url = format!("{}/admin/users", config.api_url());
    let request = Client::get(url)
        .query("search", criteria.search.as_str())
        .query("status", criteria.status.query_value())
        .query("role", criteria.role.query_value());

    let response = authorize(request, config).send().await?;
    check_status(&response)?;

    let body: ListUsersResponse = response
        .json()
        .map_err(|e| UsersApiError::Decode(format!("Failed to parse users list: {e}")))?;
    Ok(body.into_users())
}

/// GET `/admin/users/stats`
pub async fn fetch_stats(config: &BusinessConfig) -> ApiResult<UserStats> {
    let url = format!("{}/admin/users/stats", config.api_url());

    let response = authorize(Client::get(url), config).send().await?;
    check_status(&response)?;

    let body: StatsResponse = response
        .json()
        .map_err(|e| UsersApiError::Decode(format!("Failed to parse user stats: {e}")))?;
    Ok(body.into_stats())
}

/// PUT `/admin/users/{id}/status`
/// Body: `{ "status": "Active" }`
pub async fn update_status(
    config: &BusinessConfig,
    id: Ustr,
    status: UserStatus,
) -> ApiResult<()> {
    let request = Client::put(user_url(config, id, "/status"))
        .json(&StatusBody {
            status: status.as_str(),
        })
        .map_err(|e| UsersApiError::Decode(format!("Failed to serialize request: {e}")))?;

    let response = authorize(request, config).send().await?;
    check_status(&response)
}

/// PUT `/admin/users/{id}/role`
/// Body: `{ "role": "admin" }`
pub async fn update_role(config: &BusinessConfig, id: Ustr, role: UserRole) -> ApiResult<()> {
    let request = Client::put(user_url(config, id, "/role"))
        .json(&RoleBody {
            role: role.as_str(),
        })
        .map_err(|e| UsersApiError::Decode(format!("Failed to serialize request: {e}")))?;

    let response = authorize(request, config).send().await?;
    check_status(&response)
}

/// DELETE `/admin/users/{id}`
pub async fn delete_user(config: &BusinessConfig, id: Ustr) -> ApiResult<()> {
    let request = Client::delete(user_url(config, id, ""));

    let response = authorize(request, config).send().await?;
    check_status(&response)
}

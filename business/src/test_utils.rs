//! Mock-server harness for the users commands.
//!
//! ```ignore
//! let mut test_ctx = TestContext::new().await;
//! test_ctx.mock_list_users(vec![sample_user("u1", "Ann")]).await;
//! test_ctx.refresh_users().await;
//! assert_eq!(test_ctx.store().users().len(), 1);
//! ```

use std::time::Duration;

use serde_json::{Value, json};
use storedesk_states::StateCtx;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::users::{UserListStore, UserStatsCompute, refresh_users};
use crate::{BusinessConfig, Notification, register_users};

pub struct TestContext {
    pub mock_server: MockServer,
    pub ctx: StateCtx,
}

impl TestContext {
    pub async fn new() -> Self {
        let mock_server = MockServer::start().await;

        let mut ctx = StateCtx::new();
        register_users(&mut ctx, BusinessConfig::new(mock_server.uri()));

        Self { mock_server, ctx }
    }

    /// Same loop as the CLI's `flush_and_await`: spawn whatever is queued,
    /// then sync after every finished task.
    pub async fn flush_and_wait(&mut self) {
        self.ctx.sync_computes();
        self.ctx.flush_commands();

        let timeout = Duration::from_secs(5);
        while self.ctx.task_count() > 0 {
            let joined = tokio::time::timeout(timeout, self.ctx.task_set_mut().join_next())
                .await
                .unwrap_or_else(|_| {
                    panic!(
                        "Timed out waiting for pending tasks ({} still in JoinSet)",
                        self.ctx.task_count()
                    )
                });
            if joined.is_some() {
                self.ctx.sync_computes();
            }
        }

        self.ctx.sync_computes();
    }

    pub async fn refresh_users(&mut self) {
        refresh_users(&mut self.ctx);
        self.flush_and_wait().await;
    }

    pub fn store(&self) -> &UserListStore {
        self.ctx.compute::<UserListStore>()
    }

    pub fn stats(&self) -> &UserStatsCompute {
        self.ctx.compute::<UserStatsCompute>()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        let mut taken = Vec::new();
        self.ctx
            .update::<UserListStore>(|store| taken = store.take_notifications());
        taken
    }

    // =========================================================================
    // Mock endpoint helpers
    // =========================================================================

    pub async fn mock_list_users(&self, users: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/api/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(users)))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_list_users_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/api/admin/users"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_stats(&self, stats: Value) {
        Mock::given(method("GET"))
            .and(path("/api/admin/users/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stats))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_stats_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/api/admin/users/stats"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// `suffix` is `/status`, `/role` or empty for delete.
    pub async fn mock_mutation(
        &self,
        http_method: &str,
        id: &str,
        suffix: &str,
        status: u16,
        message: Option<&str>,
    ) {
        let body = match message {
            Some(message) => json!({ "message": message }),
            None => json!({}),
        };
        Mock::given(method(http_method))
            .and(path(format!("/api/admin/users/{id}{suffix}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }

    /// Like [`Self::mock_mutation`] but the answer takes `delay`.
    pub async fn mock_slow_mutation(
        &self,
        http_method: &str,
        id: &str,
        suffix: &str,
        delay: Duration,
    ) {
        Mock::given(method(http_method))
            .and(path(format!("/api/admin/users/{id}{suffix}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "message": "ok" }))
                    .set_delay(delay),
            )
            .mount(&self.mock_server)
            .await;
    }
}

pub fn sample_user(id: &str, name: &str, status: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "mobile": "5550100",
        "role": role,
        "status": status,
        "createdAt": "2024-01-15T09:30:00Z",
        "orderHistory": [],
        "isEmailVerified": true
    })
}

// Login, logout, session check and the background keep-alive

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::client::PlanningClient;
use super::error::ApiError;
use crate::models::OrganizationMembership;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserInfo {
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

/// Answer of `/auth/check/` and `/auth/login/`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(default, alias = "isAuthenticated")]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user: Option<UserInfo>,
    #[serde(default, alias = "userOrganizations")]
    pub user_organizations: Vec<OrganizationMembership>,
}

impl AuthStatus {
    /// First organization the user belongs to; used as the viewing organization.
    pub fn primary_organization(&self) -> Option<u64> {
        self.user_organizations
            .iter()
            .find_map(|m| m.organization)
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl PlanningClient {
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthStatus, ApiError> {
        let mut status: AuthStatus = self
            .post::<_, Option<AuthStatus>>("auth/login/", &Credentials { username, password })
            .await?
            .unwrap_or_default();
        // Django rotates the CSRF token on login; re-read it from the cookie next time
        self.forget_held_csrf().await;
        status.is_authenticated = true;
        self.set_authenticated(true).await;
        tracing::info!(username, "Logged in");
        Ok(status)
    }

    /// Log out and drop the local session even if the server call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .post::<_, serde_json::Value>("auth/logout/", &serde_json::json!({}))
            .await
            .map(|_| ());
        self.clear_session().await;
        result
    }

    pub async fn check(&self) -> Result<AuthStatus, ApiError> {
        let status: AuthStatus = self.get("auth/check/", &[]).await?;
        self.set_authenticated(status.is_authenticated).await;
        Ok(status)
    }

    /// Ping `/auth/check/` on the configured interval to keep the session cookie fresh.
    /// Stops on its own once the session is gone.
    pub fn spawn_keepalive(&self) -> KeepAlive {
        let client = self.clone();
        let period = self.settings().keepalive_interval;
        spawn_keepalive_with(period, move || {
            let client = client.clone();
            async move {
                match client.check().await {
                    Ok(status) if status.is_authenticated => true,
                    Ok(_) | Err(ApiError::Unauthorized) => {
                        tracing::info!("Session no longer authenticated; stopping keep-alive");
                        false
                    }
                    Err(e) => {
                        tracing::warn!("Keep-alive check failed: {}", e);
                        true
                    }
                }
            }
        })
    }
}

/// Handle to a running keep-alive task. Dropping it stops the task.
pub struct KeepAlive {
    handle: JoinHandle<()>,
}

impl KeepAlive {
    pub fn stop(self) {
        // Drop aborts
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Run `tick` every `period` (first run after one period) until it returns false.
pub fn spawn_keepalive_with<F, Fut>(period: Duration, mut tick: F) -> KeepAlive
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !tick().await {
                break;
            }
        }
    });
    KeepAlive { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_ticks_on_interval_until_dropped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let period = Duration::from_secs(15 * 60);

        let keepalive = spawn_keepalive_with(period, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        tokio::time::sleep(period * 3 + period / 2).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(keepalive.is_running());

        keepalive.stop();
        tokio::time::sleep(period * 3).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_stops_when_tick_returns_false() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let period = Duration::from_secs(60);

        let keepalive = spawn_keepalive_with(period, move || {
            let counter = counter.clone();
            async move { counter.fetch_add(1, Ordering::SeqCst) < 1 }
        });

        tokio::time::sleep(period * 5).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert!(!keepalive.is_running());
    }

    #[test]
    fn test_auth_status_accepts_camel_case() {
        let status: AuthStatus = serde_json::from_str(
            r#"{"isAuthenticated": true,
                "user": {"id": 1, "username": "planner", "first_name": "Abebe", "last_name": "K"},
                "userOrganizations": [{"organization": 4, "role": "PLANNER"}]}"#,
        )
        .unwrap();
        assert!(status.is_authenticated);
        assert_eq!(status.primary_organization(), Some(4));
        assert_eq!(status.user.unwrap().display_name(), "Abebe K");
    }
}

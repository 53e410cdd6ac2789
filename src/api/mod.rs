// Planning REST API client
// Public interface: explicit client object, typed errors, retry utility

pub mod auth;
pub mod client;
pub mod error;
pub mod resources;
pub mod retry;

pub use auth::{spawn_keepalive_with, AuthStatus, KeepAlive, UserInfo};
pub use client::{ApiSettings, PlanningClient, CSRF_COOKIE, CSRF_HEADER};
pub use error::ApiError;
pub use resources::{OrEmpty, PlanKind, Resource, WeightValidation};
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;
use grantdesk_core::AppResult;
use grantdesk_domain::{FormAction, PermissionRequest, UserKey, UserPermissionRecord};

use crate::ViewDirective;

/// Port to the remote permission service.
///
/// Mutations return the service-provided message of a successful envelope.
#[async_trait]
pub trait PermissionTransport: Send + Sync {
    /// Grants the permissions described by one request.
    async fn grant(&self, request: &PermissionRequest) -> AppResult<String>;

    /// Revokes the permissions described by one request.
    async fn revoke(&self, request: &PermissionRequest) -> AppResult<String>;

    /// Applies several requests of the same action in one call.
    async fn batch(&self, action: FormAction, requests: &[PermissionRequest])
    -> AppResult<String>;

    /// Lists every account with its permissions.
    async fn list_users(&self) -> AppResult<Vec<UserPermissionRecord>>;

    /// Returns the permissions of one account.
    async fn user_detail(&self, key: &UserKey) -> AppResult<UserPermissionRecord>;

    /// Returns whether the account exists.
    async fn user_exists(&self, key: &UserKey) -> AppResult<bool>;
}

/// Port to whatever presents the console: a browser page, a terminal.
pub trait ViewRenderer: Send + Sync {
    /// Applies one directive.
    fn apply(&self, directive: ViewDirective);
}

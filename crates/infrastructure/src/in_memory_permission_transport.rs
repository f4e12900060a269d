use std::collections::BTreeMap;

use async_trait::async_trait;
use grantdesk_application::PermissionTransport;
use grantdesk_core::{AppError, AppResult};
use grantdesk_domain::{
    FormAction, PermissionEntry, PermissionRequest, PermissionType, Scope, TableScope, UserKey,
    UserPermissionRecord, ViewScope,
};
use tokio::sync::RwLock;

type AccountKey = (String, String);

/// One granted permission and the exact object it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredGrant {
    scope: Scope,
    permission_type: PermissionType,
    database_name: Option<String>,
    object_name: Option<String>,
    with_grant_option: bool,
}

impl StoredGrant {
    fn same_target(&self, other: &Self) -> bool {
        self.scope == other.scope
            && self.permission_type == other.permission_type
            && self.database_name == other.database_name
            && self.object_name == other.object_name
    }

    fn all_databases(&self) -> bool {
        match self.scope {
            Scope::Database => self.database_name.is_none(),
            Scope::Table(table_scope) => table_scope == TableScope::AllTablesInAllDatabases,
            Scope::View(view_scope) | Scope::MaterializedView(view_scope) => {
                view_scope == ViewScope::AllViewsInAllDatabases
            }
            Scope::System => false,
        }
    }

    fn to_entry(&self) -> PermissionEntry {
        PermissionEntry {
            permission_type: self.permission_type.as_str().to_owned(),
            database_name: self.database_name.clone(),
            all_databases: self.all_databases(),
            with_grant_option: self.with_grant_option,
        }
    }
}

/// In-memory permission service for demos and tests.
///
/// Accounts must be registered before permissions can be granted to them,
/// matching the remote service's "user does not exist" rejection.
#[derive(Default)]
pub struct InMemoryPermissionTransport {
    accounts: RwLock<BTreeMap<AccountKey, Vec<StoredGrant>>>,
}

impl InMemoryPermissionTransport {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account with no permissions.
    pub async fn create_account(&self, username: &str, host: &str) {
        self.accounts
            .write()
            .await
            .entry((username.to_owned(), host.to_owned()))
            .or_default();
    }

    async fn apply(&self, action: FormAction, request: &PermissionRequest) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;
        let key = (request.username().to_owned(), request.host().to_owned());
        let Some(grants) = accounts.get_mut(&key) else {
            return Err(AppError::Application {
                code: 500,
                message: format!("user does not exist: {}", request.username()),
            });
        };

        for grant in grants_for(request) {
            let position = grants.iter().position(|existing| existing.same_target(&grant));

            match (action, position) {
                (FormAction::Grant, Some(index)) => grants[index] = grant,
                (FormAction::Grant, None) => grants.push(grant),
                (FormAction::Revoke, Some(index)) => {
                    grants.remove(index);
                }
                (FormAction::Revoke, None) => {}
            }
        }

        Ok(())
    }
}

fn grants_for(request: &PermissionRequest) -> Vec<StoredGrant> {
    let scope = request.scope();
    let database_name = match scope {
        Scope::Database if request.all_databases() == Some(true) => None,
        Scope::System => None,
        _ => request.database_name().map(str::to_owned),
    };
    let object_name = request
        .table_name()
        .or_else(|| request.view_name())
        .map(str::to_owned);

    request
        .permission_types()
        .iter()
        .map(|permission_type| StoredGrant {
            scope,
            permission_type: *permission_type,
            database_name: database_name.clone(),
            object_name: object_name.clone(),
            with_grant_option: request.with_grant_option().unwrap_or(false),
        })
        .collect()
}

fn to_record((username, host): &AccountKey, grants: &[StoredGrant]) -> UserPermissionRecord {
    UserPermissionRecord::new(
        username.as_str(),
        host.as_str(),
        grants.iter().any(|grant| grant.with_grant_option),
        grants.iter().map(StoredGrant::to_entry).collect(),
    )
}

#[async_trait]
impl PermissionTransport for InMemoryPermissionTransport {
    async fn grant(&self, request: &PermissionRequest) -> AppResult<String> {
        self.apply(FormAction::Grant, request).await?;
        Ok("permissions granted".to_owned())
    }

    async fn revoke(&self, request: &PermissionRequest) -> AppResult<String> {
        self.apply(FormAction::Revoke, request).await?;
        Ok("permissions revoked".to_owned())
    }

    async fn batch(
        &self,
        action: FormAction,
        requests: &[PermissionRequest],
    ) -> AppResult<String> {
        for request in requests {
            self.apply(action, request).await?;
        }
        Ok(format!("{} requests applied", requests.len()))
    }

    async fn list_users(&self) -> AppResult<Vec<UserPermissionRecord>> {
        Ok(self
            .accounts
            .read()
            .await
            .iter()
            .map(|(key, grants)| to_record(key, grants))
            .collect())
    }

    async fn user_detail(&self, key: &UserKey) -> AppResult<UserPermissionRecord> {
        let account = (key.username().to_owned(), key.host().to_owned());
        self.accounts
            .read()
            .await
            .get(&account)
            .map(|grants| to_record(&account, grants))
            .ok_or_else(|| AppError::NotFound(format!("account {key} not found")))
    }

    async fn user_exists(&self, key: &UserKey) -> AppResult<bool> {
        Ok(self
            .accounts
            .read()
            .await
            .contains_key(&(key.username().to_owned(), key.host().to_owned())))
    }
}

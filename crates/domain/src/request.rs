use grantdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    AccountIdentity, FieldName, PermissionSelection, PermissionType, Scope, ScopeSelection,
    ScopeType, TableScope, ViewScope,
};

/// Which mutation a form submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../../bindings/form-action.ts")]
pub enum FormAction {
    /// Grant permissions.
    Grant,
    /// Revoke permissions.
    Revoke,
}

impl FormAction {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

impl std::str::FromStr for FormAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "grant" => Ok(Self::Grant),
            "revoke" => Ok(Self::Revoke),
            _ => Err(AppError::Validation(format!("unknown form action '{value}'"))),
        }
    }
}

impl std::fmt::Display for FormAction {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Normalized grant/revoke payload.
///
/// Only the keys relevant to the scope are present on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../bindings/permission-request.ts")]
pub struct PermissionRequest {
    username: String,
    host: String,
    permission_types: Vec<PermissionType>,
    scope_type: ScopeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    with_grant_option: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    database_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    all_databases: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    table_scope: Option<TableScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    view_scope: Option<ViewScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    view_name: Option<String>,
    #[serde(skip)]
    #[ts(skip)]
    action: FormAction,
    #[serde(skip)]
    #[ts(skip)]
    scope: Scope,
}

impl PermissionRequest {
    /// Returns the action this payload was built for.
    #[must_use]
    pub fn action(&self) -> FormAction {
        self.action
    }

    /// Returns the scope pair this payload was built for.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the host pattern.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns permission types in selection order.
    #[must_use]
    pub fn permission_types(&self) -> &[PermissionType] {
        &self.permission_types
    }

    /// Returns the scope type.
    #[must_use]
    pub fn scope_type(&self) -> ScopeType {
        self.scope_type
    }

    /// Returns the grant option; `None` for revokes.
    #[must_use]
    pub fn with_grant_option(&self) -> Option<bool> {
        self.with_grant_option
    }

    /// Returns the targeted database, if any.
    #[must_use]
    pub fn database_name(&self) -> Option<&str> {
        self.database_name.as_deref()
    }

    /// Returns the all-databases flag, present only for DATABASE.
    #[must_use]
    pub fn all_databases(&self) -> Option<bool> {
        self.all_databases
    }

    /// Returns the table targeting, present only for TABLE.
    #[must_use]
    pub fn table_scope(&self) -> Option<TableScope> {
        self.table_scope
    }

    /// Returns the targeted table, if any.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    /// Returns the view targeting, present for VIEW and MATERIALIZED_VIEW.
    #[must_use]
    pub fn view_scope(&self) -> Option<ViewScope> {
        self.view_scope
    }

    /// Returns the targeted view, if any.
    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        self.view_name.as_deref()
    }

    /// Renders the statements the service is expected to execute, one per
    /// permission type.
    #[must_use]
    pub fn statement_preview(&self) -> Vec<String> {
        let object = self.object_clause();
        let account = format!("'{}'@'{}'", self.username, self.host);

        self.permission_types
            .iter()
            .map(|permission_type| match self.action {
                FormAction::Grant => {
                    let grant_option = if self.with_grant_option == Some(true) {
                        " WITH GRANT OPTION"
                    } else {
                        ""
                    };
                    format!(
                        "GRANT {} ON {object} TO {account}{grant_option}",
                        permission_type.as_str()
                    )
                }
                FormAction::Revoke => format!(
                    "REVOKE {} ON {object} FROM {account}",
                    permission_type.as_str()
                ),
            })
            .collect()
    }

    fn object_clause(&self) -> String {
        let database = self.database_name.as_deref().unwrap_or_default();
        let named = |name: Option<&str>| format!("`{database}`.`{}`", name.unwrap_or_default());

        match self.scope {
            Scope::Database if self.all_databases == Some(true) => "ALL DATABASES".to_owned(),
            Scope::Database => format!("DATABASE `{database}`"),
            Scope::Table(TableScope::SingleTable) => {
                format!("TABLE {}", named(self.table_name()))
            }
            Scope::Table(TableScope::AllTablesInDatabase) => {
                format!("ALL TABLES IN DATABASE `{database}`")
            }
            Scope::Table(TableScope::AllTablesInAllDatabases) => {
                "ALL TABLES IN ALL DATABASES".to_owned()
            }
            Scope::View(ViewScope::SingleView) => format!("VIEW {}", named(self.view_name())),
            Scope::View(ViewScope::AllViewsInDatabase) => {
                format!("ALL VIEWS IN DATABASE `{database}`")
            }
            Scope::View(ViewScope::AllViewsInAllDatabases) => {
                "ALL VIEWS IN ALL DATABASES".to_owned()
            }
            Scope::MaterializedView(ViewScope::SingleView) => {
                format!("MATERIALIZED VIEW {}", named(self.view_name()))
            }
            Scope::MaterializedView(ViewScope::AllViewsInDatabase) => {
                format!("ALL MATERIALIZED VIEWS IN DATABASE `{database}`")
            }
            Scope::MaterializedView(ViewScope::AllViewsInAllDatabases) => {
                "ALL MATERIALIZED VIEWS IN ALL DATABASES".to_owned()
            }
            Scope::System => "SYSTEM".to_owned(),
        }
    }
}

/// Assembles [`PermissionRequest`] payloads from form state.
pub struct RequestBuilder;

impl RequestBuilder {
    /// Builds the payload for one submission.
    ///
    /// Fails when no permission type is selected or a relevant identifier is
    /// blank. The permission vocabulary is not checked here.
    pub fn build(
        action: FormAction,
        selection: &ScopeSelection,
        permissions: &PermissionSelection,
        identity: &AccountIdentity,
        with_grant_option: bool,
    ) -> AppResult<PermissionRequest> {
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "select at least one permission type".to_owned(),
            ));
        }

        let scope = selection.scope();
        let mut request = PermissionRequest {
            username: identity.username().to_owned(),
            host: identity.host().to_owned(),
            permission_types: permissions.as_slice().to_vec(),
            scope_type: scope.scope_type(),
            with_grant_option: match action {
                FormAction::Grant => Some(with_grant_option),
                FormAction::Revoke => None,
            },
            database_name: None,
            all_databases: None,
            table_scope: None,
            table_name: None,
            view_scope: None,
            view_name: None,
            action,
            scope,
        };

        match scope {
            Scope::Database => {
                request.database_name = Some(required(selection, FieldName::DatabaseName)?);
                request.all_databases = Some(selection.all_databases());
            }
            Scope::Table(table_scope) => {
                request.table_scope = Some(table_scope);
                match table_scope {
                    TableScope::SingleTable => {
                        request.table_name = Some(required(selection, FieldName::TableName)?);
                        request.database_name =
                            Some(required(selection, FieldName::TableDatabaseName)?);
                    }
                    TableScope::AllTablesInDatabase => {
                        request.database_name =
                            Some(required(selection, FieldName::TableDatabaseName)?);
                    }
                    TableScope::AllTablesInAllDatabases => {}
                }
            }
            Scope::View(view_scope) | Scope::MaterializedView(view_scope) => {
                request.view_scope = Some(view_scope);
                match view_scope {
                    ViewScope::SingleView => {
                        request.view_name = Some(required(selection, FieldName::ViewName)?);
                        request.database_name =
                            Some(required(selection, FieldName::ViewDatabaseName)?);
                    }
                    ViewScope::AllViewsInDatabase => {
                        request.database_name =
                            Some(required(selection, FieldName::ViewDatabaseName)?);
                    }
                    ViewScope::AllViewsInAllDatabases => {}
                }
            }
            Scope::System => {}
        }

        Ok(request)
    }
}

fn required(selection: &ScopeSelection, field: FieldName) -> AppResult<String> {
    selection
        .value(field)
        .map(str::to_owned)
        .ok_or_else(|| AppError::Validation(format!("field '{}' is required", field.as_str())))
}

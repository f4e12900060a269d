use std::str::FromStr;

use grantdesk_core::AppError;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Class of database object a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "../../../bindings/scope-type.ts")]
pub enum ScopeType {
    /// One database or every database.
    Database,
    /// Tables, targeted through a [`TableScope`].
    Table,
    /// Views, targeted through a [`ViewScope`].
    View,
    /// Materialized views, targeted through a [`ViewScope`].
    MaterializedView,
    /// Cluster-wide system privileges.
    System,
}

impl ScopeType {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "DATABASE",
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::MaterializedView => "MATERIALIZED_VIEW",
            Self::System => "SYSTEM",
        }
    }

    /// Returns all scope types in selector order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Database,
            Self::Table,
            Self::View,
            Self::MaterializedView,
            Self::System,
        ]
    }

    /// Returns the sub-scope a freshly selected scope starts with.
    #[must_use]
    pub fn default_sub_scope(&self) -> Option<SubScope> {
        match self {
            Self::Table => Some(SubScope::Table(TableScope::SingleTable)),
            Self::View | Self::MaterializedView => Some(SubScope::View(ViewScope::SingleView)),
            Self::Database | Self::System => None,
        }
    }
}

impl FromStr for ScopeType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "DATABASE" => Ok(Self::Database),
            "TABLE" => Ok(Self::Table),
            "VIEW" => Ok(Self::View),
            "MATERIALIZED_VIEW" => Ok(Self::MaterializedView),
            "SYSTEM" => Ok(Self::System),
            _ => Err(AppError::Validation(format!("unknown scope type '{value}'"))),
        }
    }
}

impl std::fmt::Display for ScopeType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Targeting inside the TABLE scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "../../../bindings/table-scope.ts")]
pub enum TableScope {
    /// One named table.
    SingleTable,
    /// Every table of one database.
    AllTablesInDatabase,
    /// Every table everywhere.
    AllTablesInAllDatabases,
}

impl TableScope {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleTable => "SINGLE_TABLE",
            Self::AllTablesInDatabase => "ALL_TABLES_IN_DATABASE",
            Self::AllTablesInAllDatabases => "ALL_TABLES_IN_ALL_DATABASES",
        }
    }
}

/// Targeting inside the VIEW and MATERIALIZED_VIEW scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "../../../bindings/view-scope.ts")]
pub enum ViewScope {
    /// One named view.
    SingleView,
    /// Every view of one database.
    AllViewsInDatabase,
    /// Every view everywhere.
    AllViewsInAllDatabases,
}

impl ViewScope {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleView => "SINGLE_VIEW",
            Self::AllViewsInDatabase => "ALL_VIEWS_IN_DATABASE",
            Self::AllViewsInAllDatabases => "ALL_VIEWS_IN_ALL_DATABASES",
        }
    }
}

/// Sub-scope token as carried by the scope selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "../../../bindings/sub-scope.ts")]
pub enum SubScope {
    /// Table targeting.
    Table(TableScope),
    /// View or materialized view targeting.
    View(ViewScope),
}

impl SubScope {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table(table_scope) => table_scope.as_str(),
            Self::View(view_scope) => view_scope.as_str(),
        }
    }
}

impl FromStr for SubScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "SINGLE_TABLE" => Ok(Self::Table(TableScope::SingleTable)),
            "ALL_TABLES_IN_DATABASE" => Ok(Self::Table(TableScope::AllTablesInDatabase)),
            "ALL_TABLES_IN_ALL_DATABASES" => Ok(Self::Table(TableScope::AllTablesInAllDatabases)),
            "SINGLE_VIEW" => Ok(Self::View(ViewScope::SingleView)),
            "ALL_VIEWS_IN_DATABASE" => Ok(Self::View(ViewScope::AllViewsInDatabase)),
            "ALL_VIEWS_IN_ALL_DATABASES" => Ok(Self::View(ViewScope::AllViewsInAllDatabases)),
            _ => Err(AppError::Validation(format!("unknown sub-scope '{value}'"))),
        }
    }
}

impl std::fmt::Display for SubScope {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Closed set of target inputs on a permission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../bindings/field-name.ts")]
pub enum FieldName {
    /// Database targeted by the DATABASE scope.
    DatabaseName,
    /// "Every database" checkbox of the DATABASE scope.
    AllDatabases,
    /// Table targeted by SINGLE_TABLE.
    TableName,
    /// Database holding the targeted tables.
    TableDatabaseName,
    /// View targeted by SINGLE_VIEW.
    ViewName,
    /// Database holding the targeted views.
    ViewDatabaseName,
}

impl FieldName {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseName => "databaseName",
            Self::AllDatabases => "allDatabases",
            Self::TableName => "tableName",
            Self::TableDatabaseName => "tableDatabaseName",
            Self::ViewName => "viewName",
            Self::ViewDatabaseName => "viewDatabaseName",
        }
    }

    /// Returns every form field.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::DatabaseName,
            Self::AllDatabases,
            Self::TableName,
            Self::TableDatabaseName,
            Self::ViewName,
            Self::ViewDatabaseName,
        ]
    }

    /// Returns whether the field holds free text rather than a checkbox.
    #[must_use]
    pub fn is_text(&self) -> bool {
        !matches!(self, Self::AllDatabases)
    }
}

impl FromStr for FieldName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|field| field.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AppError::Validation(format!("unknown form field '{value}'")))
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

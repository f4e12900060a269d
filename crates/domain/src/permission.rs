use std::str::FromStr;

use grantdesk_core::AppError;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Privilege tokens understood by the permission service.
///
/// Declaration order is the display order used by every vocabulary table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(
    export,
    export_to = "../../../bindings/permission-type.ts"
)]
pub enum PermissionType {
    /// Structural change on a database, table or view.
    #[serde(rename = "ALTER")]
    Alter,
    /// Removal of a database, table or view.
    #[serde(rename = "DROP")]
    Drop,
    /// Table creation inside a database.
    #[serde(rename = "CREATE TABLE")]
    CreateTable,
    /// View creation inside a database.
    #[serde(rename = "CREATE VIEW")]
    CreateView,
    /// Function creation inside a database.
    #[serde(rename = "CREATE FUNCTION")]
    CreateFunction,
    /// Materialized view creation inside a database.
    #[serde(rename = "CREATE MATERIALIZED VIEW")]
    CreateMaterializedView,
    /// Reading a materialized view.
    #[serde(rename = "SELECT MATERIALIZED VIEW")]
    SelectMaterializedView,
    /// Altering a materialized view.
    #[serde(rename = "ALTER MATERIALIZED VIEW")]
    AlterMaterializedView,
    /// Refreshing a materialized view.
    #[serde(rename = "REFRESH MATERIALIZED VIEW")]
    RefreshMaterializedView,
    /// Dropping a materialized view.
    #[serde(rename = "DROP MATERIALIZED VIEW")]
    DropMaterializedView,
    /// Reading rows.
    #[serde(rename = "SELECT")]
    Select,
    /// Inserting rows.
    #[serde(rename = "INSERT")]
    Insert,
    /// Exporting rows.
    #[serde(rename = "EXPORT")]
    Export,
    /// Updating rows.
    #[serde(rename = "UPDATE")]
    Update,
    /// Deleting rows.
    #[serde(rename = "DELETE")]
    Delete,
    /// Every privilege applicable to the object.
    #[serde(rename = "ALL PRIVILEGES")]
    AllPrivileges,
    /// Creating resource groups.
    #[serde(rename = "CREATE RESOURCE GROUP")]
    CreateResourceGroup,
    /// Creating resources.
    #[serde(rename = "CREATE RESOURCE")]
    CreateResource,
    /// Creating external catalogs.
    #[serde(rename = "CREATE EXTERNAL CATALOG")]
    CreateExternalCatalog,
    /// Managing backup repositories.
    #[serde(rename = "REPOSITORY")]
    Repository,
    /// Managing the SQL blacklist.
    #[serde(rename = "BLACKLIST")]
    Blacklist,
    /// Managing files.
    #[serde(rename = "FILE")]
    File,
    /// Operating nodes.
    #[serde(rename = "OPERATE")]
    Operate,
    /// Creating storage volumes.
    #[serde(rename = "CREATE STORAGE VOLUME")]
    CreateStorageVolume,
    /// Managing security settings.
    #[serde(rename = "SECURITY")]
    Security,
}

impl PermissionType {
    /// Returns the wire token for this permission type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alter => "ALTER",
            Self::Drop => "DROP",
            Self::CreateTable => "CREATE TABLE",
            Self::CreateView => "CREATE VIEW",
            Self::CreateFunction => "CREATE FUNCTION",
            Self::CreateMaterializedView => "CREATE MATERIALIZED VIEW",
            Self::SelectMaterializedView => "SELECT MATERIALIZED VIEW",
            Self::AlterMaterializedView => "ALTER MATERIALIZED VIEW",
            Self::RefreshMaterializedView => "REFRESH MATERIALIZED VIEW",
            Self::DropMaterializedView => "DROP MATERIALIZED VIEW",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Export => "EXPORT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::AllPrivileges => "ALL PRIVILEGES",
            Self::CreateResourceGroup => "CREATE RESOURCE GROUP",
            Self::CreateResource => "CREATE RESOURCE",
            Self::CreateExternalCatalog => "CREATE EXTERNAL CATALOG",
            Self::Repository => "REPOSITORY",
            Self::Blacklist => "BLACKLIST",
            Self::File => "FILE",
            Self::Operate => "OPERATE",
            Self::CreateStorageVolume => "CREATE STORAGE VOLUME",
            Self::Security => "SECURITY",
        }
    }

    /// Returns all known permission types in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionType] = &[
            PermissionType::Alter,
            PermissionType::Drop,
            PermissionType::CreateTable,
            PermissionType::CreateView,
            PermissionType::CreateFunction,
            PermissionType::CreateMaterializedView,
            PermissionType::SelectMaterializedView,
            PermissionType::AlterMaterializedView,
            PermissionType::RefreshMaterializedView,
            PermissionType::DropMaterializedView,
            PermissionType::Select,
            PermissionType::Insert,
            PermissionType::Export,
            PermissionType::Update,
            PermissionType::Delete,
            PermissionType::AllPrivileges,
            PermissionType::CreateResourceGroup,
            PermissionType::CreateResource,
            PermissionType::CreateExternalCatalog,
            PermissionType::Repository,
            PermissionType::Blacklist,
            PermissionType::File,
            PermissionType::Operate,
            PermissionType::CreateStorageVolume,
            PermissionType::Security,
        ];

        ALL
    }

}

impl FromStr for PermissionType {
    type Err = AppError;

    /// Matching ignores case, surrounding whitespace and repeated inner spaces,
    /// so `select`, ` Create  Table ` and `create_table` are all accepted.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        if normalized.is_empty() {
            return Err(AppError::Validation(
                "permission type must not be empty".to_owned(),
            ));
        }

        Self::all()
            .iter()
            .copied()
            .find(|permission_type| permission_type.as_str() == normalized)
            .ok_or_else(|| AppError::Validation(format!("unknown permission type '{value}'")))
    }
}

impl std::fmt::Display for PermissionType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Ordered, de-duplicated set of permission types picked by an operator.
///
/// Insertion order is kept so the request payload lists permissions the way
/// they were chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PermissionType>", into = "Vec<PermissionType>")]
pub struct PermissionSelection(Vec<PermissionType>);

impl PermissionSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a permission type; returns `false` when it was already selected.
    pub fn insert(&mut self, permission_type: PermissionType) -> bool {
        if self.0.contains(&permission_type) {
            return false;
        }

        self.0.push(permission_type);
        true
    }

    /// Removes a permission type; returns `false` when it was not selected.
    pub fn remove(&mut self, permission_type: PermissionType) -> bool {
        let before = self.0.len();
        self.0.retain(|selected| selected != &permission_type);
        before != self.0.len()
    }

    /// Keeps only the permission types accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(PermissionType) -> bool) {
        self.0.retain(|selected| keep(*selected));
    }

    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the selected permission types in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[PermissionType] {
        &self.0
    }
}

impl FromIterator<PermissionType> for PermissionSelection {
    fn from_iter<T: IntoIterator<Item = PermissionType>>(iter: T) -> Self {
        let mut selection = Self::new();
        for permission_type in iter {
            selection.insert(permission_type);
        }
        selection
    }
}

impl From<Vec<PermissionType>> for PermissionSelection {
    fn from(permission_types: Vec<PermissionType>) -> Self {
        permission_types.into_iter().collect()
    }
}

impl From<PermissionSelection> for Vec<PermissionType> {
    fn from(selection: PermissionSelection) -> Self {
        selection.0
    }
}

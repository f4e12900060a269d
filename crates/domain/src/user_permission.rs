use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One permission line of an account as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../bindings/permission-entry.ts")]
pub struct PermissionEntry {
    /// Permission token as reported, not normalized.
    pub permission_type: String,
    /// Database the permission applies to, if any.
    #[serde(default)]
    pub database_name: Option<String>,
    /// Whether the permission covers every database.
    #[serde(default)]
    pub all_databases: bool,
    /// Whether the permission may be passed on.
    #[serde(default)]
    pub with_grant_option: bool,
}

/// Read model of one account and its permissions. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../bindings/user-permission-record.ts")]
pub struct UserPermissionRecord {
    username: String,
    host: String,
    #[serde(default)]
    has_grant_option: bool,
    #[serde(default)]
    permissions: Option<Vec<PermissionEntry>>,
}

impl UserPermissionRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        host: impl Into<String>,
        has_grant_option: bool,
        permissions: Vec<PermissionEntry>,
    ) -> Self {
        Self {
            username: username.into(),
            host: host.into(),
            has_grant_option,
            permissions: Some(permissions),
        }
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

    /// Returns whether any permission carries the grant option.
    #[must_use]
    pub fn has_grant_option(&self) -> bool {
        self.has_grant_option
    }

    /// Returns reported permissions; a missing list reads as empty.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionEntry] {
        self.permissions.as_deref().unwrap_or_default()
    }
}

/// Row of the account list with its permission-count badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../bindings/user-list-row.ts")]
pub struct UserListRow {
    /// Account name.
    pub username: String,
    /// Host pattern.
    pub host: String,
    /// Number of reported permissions.
    #[ts(type = "number")]
    pub permission_count: usize,
    /// Whether any permission carries the grant option.
    pub has_grant_option: bool,
}

impl From<&UserPermissionRecord> for UserListRow {
    fn from(record: &UserPermissionRecord) -> Self {
        Self {
            username: record.username.clone(),
            host: record.host.clone(),
            permission_count: record.permissions().len(),
            has_grant_option: record.has_grant_option,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{UserListRow, UserPermissionRecord};

    #[test]
    fn badge_counts_reported_permissions() {
        let parsed = serde_json::from_str::<UserPermissionRecord>(
            r#"{
                "username": "alice",
                "host": "%",
                "hasGrantOption": true,
                "permissions": [
                    {"permissionType": "SELECT", "databaseName": "sales", "allDatabases": false, "withGrantOption": true},
                    {"permissionType": "INSERT", "databaseName": "sales", "allDatabases": false, "withGrantOption": false},
                    {"permissionType": "OPERATE", "databaseName": null, "allDatabases": false, "withGrantOption": false}
                ]
            }"#,
        );
        let row = parsed.as_ref().ok().map(UserListRow::from);

        assert_eq!(row.map(|found| found.permission_count), Some(3));
    }

    #[test]
    fn missing_permission_list_counts_as_zero() {
        let parsed = serde_json::from_str::<UserPermissionRecord>(
            r#"{"username": "bob", "host": "localhost", "permissions": null}"#,
        );
        let Ok(record) = parsed else {
            panic!("record should parse");
        };

        assert!(record.permissions().is_empty());
        assert_eq!(UserListRow::from(&record).permission_count, 0);
    }
}

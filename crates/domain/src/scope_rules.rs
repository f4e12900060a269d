//! Lookup table from a scope/sub-scope pair to the permission types and form
//! fields that apply to it.
//!
//! Answers come from exhaustive matches over [`Scope`] and never depend on
//! earlier answers.

use std::collections::BTreeSet;

use grantdesk_core::{AppError, AppResult};

use crate::{FieldName, PermissionType, ScopeType, SubScope, TableScope, ViewScope};

const DATABASE_PERMISSIONS: &[PermissionType] = &[
    PermissionType::Alter,
    PermissionType::Drop,
    PermissionType::CreateTable,
    PermissionType::CreateView,
    PermissionType::CreateFunction,
    PermissionType::CreateMaterializedView,
    PermissionType::AllPrivileges,
];

const VIEW_PERMISSIONS: &[PermissionType] = &[
    PermissionType::Alter,
    PermissionType::Drop,
    PermissionType::Select,
    PermissionType::AllPrivileges,
];

const MATERIALIZED_VIEW_PERMISSIONS: &[PermissionType] = &[
    PermissionType::SelectMaterializedView,
    PermissionType::AlterMaterializedView,
    PermissionType::RefreshMaterializedView,
    PermissionType::DropMaterializedView,
    PermissionType::AllPrivileges,
];

const SINGLE_TABLE_PERMISSIONS: &[PermissionType] = &[
    PermissionType::Alter,
    PermissionType::Drop,
    PermissionType::Select,
    PermissionType::Insert,
    PermissionType::Export,
    PermissionType::Update,
    PermissionType::Delete,
    PermissionType::AllPrivileges,
];

// Structural changes need a single-table grant.
const MULTI_TABLE_PERMISSIONS: &[PermissionType] = &[
    PermissionType::Select,
    PermissionType::Insert,
    PermissionType::Export,
    PermissionType::Update,
    PermissionType::Delete,
    PermissionType::AllPrivileges,
];

const SYSTEM_PERMISSIONS: &[PermissionType] = &[
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

/// Validated scope/sub-scope pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// DATABASE scope.
    Database,
    /// TABLE scope with its targeting.
    Table(TableScope),
    /// VIEW scope with its targeting.
    View(ViewScope),
    /// MATERIALIZED_VIEW scope with its targeting.
    MaterializedView(ViewScope),
    /// SYSTEM scope.
    System,
}

impl Scope {
    /// Pairs a scope type with an optional sub-scope.
    ///
    /// A missing sub-scope falls back to the scope's default. A sub-scope on
    /// DATABASE/SYSTEM, or one of the wrong kind, is rejected.
    pub fn new(scope_type: ScopeType, sub_scope: Option<SubScope>) -> AppResult<Self> {
        let sub_scope = sub_scope.or_else(|| scope_type.default_sub_scope());

        match (scope_type, sub_scope) {
            (ScopeType::Database, None) => Ok(Self::Database),
            (ScopeType::System, None) => Ok(Self::System),
            (ScopeType::Table, Some(SubScope::Table(table_scope))) => Ok(Self::Table(table_scope)),
            (ScopeType::View, Some(SubScope::View(view_scope))) => Ok(Self::View(view_scope)),
            (ScopeType::MaterializedView, Some(SubScope::View(view_scope))) => {
                Ok(Self::MaterializedView(view_scope))
            }
            (scope_type, Some(sub_scope)) => Err(AppError::Validation(format!(
                "sub-scope '{}' does not apply to scope '{}'",
                sub_scope.as_str(),
                scope_type.as_str()
            ))),
            (scope_type, None) => Err(AppError::Validation(format!(
                "scope '{}' requires a sub-scope",
                scope_type.as_str()
            ))),
        }
    }

    /// Returns the default pair for a scope type.
    #[must_use]
    pub fn default_for(scope_type: ScopeType) -> Self {
        match scope_type {
            ScopeType::Database => Self::Database,
            ScopeType::Table => Self::Table(TableScope::SingleTable),
            ScopeType::View => Self::View(ViewScope::SingleView),
            ScopeType::MaterializedView => Self::MaterializedView(ViewScope::SingleView),
            ScopeType::System => Self::System,
        }
    }

    /// Returns every supported pair.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let view_scopes = [
            ViewScope::SingleView,
            ViewScope::AllViewsInDatabase,
            ViewScope::AllViewsInAllDatabases,
        ];

        let mut scopes = vec![Self::Database];
        scopes.extend(
            [
                TableScope::SingleTable,
                TableScope::AllTablesInDatabase,
                TableScope::AllTablesInAllDatabases,
            ]
            .into_iter()
            .map(Self::Table),
        );
        scopes.extend(view_scopes.into_iter().map(Self::View));
        scopes.extend(view_scopes.into_iter().map(Self::MaterializedView));
        scopes.push(Self::System);
        scopes
    }

    /// Returns the scope type half of the pair.
    #[must_use]
    pub fn scope_type(&self) -> ScopeType {
        match self {
            Self::Database => ScopeType::Database,
            Self::Table(_) => ScopeType::Table,
            Self::View(_) => ScopeType::View,
            Self::MaterializedView(_) => ScopeType::MaterializedView,
            Self::System => ScopeType::System,
        }
    }

    /// Returns the sub-scope half of the pair.
    #[must_use]
    pub fn sub_scope(&self) -> Option<SubScope> {
        match self {
            Self::Table(table_scope) => Some(SubScope::Table(*table_scope)),
            Self::View(view_scope) | Self::MaterializedView(view_scope) => {
                Some(SubScope::View(*view_scope))
            }
            Self::Database | Self::System => None,
        }
    }

    /// Permission types offered for this pair, in display order.
    #[must_use]
    pub fn permission_vocabulary(&self) -> &'static [PermissionType] {
        match self {
            Self::Database => DATABASE_PERMISSIONS,
            Self::Table(TableScope::SingleTable) => SINGLE_TABLE_PERMISSIONS,
            Self::Table(TableScope::AllTablesInDatabase | TableScope::AllTablesInAllDatabases) => {
                MULTI_TABLE_PERMISSIONS
            }
            Self::View(_) => VIEW_PERMISSIONS,
            Self::MaterializedView(_) => MATERIALIZED_VIEW_PERMISSIONS,
            Self::System => SYSTEM_PERMISSIONS,
        }
    }

    /// Permission types offered for this pair.
    #[must_use]
    pub fn visible_permission_types(&self) -> BTreeSet<PermissionType> {
        self.permission_vocabulary().iter().copied().collect()
    }

    /// Fields that must be filled before a submission.
    #[must_use]
    pub fn required_fields(&self) -> BTreeSet<FieldName> {
        self.visible_fields()
            .into_iter()
            .filter(FieldName::is_text)
            .collect()
    }

    /// Fields shown for this pair. The all-databases checkbox is shown but
    /// never required.
    #[must_use]
    pub fn visible_fields(&self) -> BTreeSet<FieldName> {
        let fields: &[FieldName] = match self {
            Self::Database => &[FieldName::DatabaseName, FieldName::AllDatabases],
            Self::Table(TableScope::SingleTable) => {
                &[FieldName::TableName, FieldName::TableDatabaseName]
            }
            Self::Table(TableScope::AllTablesInDatabase) => &[FieldName::TableDatabaseName],
            Self::View(ViewScope::SingleView) | Self::MaterializedView(ViewScope::SingleView) => {
                &[FieldName::ViewName, FieldName::ViewDatabaseName]
            }
            Self::View(ViewScope::AllViewsInDatabase)
            | Self::MaterializedView(ViewScope::AllViewsInDatabase) => {
                &[FieldName::ViewDatabaseName]
            }
            Self::Table(TableScope::AllTablesInAllDatabases)
            | Self::View(ViewScope::AllViewsInAllDatabases)
            | Self::MaterializedView(ViewScope::AllViewsInAllDatabases)
            | Self::System => &[],
        };

        fields.iter().copied().collect()
    }
}

/// Permission types applicable to a scope/sub-scope pair.
pub fn visible_permission_types(
    scope_type: ScopeType,
    sub_scope: Option<SubScope>,
) -> AppResult<BTreeSet<PermissionType>> {
    Ok(Scope::new(scope_type, sub_scope)?.visible_permission_types())
}

/// Fields required for a scope/sub-scope pair.
pub fn required_fields(
    scope_type: ScopeType,
    sub_scope: Option<SubScope>,
) -> AppResult<BTreeSet<FieldName>> {
    Ok(Scope::new(scope_type, sub_scope)?.required_fields())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::{Scope, required_fields, visible_permission_types};
    use crate::{FieldName, PermissionType, ScopeType, SubScope, TableScope, ViewScope};

    fn set<T: Ord + Copy>(values: &[T]) -> BTreeSet<T> {
        values.iter().copied().collect()
    }

    #[test]
    fn permission_table_matches_every_pair() {
        use PermissionType::*;

        let expected: Vec<(Scope, BTreeSet<PermissionType>)> = vec![
            (
                Scope::Database,
                set(&[
                    Alter,
                    Drop,
                    CreateTable,
                    CreateView,
                    CreateFunction,
                    CreateMaterializedView,
                    AllPrivileges,
                ]),
            ),
            (
                Scope::Table(TableScope::SingleTable),
                set(&[
                    Alter,
                    Drop,
                    Select,
                    Insert,
                    Export,
                    Update,
                    Delete,
                    AllPrivileges,
                ]),
            ),
            (
                Scope::Table(TableScope::AllTablesInDatabase),
                set(&[Select, Insert, Export, Update, Delete, AllPrivileges]),
            ),
            (
                Scope::Table(TableScope::AllTablesInAllDatabases),
                set(&[Select, Insert, Export, Update, Delete, AllPrivileges]),
            ),
            (
                Scope::System,
                set(&[
                    CreateResourceGroup,
                    CreateResource,
                    CreateExternalCatalog,
                    Repository,
                    Blacklist,
                    File,
                    Operate,
                    CreateStorageVolume,
                    Security,
                ]),
            ),
        ];

        for (scope, permissions) in expected {
            assert_eq!(scope.visible_permission_types(), permissions, "{scope:?}");
        }

        for view_scope in [
            ViewScope::SingleView,
            ViewScope::AllViewsInDatabase,
            ViewScope::AllViewsInAllDatabases,
        ] {
            assert_eq!(
                Scope::View(view_scope).visible_permission_types(),
                set(&[Alter, Drop, Select, AllPrivileges])
            );
            assert_eq!(
                Scope::MaterializedView(view_scope).visible_permission_types(),
                set(&[
                    SelectMaterializedView,
                    AlterMaterializedView,
                    RefreshMaterializedView,
                    DropMaterializedView,
                    AllPrivileges,
                ])
            );
        }
    }

    #[test]
    fn single_table_and_system_vocabulary_sizes() {
        assert_eq!(
            Scope::Table(TableScope::SingleTable)
                .permission_vocabulary()
                .len(),
            8
        );
        assert_eq!(Scope::System.permission_vocabulary().len(), 9);
    }

    #[test]
    fn required_field_table_matches_every_pair() {
        use FieldName::*;

        let expected: Vec<(Scope, BTreeSet<FieldName>)> = vec![
            (Scope::Database, set(&[DatabaseName])),
            (
                Scope::Table(TableScope::SingleTable),
                set(&[TableName, TableDatabaseName]),
            ),
            (
                Scope::Table(TableScope::AllTablesInDatabase),
                set(&[TableDatabaseName]),
            ),
            (Scope::Table(TableScope::AllTablesInAllDatabases), set(&[])),
            (
                Scope::View(ViewScope::SingleView),
                set(&[ViewName, ViewDatabaseName]),
            ),
            (
                Scope::View(ViewScope::AllViewsInDatabase),
                set(&[ViewDatabaseName]),
            ),
            (Scope::View(ViewScope::AllViewsInAllDatabases), set(&[])),
            (
                Scope::MaterializedView(ViewScope::SingleView),
                set(&[ViewName, ViewDatabaseName]),
            ),
            (
                Scope::MaterializedView(ViewScope::AllViewsInDatabase),
                set(&[ViewDatabaseName]),
            ),
            (
                Scope::MaterializedView(ViewScope::AllViewsInAllDatabases),
                set(&[]),
            ),
            (Scope::System, set(&[])),
        ];

        assert_eq!(expected.len(), Scope::all().len());
        for (scope, fields) in expected {
            assert_eq!(scope.required_fields(), fields, "{scope:?}");
        }
    }

    #[test]
    fn all_databases_checkbox_is_visible_but_not_required() {
        assert!(Scope::Database.visible_fields().contains(&FieldName::AllDatabases));
        assert!(!Scope::Database.required_fields().contains(&FieldName::AllDatabases));
    }

    #[test]
    fn mismatched_sub_scope_is_rejected() {
        assert!(
            Scope::new(
                ScopeType::Table,
                Some(SubScope::View(ViewScope::SingleView))
            )
            .is_err()
        );
        assert!(
            Scope::new(
                ScopeType::System,
                Some(SubScope::Table(TableScope::SingleTable))
            )
            .is_err()
        );
    }

    #[test]
    fn missing_sub_scope_falls_back_to_default() {
        let fields = required_fields(ScopeType::View, None);
        assert_eq!(
            fields.ok(),
            Some(set(&[FieldName::ViewName, FieldName::ViewDatabaseName]))
        );

        let permissions = visible_permission_types(ScopeType::Table, None);
        assert_eq!(permissions.map(|found| found.len()).ok(), Some(8));
    }

    fn any_scope() -> impl Strategy<Value = Scope> {
        proptest::sample::select(Scope::all())
    }

    proptest! {
        #[test]
        fn lookups_are_deterministic(scope in any_scope()) {
            prop_assert_eq!(scope.visible_permission_types(), scope.visible_permission_types());
            prop_assert_eq!(scope.required_fields(), scope.required_fields());
        }

        #[test]
        fn required_fields_are_always_visible(scope in any_scope()) {
            prop_assert!(scope.required_fields().is_subset(&scope.visible_fields()));
        }

        #[test]
        fn pair_roundtrips_through_constructor(scope in any_scope()) {
            let rebuilt = Scope::new(scope.scope_type(), scope.sub_scope());
            prop_assert_eq!(rebuilt.ok(), Some(scope));
        }

        #[test]
        fn all_privileges_is_offered_outside_system(scope in any_scope()) {
            let offered = scope
                .visible_permission_types()
                .contains(&PermissionType::AllPrivileges);
            prop_assert_eq!(offered, scope != Scope::System);
        }
    }
}

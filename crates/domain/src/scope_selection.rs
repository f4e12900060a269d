use std::collections::{BTreeMap, BTreeSet};

use grantdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{FieldName, PermissionType, Scope, ScopeType, SubScope};

/// Target half of a permission form: scope pair, identifier values and the
/// all-databases flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScopeSelectionRecord", into = "ScopeSelectionRecord")]
pub struct ScopeSelection {
    scope: Scope,
    values: BTreeMap<FieldName, String>,
    all_databases: bool,
}

/// Wire shape of [`ScopeSelection`], validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScopeSelectionRecord {
    scope_type: ScopeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub_scope: Option<SubScope>,
    #[serde(default)]
    values: BTreeMap<FieldName, String>,
    #[serde(default)]
    all_databases: bool,
}

impl TryFrom<ScopeSelectionRecord> for ScopeSelection {
    type Error = AppError;

    fn try_from(record: ScopeSelectionRecord) -> Result<Self, Self::Error> {
        let mut selection = Self::from_scope(Scope::new(record.scope_type, record.sub_scope)?);
        for (field, value) in record.values {
            selection.set_value(field, value)?;
        }
        if record.all_databases {
            selection.set_all_databases(true)?;
        }

        Ok(selection)
    }
}

impl From<ScopeSelection> for ScopeSelectionRecord {
    fn from(selection: ScopeSelection) -> Self {
        Self {
            scope_type: selection.scope.scope_type(),
            sub_scope: selection.scope.sub_scope(),
            values: selection.values,
            all_databases: selection.all_databases,
        }
    }
}

impl Default for ScopeSelection {
    fn default() -> Self {
        Self::new(ScopeType::Database)
    }
}

impl ScopeSelection {
    /// Creates a blank selection for a scope type with its default sub-scope.
    #[must_use]
    pub fn new(scope_type: ScopeType) -> Self {
        Self::from_scope(Scope::default_for(scope_type))
    }

    /// Creates a blank selection for a validated scope pair.
    #[must_use]
    pub fn from_scope(scope: Scope) -> Self {
        Self {
            scope,
            values: BTreeMap::new(),
            all_databases: false,
        }
    }

    /// Returns the active scope pair.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the active scope type.
    #[must_use]
    pub fn scope_type(&self) -> ScopeType {
        self.scope.scope_type()
    }

    /// Returns the active sub-scope.
    #[must_use]
    pub fn sub_scope(&self) -> Option<SubScope> {
        self.scope.sub_scope()
    }

    /// Switches scope type. Everything else starts over from the defaults.
    pub fn set_scope_type(&mut self, scope_type: ScopeType) {
        *self = Self::new(scope_type);
    }

    /// Switches sub-scope inside the current scope type.
    ///
    /// Values of fields hidden by the new sub-scope are dropped.
    pub fn set_sub_scope(&mut self, sub_scope: SubScope) -> AppResult<()> {
        self.scope = Scope::new(self.scope.scope_type(), Some(sub_scope))?;

        let visible = self.scope.visible_fields();
        self.values.retain(|field, _| visible.contains(field));
        Ok(())
    }

    /// Stores a text field value. Hidden and non-text fields are rejected.
    pub fn set_value(&mut self, field: FieldName, value: impl Into<String>) -> AppResult<()> {
        if !field.is_text() {
            return Err(AppError::Validation(format!(
                "field '{}' is not a text field",
                field.as_str()
            )));
        }
        self.ensure_visible(field)?;

        self.values.insert(field, value.into());
        Ok(())
    }

    /// Returns a trimmed field value, or `None` when it is absent or blank.
    #[must_use]
    pub fn value(&self, field: FieldName) -> Option<&str> {
        self.values
            .get(&field)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Sets the all-databases flag. Only the DATABASE scope shows it.
    pub fn set_all_databases(&mut self, all_databases: bool) -> AppResult<()> {
        self.ensure_visible(FieldName::AllDatabases)?;
        self.all_databases = all_databases;
        Ok(())
    }

    /// Returns the all-databases flag.
    #[must_use]
    pub fn all_databases(&self) -> bool {
        self.all_databases
    }

    /// Permission types offered for the active pair.
    #[must_use]
    pub fn visible_permission_types(&self) -> BTreeSet<PermissionType> {
        self.scope.visible_permission_types()
    }

    /// Fields required for the active pair.
    #[must_use]
    pub fn required_fields(&self) -> BTreeSet<FieldName> {
        self.scope.required_fields()
    }

    /// Fields shown for the active pair.
    #[must_use]
    pub fn visible_fields(&self) -> BTreeSet<FieldName> {
        self.scope.visible_fields()
    }

    /// Required fields that are still blank, in field order.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<FieldName> {
        self.required_fields()
            .into_iter()
            .filter(|field| self.value(*field).is_none())
            .collect()
    }

    fn ensure_visible(&self, field: FieldName) -> AppResult<()> {
        if self.scope.visible_fields().contains(&field) {
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "field '{}' is not shown for scope '{}'",
            field.as_str(),
            self.scope.scope_type().as_str()
        )))
    }
}

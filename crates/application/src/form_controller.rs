use grantdesk_core::{AppError, AppResult};
use grantdesk_domain::{
    AccountIdentity, FieldName, FormAction, PermissionRequest, PermissionSelection,
    PermissionType, RequestBuilder, ScopeSelection, ScopeType, SubScope,
};

use crate::ViewDirective;

/// Operator input on a permission form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Scope selector changed.
    ScopeChanged(ScopeType),
    /// Sub-scope selector changed.
    SubScopeChanged(SubScope),
    /// A text field was edited.
    FieldEdited {
        /// Edited field.
        field: FieldName,
        /// New raw value.
        value: String,
    },
    /// The all-databases checkbox changed.
    AllDatabasesToggled(bool),
    /// A permission checkbox changed.
    PermissionToggled {
        /// Toggled permission type.
        permission: PermissionType,
        /// New checkbox state.
        checked: bool,
    },
    /// The grant-option checkbox changed.
    GrantOptionToggled(bool),
    /// Username or host changed.
    IdentityEdited {
        /// Raw account name.
        username: String,
        /// Raw host pattern.
        host: String,
    },
    /// The form was cleared.
    Reset,
}

/// Everything a permission form holds between events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    selection: ScopeSelection,
    permissions: PermissionSelection,
    username: String,
    host: String,
    with_grant_option: bool,
}

impl FormState {
    /// Returns the scope selection.
    #[must_use]
    pub fn selection(&self) -> &ScopeSelection {
        &self.selection
    }

    /// Returns checked permission types in checking order.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSelection {
        &self.permissions
    }

    /// Returns the raw account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the raw host pattern.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the grant-option checkbox state.
    #[must_use]
    pub fn with_grant_option(&self) -> bool {
        self.with_grant_option
    }
}

/// Applies one event to a form state.
///
/// Returns the next state and the directives that bring a view in line with
/// it. A rejected event yields an error and no state.
pub fn reduce(
    action: FormAction,
    mut state: FormState,
    event: FormEvent,
) -> AppResult<(FormState, Vec<ViewDirective>)> {
    let directives = match event {
        FormEvent::ScopeChanged(scope_type) => {
            state.selection.set_scope_type(scope_type);
            rederive(action, &mut state)
        }
        FormEvent::SubScopeChanged(sub_scope) => {
            state.selection.set_sub_scope(sub_scope)?;
            rederive(action, &mut state)
        }
        FormEvent::FieldEdited { field, value } => {
            state.selection.set_value(field, value)?;
            Vec::new()
        }
        FormEvent::AllDatabasesToggled(all_databases) => {
            state.selection.set_all_databases(all_databases)?;
            Vec::new()
        }
        FormEvent::PermissionToggled {
            permission,
            checked,
        } => {
            if checked {
                if !state.selection.visible_permission_types().contains(&permission) {
                    return Err(AppError::Validation(format!(
                        "permission '{}' is not offered for scope '{}'",
                        permission.as_str(),
                        state.selection.scope_type().as_str()
                    )));
                }
                state.permissions.insert(permission);
            } else {
                state.permissions.remove(permission);
            }
            Vec::new()
        }
        FormEvent::GrantOptionToggled(with_grant_option) => {
            if action != FormAction::Grant {
                return Err(AppError::Validation(
                    "grant option only applies to grant forms".to_owned(),
                ));
            }
            state.with_grant_option = with_grant_option;
            Vec::new()
        }
        FormEvent::IdentityEdited { username, host } => {
            state.username = username;
            state.host = host;
            Vec::new()
        }
        FormEvent::Reset => {
            state = FormState::default();
            let mut directives = vec![ViewDirective::ResetForm { form: action }];
            directives.extend(scope_directives(action, &state.selection));
            directives
        }
    };

    Ok((state, directives))
}

/// Drops checked permissions the new scope does not offer and redraws.
fn rederive(action: FormAction, state: &mut FormState) -> Vec<ViewDirective> {
    let offered = state.selection.visible_permission_types();
    state
        .permissions
        .retain(|permission| offered.contains(&permission));

    scope_directives(action, &state.selection)
}

/// Hides and un-requires everything, then shows and requires exactly what the
/// active scope needs.
fn scope_directives(action: FormAction, selection: &ScopeSelection) -> Vec<ViewDirective> {
    let visible = selection.visible_fields();
    let required = selection.required_fields();
    let offered = selection.visible_permission_types();

    let mut directives = Vec::new();
    for field in FieldName::all() {
        directives.push(ViewDirective::Hide {
            form: action,
            field: *field,
        });
        directives.push(ViewDirective::SetRequired {
            form: action,
            field: *field,
            required: false,
        });
    }
    for field in &visible {
        directives.push(ViewDirective::Show {
            form: action,
            field: *field,
        });
    }
    for field in &required {
        directives.push(ViewDirective::SetRequired {
            form: action,
            field: *field,
            required: true,
        });
    }
    for permission in PermissionType::all() {
        directives.push(ViewDirective::SetPermissionVisible {
            form: action,
            permission: *permission,
            visible: offered.contains(permission),
        });
    }

    directives
}

/// Owns one form's state and turns its events into directives.
#[derive(Debug, Clone)]
pub struct FormController {
    action: FormAction,
    state: FormState,
}

impl FormController {
    /// Creates a blank form.
    #[must_use]
    pub fn new(action: FormAction) -> Self {
        Self {
            action,
            state: FormState::default(),
        }
    }

    /// Returns which mutation this form submits.
    #[must_use]
    pub fn action(&self) -> FormAction {
        self.action
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Directives that draw the form from scratch.
    #[must_use]
    pub fn initial_directives(&self) -> Vec<ViewDirective> {
        scope_directives(self.action, &self.state.selection)
    }

    /// Applies one event. The state is left untouched when it is rejected.
    pub fn handle(&mut self, event: FormEvent) -> AppResult<Vec<ViewDirective>> {
        let (state, directives) = reduce(self.action, self.state.clone(), event)?;
        self.state = state;
        Ok(directives)
    }

    /// Validates the form and builds its payload.
    ///
    /// Checks run in order: at least one permission, then every required
    /// field, then the account.
    pub fn prepare_submission(&self) -> AppResult<PermissionRequest> {
        if self.state.permissions.is_empty() {
            return Err(AppError::Validation(
                "select at least one permission type".to_owned(),
            ));
        }

        let missing = self.state.selection.missing_required_fields();
        if !missing.is_empty() {
            let names = missing
                .iter()
                .map(FieldName::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::Validation(format!(
                "please fill in required fields: {names}"
            )));
        }

        let identity = AccountIdentity::new(&self.state.username, &self.state.host)?;

        RequestBuilder::build(
            self.action,
            &self.state.selection,
            &self.state.permissions,
            &identity,
            self.state.with_grant_option,
        )
    }
}

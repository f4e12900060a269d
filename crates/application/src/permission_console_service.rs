use std::sync::Arc;

use grantdesk_core::{AppError, AppResult};
use grantdesk_domain::{
    AccountIdentity, FormAction, PermissionRequest, PermissionSelection, PermissionType,
    RequestBuilder, ScopeSelection, UserKey, UserListRow, UserPermissionRecord,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    FormController, FormEvent, MessageKind, PermissionTransport, SubmissionGate,
    USER_PERMISSIONS_MODAL, ViewDirective, ViewRegion, ViewRenderer,
};

/// One line of a batch file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    /// Account name.
    pub username: String,
    /// Host pattern.
    pub host: String,
    /// Target of the permissions.
    pub scope: ScopeSelection,
    /// Permission types in the order they should be sent.
    pub permission_types: Vec<PermissionType>,
    /// Grant option; only valid for grants.
    #[serde(default)]
    pub with_grant_option: bool,
}

impl BatchEntry {
    /// Builds the payload for this entry, checking the scope's vocabulary.
    pub fn to_request(&self, action: FormAction) -> AppResult<PermissionRequest> {
        if self.with_grant_option && action == FormAction::Revoke {
            return Err(AppError::Validation(
                "grant option only applies to grants".to_owned(),
            ));
        }

        let offered = self.scope.visible_permission_types();
        if let Some(hidden) = self
            .permission_types
            .iter()
            .find(|permission| !offered.contains(permission))
        {
            return Err(AppError::Validation(format!(
                "permission '{}' is not offered for scope '{}'",
                hidden.as_str(),
                self.scope.scope_type().as_str()
            )));
        }

        let missing = self.scope.missing_required_fields();
        if let Some(field) = missing.first() {
            return Err(AppError::Validation(format!(
                "field '{}' is required",
                field.as_str()
            )));
        }

        let identity = AccountIdentity::new(&self.username, &self.host)?;
        let permissions: PermissionSelection = self.permission_types.iter().copied().collect();

        RequestBuilder::build(
            action,
            &self.scope,
            &permissions,
            &identity,
            self.with_grant_option,
        )
    }
}

/// Orchestrates form submissions and account lookups against the permission
/// service, reporting every outcome to the renderer.
#[derive(Clone)]
pub struct PermissionConsoleService {
    transport: Arc<dyn PermissionTransport>,
    renderer: Arc<dyn ViewRenderer>,
    gate: Arc<SubmissionGate>,
}

impl PermissionConsoleService {
    /// Creates a console service.
    #[must_use]
    pub fn new(transport: Arc<dyn PermissionTransport>, renderer: Arc<dyn ViewRenderer>) -> Self {
        Self {
            transport,
            renderer,
            gate: Arc::new(SubmissionGate::new()),
        }
    }

    /// Draws a form from scratch.
    pub fn open_form(&self, controller: &FormController) {
        self.render_all(controller.initial_directives());
    }

    /// Feeds one event to a form and renders the outcome.
    pub fn dispatch(&self, controller: &mut FormController, event: FormEvent) -> AppResult<()> {
        match controller.handle(event) {
            Ok(directives) => {
                self.render_all(directives);
                Ok(())
            }
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        }
    }

    /// Validates and submits a form.
    ///
    /// Nothing is sent when validation fails. On success the form is reset
    /// and the account list reloaded afterwards.
    pub async fn submit(&self, controller: &mut FormController) -> AppResult<String> {
        let action = controller.action();
        let request = match controller.prepare_submission() {
            Ok(request) => request,
            Err(error) => {
                self.report(&error);
                return Err(error);
            }
        };

        let guard = match self.gate.acquire(action, self.renderer.as_ref()) {
            Ok(guard) => guard,
            Err(error) => {
                self.report(&error);
                return Err(error);
            }
        };

        info!(
            action = action.as_str(),
            username = request.username(),
            host = request.host(),
            scope_type = request.scope_type().as_str(),
            permission_count = request.permission_types().len(),
            "submitting permission request"
        );

        let result = match action {
            FormAction::Grant => self.transport.grant(&request).await,
            FormAction::Revoke => self.transport.revoke(&request).await,
        };

        let message = match result {
            Ok(message) => message,
            Err(error) => {
                warn!(action = action.as_str(), error = %error, "permission request failed");
                self.report(&error);
                return Err(error);
            }
        };

        self.renderer.apply(ViewDirective::message(
            MessageKind::Success,
            "Success",
            success_text(action, &message),
        ));
        let directives = controller.handle(FormEvent::Reset)?;
        self.render_all(directives);
        drop(guard);

        // A failed reload is reported on its own and does not undo the mutation.
        let _ = self.load_users().await;
        Ok(message)
    }

    /// Submits several requests of one action in a single call.
    pub async fn submit_batch(
        &self,
        action: FormAction,
        entries: &[BatchEntry],
    ) -> AppResult<String> {
        let requests = match build_batch(action, entries) {
            Ok(requests) => requests,
            Err(error) => {
                self.report(&error);
                return Err(error);
            }
        };

        let guard = match self.gate.acquire(action, self.renderer.as_ref()) {
            Ok(guard) => guard,
            Err(error) => {
                self.report(&error);
                return Err(error);
            }
        };

        info!(
            action = action.as_str(),
            request_count = requests.len(),
            "submitting permission batch"
        );

        let message = match self.transport.batch(action, &requests).await {
            Ok(message) => message,
            Err(error) => {
                warn!(action = action.as_str(), error = %error, "permission batch failed");
                self.report(&error);
                return Err(error);
            }
        };

        self.renderer.apply(ViewDirective::message(
            MessageKind::Success,
            "Success",
            success_text(action, &message),
        ));
        drop(guard);

        let _ = self.load_users().await;
        Ok(message)
    }

    /// Loads the account list.
    pub async fn load_users(&self) -> AppResult<Vec<UserListRow>> {
        self.renderer.apply(ViewDirective::ShowLoading {
            region: ViewRegion::UserList,
        });

        let records = match self.transport.list_users().await {
            Ok(records) => records,
            Err(error) => {
                warn!(error = %error, "loading accounts failed");
                self.report(&error);
                return Err(error);
            }
        };

        let rows: Vec<UserListRow> = records.iter().map(UserListRow::from).collect();
        info!(account_count = rows.len(), "loaded accounts");

        self.renderer
            .apply(ViewDirective::RenderUserList { rows: rows.clone() });
        Ok(rows)
    }

    /// Loads one account's permissions and opens the detail modal.
    pub async fn view_user_details(&self, key: &UserKey) -> AppResult<UserPermissionRecord> {
        self.renderer.apply(ViewDirective::ShowLoading {
            region: ViewRegion::UserDetail,
        });

        let record = match self.transport.user_detail(key).await {
            Ok(record) => record,
            Err(error) => {
                warn!(username = key.username(), host = key.host(), error = %error, "loading account failed");
                self.report(&error);
                return Err(error);
            }
        };

        self.renderer.apply(ViewDirective::RenderUserDetail {
            record: record.clone(),
        });
        self.renderer.apply(ViewDirective::ShowModal {
            id: USER_PERMISSIONS_MODAL.to_owned(),
        });
        Ok(record)
    }

    /// Returns whether an account exists.
    pub async fn user_exists(&self, key: &UserKey) -> AppResult<bool> {
        match self.transport.user_exists(key).await {
            Ok(exists) => {
                info!(username = key.username(), host = key.host(), exists, "checked account");
                let text = if exists {
                    format!("account {key} exists")
                } else {
                    format!("account {key} was not found")
                };
                self.renderer
                    .apply(ViewDirective::message(MessageKind::Info, "Account", text));
                Ok(exists)
            }
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        }
    }

    fn render_all(&self, directives: Vec<ViewDirective>) {
        for directive in directives {
            self.renderer.apply(directive);
        }
    }

    /// Shows a failure to the operator.
    ///
    /// Every method of this service already reports its own errors; callers
    /// use this for failures raised around it.
    pub fn report(&self, error: &AppError) {
        self.renderer.apply(ViewDirective::from_error(error));
    }
}

fn build_batch(action: FormAction, entries: &[BatchEntry]) -> AppResult<Vec<PermissionRequest>> {
    if entries.is_empty() {
        return Err(AppError::Validation(
            "batch contains no requests".to_owned(),
        ));
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.to_request(action).map_err(|error| match error {
                AppError::Validation(message) => {
                    AppError::Validation(format!("entry {}: {message}", index + 1))
                }
                other => other,
            })
        })
        .collect()
}

fn success_text(action: FormAction, message: &str) -> String {
    if !message.trim().is_empty() {
        return message.to_owned();
    }

    match action {
        FormAction::Grant => "permissions granted".to_owned(),
        FormAction::Revoke => "permissions revoked".to_owned(),
    }
}

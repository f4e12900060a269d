use grantdesk_core::AppError;
use grantdesk_domain::{FieldName, FormAction, PermissionType, UserListRow, UserPermissionRecord};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Modal that shows one account's permissions.
pub const USER_PERMISSIONS_MODAL: &str = "userPermissionsModal";

/// Tone of an operator message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../../bindings/message-kind.ts")]
pub enum MessageKind {
    /// Completed mutation.
    Success,
    /// Failed attempt.
    Danger,
    /// Rejected locally, nothing was sent.
    Warning,
    /// Neutral notice.
    Info,
}

impl MessageKind {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// Page areas that show a loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../bindings/view-region.ts")]
pub enum ViewRegion {
    /// Account list.
    UserList,
    /// Account detail modal body.
    UserDetail,
}

/// Instruction for a [`crate::ViewRenderer`].
///
/// Serialized as JSON tagged by `type` so a browser renderer can switch on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "../../../bindings/view-directive.ts")]
pub enum ViewDirective {
    /// Shows one field of a form.
    Show {
        /// Target form.
        form: FormAction,
        /// Field to show.
        field: FieldName,
    },
    /// Hides one field of a form.
    Hide {
        /// Target form.
        form: FormAction,
        /// Field to hide.
        field: FieldName,
    },
    /// Marks one field as required or optional.
    SetRequired {
        /// Target form.
        form: FormAction,
        /// Field to mark.
        field: FieldName,
        /// Whether the field is required.
        required: bool,
    },
    /// Shows or hides one permission checkbox.
    SetPermissionVisible {
        /// Target form.
        form: FormAction,
        /// Checkbox to toggle.
        permission: PermissionType,
        /// Whether the checkbox is shown.
        visible: bool,
    },
    /// Shows an operator message.
    ShowMessage {
        /// Message heading.
        title: String,
        /// Message body.
        text: String,
        /// Message tone.
        kind: MessageKind,
    },
    /// Replaces a region with a loading indicator.
    ShowLoading {
        /// Region to replace.
        region: ViewRegion,
    },
    /// Opens a modal.
    ShowModal {
        /// Modal element id.
        id: String,
    },
    /// Disables or re-enables a form's submit control.
    SetSubmitBusy {
        /// Target form.
        form: FormAction,
        /// Whether a submission is in flight.
        busy: bool,
    },
    /// Clears a form's inputs.
    ResetForm {
        /// Target form.
        form: FormAction,
    },
    /// Renders the account list.
    RenderUserList {
        /// Rows with permission-count badges.
        rows: Vec<UserListRow>,
    },
    /// Renders one account's permissions.
    RenderUserDetail {
        /// Fetched record.
        record: UserPermissionRecord,
    },
}

impl ViewDirective {
    pub(crate) fn message(kind: MessageKind, title: &str, text: impl Into<String>) -> Self {
        Self::ShowMessage {
            title: title.to_owned(),
            text: text.into(),
            kind,
        }
    }

    /// Builds the operator message for a failed attempt.
    ///
    /// Errors raised before any network call are warnings; everything else is
    /// shown as an error.
    #[must_use]
    pub fn from_error(error: &AppError) -> Self {
        if error.is_local() {
            Self::message(MessageKind::Warning, "Warning", error.user_message())
        } else {
            Self::message(MessageKind::Danger, "Error", error.user_message())
        }
    }
}

//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod identity;
mod permission;
mod request;
mod scope;
mod scope_rules;
mod scope_selection;
mod user_permission;

pub use identity::{AccountIdentity, UserKey};
pub use permission::{PermissionSelection, PermissionType};
pub use request::{FormAction, PermissionRequest, RequestBuilder};
pub use scope::{FieldName, ScopeType, SubScope, TableScope, ViewScope};
pub use scope_rules::{Scope, required_fields, visible_permission_types};
pub use scope_selection::ScopeSelection;
pub use user_permission::{PermissionEntry, UserListRow, UserPermissionRecord};

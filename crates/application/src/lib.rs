//! Application services and ports.

#![forbid(unsafe_code)]

mod console_ports;
mod form_controller;
mod permission_console_service;
mod submission_gate;
mod view_directive;

pub use console_ports::{PermissionTransport, ViewRenderer};
pub use form_controller::{FormController, FormEvent, FormState, reduce};
pub use permission_console_service::{BatchEntry, PermissionConsoleService};
pub use submission_gate::{SubmissionGate, SubmissionGuard};
pub use view_directive::{MessageKind, USER_PERMISSIONS_MODAL, ViewDirective, ViewRegion};

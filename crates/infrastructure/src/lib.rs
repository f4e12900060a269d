//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_permission_transport;
mod in_memory_permission_transport;

pub use http_permission_transport::{HttpPermissionTransport, SessionLogin};
pub use in_memory_permission_transport::InMemoryPermissionTransport;

//! Unified records shared by every backend

pub mod service;
pub mod status;

pub use service::{ManagerConfig, ServiceSpec, Svc, Task};
pub use status::OperationStatus;

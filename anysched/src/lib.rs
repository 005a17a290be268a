//! anysched Library
//!
//! One interface to deploy, destroy and inspect container services on
//! Kubernetes, Marathon, Docker Swarm and Nomad.

pub mod backends;
pub mod errors;
pub mod http;
pub mod logs;
pub mod manager;
pub mod mapper;
pub mod models;
pub mod operation;
pub mod registry;
pub mod settings;

pub use errors::{ApiError, SchedError};
pub use manager::{BackendKind, Manager};
pub use models::{ManagerConfig, OperationStatus, ServiceSpec, Svc, Task};
pub use operation::{Operation, OperationState, Properties, WaitOptions};
pub use registry::Registry;

//! Marathon backend (v2 REST API)

mod manager;
mod tracker;

pub use manager::MarathonManager;

pub(crate) use tracker::{AppTracker, DeploymentsTracker};

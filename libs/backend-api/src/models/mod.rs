//! API models

pub mod kubernetes;
pub mod marathon;
pub mod nomad;
pub mod swarm;

//! Backend wire models
//!
//! Serde shapes for the parts of the Kubernetes, Marathon, Docker Engine and
//! Nomad REST APIs that anysched reads back.

pub mod models;

pub use models::{kubernetes, marathon, nomad, swarm};

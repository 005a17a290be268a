//! Per-scheduler adapters implementing [`Manager`](crate::manager::Manager)

pub mod dockerswarm;
pub mod kubernetes;
pub mod marathon;
pub mod nomad;

pub use dockerswarm::DockerSwarmManager;
pub use kubernetes::KubernetesManager;
pub use marathon::MarathonManager;
pub use nomad::NomadManager;

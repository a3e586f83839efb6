pub mod types;
pub mod geo;
pub mod services;
pub mod cluster;
pub mod priority;
pub mod occupancy;
pub mod assign;

pub use types::{
    AmbulanceStatus, BedCount, Breathing, Capability, Case, Cluster, Consciousness, Hospital,
    HospitalServices, Patient, Severity,
};
pub use geo::distance_km;
pub use services::{infer_from_text, required_services, required_services_for};
pub use cluster::cluster_cases;
pub use priority::{prioritize, sort_by_severity};
pub use occupancy::occupancy;
pub use assign::{assign, run_assignment, AssignmentRun, AssignmentTier, ClusterAssignment};

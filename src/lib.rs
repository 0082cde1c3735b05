//! Mutating admission hook that moves labeled workloads to the spot
//! scheduler, using percentages from an assignment ConfigMap.

pub mod assignment;
pub mod config;
pub mod errors;
pub mod hook;
pub mod patch;
pub mod webhook;
pub mod workload;

pub use assignment::{AssignmentStore, InMemoryStore};
pub use config::HookConfig;
pub use hook::SpotHook;
pub use webhook::server::{Admit, Server};

//! kgscout-agent — Knowledge-graph pathfinding runs.
//!
//! [`Pathfinder`] drives a validation or discovery run over any
//! [`kgscout_kg::GraphRepository`] and returns an [`Outcome`]; the
//! `kgscout` binary wires it to configuration, the CLI and artifact files.

pub mod artifact;
pub mod config;
pub mod orchestrator;
pub mod report;
pub mod request;

pub use config::Config;
pub use orchestrator::{Pathfinder, PathfinderSettings, RunState, RunTrace};
pub use report::{Outcome, Report};
pub use request::{Mode, PathfinderRequest, RequestDefaults, RunPlan};

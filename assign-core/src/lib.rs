//! Classroom assignment engine.
//!
//! Partitions a roster of students into `K` classes under hard
//! constraints (friend presence, separation pairs, cluster cohesion,
//! class-size band) while optimizing a weighted blend of soft balance
//! objectives, via two interchangeable solvers: [`solver::greedy`] and
//! [`solver::cso`].
//!
//! The public entry point is [`orchestrator::Orchestrator`]; most
//! callers only need [`config::EngineConfig`],
//! [`models::RawRoster`]/[`models::RawStudent`], and
//! [`orchestrator::Orchestrator::assign`]. The lower-level modules
//! (`roster`, `validator`, `evaluator`, `solver`) are public so a caller
//! that only needs validation, scoring, or a single solver strategy
//! isn't forced through the orchestrator.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod orchestrator;
pub mod roster;
pub mod solver;
pub mod validator;

pub use config::EngineConfig;
pub use error::{EngineError, ErrorCode};
pub use models::{Assignment, AssignmentResponse, RawRoster, RawStudent};
pub use orchestrator::Orchestrator;

//! Consistency validator for adventure module data.
//!
//! Loads a structured adventure module (areas, locations, plot, world
//! registry metadata) and checks its referential and narrative integrity
//! before the module is played:
//! - Schema compliance: exact field sets, typed IDs, quantity shapes
//! - Connectivity: reciprocated edges, reachability, ID-type confusion
//! - Plot coherence: resolvable references, acyclic progression
//! - Reward tracking: loot tables vs. declared quest rewards
//! - Free-text heuristics: progression order, spawn loops, rare triggers
//!
//! The validator is read-only: data flows from raw files to typed records
//! to the index and graph, then through the rules into one report.
//!
//! # Quick Start
//!
//! ```ignore
//! use modlint_core::Validator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = Validator::new("modules/Greenfields_Vale").run().await?;
//!     print!("{}", report.render());
//!     std::process::exit(report.exit_code());
//! }
//! ```

pub mod graph;
pub mod ids;
pub mod index;
pub mod loader;
pub mod model;
pub mod report;
pub mod rules;
pub mod testing;
pub mod validator;

// Primary public API
pub use ids::{AreaId, Coordinates, DcCheck, IdError, LocationId};
pub use loader::{LoadError, LoadedModule, SchemaError};
pub use report::{Finding, FindingKind, Report, Severity};
pub use rules::{default_rules, Rule, RuleContext};
pub use validator::Validator;

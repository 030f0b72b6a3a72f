//! Validation rules.
//!
//! Every rule is a pure function over the loaded module, the reference
//! index, and the connectivity graph: it reads shared immutable state and
//! returns findings. Rules never depend on one another, so they can run in
//! any order; one rule failing to evaluate (missing input file) reports an
//! inconclusive finding instead of blocking the rest.

mod connectivity;
mod plot;
mod rewards;
mod schema;
mod text;

pub use connectivity::{DanglingConnection, OneWayEdge, UnreachableLocation, WrongIdType};
pub use plot::{NextPointsResolve, PlotAreaResolves, PlotProgression, UnknownEntityMention};
pub use rewards::{MissingItem, RewardDualPresence};
pub use schema::{ExtraneousFields, MisplacedMonster, MonsterQuantity, TemplateIntegrity};
pub use text::{RareTrigger, SequentialProgression, SpawnLoopSafety};

use crate::graph::ConnectivityGraph;
use crate::index::ReferenceIndex;
use crate::loader::LoadedModule;
use crate::model::Module;
use crate::report::Finding;

/// Read-only inputs shared by every rule during one run.
pub struct RuleContext<'a> {
    pub loaded: &'a LoadedModule,
    pub index: &'a ReferenceIndex,
    pub graph: &'a ConnectivityGraph,
}

impl<'a> RuleContext<'a> {
    pub fn module(&self) -> &Module {
        &self.loaded.module
    }
}

/// One independent validation rule.
pub trait Rule: Send + Sync {
    /// Stable identifier, used in reports and for toggling.
    fn id(&self) -> &'static str;

    /// One-line summary for `--list-rules`.
    fn description(&self) -> &'static str;

    /// Evaluate against the shared context. Never mutates anything.
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding>;
}

/// The full rule set, in a stable order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ExtraneousFields),
        Box::new(MisplacedMonster),
        Box::new(MonsterQuantity),
        Box::new(TemplateIntegrity),
        Box::new(UnreachableLocation),
        Box::new(OneWayEdge),
        Box::new(WrongIdType),
        Box::new(DanglingConnection),
        Box::new(PlotAreaResolves),
        Box::new(NextPointsResolve),
        Box::new(PlotProgression),
        Box::new(UnknownEntityMention),
        Box::new(RewardDualPresence),
        Box::new(MissingItem),
        Box::new(SequentialProgression),
        Box::new(SpawnLoopSafety),
        Box::new(RareTrigger),
    ]
}

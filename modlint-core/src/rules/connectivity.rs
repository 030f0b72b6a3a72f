//! Connectivity rules over the location graph.

use super::{Rule, RuleContext};
use crate::ids::{classify_id, IdClass, LocationId};
use crate::report::{Finding, Severity};

/// Every location must be reachable from the module's starting location.
/// An unreached location is dead content, not a style nit.
pub struct UnreachableLocation;

impl Rule for UnreachableLocation {
    fn id(&self) -> &'static str {
        "unreachable-location"
    }

    fn description(&self) -> &'static str {
        "every location must be reachable from the starting location"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        if ctx.graph.nodes.is_empty() {
            return vec![Finding::inconclusive(
                self.id(),
                "no locations loaded; cannot evaluate reachability",
            )];
        }
        let Some(start) = &ctx.graph.start else {
            return vec![Finding::inconclusive(
                self.id(),
                "no starting location could be determined (module context and plot \
                 are both unavailable)",
            )];
        };

        ctx.graph
            .unreachable()
            .into_iter()
            .map(|id| {
                let name = ctx
                    .index
                    .locations
                    .get(id)
                    .map(|entry| entry.name.as_str())
                    .unwrap_or("unknown");
                Finding::violation(
                    Severity::Critical,
                    self.id(),
                    Some(id.to_string()),
                    format!("location {id} ({name}) is unreachable from start {start}"),
                )
            })
            .collect()
    }
}

/// Every edge must be reciprocated: A -> B implies B -> A. Not
/// auto-repaired, since which side is wrong is an authoring decision.
pub struct OneWayEdge;

impl Rule for OneWayEdge {
    fn id(&self) -> &'static str {
        "one-way-edge"
    }

    fn description(&self) -> &'static str {
        "connectivity edges must be reciprocated in both directions"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        ctx.graph
            .asymmetric_edges()
            .into_iter()
            .map(|(from, to)| {
                Finding::violation(
                    Severity::Important,
                    self.id(),
                    Some(format!("{from} -> {to}")),
                    format!("{from} connects to {to} but {to} does not connect back"),
                )
            })
            .collect()
    }
}

/// `areaConnectivityId` entries must be location IDs. Area-shaped strings
/// are the classic authoring mistake here; the shapes are disjoint, so
/// classification is by pattern class, never length.
pub struct WrongIdType;

impl Rule for WrongIdType {
    fn id(&self) -> &'static str {
        "wrong-id-type"
    }

    fn description(&self) -> &'static str {
        "areaConnectivityId entries must be location IDs, never area IDs"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (_, location) in ctx.module().all_locations() {
            let from = &location.location_id;
            for raw in &location.area_connectivity_id {
                match classify_id(raw) {
                    IdClass::Location => {}
                    IdClass::Area => findings.push(Finding::violation(
                        Severity::Critical,
                        self.id(),
                        Some(format!("{from} -> {raw}")),
                        format!(
                            "areaConnectivityId entry {raw:?} is an area ID; it must \
                             name the destination location inside that area"
                        ),
                    )),
                    IdClass::Neither => findings.push(Finding::violation(
                        Severity::Critical,
                        self.id(),
                        Some(format!("{from} -> {raw}")),
                        format!("areaConnectivityId entry {raw:?} is not a location ID"),
                    )),
                }
            }
        }

        findings
    }
}

/// Connectivity references must resolve to locations that exist.
pub struct DanglingConnection;

impl Rule for DanglingConnection {
    fn id(&self) -> &'static str {
        "dangling-connection"
    }

    fn description(&self) -> &'static str {
        "every connectivity reference must resolve to an existing location"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (_, location) in ctx.module().all_locations() {
            let from = &location.location_id;

            for raw in &location.connectivity {
                match raw.parse::<LocationId>() {
                    Ok(to) if ctx.index.locations.contains_key(&to) => {}
                    Ok(to) => findings.push(Finding::violation(
                        Severity::Critical,
                        self.id(),
                        Some(format!("{from} -> {to}")),
                        format!("{from} connects to {to}, which does not exist"),
                    )),
                    Err(_) => findings.push(Finding::violation(
                        Severity::Critical,
                        self.id(),
                        Some(format!("{from} -> {raw}")),
                        format!("connectivity entry {raw:?} is not a location ID"),
                    )),
                }
            }

            // Shape violations in areaConnectivityId belong to the
            // wrong-id-type rule; here only well-shaped-but-missing.
            for raw in &location.area_connectivity_id {
                if let Ok(to) = raw.parse::<LocationId>() {
                    if !ctx.index.locations.contains_key(&to) {
                        findings.push(Finding::violation(
                            Severity::Critical,
                            self.id(),
                            Some(format!("{from} -> {to}")),
                            format!(
                                "{from} has a cross-area connection to {to}, which does \
                                 not exist"
                            ),
                        ));
                    }
                }
            }
        }

        findings
    }
}

//! Connectivity graph over location IDs.
//!
//! Edges come from each location's intra-area `connectivity` list plus
//! cross-area edges synthesized from `areaConnectivityId`. The builder only
//! records edges whose endpoints both resolve to loaded locations; the
//! connectivity rules separately flag the entries that do not resolve.
//! Traversal treats edges as undirected (a one-way edge still connects),
//! while the directed edge set is kept so asymmetry can be reported.

use crate::ids::LocationId;
use crate::index::ReferenceIndex;
use crate::model::Module;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// The derived, never-persisted location graph.
#[derive(Debug, Default)]
pub struct ConnectivityGraph {
    /// Every node, whether or not any edge touches it.
    pub nodes: BTreeSet<LocationId>,
    /// Directed edges exactly as authored (resolved endpoints only).
    pub directed: BTreeSet<(LocationId, LocationId)>,
    /// Symmetrized adjacency for traversal.
    pub adjacency: BTreeMap<LocationId, BTreeSet<LocationId>>,
    /// Where reachability starts, when the module declares or implies one.
    pub start: Option<LocationId>,
}

impl ConnectivityGraph {
    pub fn build(module: &Module, index: &ReferenceIndex) -> Self {
        let mut graph = ConnectivityGraph {
            start: module.starting_location(),
            ..ConnectivityGraph::default()
        };

        for (_, location) in module.all_locations() {
            graph.nodes.insert(location.location_id.clone());
        }

        for (_, location) in module.all_locations() {
            let from = &location.location_id;
            let targets = location
                .connectivity
                .iter()
                .chain(location.area_connectivity_id.iter());
            for raw in targets {
                let Ok(to) = raw.parse::<LocationId>() else {
                    continue;
                };
                if !index.locations.contains_key(&to) {
                    continue;
                }
                graph.directed.insert((from.clone(), to.clone()));
                graph
                    .adjacency
                    .entry(from.clone())
                    .or_default()
                    .insert(to.clone());
                graph
                    .adjacency
                    .entry(to.clone())
                    .or_default()
                    .insert(from.clone());
            }
        }

        graph
    }

    pub fn has_directed_edge(&self, from: &LocationId, to: &LocationId) -> bool {
        self.directed.contains(&(from.clone(), to.clone()))
    }

    /// Directed edges whose reciprocal is missing. Not auto-repaired:
    /// which direction is wrong is a content-authoring decision.
    pub fn asymmetric_edges(&self) -> Vec<(&LocationId, &LocationId)> {
        self.directed
            .iter()
            .filter(|(from, to)| !self.directed.contains(&(to.clone(), from.clone())))
            .map(|(from, to)| (from, to))
            .collect()
    }

    /// Breadth-first traversal from the start location.
    pub fn reachable(&self) -> BTreeSet<LocationId> {
        let mut visited = BTreeSet::new();
        let Some(start) = &self.start else {
            return visited;
        };
        if !self.nodes.contains(start) {
            return visited;
        }

        let mut queue = VecDeque::new();
        visited.insert(start.clone());
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = self.adjacency.get(&current) {
                for next in neighbors {
                    if visited.insert(next.clone()) {
                        queue.push_back(next.clone());
                    }
                }
            }
        }

        visited
    }

    /// Nodes the traversal never reaches, in deterministic order.
    pub fn unreachable(&self) -> Vec<&LocationId> {
        let reached = self.reachable();
        self.nodes.iter().filter(|n| !reached.contains(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Area, Module, ModuleContext};
    use crate::testing::{area_value, connected_location};

    fn module_from_areas(start: &str, areas: Vec<serde_json::Value>) -> Module {
        let mut module = Module {
            name: "Testfields".to_string(),
            context: Some(ModuleContext {
                starting_location_id: Some(start.parse().unwrap()),
                ..ModuleContext::default()
            }),
            ..Module::default()
        };
        for value in areas {
            let area: Area = serde_json::from_value(value).unwrap();
            module.areas.insert(area.area_id.clone(), area);
        }
        module
    }

    fn graph_of(module: &Module) -> ConnectivityGraph {
        let index = ReferenceIndex::build(module);
        ConnectivityGraph::build(module, &index)
    }

    #[test]
    fn test_fully_reciprocated_graph_reaches_everything() {
        let module = module_from_areas(
            "A01",
            vec![area_value(
                "HFG001",
                "Vale",
                vec![
                    connected_location("A01", &["A02"]),
                    connected_location("A02", &["A01", "A03"]),
                    connected_location("A03", &["A02"]),
                ],
            )],
        );
        let graph = graph_of(&module);
        assert!(graph.asymmetric_edges().is_empty());
        assert_eq!(graph.reachable().len(), 3);
        assert!(graph.unreachable().is_empty());
    }

    #[test]
    fn test_one_way_edge_detected_but_still_traversable() {
        let module = module_from_areas(
            "A01",
            vec![area_value(
                "HFG001",
                "Vale",
                vec![
                    connected_location("A01", &["B01"]),
                    connected_location("B01", &[]),
                ],
            )],
        );
        let graph = graph_of(&module);

        let asymmetric = graph.asymmetric_edges();
        assert_eq!(asymmetric.len(), 1);
        assert_eq!(asymmetric[0].0.as_str(), "A01");
        assert_eq!(asymmetric[0].1.as_str(), "B01");
        // Undirected traversal still reaches B01.
        assert!(graph.unreachable().is_empty());
    }

    #[test]
    fn test_isolated_location_is_unreachable() {
        let module = module_from_areas(
            "A01",
            vec![area_value(
                "HFG001",
                "Vale",
                vec![
                    connected_location("A01", &["A02"]),
                    connected_location("A02", &["A01"]),
                    connected_location("C03", &[]),
                ],
            )],
        );
        let graph = graph_of(&module);
        let unreachable = graph.unreachable();
        assert_eq!(unreachable.len(), 1);
        assert_eq!(unreachable[0].as_str(), "C03");
    }

    #[test]
    fn test_cross_area_edges_connect_areas() {
        let mut town = connected_location("A01", &[]);
        town["areaConnectivity"] = serde_json::json!(["The Crypt"]);
        town["areaConnectivityId"] = serde_json::json!(["C01"]);
        let mut crypt = connected_location("C01", &[]);
        crypt["areaConnectivity"] = serde_json::json!(["The Vale"]);
        crypt["areaConnectivityId"] = serde_json::json!(["A01"]);

        let module = module_from_areas(
            "A01",
            vec![
                area_value("HFG001", "The Vale", vec![town]),
                area_value("ZZT001", "The Crypt", vec![crypt]),
            ],
        );
        let graph = graph_of(&module);
        assert!(graph.asymmetric_edges().is_empty());
        assert_eq!(graph.reachable().len(), 2);
    }

    #[test]
    fn test_unresolvable_targets_produce_no_edges() {
        let module = module_from_areas(
            "A01",
            vec![area_value(
                "HFG001",
                "Vale",
                vec![connected_location("A01", &["Z99", "HFG001", "garbage"])],
            )],
        );
        let graph = graph_of(&module);
        assert!(graph.directed.is_empty());
    }
}

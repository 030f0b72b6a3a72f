//! Reference index: lookup tables over a loaded module.
//!
//! Built once per run as an immutable snapshot and shared by reference
//! with every rule. Name lookups are case-insensitive since plot text and
//! DM instructions do not reliably match authored casing.

use crate::ids::{AreaId, LocationId};
use crate::model::Module;
use crate::report::{Finding, Severity};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    /// The literal reward convention in plot and side-quest text:
    /// `Reward: <item>` up to the end of the sentence or line.
    static ref REWARD_RE: Regex = Regex::new(r"Reward:\s*([^.!\n]+)").unwrap();
}

/// Where a location lives and what it is called.
#[derive(Debug, Clone)]
pub struct LocationEntry {
    pub area: AreaId,
    pub name: String,
}

/// An area's display data.
#[derive(Debug, Clone)]
pub struct AreaEntry {
    pub name: String,
}

/// Every place an item name is mentioned as obtainable.
///
/// An item should come from exactly one side: a static loot table or a
/// quest-reward declaration. The reward-tracking rule flags dual presence.
#[derive(Debug, Clone, Default)]
pub struct ItemEntry {
    /// Item name as first authored (lookups use the lowercased key).
    pub name: String,
    /// Locations whose loot table lists the item.
    pub loot_locations: BTreeSet<LocationId>,
    /// Plot point / side quest IDs declaring the item as a reward.
    pub reward_quests: BTreeSet<String>,
}

/// Immutable lookup tables over one module.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    /// Location ID to its owning area and name.
    pub locations: BTreeMap<LocationId, LocationEntry>,
    /// Area ID to display data.
    pub areas: BTreeMap<AreaId, AreaEntry>,
    /// Lowercased area name back to its ID, for lexical matching.
    pub area_names: BTreeMap<String, AreaId>,
    /// Lowercased NPC name to every location placing that NPC.
    pub npc_locations: BTreeMap<String, BTreeSet<LocationId>>,
    /// Lowercased monster name to every location placing that monster.
    pub monster_locations: BTreeMap<String, BTreeSet<LocationId>>,
    /// Lowercased item name to its loot/reward occurrences.
    pub items: BTreeMap<String, ItemEntry>,
    /// Duplicate location IDs were seen; lookups may be missing data.
    pub partial: bool,
    /// Findings raised during the build (duplicate location IDs).
    pub findings: Vec<Finding>,
}

/// Remove reward declarations from quest text, leaving the rest intact.
/// Used by the mention rules so a quest's own reward is never reported as
/// an unknown entity.
pub fn strip_rewards(text: &str) -> String {
    REWARD_RE.replace_all(text, "").into_owned()
}

/// Extract reward item names declared in a block of quest text.
pub fn reward_mentions(text: &str) -> Vec<String> {
    REWARD_RE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

impl ReferenceIndex {
    /// Build the index. Duplicate location IDs mark the index partial and
    /// become findings, never errors: later rules still need to run.
    pub fn build(module: &Module) -> Self {
        let mut index = ReferenceIndex::default();

        for (area_id, area) in &module.areas {
            index.areas.insert(
                area_id.clone(),
                AreaEntry {
                    name: area.area_name.clone(),
                },
            );
            index
                .area_names
                .insert(area.area_name.to_lowercase(), area_id.clone());
        }

        for (area_id, location) in module.all_locations() {
            let id = location.location_id.clone();
            if let Some(existing) = index.locations.get(&id) {
                index.partial = true;
                index.findings.push(Finding::violation(
                    Severity::Critical,
                    "duplicate-location-id",
                    Some(id.to_string()),
                    format!(
                        "location ID {id} is declared in both {} and {area_id}; \
                         location IDs must be unique across the module",
                        existing.area
                    ),
                ));
                continue;
            }
            index.locations.insert(
                id.clone(),
                LocationEntry {
                    area: area_id.clone(),
                    name: location.name.clone(),
                },
            );

            for npc in &location.npcs {
                index
                    .npc_locations
                    .entry(npc.name.to_lowercase())
                    .or_default()
                    .insert(id.clone());
            }
            for monster in &location.monsters {
                index
                    .monster_locations
                    .entry(monster.name.to_lowercase())
                    .or_default()
                    .insert(id.clone());
            }
            for item in &location.loot_table {
                let entry = index
                    .items
                    .entry(item.to_lowercase())
                    .or_insert_with(|| ItemEntry {
                        name: item.clone(),
                        ..ItemEntry::default()
                    });
                entry.loot_locations.insert(id.clone());
            }
        }

        if let Some(plot) = &module.plot {
            for point in &plot.plot_points {
                for item in reward_mentions(&point.description) {
                    let entry = index
                        .items
                        .entry(item.to_lowercase())
                        .or_insert_with(|| ItemEntry {
                            name: item.clone(),
                            ..ItemEntry::default()
                        });
                    entry.reward_quests.insert(point.id.clone());
                }
            }
            for quest in &plot.side_quests {
                for item in reward_mentions(&quest.description) {
                    let entry = index
                        .items
                        .entry(item.to_lowercase())
                        .or_insert_with(|| ItemEntry {
                            name: item.clone(),
                            ..ItemEntry::default()
                        });
                    entry.reward_quests.insert(quest.id.clone());
                }
            }
        }

        index
    }

    pub fn has_npc(&self, name: &str) -> bool {
        self.npc_locations.contains_key(&name.to_lowercase())
    }

    pub fn has_monster(&self, name: &str) -> bool {
        self.monster_locations.contains_key(&name.to_lowercase())
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.items.contains_key(&name.to_lowercase())
    }

    pub fn area_by_name(&self, name: &str) -> Option<&AreaId> {
        self.area_names.get(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Area, Module, Plot};
    use crate::testing::{area_value, location_value, plot_value, side_quest_value};

    fn module_with(areas: Vec<serde_json::Value>, plot: Option<serde_json::Value>) -> Module {
        let mut module = Module {
            name: "Testfields".to_string(),
            ..Module::default()
        };
        for value in areas {
            let area: Area = serde_json::from_value(value).unwrap();
            module.areas.insert(area.area_id.clone(), area);
        }
        if let Some(value) = plot {
            module.plot = Some(serde_json::from_value::<Plot>(value).unwrap());
        }
        module
    }

    #[test]
    fn test_lookup_tables() {
        let mut loc = location_value("A01");
        loc["npcs"] = serde_json::json!([
            {"name": "Maelo", "description": "A scholar.", "attitude": "friendly"}
        ]);
        loc["monsters"] = serde_json::json!([
            {"name": "Cornfield Shadow", "quantity": {"min": 1, "max": 2}}
        ]);
        loc["lootTable"] = serde_json::json!(["Rusted Key"]);

        let module = module_with(
            vec![area_value("HFG001", "Greenfields Vale", vec![loc])],
            None,
        );
        let index = ReferenceIndex::build(&module);

        assert!(!index.partial);
        assert!(index.has_npc("maelo"));
        assert!(index.has_monster("Cornfield Shadow"));
        assert!(index.has_item("rusted key"));
        assert_eq!(
            index.area_by_name("greenfields vale").unwrap().as_str(),
            "HFG001"
        );
        let entry = index.locations.get(&"A01".parse().unwrap()).unwrap();
        assert_eq!(entry.area.as_str(), "HFG001");
    }

    #[test]
    fn test_duplicate_location_ids_mark_index_partial() {
        let module = module_with(
            vec![
                area_value("HFG001", "Vale", vec![location_value("A01")]),
                area_value("ZZT001", "Crypt", vec![location_value("A01")]),
            ],
            None,
        );
        let index = ReferenceIndex::build(&module);
        assert!(index.partial);
        assert_eq!(index.findings.len(), 1);
        assert_eq!(index.findings[0].rule, "duplicate-location-id");
        // The first occurrence is still usable.
        assert!(index.locations.contains_key(&"A01".parse().unwrap()));
    }

    #[test]
    fn test_reward_mentions_parse() {
        assert_eq!(
            reward_mentions("Help the miller. Reward: Moonblade. Then leave."),
            vec!["Moonblade".to_string()]
        );
        assert!(reward_mentions("No reward convention here").is_empty());
    }

    #[test]
    fn test_quest_rewards_enter_item_index() {
        let module = module_with(
            vec![area_value("HFG001", "Vale", vec![location_value("A01")])],
            Some(plot_value(
                vec![],
                vec![side_quest_value(
                    "SQ01",
                    "HFG001",
                    "Find the heirloom. Reward: Moonblade.",
                )],
            )),
        );
        let index = ReferenceIndex::build(&module);
        let entry = index.items.get("moonblade").unwrap();
        assert!(entry.loot_locations.is_empty());
        assert_eq!(
            entry.reward_quests.iter().collect::<Vec<_>>(),
            vec!["SQ01"]
        );
    }
}

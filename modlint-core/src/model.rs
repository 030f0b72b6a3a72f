//! Typed records for adventure module data.
//!
//! Field names mirror the persisted JSON (camelCase). Required fields are
//! plain (non-`Option`) so a missing field is a deserialization error for
//! the containing file; empty containers are valid data. The fixed-shape
//! sub-records (NPC, monster, trap, door, feature) capture any unknown keys
//! into an `extra` map so that extraneous fields surface as rule findings
//! rather than load failures.

use crate::ids::{AreaId, Coordinates, DcCheck, LocationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// How dangerous a location is, as authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DangerLevel {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DangerLevel::Low => write!(f, "Low"),
            DangerLevel::Medium => write!(f, "Medium"),
            DangerLevel::High => write!(f, "High"),
            DangerLevel::VeryHigh => write!(f, "Very High"),
        }
    }
}

/// Progression status shared by plot points and side quests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    #[serde(rename = "not started")]
    NotStarted,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

/// A non-hostile character placed in a location.
///
/// Exactly three fields are permitted; anything else lands in `extra` and
/// is flagged by the schema-compliance rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    pub description: String,
    pub attitude: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Allowed count range for a monster placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuantityRange {
    pub min: u32,
    pub max: u32,
}

/// A hostile creature placed in a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub quantity: QuantityRange,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stats: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A trap attached to a location. All fields are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trap {
    pub name: String,
    pub description: String,
    #[serde(rename = "detectDC")]
    pub detect_dc: u32,
    #[serde(rename = "disableDC")]
    pub disable_dc: u32,
    #[serde(rename = "triggerDC")]
    pub trigger_dc: u32,
    pub damage: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A door attached to a location. All fields are required; `trap` keeps
/// its raw JSON shape since authored data varies between a string and an
/// embedded object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Door {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub door_type: String,
    pub locked: bool,
    #[serde(rename = "lockDC")]
    pub lock_dc: u32,
    #[serde(rename = "breakDC")]
    pub break_dc: u32,
    pub keyname: String,
    pub trapped: bool,
    pub trap: Value,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A notable non-interactive feature of a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A record of combat that occurred at a location during play.
///
/// A non-empty `encounters` list marks a location as visited; template
/// (`_BU`) files must keep it empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    #[serde(default)]
    pub encounter_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The smallest navigable unit of a module.
///
/// Every field listed here is required by the schema; absence of any is a
/// load failure for the containing area file. Connectivity entries are kept
/// as raw strings so the connectivity rules can classify malformed or
/// wrongly-shaped IDs instead of the loader rejecting the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
    pub description: String,
    pub dm_instructions: String,
    pub location_id: LocationId,
    pub coordinates: Coordinates,
    pub accessibility: String,
    pub npcs: Vec<Npc>,
    pub monsters: Vec<Monster>,
    pub plot_hooks: Vec<String>,
    pub loot_table: Vec<String>,
    pub danger_level: DangerLevel,
    /// Sibling location IDs within the same area.
    pub connectivity: Vec<String>,
    /// Names of areas reachable from this location.
    pub area_connectivity: Vec<String>,
    /// Destination *location* IDs in those areas (never area IDs).
    pub area_connectivity_id: Vec<String>,
    pub traps: Vec<Trap>,
    pub features: Vec<Feature>,
    pub dc_checks: Vec<DcCheck>,
    pub encounters: Vec<Encounter>,
    pub adventure_summary: String,
    pub doors: Vec<Door>,
}

impl Location {
    /// A location counts as visited once combat has been recorded there.
    pub fn is_visited(&self) -> bool {
        !self.encounters.is_empty()
    }
}

/// A room entry in an area's embedded map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapRoom {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub coordinates: Option<String>,
}

/// The map embedded in an area file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMap {
    #[serde(default)]
    pub map_id: String,
    #[serde(default)]
    pub map_name: String,
    #[serde(default)]
    pub total_rooms: u32,
    #[serde(default)]
    pub rooms: Vec<MapRoom>,
}

/// A named zone containing locations, loaded from `areas/<areaId>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub area_id: AreaId,
    pub area_name: String,
    #[serde(default)]
    pub area_type: Option<String>,
    #[serde(default)]
    pub area_description: Option<String>,
    #[serde(default)]
    pub danger_level: Option<DangerLevel>,
    #[serde(default)]
    pub recommended_level: Option<u32>,
    pub map: AreaMap,
    pub locations: Vec<Location>,
}

/// A milestone in main-quest progression.
///
/// `location` holds an *area* ID despite its name; that asymmetry comes
/// straight from the source data and is why the field is strongly typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotPoint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: AreaId,
    pub next_points: Vec<String>,
    pub status: QuestStatus,
    pub plot_impact: String,
}

/// An optional quest tied to one or more areas. A narrative reward may be
/// embedded in the description via the literal `Reward: <item>` convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideQuest {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Area IDs, kept raw so malformed entries become findings.
    pub involved_locations: Vec<String>,
    pub status: QuestStatus,
    pub plot_impact: String,
}

/// Contents of `module_plot.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plot {
    #[serde(default)]
    pub plot_title: Option<String>,
    pub plot_points: Vec<PlotPoint>,
    #[serde(default)]
    pub side_quests: Vec<SideQuest>,
}

/// World-registry metadata from `module_context.json`. Tolerant by design:
/// the registry carries fields the validator has no opinion about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleContext {
    #[serde(default)]
    pub module_name: Option<String>,
    #[serde(default)]
    pub starting_area_id: Option<AreaId>,
    #[serde(default)]
    pub starting_location_id: Option<LocationId>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The root aggregate for one validation run. Assembled by the loader,
/// never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Module {
    /// Module name, taken from the root directory.
    pub name: String,
    pub context: Option<ModuleContext>,
    pub plot: Option<Plot>,
    /// Gameplay area files keyed by area ID, in deterministic order.
    pub areas: BTreeMap<AreaId, Area>,
    /// Template (`_BU`) variants keyed by area ID.
    pub templates: BTreeMap<AreaId, Area>,
}

impl Module {
    /// Iterate every location in every gameplay area, area order first.
    pub fn all_locations(&self) -> impl Iterator<Item = (&AreaId, &Location)> {
        self.areas
            .iter()
            .flat_map(|(id, area)| area.locations.iter().map(move |loc| (id, loc)))
    }

    /// The starting location for reachability analysis.
    ///
    /// Prefers an explicit declaration in the module context; otherwise the
    /// lowest-sorted location of the first plot point's area; otherwise the
    /// lowest-sorted location anywhere.
    pub fn starting_location(&self) -> Option<LocationId> {
        if let Some(ctx) = &self.context {
            if let Some(start) = &ctx.starting_location_id {
                return Some(start.clone());
            }
            if let Some(area_id) = &ctx.starting_area_id {
                if let Some(first) = self.first_location_of(area_id) {
                    return Some(first);
                }
            }
        }

        if let Some(plot) = &self.plot {
            if let Some(first_point) = plot.plot_points.first() {
                if let Some(first) = self.first_location_of(&first_point.location) {
                    return Some(first);
                }
            }
        }

        self.all_locations()
            .map(|(_, loc)| loc.location_id.clone())
            .min()
    }

    fn first_location_of(&self, area_id: &AreaId) -> Option<LocationId> {
        self.areas
            .get(area_id)?
            .locations
            .iter()
            .map(|loc| loc.location_id.clone())
            .min()
    }
}

//! Fixture builders for validator tests.
//!
//! Produces minimal-but-complete JSON values matching the persisted module
//! layout, so tests can start from a valid module and break exactly one
//! thing. Also writes whole modules to disk for loader and end-to-end
//! tests.

use serde_json::{json, Value};
use std::io;
use std::path::Path;

/// A complete location record with every required field present and all
/// containers empty.
pub fn location_value(id: &str) -> Value {
    json!({
        "name": format!("Room {id}"),
        "type": "room",
        "description": "A dusty chamber.",
        "dmInstructions": "Describe the dust.",
        "locationId": id,
        "coordinates": "X1Y1",
        "accessibility": "open",
        "npcs": [],
        "monsters": [],
        "plotHooks": [],
        "lootTable": [],
        "dangerLevel": "Low",
        "connectivity": [],
        "areaConnectivity": [],
        "areaConnectivityId": [],
        "traps": [],
        "features": [],
        "dcChecks": [],
        "encounters": [],
        "adventureSummary": "",
        "doors": []
    })
}

/// A location with its intra-area connectivity set.
pub fn connected_location(id: &str, connectivity: &[&str]) -> Value {
    let mut loc = location_value(id);
    loc["connectivity"] = json!(connectivity);
    loc
}

/// An area file value wrapping the given locations.
pub fn area_value(area_id: &str, name: &str, locations: Vec<Value>) -> Value {
    json!({
        "areaId": area_id,
        "areaName": name,
        "areaType": "wilderness",
        "map": {"mapId": format!("MAP-{area_id}"), "mapName": name, "totalRooms": locations.len(), "rooms": []},
        "locations": locations
    })
}

/// A plot point with the given successor IDs.
pub fn plot_point_value(id: &str, area_id: &str, next: &[&str]) -> Value {
    json!({
        "id": id,
        "title": format!("Plot point {id}"),
        "description": format!("Events of {id}."),
        "location": area_id,
        "nextPoints": next,
        "status": "not started",
        "plotImpact": ""
    })
}

/// A side quest with the given description.
pub fn side_quest_value(id: &str, area_id: &str, description: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Side quest {id}"),
        "description": description,
        "involvedLocations": [area_id],
        "status": "not started",
        "plotImpact": ""
    })
}

/// A plot file value from plot points and side quests.
pub fn plot_value(points: Vec<Value>, side_quests: Vec<Value>) -> Value {
    json!({
        "plotTitle": "The Test of Consistency",
        "plotPoints": points,
        "sideQuests": side_quests
    })
}

/// A module context declaring the starting location.
pub fn context_value(starting_area: &str, starting_location: &str) -> Value {
    json!({
        "moduleName": "Testfields",
        "startingAreaId": starting_area,
        "startingLocationId": starting_location
    })
}

/// Write a complete module directory: context, plot, and area files.
///
/// `areas` pairs each area ID with its file value; a pristine `_BU`
/// template (encounters emptied, adventure summary blanked) is written
/// alongside each area file.
pub fn write_module(
    root: &Path,
    context: &Value,
    plot: &Value,
    areas: &[(&str, Value)],
) -> io::Result<()> {
    std::fs::create_dir_all(root.join("areas"))?;
    std::fs::write(
        root.join("module_context.json"),
        serde_json::to_string_pretty(context)?,
    )?;
    std::fs::write(
        root.join("module_plot.json"),
        serde_json::to_string_pretty(plot)?,
    )?;

    for (area_id, value) in areas {
        std::fs::write(
            root.join("areas").join(format!("{area_id}.json")),
            serde_json::to_string_pretty(value)?,
        )?;

        let mut template = value.clone();
        if let Some(locations) = template["locations"].as_array_mut() {
            for loc in locations {
                loc["encounters"] = json!([]);
                loc["adventureSummary"] = json!("");
            }
        }
        std::fs::write(
            root.join("areas").join(format!("{area_id}_BU.json")),
            serde_json::to_string_pretty(&template)?,
        )?;
    }

    Ok(())
}

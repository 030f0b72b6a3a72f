//! Schema-compliance rules for the fixed-shape sub-records.

use super::{Rule, RuleContext};
use crate::report::{Finding, Severity};

/// Field names a monster record carries that an NPC never should. Their
/// presence on an NPC means a monster was filed in the wrong list.
const MONSTER_ONLY_FIELDS: [&str; 2] = ["quantity", "stats"];

fn extraneous(
    rule: &str,
    location: &str,
    record_kind: &str,
    name: &str,
    fields: Vec<&String>,
) -> Finding {
    let joined = fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Finding::violation(
        Severity::Important,
        rule,
        Some(format!("{location}/{name}")),
        format!("{record_kind} {name:?} carries extraneous field(s): {joined}"),
    )
}

/// NPC, monster, trap, door, and feature records have exact field sets;
/// any unknown key is a violation.
pub struct ExtraneousFields;

impl Rule for ExtraneousFields {
    fn id(&self) -> &'static str {
        "extraneous-fields"
    }

    fn description(&self) -> &'static str {
        "fixed-shape sub-records must not carry unknown fields"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (_, location) in ctx.module().all_locations() {
            let loc = location.location_id.as_str();

            for npc in &location.npcs {
                // Monster-shaped fields are the misplaced-monster rule's
                // business; report only the rest here.
                let fields: Vec<&String> = npc
                    .extra
                    .keys()
                    .filter(|k| !MONSTER_ONLY_FIELDS.contains(&k.as_str()))
                    .collect();
                if !fields.is_empty() {
                    findings.push(extraneous(self.id(), loc, "NPC", &npc.name, fields));
                }
            }
            for monster in &location.monsters {
                if !monster.extra.is_empty() {
                    findings.push(extraneous(
                        self.id(),
                        loc,
                        "monster",
                        &monster.name,
                        monster.extra.keys().collect(),
                    ));
                }
            }
            for trap in &location.traps {
                if !trap.extra.is_empty() {
                    findings.push(extraneous(
                        self.id(),
                        loc,
                        "trap",
                        &trap.name,
                        trap.extra.keys().collect(),
                    ));
                }
            }
            for door in &location.doors {
                if !door.extra.is_empty() {
                    findings.push(extraneous(
                        self.id(),
                        loc,
                        "door",
                        &door.name,
                        door.extra.keys().collect(),
                    ));
                }
            }
            for feature in &location.features {
                if !feature.extra.is_empty() {
                    findings.push(extraneous(
                        self.id(),
                        loc,
                        "feature",
                        &feature.name,
                        feature.extra.keys().collect(),
                    ));
                }
            }
        }

        findings
    }
}

/// A record in the NPC list carrying monster-only fields is a monster
/// filed in the wrong place, not merely an odd NPC.
pub struct MisplacedMonster;

impl Rule for MisplacedMonster {
    fn id(&self) -> &'static str {
        "misplaced-monster"
    }

    fn description(&self) -> &'static str {
        "monsters must live in the monster list, never among NPCs"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (_, location) in ctx.module().all_locations() {
            for npc in &location.npcs {
                let monster_fields: Vec<&str> = MONSTER_ONLY_FIELDS
                    .iter()
                    .copied()
                    .filter(|f| npc.extra.contains_key(*f))
                    .collect();
                if !monster_fields.is_empty() {
                    findings.push(Finding::violation(
                        Severity::Important,
                        self.id(),
                        Some(format!("{}/{}", location.location_id, npc.name)),
                        format!(
                            "NPC {:?} carries monster field(s) {} and looks like a \
                             monster placed in the NPC list",
                            npc.name,
                            monster_fields.join(", ")
                        ),
                    ));
                }
            }
        }

        findings
    }
}

/// Monster quantity ranges must be well-formed.
pub struct MonsterQuantity;

impl Rule for MonsterQuantity {
    fn id(&self) -> &'static str {
        "monster-quantity"
    }

    fn description(&self) -> &'static str {
        "monster quantity ranges must satisfy min <= max and max > 0"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (_, location) in ctx.module().all_locations() {
            for monster in &location.monsters {
                let q = monster.quantity;
                if q.min > q.max {
                    findings.push(Finding::violation(
                        Severity::Important,
                        self.id(),
                        Some(format!("{}/{}", location.location_id, monster.name)),
                        format!(
                            "monster {:?} has quantity min {} greater than max {}",
                            monster.name, q.min, q.max
                        ),
                    ));
                } else if q.max == 0 {
                    findings.push(Finding::violation(
                        Severity::Important,
                        self.id(),
                        Some(format!("{}/{}", location.location_id, monster.name)),
                        format!("monster {:?} can never spawn (max quantity is 0)", monster.name),
                    ));
                }
            }
        }

        findings
    }
}

/// `_BU` template files are pristine copies: no recorded encounters and no
/// adventure summary. Anything else means gameplay state leaked into the
/// template.
pub struct TemplateIntegrity;

impl Rule for TemplateIntegrity {
    fn id(&self) -> &'static str {
        "template-integrity"
    }

    fn description(&self) -> &'static str {
        "_BU templates must have empty encounters and adventure summaries"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (area_id, area) in &ctx.module().templates {
            for location in &area.locations {
                if !location.encounters.is_empty() {
                    findings.push(Finding::violation(
                        Severity::Important,
                        self.id(),
                        Some(format!("{area_id}_BU/{}", location.location_id)),
                        "template location has recorded encounters; templates must stay pristine"
                            .to_string(),
                    ));
                }
                if !location.adventure_summary.is_empty() {
                    findings.push(Finding::violation(
                        Severity::Important,
                        self.id(),
                        Some(format!(
                            "{area_id}_BU/{}/adventureSummary",
                            location.location_id
                        )),
                        "template location has a non-empty adventure summary".to_string(),
                    ));
                }
            }
        }

        findings
    }
}

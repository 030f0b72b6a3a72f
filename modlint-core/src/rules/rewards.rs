//! Reward-tracking rules.
//!
//! An item is either static loot or a quest reward, never both: a quest
//! reward that also sits in a loot table can be obtained twice (or found
//! on the floor before the quest hands it out). Absence from loot tables
//! is the expected state for a declared reward, not a defect.

use super::{Rule, RuleContext};
use crate::report::{Finding, Severity};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A grant phrase followed by a multi-word capitalized item name, e.g.
    /// "gives the party the Moonforged Blade".
    static ref GRANT_RE: Regex = Regex::new(
        r"(?:(?i:gives?|grants?|awards?|receives?|obtains?|finds?|rewarded with))\s+(?:(?i:the party|the|them|an|a)\s+)*([A-Z][A-Za-z']*(?:\s+[A-Z][A-Za-z']*)+)"
    )
    .unwrap();
}

/// Flags items declared as a quest reward that also appear in a loot
/// table. Dual presence is the bug; a reward absent from loot is correct.
pub struct RewardDualPresence;

impl Rule for RewardDualPresence {
    fn id(&self) -> &'static str {
        "reward-dual-presence"
    }

    fn description(&self) -> &'static str {
        "a quest reward must not also appear in a static loot table"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for entry in ctx.index.items.values() {
            if entry.loot_locations.is_empty() || entry.reward_quests.is_empty() {
                continue;
            }
            let quests = entry
                .reward_quests
                .iter()
                .map(|q| q.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let locations = entry
                .loot_locations
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            findings.push(Finding::violation(
                Severity::Important,
                self.id(),
                Some(entry.name.clone()),
                format!(
                    "{:?} is declared as a reward by {quests} but also sits in the \
                     loot table(s) of {locations}; it can be obtained twice",
                    entry.name
                ),
            ));
        }

        findings
    }
}

/// Flags item names granted in DM instructions or plot text that exist in
/// no loot table and carry no reward declaration anywhere.
pub struct MissingItem;

impl MissingItem {
    fn scan(&self, ctx: &RuleContext<'_>, anchor: &str, text: &str, findings: &mut Vec<Finding>) {
        for caps in GRANT_RE.captures_iter(text) {
            let name = caps[1].trim();
            if ctx.index.has_item(name) || ctx.index.has_npc(name) || ctx.index.has_monster(name) {
                continue;
            }
            findings.push(Finding::advisory(
                Severity::Polish,
                self.id(),
                Some(format!("{anchor}/{name}")),
                format!(
                    "{name:?} is granted in text but exists in no loot table and no \
                     reward declaration"
                ),
            ));
        }
    }
}

impl Rule for MissingItem {
    fn id(&self) -> &'static str {
        "missing-item"
    }

    fn description(&self) -> &'static str {
        "items granted in text must exist as loot or a declared reward"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (_, location) in ctx.module().all_locations() {
            self.scan(
                ctx,
                location.location_id.as_str(),
                &location.dm_instructions,
                &mut findings,
            );
        }
        if let Some(plot) = &ctx.module().plot {
            for point in &plot.plot_points {
                self.scan(ctx, &point.id, &point.description, &mut findings);
            }
            for quest in &plot.side_quests {
                self.scan(ctx, &quest.id, &quest.description, &mut findings);
            }
        }

        findings
    }
}

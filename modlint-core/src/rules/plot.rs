//! Plot coherence rules.

use super::text::capitalized_phrases;
use super::{Rule, RuleContext};
use crate::index::strip_rewards;
use crate::model::Plot;
use crate::report::{Finding, Severity};
use std::collections::{BTreeMap, BTreeSet};

fn plot_or_inconclusive<'a>(
    rule: &'static str,
    ctx: &'a RuleContext<'_>,
) -> Result<&'a Plot, Vec<Finding>> {
    match &ctx.module().plot {
        Some(plot) => Ok(plot),
        None => Err(vec![Finding::inconclusive(
            rule,
            "module_plot.json failed to load; cannot evaluate",
        )]),
    }
}

/// Every plot point's `location` (an area ID) and every side quest's
/// involved location must resolve to a loaded area.
pub struct PlotAreaResolves;

impl Rule for PlotAreaResolves {
    fn id(&self) -> &'static str {
        "plot-area-resolves"
    }

    fn description(&self) -> &'static str {
        "plot points and side quests must reference existing areas"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let plot = match plot_or_inconclusive(self.id(), ctx) {
            Ok(plot) => plot,
            Err(findings) => return findings,
        };
        // If every area file failed to load we cannot distinguish a bad
        // reference from a missing file.
        if ctx.module().areas.is_empty() && !ctx.loaded.failures.is_empty() {
            return vec![Finding::inconclusive(
                self.id(),
                "no area files loaded; cannot resolve area references",
            )];
        }

        let mut findings = Vec::new();

        for point in &plot.plot_points {
            if !ctx.index.areas.contains_key(&point.location) {
                findings.push(Finding::violation(
                    Severity::Critical,
                    self.id(),
                    Some(point.id.clone()),
                    format!(
                        "plot point {} is placed in area {}, which does not exist",
                        point.id, point.location
                    ),
                ));
            }
        }

        for quest in &plot.side_quests {
            for raw in &quest.involved_locations {
                match raw.parse::<crate::ids::AreaId>() {
                    Ok(area_id) if ctx.index.areas.contains_key(&area_id) => {}
                    Ok(area_id) => findings.push(Finding::violation(
                        Severity::Critical,
                        self.id(),
                        Some(format!("{}/{area_id}", quest.id)),
                        format!(
                            "side quest {} involves area {area_id}, which does not exist",
                            quest.id
                        ),
                    )),
                    Err(_) => findings.push(Finding::violation(
                        Severity::Critical,
                        self.id(),
                        Some(format!("{}/{raw}", quest.id)),
                        format!(
                            "side quest {} involvedLocations entry {raw:?} is not an area ID",
                            quest.id
                        ),
                    )),
                }
            }
        }

        findings
    }
}

/// Every `nextPoints` entry must name an existing plot point.
pub struct NextPointsResolve;

impl Rule for NextPointsResolve {
    fn id(&self) -> &'static str {
        "next-points-resolve"
    }

    fn description(&self) -> &'static str {
        "every nextPoints entry must resolve to an existing plot point"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let plot = match plot_or_inconclusive(self.id(), ctx) {
            Ok(plot) => plot,
            Err(findings) => return findings,
        };

        let ids: BTreeSet<&str> = plot.plot_points.iter().map(|p| p.id.as_str()).collect();
        let mut findings = Vec::new();

        for point in &plot.plot_points {
            for next in &point.next_points {
                if !ids.contains(next.as_str()) {
                    findings.push(Finding::violation(
                        Severity::Critical,
                        self.id(),
                        Some(format!("{} -> {next}", point.id)),
                        format!(
                            "plot point {} advances to {next}, which does not exist",
                            point.id
                        ),
                    ));
                }
            }
        }

        findings
    }
}

/// The progression graph must be acyclic, fully reachable from the first
/// plot point, and end in a single terminal point with no successors.
pub struct PlotProgression;

impl Rule for PlotProgression {
    fn id(&self) -> &'static str {
        "plot-progression"
    }

    fn description(&self) -> &'static str {
        "plot points must form an acyclic progression with one terminal point"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let plot = match plot_or_inconclusive(self.id(), ctx) {
            Ok(plot) => plot,
            Err(findings) => return findings,
        };
        if plot.plot_points.is_empty() {
            return vec![Finding::violation(
                Severity::Critical,
                self.id(),
                None,
                "the plot has no plot points".to_string(),
            )];
        }

        let by_id: BTreeMap<&str, &crate::model::PlotPoint> = plot
            .plot_points
            .iter()
            .map(|p| (p.id.as_str(), p))
            .collect();
        let mut findings = Vec::new();

        let terminals: Vec<&str> = plot
            .plot_points
            .iter()
            .filter(|p| p.next_points.is_empty())
            .map(|p| p.id.as_str())
            .collect();
        if terminals.is_empty() {
            findings.push(Finding::violation(
                Severity::Critical,
                self.id(),
                None,
                "no terminal plot point: every point has successors, so the \
                 main quest can never conclude"
                    .to_string(),
            ));
        } else if terminals.len() > 1 {
            findings.push(Finding::violation(
                Severity::Critical,
                self.id(),
                None,
                format!(
                    "multiple terminal plot points ({}); the progression must \
                     converge on exactly one ending",
                    terminals.join(", ")
                ),
            ));
        }

        // Cycle check: iterative DFS with an explicit in-progress set.
        let first = plot.plot_points[0].id.as_str();
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut in_progress: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<(&str, usize)> = vec![(first, 0)];
        visited.insert(first);
        in_progress.insert(first);
        let mut cycle_reported = false;

        while let Some((id, child)) = stack.pop() {
            let Some(point) = by_id.get(id) else { continue };
            if child < point.next_points.len() {
                stack.push((id, child + 1));
                let Some(next) = by_id
                    .get(point.next_points[child].as_str())
                    .map(|p| p.id.as_str())
                else {
                    continue; // dangling IDs are next-points-resolve's job
                };
                if in_progress.contains(next) {
                    if !cycle_reported {
                        findings.push(Finding::violation(
                            Severity::Critical,
                            self.id(),
                            Some(format!("{id} -> {next}")),
                            format!(
                                "plot progression contains a cycle through {next}; the \
                                 terminal point can never be reached deterministically"
                            ),
                        ));
                        cycle_reported = true;
                    }
                } else if visited.insert(next) {
                    in_progress.insert(next);
                    stack.push((next, 0));
                }
            } else {
                in_progress.remove(id);
            }
        }

        for point in &plot.plot_points {
            if !visited.contains(point.id.as_str()) {
                findings.push(Finding::violation(
                    Severity::Critical,
                    self.id(),
                    Some(point.id.clone()),
                    format!(
                        "plot point {} is not reachable from the first point {first}",
                        point.id
                    ),
                ));
            }
        }

        findings
    }
}

/// Named entities mentioned in plot and side-quest text should exist
/// somewhere in the module. Reward declarations are exempt: the reward
/// item is expected to exist nowhere else.
pub struct UnknownEntityMention;

impl UnknownEntityMention {
    fn check_text(
        &self,
        ctx: &RuleContext<'_>,
        anchor: &str,
        text: &str,
        location_names: &BTreeSet<String>,
        findings: &mut Vec<Finding>,
    ) {
        let stripped = strip_rewards(text);
        for phrase in capitalized_phrases(&stripped) {
            let lowered = phrase.to_lowercase();
            let known = ctx.index.has_npc(&lowered)
                || ctx.index.has_monster(&lowered)
                || ctx.index.has_item(&lowered)
                || ctx.index.area_by_name(&lowered).is_some()
                || location_names.contains(&lowered);
            if !known {
                findings.push(Finding::advisory(
                    Severity::Polish,
                    self.id(),
                    Some(format!("{anchor}/{phrase}")),
                    format!(
                        "{phrase:?} reads like a named entity but matches no NPC, \
                         monster, item, area, or location in the module"
                    ),
                ));
            }
        }
    }
}

impl Rule for UnknownEntityMention {
    fn id(&self) -> &'static str {
        "unknown-entity-mention"
    }

    fn description(&self) -> &'static str {
        "names mentioned in plot text should exist in the module"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let plot = match plot_or_inconclusive(self.id(), ctx) {
            Ok(plot) => plot,
            Err(findings) => return findings,
        };

        let location_names: BTreeSet<String> = ctx
            .index
            .locations
            .values()
            .map(|entry| entry.name.to_lowercase())
            .collect();

        let mut findings = Vec::new();
        for point in &plot.plot_points {
            self.check_text(
                ctx,
                &point.id,
                &point.description,
                &location_names,
                &mut findings,
            );
        }
        for quest in &plot.side_quests {
            self.check_text(
                ctx,
                &quest.id,
                &quest.description,
                &location_names,
                &mut findings,
            );
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;
    use crate::testing::{area_value, location_value, plot_point_value, plot_value, side_quest_value};
    use serde_json::json;

    fn vale() -> serde_json::Value {
        area_value("HFG001", "Greenfields Vale", vec![location_value("A01")])
    }

    #[test]
    fn test_clean_chain_has_no_findings() {
        let plot = plot_value(
            vec![
                plot_point_value("PP001", "HFG001", &["PP002"]),
                plot_point_value("PP002", "HFG001", &["PP003"]),
                plot_point_value("PP003", "HFG001", &[]),
            ],
            vec![],
        );
        assert!(run_rule(&PlotAreaResolves, vec![vale()], Some(plot.clone()), None).is_empty());
        assert!(run_rule(&NextPointsResolve, vec![vale()], Some(plot.clone()), None).is_empty());
        assert!(run_rule(&PlotProgression, vec![vale()], Some(plot), None).is_empty());
    }

    #[test]
    fn test_plot_point_in_missing_area() {
        let plot = plot_value(vec![plot_point_value("PP001", "ZZZ999", &[])], vec![]);
        let findings = run_rule(&PlotAreaResolves, vec![vale()], Some(plot), None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.as_deref(), Some("PP001"));
    }

    #[test]
    fn test_side_quest_with_location_shaped_area() {
        let plot = plot_value(
            vec![plot_point_value("PP001", "HFG001", &[])],
            vec![side_quest_value("SQ01", "A01", "Dig at the old well.")],
        );
        let findings = run_rule(&PlotAreaResolves, vec![vale()], Some(plot), None);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("not an area ID"));
    }

    #[test]
    fn test_dangling_next_point() {
        let plot = plot_value(
            vec![plot_point_value("PP001", "HFG001", &["PP009"])],
            vec![],
        );
        let findings = run_rule(&NextPointsResolve, vec![vale()], Some(plot), None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.as_deref(), Some("PP001 -> PP009"));
    }

    #[test]
    fn test_cycle_detected() {
        let plot = plot_value(
            vec![
                plot_point_value("PP001", "HFG001", &["PP002"]),
                plot_point_value("PP002", "HFG001", &["PP001"]),
            ],
            vec![],
        );
        let findings = run_rule(&PlotProgression, vec![vale()], Some(plot), None);
        // A cycle also means there is no terminal point.
        assert!(findings.iter().any(|f| f.message.contains("cycle")));
        assert!(findings.iter().any(|f| f.message.contains("terminal")));
    }

    #[test]
    fn test_unreachable_plot_point() {
        let plot = plot_value(
            vec![
                plot_point_value("PP001", "HFG001", &[]),
                plot_point_value("PP002", "HFG001", &[]),
            ],
            vec![],
        );
        let findings = run_rule(&PlotProgression, vec![vale()], Some(plot), None);
        assert!(findings
            .iter()
            .any(|f| f.message.contains("not reachable") && f.location.as_deref() == Some("PP002")));
    }

    #[test]
    fn test_plot_rules_inconclusive_without_plot() {
        use crate::report::FindingKind;
        for rule in [
            &PlotAreaResolves as &dyn crate::rules::Rule,
            &NextPointsResolve,
            &PlotProgression,
            &UnknownEntityMention,
        ] {
            let findings = run_rule(rule, vec![vale()], None, None);
            assert_eq!(findings.len(), 1, "rule {}", rule.id());
            assert_eq!(findings[0].kind, FindingKind::Inconclusive);
        }
    }

    #[test]
    fn test_unknown_entity_mention() {
        let mut loc = location_value("A01");
        loc["npcs"] = json!([
            {"name": "Old Greta", "description": "The miller's widow.", "attitude": "wary"}
        ]);
        let area = area_value("HFG001", "Greenfields Vale", vec![loc]);
        let plot = plot_value(
            vec![],
            vec![side_quest_value(
                "SQ01",
                "HFG001",
                "Ask about Old Greta, then seek the Hollow King beneath the vale.",
            )],
        );
        let findings = run_rule(&UnknownEntityMention, vec![area], Some(plot), None);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Hollow King"));
    }

    #[test]
    fn test_reward_declaration_is_exempt() {
        let plot = plot_value(
            vec![],
            vec![side_quest_value(
                "SQ01",
                "HFG001",
                "Recover the heirloom. Reward: Moonforged Blade.",
            )],
        );
        let findings = run_rule(&UnknownEntityMention, vec![vale()], Some(plot), None);
        assert!(findings.is_empty());
    }
}

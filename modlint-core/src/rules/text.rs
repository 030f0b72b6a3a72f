//! Free-text heuristic rules.
//!
//! These operate on lexical matches against natural-language DM
//! instructions and plot hooks. They cannot parse intent with certainty,
//! so every finding here is Advisory kind: worth a human look, never a
//! hard failure.

use super::{Rule, RuleContext};
use crate::ids::AreaId;
use crate::report::{Finding, Severity};
use std::collections::BTreeMap;

/// Directive verbs that introduce a monster spawn in DM instructions.
const SPAWN_DIRECTIVES: [&str; 6] = ["use", "spawn", "summon", "unleash", "send", "trigger"];

/// Conditional tokens that gate a directive. A directive with one of these
/// in the preceding window is author-controlled, not unconditional.
const CONDITIONAL_TOKENS: [&str; 8] = [
    "if", "when", "whenever", "after", "once", "unless", "should", "before",
];

/// How many tokens before a directive verb to scan for a conditional.
const CONDITIONAL_WINDOW: usize = 8;

/// How many tokens after a directive verb to scan for a monster mention.
const MENTION_WINDOW: usize = 8;

/// Temporal or environmental trigger phrases that may never occur in play.
const RARE_TRIGGER_PHRASES: [&str; 12] = [
    "full moon",
    "new moon",
    "blood moon",
    "harvest moon",
    "lunar",
    "eclipse",
    "solstice",
    "equinox",
    "once a year",
    "only at midnight",
    "when it rains",
    "during a thunderstorm",
];

/// Lowercased alphanumeric word tokens.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Normalize text to lowercased words joined by single spaces, so phrase
/// containment checks ignore punctuation and casing.
pub(crate) fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Extract candidate proper names: runs of two or more capitalized words,
/// optionally joined by a single lowercase connector ("of", "the", "and").
///
/// A run that begins at a sentence start sheds its first word when a
/// connector follows it ("Seek the Mill of Sorrows" yields "Mill of
/// Sorrows", not the verb). Approximate by design.
pub(crate) fn capitalized_phrases(text: &str) -> Vec<String> {
    fn is_capitalized(word: &str) -> bool {
        word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
    }
    const CONNECTORS: [&str; 3] = ["of", "the", "and"];
    const ARTICLES: [&str; 3] = ["The", "A", "An"];

    // (trimmed word, starts a sentence)
    let mut words: Vec<(&str, bool)> = Vec::new();
    let mut sentence_start = true;
    for raw in text.split_whitespace() {
        let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if !trimmed.is_empty() {
            words.push((trimmed, sentence_start));
        }
        sentence_start = raw.ends_with(['.', '!', '?', ':', ';']);
    }

    let mut phrases = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_opens_sentence = false;

    let mut flush = |run: &mut Vec<&str>, opens_sentence: bool| {
        while run
            .last()
            .map(|w| CONNECTORS.contains(&w.to_lowercase().as_str()))
            .unwrap_or(false)
        {
            run.pop();
        }
        let mut start = 0;
        // Drop a leading article, or a sentence-opening word glued on by a
        // connector ("Seek the ...", "Use the ...").
        if run.first().map(|w| ARTICLES.contains(w)).unwrap_or(false) {
            start = 1;
        } else if opens_sentence
            && run
                .get(1)
                .map(|w| CONNECTORS.contains(&w.to_lowercase().as_str()))
                .unwrap_or(false)
        {
            start = 2;
        }
        let tail = &run[start.min(run.len())..];
        let cap_count = tail.iter().filter(|w| is_capitalized(w)).count();
        if cap_count >= 2 && tail.len() >= 2 {
            phrases.push(tail.join(" "));
        }
        run.clear();
    };

    for (word, starts_sentence) in words {
        if is_capitalized(word) {
            if run.is_empty() {
                run_opens_sentence = starts_sentence;
            }
            run.push(word);
        } else if !run.is_empty() && CONNECTORS.contains(&word) {
            run.push(word);
        } else {
            flush(&mut run, run_opens_sentence);
        }
    }
    flush(&mut run, run_opens_sentence);

    phrases
}

/// Plot hooks should not reference areas far ahead of (or behind) the
/// progression step their own area belongs to.
pub struct SequentialProgression;

impl Rule for SequentialProgression {
    fn id(&self) -> &'static str {
        "sequential-progression"
    }

    fn description(&self) -> &'static str {
        "plot hooks should reference areas at most one progression step ahead"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let Some(plot) = &ctx.module().plot else {
            return vec![Finding::inconclusive(
                self.id(),
                "module_plot.json failed to load; cannot order areas by progression",
            )];
        };
        if plot.plot_points.is_empty() {
            return Vec::new();
        }

        // Progression step of each area: BFS depth of the earliest plot
        // point located there, following nextPoints from the first point.
        let mut point_depth: BTreeMap<&str, usize> = BTreeMap::new();
        let by_id: BTreeMap<&str, &crate::model::PlotPoint> = plot
            .plot_points
            .iter()
            .map(|p| (p.id.as_str(), p))
            .collect();
        let first = &plot.plot_points[0];
        let mut queue = std::collections::VecDeque::new();
        point_depth.insert(first.id.as_str(), 0);
        queue.push_back(first.id.as_str());
        while let Some(id) = queue.pop_front() {
            let depth = point_depth[id];
            if let Some(point) = by_id.get(id) {
                for next in &point.next_points {
                    if let Some(next_point) = by_id.get(next.as_str()) {
                        point_depth.entry(next_point.id.as_str()).or_insert_with(|| {
                            queue.push_back(next_point.id.as_str());
                            depth + 1
                        });
                    }
                }
            }
        }

        let mut area_step: BTreeMap<AreaId, usize> = BTreeMap::new();
        for point in &plot.plot_points {
            if let Some(depth) = point_depth.get(point.id.as_str()) {
                let entry = area_step.entry(point.location.clone()).or_insert(*depth);
                *entry = (*entry).min(*depth);
            }
        }

        let mut findings = Vec::new();
        for (area_id, area) in &ctx.module().areas {
            let Some(&current_step) = area_step.get(area_id) else {
                continue;
            };
            for location in &area.locations {
                for hook in &location.plot_hooks {
                    let hook_text = normalize(hook);
                    for (name, target_id) in &ctx.index.area_names {
                        if target_id == area_id || !hook_text.contains(name.as_str()) {
                            continue;
                        }
                        let Some(&target_step) = area_step.get(target_id) else {
                            continue;
                        };
                        if target_step > current_step + 1 {
                            findings.push(Finding::advisory(
                                Severity::Polish,
                                self.id(),
                                Some(format!("{}/{target_id}", location.location_id)),
                                format!(
                                    "plot hook references {target_id} ({name}), which is \
                                     {} step(s) ahead of this area's progression",
                                    target_step - current_step
                                ),
                            ));
                        } else if target_step < current_step {
                            findings.push(Finding::advisory(
                                Severity::Polish,
                                self.id(),
                                Some(format!("{}/{target_id}", location.location_id)),
                                format!(
                                    "plot hook references {target_id} ({name}), which lies \
                                     behind this area's progression"
                                ),
                            ));
                        }
                    }
                }
            }
        }

        findings
    }
}

/// An unconditional "use/spawn <monster>" directive in DM instructions can
/// fire every single turn the party stands in the location.
pub struct SpawnLoopSafety;

impl Rule for SpawnLoopSafety {
    fn id(&self) -> &'static str {
        "spawn-loop-safety"
    }

    fn description(&self) -> &'static str {
        "monster-spawn directives in DM instructions must be conditional"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let monster_names: Vec<String> = ctx
            .index
            .monster_locations
            .keys()
            .map(|name| normalize(name))
            .collect();

        let mut findings = Vec::new();
        for (_, location) in ctx.module().all_locations() {
            let tokens = tokenize(&location.dm_instructions);

            for (i, token) in tokens.iter().enumerate() {
                if !SPAWN_DIRECTIVES.contains(&token.as_str()) {
                    continue;
                }

                let after = tokens[i + 1..tokens.len().min(i + 1 + MENTION_WINDOW)].join(" ");
                let mentions_monster = after.contains("monster")
                    || monster_names.iter().any(|name| after.contains(name.as_str()));
                if !mentions_monster {
                    continue;
                }

                let before = &tokens[i.saturating_sub(CONDITIONAL_WINDOW)..i];
                let conditional = before
                    .iter()
                    .any(|t| CONDITIONAL_TOKENS.contains(&t.as_str()));
                if conditional {
                    continue;
                }

                findings.push(Finding::advisory(
                    Severity::Important,
                    self.id(),
                    Some(location.location_id.to_string()),
                    format!(
                        "DM instructions contain an unconditional spawn directive \
                         ({:?} ...); gate it with a condition such as \"if\" or \"when\"",
                        token
                    ),
                ));
                break; // one finding per location is enough
            }
        }

        findings
    }
}

/// Story content gated on rare temporal or environmental conditions may
/// never trigger during a playthrough.
pub struct RareTrigger;

impl Rule for RareTrigger {
    fn id(&self) -> &'static str {
        "rare-trigger"
    }

    fn description(&self) -> &'static str {
        "story content should not hinge on rare temporal/environmental triggers"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        let mut scan = |anchor: String, text: &str, findings: &mut Vec<Finding>| {
            let normalized = normalize(text);
            for phrase in RARE_TRIGGER_PHRASES {
                if normalized.contains(phrase) {
                    findings.push(Finding::advisory(
                        Severity::Polish,
                        "rare-trigger",
                        Some(anchor.clone()),
                        format!(
                            "instruction text gates content on {phrase:?}, a condition \
                             that may never occur during play"
                        ),
                    ));
                    break;
                }
            }
        };

        for (_, location) in ctx.module().all_locations() {
            scan(
                location.location_id.to_string(),
                &location.dm_instructions,
                &mut findings,
            );
        }
        if let Some(plot) = &ctx.module().plot {
            for point in &plot.plot_points {
                scan(point.id.clone(), &point.description, &mut findings);
            }
            for quest in &plot.side_quests {
                scan(quest.id.clone(), &quest.description, &mut findings);
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;
    use crate::testing::{area_value, location_value, plot_point_value, plot_value};
    use serde_json::json;

    fn cornfield_area(dm_instructions: &str) -> serde_json::Value {
        let mut loc = location_value("A01");
        loc["dmInstructions"] = json!(dm_instructions);
        loc["monsters"] = json!([{
            "name": "Cornfield Shadow",
            "quantity": {"min": 1, "max": 1}
        }]);
        area_value("HFG001", "Vale", vec![loc])
    }

    #[test]
    fn test_capitalized_phrases() {
        let phrases =
            capitalized_phrases("Seek the Mill of Sorrows, then ask Maelo about Old Greta.");
        assert!(phrases.contains(&"Mill of Sorrows".to_string()));
        assert!(phrases.contains(&"Old Greta".to_string()));
        // Single capitalized words (sentence starts, lone names) are skipped.
        assert!(!phrases.iter().any(|p| p == "Seek" || p == "Maelo"));
    }

    #[test]
    fn test_unconditional_spawn_is_flagged() {
        let findings = run_rule(
            &SpawnLoopSafety,
            vec![cornfield_area(
                "Use the Cornfield Shadow to drive the party deeper.",
            )],
            None,
            None,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "spawn-loop-safety");
    }

    #[test]
    fn test_conditional_spawn_is_not_flagged() {
        let findings = run_rule(
            &SpawnLoopSafety,
            vec![cornfield_area(
                "IF party makes noise, use the Cornfield Shadow to drive them deeper.",
            )],
            None,
            None,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_directive_without_monster_mention_is_not_flagged() {
        let findings = run_rule(
            &SpawnLoopSafety,
            vec![cornfield_area("Use the lantern to light the path.")],
            None,
            None,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_rare_trigger_phrase_flagged() {
        let mut loc = location_value("A01");
        loc["dmInstructions"] =
            json!("The ghost only appears during the full moon over the mill pond.");
        let findings = run_rule(
            &RareTrigger,
            vec![area_value("HFG001", "Vale", vec![loc])],
            None,
            None,
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("full moon"));
    }

    #[test]
    fn test_hook_referencing_area_two_steps_ahead() {
        let mut early = location_value("A01");
        early["plotHooks"] = json!(["Rumors speak of the Sunken Crypt and its horrors."]);
        let mid = location_value("B01");
        let late = location_value("C01");

        let findings = run_rule(
            &SequentialProgression,
            vec![
                area_value("HFG001", "Greenfields Vale", vec![early]),
                area_value("MID001", "Old Mill", vec![mid]),
                area_value("ZZT001", "Sunken Crypt", vec![late]),
            ],
            Some(plot_value(
                vec![
                    plot_point_value("PP001", "HFG001", &["PP002"]),
                    plot_point_value("PP002", "MID001", &["PP003"]),
                    plot_point_value("PP003", "ZZT001", &[]),
                ],
                vec![],
            )),
            None,
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("ahead"));
    }

    #[test]
    fn test_hook_referencing_next_area_is_fine() {
        let mut early = location_value("A01");
        early["plotHooks"] = json!(["The miller points toward the Old Mill."]);
        let mid = location_value("B01");

        let findings = run_rule(
            &SequentialProgression,
            vec![
                area_value("HFG001", "Greenfields Vale", vec![early]),
                area_value("MID001", "Old Mill", vec![mid]),
            ],
            Some(plot_value(
                vec![
                    plot_point_value("PP001", "HFG001", &["PP002"]),
                    plot_point_value("PP002", "MID001", &[]),
                ],
                vec![],
            )),
            None,
        );
        assert!(findings.is_empty());
    }
}

//! Validation run orchestration: load, index, graph, rules, report.

use crate::graph::ConnectivityGraph;
use crate::index::ReferenceIndex;
use crate::loader::{load_module, LoadError};
use crate::report::Report;
use crate::rules::{default_rules, RuleContext};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A configured validation run over one module directory.
///
/// The validator never mutates module data: it loads a snapshot, derives
/// the index and graph, evaluates every enabled rule against them, and
/// hands back one report. Running it twice over an unchanged module
/// produces byte-identical rendered reports.
pub struct Validator {
    root: PathBuf,
    disabled: BTreeSet<String>,
}

impl Validator {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Validator {
            root: root.as_ref().to_path_buf(),
            disabled: BTreeSet::new(),
        }
    }

    /// Skip the rule with the given ID for this run.
    pub fn disable_rule(mut self, id: impl Into<String>) -> Self {
        self.disabled.insert(id.into());
        self
    }

    /// Run the full validation pass.
    pub async fn run(&self) -> Result<Report, LoadError> {
        let loaded = load_module(&self.root).await?;
        let index = ReferenceIndex::build(&loaded.module);
        let graph = ConnectivityGraph::build(&loaded.module, &index);
        let ctx = RuleContext {
            loaded: &loaded,
            index: &index,
            graph: &graph,
        };

        // Index construction itself can surface findings (duplicate IDs).
        let mut findings = index.findings.clone();
        for rule in default_rules() {
            if self.disabled.contains(rule.id()) {
                continue;
            }
            findings.extend(rule.evaluate(&ctx));
        }

        let failures = loaded.failures.iter().map(|f| f.to_report()).collect();
        Ok(Report::new(loaded.module.name.clone(), findings, failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        area_value, connected_location, context_value, plot_point_value, plot_value, write_module,
    };
    use serde_json::json;
    use tempfile::TempDir;

    fn clean_module(dir: &Path) {
        let areas = vec![(
            "HFG001",
            area_value(
                "HFG001",
                "Greenfields Vale",
                vec![
                    connected_location("A01", &["A02"]),
                    connected_location("A02", &["A01"]),
                ],
            ),
        )];
        write_module(
            dir,
            &context_value("HFG001", "A01"),
            &plot_value(
                vec![
                    plot_point_value("PP001", "HFG001", &["PP002"]),
                    plot_point_value("PP002", "HFG001", &[]),
                ],
                vec![],
            ),
            &areas,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_clean_module_produces_empty_report() {
        let dir = TempDir::new().unwrap();
        clean_module(dir.path());

        let report = Validator::new(dir.path()).run().await.unwrap();
        assert!(report.findings.is_empty(), "{:#?}", report.findings);
        assert!(report.load_failures.is_empty());
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_defective_module_reports_everything() {
        let dir = TempDir::new().unwrap();

        let mut bad = connected_location("A01", &["A02"]);
        // Area-shaped cross-area reference plus an NPC with an extra field.
        bad["areaConnectivityId"] = json!(["HFG001"]);
        bad["npcs"] = json!([{
            "name": "Maelo",
            "description": "A scholar.",
            "attitude": "friendly",
            "class": "Wizard"
        }]);
        let areas = vec![(
            "HFG001",
            area_value(
                "HFG001",
                "Greenfields Vale",
                vec![
                    bad,
                    connected_location("A02", &[]), // one-way from A01
                    connected_location("C03", &[]), // unreachable
                ],
            ),
        )];
        write_module(
            dir.path(),
            &context_value("HFG001", "A01"),
            &plot_value(vec![plot_point_value("PP001", "HFG001", &[])], vec![]),
            &areas,
        )
        .unwrap();

        let report = Validator::new(dir.path()).run().await.unwrap();
        let rules: Vec<&str> = report.findings.iter().map(|f| f.rule.as_str()).collect();
        assert!(rules.contains(&"wrong-id-type"));
        assert!(rules.contains(&"extraneous-fields"));
        assert!(rules.contains(&"one-way-edge"));
        assert!(rules.contains(&"unreachable-location"));
        assert_eq!(report.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_disabled_rule_is_skipped() {
        let dir = TempDir::new().unwrap();
        let areas = vec![(
            "HFG001",
            area_value(
                "HFG001",
                "Vale",
                vec![
                    connected_location("A01", &["A02"]),
                    connected_location("A02", &[]),
                ],
            ),
        )];
        write_module(
            dir.path(),
            &context_value("HFG001", "A01"),
            &plot_value(vec![plot_point_value("PP001", "HFG001", &[])], vec![]),
            &areas,
        )
        .unwrap();

        let report = Validator::new(dir.path())
            .disable_rule("one-way-edge")
            .run()
            .await
            .unwrap();
        assert!(!report.findings.iter().any(|f| f.rule == "one-way-edge"));
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let dir = TempDir::new().unwrap();
        clean_module(dir.path());
        // Add a defect so the report has content to compare.
        let areas_dir = dir.path().join("areas");
        let mut area: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(areas_dir.join("HFG001.json")).unwrap(),
        )
        .unwrap();
        area["locations"][1]["connectivity"] = json!([]);
        std::fs::write(
            areas_dir.join("HFG001.json"),
            serde_json::to_string_pretty(&area).unwrap(),
        )
        .unwrap();

        let first = Validator::new(dir.path()).run().await.unwrap();
        let second = Validator::new(dir.path()).run().await.unwrap();
        assert_eq!(first.render(), second.render());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert!(!first.findings.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_run_still_reports() {
        let dir = TempDir::new().unwrap();
        clean_module(dir.path());
        std::fs::write(dir.path().join("module_plot.json"), "not json at all").unwrap();

        let report = Validator::new(dir.path()).run().await.unwrap();
        assert_eq!(report.load_failures.len(), 1);
        // Plot-dependent rules went inconclusive rather than vanishing.
        assert!(report
            .findings
            .iter()
            .any(|f| f.kind == crate::report::FindingKind::Inconclusive));
        assert_eq!(report.exit_code(), 3);
    }
}

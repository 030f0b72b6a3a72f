//! Findings and report aggregation.
//!
//! Rules produce [`Finding`]s; the [`Report`] collects them together with
//! any load failures, sorts them deterministically (severity, then
//! location, then rule ID), and coalesces duplicates so the same defect is
//! never listed twice for one spot. Running the validator twice over an
//! unchanged module yields byte-identical rendered reports.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Three-tier priority model for findings.
///
/// Variant order doubles as sort order: `Critical` sorts (and compares)
/// lowest so it comes first in reports and wins `worst_severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Critical,
    Important,
    Polish,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Important => write!(f, "IMPORTANT"),
            Severity::Polish => write!(f, "POLISH"),
        }
    }
}

/// What sort of claim a finding makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FindingKind {
    /// A definite defect in the module data.
    Violation,
    /// A heuristic, free-text match; worth review, never a hard failure.
    Advisory,
    /// The rule could not evaluate because its input failed to load.
    Inconclusive,
}

/// One defect (or advisory, or inconclusive note) produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    /// ID of the rule that produced this finding.
    pub rule: String,
    /// Where in the module the finding applies (location ID, area ID,
    /// plot point ID, edge, or file), when there is a meaningful anchor.
    pub location: Option<String>,
    pub message: String,
}

impl Finding {
    pub fn violation(
        severity: Severity,
        rule: &str,
        location: impl Into<Option<String>>,
        message: impl Into<String>,
    ) -> Self {
        Finding {
            severity,
            kind: FindingKind::Violation,
            rule: rule.to_string(),
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn advisory(
        severity: Severity,
        rule: &str,
        location: impl Into<Option<String>>,
        message: impl Into<String>,
    ) -> Self {
        Finding {
            severity,
            kind: FindingKind::Advisory,
            rule: rule.to_string(),
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn inconclusive(rule: &str, message: impl Into<String>) -> Self {
        Finding {
            severity: Severity::Important,
            kind: FindingKind::Inconclusive,
            rule: rule.to_string(),
            location: None,
            message: message.into(),
        }
    }
}

/// A file the schema loader could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailureReport {
    pub path: String,
    pub error: String,
}

/// The aggregated result of one validation run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Module name, from the root directory.
    pub module: String,
    /// Sorted, deduplicated findings.
    pub findings: Vec<Finding>,
    /// Files the loader had to skip.
    pub load_failures: Vec<LoadFailureReport>,
}

impl Report {
    /// Build a report: sort by (severity, location, rule) and coalesce
    /// findings that share a rule and a location, keeping the first.
    pub fn new(
        module: impl Into<String>,
        mut findings: Vec<Finding>,
        mut load_failures: Vec<LoadFailureReport>,
    ) -> Self {
        findings.sort_by(|a, b| {
            (a.severity, &a.location, &a.rule, &a.message).cmp(&(
                b.severity,
                &b.location,
                &b.rule,
                &b.message,
            ))
        });

        let mut seen: BTreeSet<(String, Option<String>)> = BTreeSet::new();
        findings.retain(|f| seen.insert((f.rule.clone(), f.location.clone())));

        load_failures.sort_by(|a, b| a.path.cmp(&b.path));

        Report {
            module: module.into(),
            findings,
            load_failures,
        }
    }

    /// The worst severity present, if any finding exists.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).min()
    }

    /// Process exit status: 0 clean, 1 polish, 2 important, 3 critical.
    /// Load failures count as critical since part of the module could not
    /// be reasoned about at all.
    pub fn exit_code(&self) -> i32 {
        if !self.load_failures.is_empty() {
            return 3;
        }
        match self.worst_severity() {
            None => 0,
            Some(Severity::Polish) => 1,
            Some(Severity::Important) => 2,
            Some(Severity::Critical) => 3,
        }
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Render the human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Module consistency report: {}\n", self.module));

        if !self.load_failures.is_empty() {
            out.push_str("\nFiles that failed to load:\n");
            for failure in &self.load_failures {
                out.push_str(&format!("  {}: {}\n", failure.path, failure.error));
            }
        }

        for severity in [Severity::Critical, Severity::Important, Severity::Polish] {
            let group: Vec<&Finding> = self
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .collect();
            if group.is_empty() {
                continue;
            }
            out.push_str(&format!("\n{severity} ({}):\n", group.len()));
            for finding in group {
                let marker = match finding.kind {
                    FindingKind::Violation => "",
                    FindingKind::Advisory => " (advisory)",
                    FindingKind::Inconclusive => " (inconclusive)",
                };
                match &finding.location {
                    Some(loc) => out.push_str(&format!(
                        "  [{}] {}: {}{}\n",
                        finding.rule, loc, finding.message, marker
                    )),
                    None => out.push_str(&format!(
                        "  [{}] {}{}\n",
                        finding.rule, finding.message, marker
                    )),
                }
            }
        }

        if self.findings.is_empty() && self.load_failures.is_empty() {
            out.push_str("\nNo findings.\n");
        } else {
            out.push_str(&format!(
                "\n{} critical, {} important, {} polish, {} file(s) failed to load\n",
                self.count(Severity::Critical),
                self.count(Severity::Important),
                self.count(Severity::Polish),
                self.load_failures.len()
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity, rule: &str, location: &str) -> Finding {
        Finding::violation(
            severity,
            rule,
            Some(location.to_string()),
            format!("{rule} at {location}"),
        )
    }

    #[test]
    fn test_sorted_by_severity_then_location_then_rule() {
        let report = Report::new(
            "Testfields",
            vec![
                finding(Severity::Polish, "rare-trigger", "A01"),
                finding(Severity::Critical, "unreachable-location", "B02"),
                finding(Severity::Critical, "unreachable-location", "A05"),
                finding(Severity::Important, "one-way-edge", "A01 -> B02"),
            ],
            vec![],
        );
        let order: Vec<&str> = report
            .findings
            .iter()
            .map(|f| f.location.as_deref().unwrap())
            .collect();
        assert_eq!(order, vec!["A05", "B02", "A01 -> B02", "A01"]);
    }

    #[test]
    fn test_duplicates_coalesced_once() {
        let report = Report::new(
            "Testfields",
            vec![
                finding(Severity::Important, "one-way-edge", "A01 -> B02"),
                finding(Severity::Important, "one-way-edge", "A01 -> B02"),
                finding(Severity::Important, "one-way-edge", "B02 -> A01"),
            ],
            vec![],
        );
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Report::new("m", vec![], vec![]).exit_code(), 0);
        assert_eq!(
            Report::new("m", vec![finding(Severity::Polish, "r", "A01")], vec![]).exit_code(),
            1
        );
        assert_eq!(
            Report::new("m", vec![finding(Severity::Important, "r", "A01")], vec![]).exit_code(),
            2
        );
        assert_eq!(
            Report::new("m", vec![finding(Severity::Critical, "r", "A01")], vec![]).exit_code(),
            3
        );
        let degraded = Report::new(
            "m",
            vec![],
            vec![LoadFailureReport {
                path: "areas/HFG001.json".to_string(),
                error: "bad json".to_string(),
            }],
        );
        assert_eq!(degraded.exit_code(), 3);
    }

    #[test]
    fn test_render_is_deterministic() {
        let make = || {
            Report::new(
                "Testfields",
                vec![
                    finding(Severity::Critical, "unreachable-location", "C03"),
                    finding(Severity::Polish, "rare-trigger", "A01"),
                ],
                vec![],
            )
        };
        assert_eq!(make().render(), make().render());
        assert!(make().render().contains("CRITICAL (1):"));
        assert!(make().render().contains("1 critical, 0 important, 1 polish"));
    }
}

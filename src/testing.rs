//! Test helpers for building benchmarks, profiles, and stub engine-registry
//! participants without repeating the same tree-construction boilerplate in every
//! test suite.

use std::collections::HashMap;

use crate::applicability::{DictionaryModel, LanguageModel};
use crate::lattice::Verdict;
use crate::model::*;
use crate::registry::{EvalOutcome, Evaluator, Reporter, ReporterEvent};

/// Builder for a single rule.
///
/// # Examples
/// ```
/// use xccdf_core::testing::RuleBuilder;
///
/// let rule = RuleBuilder::new("r1").weight(2.0).selected(false).build();
/// assert_eq!(rule.weight, 2.0);
/// ```
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            rule: Rule {
                id: id.into(),
                version: None,
                severity: Severity::Unknown,
                role: Role::Full,
                weight: 1.0,
                default_selected: true,
                idents: vec![],
                fixes: vec![],
                platforms: vec![],
                checks: vec![],
                complex_checks: vec![],
            },
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.rule.weight = weight;
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.rule.default_selected = selected;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.rule.severity = severity;
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.rule.role = role;
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.rule.platforms.push(platform.into());
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.rule.checks.push(check);
        self
    }

    pub fn complex_check(mut self, node: ComplexCheck) -> Self {
        self.rule.complex_checks.push(node);
        self
    }

    pub fn build(self) -> Rule {
        self.rule
    }
}

/// Builder for a group of child items.
///
/// # Examples
/// ```
/// use xccdf_core::testing::{GroupBuilder, RuleBuilder};
/// use xccdf_core::model::Item;
///
/// let group = GroupBuilder::new("g1")
///     .child(Item::Rule(RuleBuilder::new("r1").build()))
///     .build();
/// assert_eq!(group.children.len(), 1);
/// ```
pub struct GroupBuilder {
    group: Group,
}

impl GroupBuilder {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            group: Group {
                id: id.into(),
                weight: 1.0,
                default_selected: true,
                platforms: vec![],
                children: vec![],
            },
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.group.weight = weight;
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.group.default_selected = selected;
        self
    }

    pub fn child(mut self, item: Item) -> Self {
        self.group.children.push(item);
        self
    }

    pub fn build(self) -> Group {
        self.group
    }
}

/// Build a minimal benchmark from a flat list of top-level items.
///
/// # Examples
/// ```
/// use xccdf_core::testing::{benchmark_with, RuleBuilder};
/// use xccdf_core::model::Item;
///
/// let benchmark = benchmark_with(vec![Item::Rule(RuleBuilder::new("r1").build())]);
/// assert!(benchmark.get_item_by_id(&"r1".into()).is_some());
/// ```
pub fn benchmark_with(children: Vec<Item>) -> Benchmark {
    Benchmark::new("test-benchmark", SchemaVersion::V1_2OrLater, children, HashMap::new(), None, None)
}

/// An evaluator stub that always returns the same verdict, ignoring its inputs.
pub struct FixedEvaluator(pub Verdict);

impl Evaluator for FixedEvaluator {
    fn evaluate(&mut self, _: &str, _: Option<&str>, _: &str, _: &[crate::binding::ValueBinding], _: &mut Vec<String>) -> EvalOutcome {
        EvalOutcome::Verdict(self.0)
    }
}

/// An evaluator stub that reports the given names for every href, for exercising
/// multi-check fan-out without a real engine.
pub struct NamedEvaluator {
    pub verdict: Verdict,
    pub names: Vec<String>,
}

impl Evaluator for NamedEvaluator {
    fn evaluate(&mut self, _: &str, _: Option<&str>, _: &str, _: &[crate::binding::ValueBinding], _: &mut Vec<String>) -> EvalOutcome {
        EvalOutcome::Verdict(self.verdict)
    }

    fn names_for_href(&mut self, _href: &str) -> Option<Vec<String>> {
        Some(self.names.clone())
    }
}

/// A reporter that records every event it sees, for assertions on start/output order.
#[derive(Default)]
pub struct RecordingReporter {
    pub started: Vec<String>,
    pub outputs: Vec<(String, Verdict)>,
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: ReporterEvent<'_>) -> bool {
        match event {
            ReporterEvent::Start { rule_id } => self.started.push(rule_id.to_string()),
            ReporterEvent::Output { result } => self.outputs.push((result.rule_id.clone(), result.verdict)),
        }
        true
    }
}

/// A dictionary model stub keyed by exact platform name.
#[derive(Default)]
pub struct StubDictionary {
    pub applicable: HashMap<String, bool>,
}

impl DictionaryModel for StubDictionary {
    fn is_name_applicable(&self, name: &str) -> Option<bool> {
        self.applicable.get(name).copied()
    }
}

/// A language model stub keyed by exact platform string.
#[derive(Default)]
pub struct StubLanguageModel {
    pub applicable: HashMap<String, bool>,
}

impl LanguageModel for StubLanguageModel {
    fn is_platform_applicable(&self, platform: &str) -> Option<bool> {
        self.applicable.get(platform).copied()
    }
}

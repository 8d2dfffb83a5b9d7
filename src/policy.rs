//! Policy model and lifecycle (§3, §4.10). A [`PolicyModel`] owns the engine registry
//! and applicability engine shared across every [`Policy`] built from one benchmark; a
//! [`Policy`] pairs a resolved selection map with an optional profile and drives
//! evaluation of its rules in benchmark order, producing a test result.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::applicability::ApplicabilityEngine;
use crate::evaluate::{self, RuleResult};
use crate::model::{Benchmark, Item, Profile};
use crate::registry::EngineRegistry;
use crate::selection::{self, SelectionMap};
use crate::Result;

/// Single-threaded, cooperatively-shared state for every policy evaluated against one
/// benchmark: the engine registry and applicability engine are both interior-mutable
/// via `RefCell` rather than `Mutex`, since this crate makes no claim of thread-safety
/// (§5) and a lock would misrepresent that.
pub struct PolicyModel {
    pub benchmark: Rc<Benchmark>,
    pub registry: RefCell<EngineRegistry>,
    pub applicability: ApplicabilityEngine,
}

impl PolicyModel {
    pub fn new(benchmark: Benchmark) -> Self {
        Self {
            benchmark: Rc::new(benchmark),
            registry: RefCell::new(EngineRegistry::new()),
            applicability: ApplicabilityEngine::new(),
        }
    }

    /// Build a policy for `profile` (or the benchmark's own defaults when `None`),
    /// resolving the selection map eagerly so evaluation order is fixed up front.
    pub fn policy(self: &Rc<Self>, profile: Option<Profile>) -> Policy {
        let selection = selection::resolve(&self.benchmark, profile.as_ref());
        Policy {
            model: Rc::clone(self),
            profile,
            selection,
        }
    }
}

/// One profile-scoped view over a [`PolicyModel`]'s benchmark, ready to evaluate.
pub struct Policy {
    model: Rc<PolicyModel>,
    profile: Option<Profile>,
    selection: SelectionMap,
}

const DEFAULT_PROFILE_ID: &str = "default-profile";

/// The test-result id prefix scheme differs before/after XCCDF 1.2 (§6); a null
/// profile-id maps to `default-profile`. This is the OpenSCAP behavior `xccdf_policy.c`
/// emits, not a per-rule-result id — one `TestResult` carries exactly one id.
fn test_result_id(schema_version: crate::model::SchemaVersion, profile_id: Option<&str>) -> String {
    let prefix = match schema_version {
        crate::model::SchemaVersion::Before1_2 => "OSCAP-Test-",
        crate::model::SchemaVersion::V1_2OrLater => "xccdf_org.open-scap_testresult_",
    };
    format!("{prefix}{}", profile_id.unwrap_or(DEFAULT_PROFILE_ID))
}

/// A flattened evaluation outcome for the whole policy: one id (§6) plus every
/// `RuleResult` produced, in the order its rule was visited (§3).
#[derive(Debug, Clone)]
pub struct TestResult {
    pub id: String,
    pub results: Vec<RuleResult>,
}

impl Policy {
    pub fn selection(&self) -> &SelectionMap {
        &self.selection
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Walk the selection map in insertion (depth-first benchmark) order, evaluating
    /// every rule and skipping groups and values (§4.10).
    pub fn evaluate(&self) -> Result<TestResult> {
        let mut results = Vec::new();

        for (id, selected) in self.selection.iter() {
            let item = match self.model.benchmark.get_item_by_id(id) {
                Some(item) => item,
                None => continue,
            };
            let rule = match item.as_rule() {
                Some(r) => r,
                None => continue,
            };

            let rule_results = evaluate::evaluate_rule(
                &self.model.benchmark,
                self.profile.as_ref(),
                rule,
                selected,
                &self.model.applicability,
                &self.model.registry,
            )?;

            results.extend(rule_results);
        }

        let profile_id = self.profile.as_ref().and_then(|p| p.id.as_ref()).map(|id| id.0.as_str());
        let id = test_result_id(self.model.benchmark.schema_version, profile_id);
        Ok(TestResult { id, results })
    }

    /// Every distinct `(system, href)` pair any rule's checks reference, in first-seen
    /// order (§4.10: used to pre-fetch or validate external content).
    pub fn systems_and_files(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        walk_checks(&self.model.benchmark.children, &mut |system, href| {
            let key = (system.to_string(), href.to_string());
            if seen.insert(key.clone()) {
                out.push(key);
            }
        });
        out
    }

    /// Every distinct href referenced by any check, in first-seen order.
    pub fn files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (_, href) in self.systems_and_files() {
            if seen.insert(href.clone()) {
                out.push(href);
            }
        }
        out
    }
}

fn walk_checks(items: &[Item], visit: &mut impl FnMut(&str, &str)) {
    for item in items {
        match item {
            Item::Group(g) => walk_checks(&g.children, visit),
            Item::Rule(r) => {
                for check in &r.checks {
                    walk_check(check, visit);
                }
                for complex in &r.complex_checks {
                    walk_complex(complex, visit);
                }
            }
            Item::Value(_) => {}
        }
    }
}

fn walk_check(check: &crate::model::Check, visit: &mut impl FnMut(&str, &str)) {
    for content_ref in &check.content_refs {
        visit(&check.system, &content_ref.href);
    }
}

fn walk_complex(node: &crate::model::ComplexCheck, visit: &mut impl FnMut(&str, &str)) {
    match node {
        crate::model::ComplexCheck::Leaf(check) => walk_check(check, visit),
        crate::model::ComplexCheck::Combinator { children, .. } => {
            for child in children {
                walk_complex(child, visit);
            }
        }
    }
}

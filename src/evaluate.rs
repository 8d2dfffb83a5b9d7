//! Rule evaluator (§4.6, §4.7, §9). Orchestrates one rule's evaluation: start
//! reporter, selection gate, applicability gate, check dispatch, content-ref and
//! multi-check fan-out, and output reporter firing — producing the rule-result(s)
//! for one rule.

use std::cell::RefCell;

use crate::applicability::ApplicabilityEngine;
use crate::binding;
use crate::dispatch::{self, Picked};
use crate::lattice::Verdict;
use crate::model::{Benchmark, Check, ComplexCheck, Profile, Rule};
use crate::registry::{EngineRegistry, EvalOutcome};
use crate::{Error, Result};

const NO_CANDIDATE_CHECK: &str = "No candidate or applicable check found.";
const NO_CONTENT_REF_RESOLVED: &str = "None of the check-content-ref elements was resolvable.";
const VALUE_BINDINGS_NOT_FOUND: &str = "Value bindings not found.";
const NO_MULTI_CHECK_DEFINITIONS: &str = "No definitions found for @multi-check.";

/// One materialized result for a rule: the verdict plus the bookkeeping needed to
/// build a `TestResult` entry (§3, §6).
#[derive(Debug, Clone, PartialEq)]
pub struct RuleResult {
    pub rule_id: String,
    pub verdict: Verdict,
    pub weight: f64,
    pub severity: crate::model::Severity,
    pub role: crate::model::Role,
    pub content_name: Option<String>,
    pub messages: Vec<String>,
}

fn make_result(rule: &Rule, verdict: Verdict, content_name: Option<String>, messages: Vec<String>) -> RuleResult {
    RuleResult {
        rule_id: rule.id.0.clone(),
        verdict,
        weight: rule.weight,
        severity: rule.severity,
        role: rule.role,
        content_name,
        messages,
    }
}

/// Evaluate one rule, honoring its selection state, applicability, and whatever
/// check(s) dispatch picks (§4.7). Always produces at least one `RuleResult` unless
/// a reporter or evaluator aborts the rule outright.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_rule(
    benchmark: &Benchmark,
    profile: Option<&Profile>,
    rule: &Rule,
    selected: bool,
    applicability: &ApplicabilityEngine,
    registry: &RefCell<EngineRegistry>,
) -> Result<Vec<RuleResult>> {
    if !registry.borrow_mut().fire_start(rule.id.0.as_str()) {
        return Err(Error::ReporterAborted);
    }

    if !selected {
        let result = make_result(rule, Verdict::NotSelected, None, Vec::new());
        return fire_and_collect(registry, result);
    }

    let applicable = applicability.is_applicable(&rule.platforms, registry);
    if applicable != Verdict::Pass {
        let result = make_result(rule, Verdict::NotApplicable, None, Vec::new());
        fire_and_collect(registry, result)
    } else {
        evaluate_applicable_rule(benchmark, profile, rule, registry)
    }
}

fn evaluate_applicable_rule(
    benchmark: &Benchmark,
    profile: Option<&Profile>,
    rule: &Rule,
    registry: &RefCell<EngineRegistry>,
) -> Result<Vec<RuleResult>> {
    let picked = dispatch::pick(rule, profile, &registry.borrow());

    let result = match picked {
        Picked::None => make_result(rule, Verdict::NotChecked, None, vec![NO_CANDIDATE_CHECK.to_string()]),
        Picked::Complex(root) => evaluate_complex_rule(benchmark, profile, rule, root, registry)?,
        Picked::Simple(check) => {
            return evaluate_simple_check(benchmark, profile, rule, check, registry);
        }
    };

    fire_and_collect(registry, result)
}

fn evaluate_complex_rule(
    benchmark: &Benchmark,
    profile: Option<&Profile>,
    rule: &Rule,
    root: &ComplexCheck,
    registry: &RefCell<EngineRegistry>,
) -> Result<RuleResult> {
    let mut messages = Vec::new();
    let mut fatal: Option<String> = None;

    let verdict = dispatch::evaluate_complex(root, &mut |check| {
        if fatal.is_some() {
            return Verdict::Error;
        }
        match evaluate_leaf_check(benchmark, profile, rule, check, registry) {
            Ok((v, mut msgs)) => {
                messages.append(&mut msgs);
                v
            }
            Err(e) => {
                fatal = Some(e);
                Verdict::Error
            }
        }
    });

    if let Some(message) = fatal {
        return Err(Error::Engine(message));
    }

    Ok(make_result(rule, verdict, None, messages))
}

/// Runs a single check-leaf of a complex-check tree: iterates its content-refs
/// (§4.6) but never expands multi-check fan-out — that only applies to a rule's
/// top-level simple check (§4.6: "multi-check only applies at the top level").
fn evaluate_leaf_check(
    benchmark: &Benchmark,
    profile: Option<&Profile>,
    rule: &Rule,
    check: &Check,
    registry: &RefCell<EngineRegistry>,
) -> std::result::Result<(Verdict, Vec<String>), String> {
    let bindings = match binding::assemble(benchmark, profile, &check.exports) {
        Ok(b) => b,
        Err(_) => return Ok((Verdict::Unknown, vec![VALUE_BINDINGS_NOT_FOUND.to_string()])),
    };

    for content_ref in &check.content_refs {
        let mut imports = check.imports.clone();
        let outcome = registry.borrow_mut().evaluate(
            &check.system,
            rule.id.0.as_str(),
            content_ref.name.as_deref(),
            &content_ref.href,
            &bindings,
            &mut imports,
        );
        let verdict = match outcome {
            Some(EvalOutcome::Verdict(v)) => v,
            Some(EvalOutcome::Fatal(msg)) => return Err(msg),
            None => Verdict::NotChecked,
        };
        if verdict != Verdict::NotChecked {
            // Negation is applied once per leaf by `dispatch::evaluate_complex`, not here.
            return Ok((verdict, Vec::new()));
        }
    }

    Ok((Verdict::NotChecked, vec![NO_CONTENT_REF_RESOLVED.to_string()]))
}

/// Evaluate a top-level simple check: assemble bindings once, then iterate its
/// content-refs in declaration order, stopping at the first non-`NotChecked`
/// verdict and pinning that content-ref. Expands multi-check fan-out into one
/// `RuleResult` per content name the engine reports (§9).
fn evaluate_simple_check(
    benchmark: &Benchmark,
    profile: Option<&Profile>,
    rule: &Rule,
    check: &Check,
    registry: &RefCell<EngineRegistry>,
) -> Result<Vec<RuleResult>> {
    let bindings = match binding::assemble(benchmark, profile, &check.exports) {
        Ok(b) => b,
        Err(_) => {
            let result = make_result(rule, Verdict::Unknown, None, vec![VALUE_BINDINGS_NOT_FOUND.to_string()]);
            return fire_and_collect(registry, result);
        }
    };

    for content_ref in &check.content_refs {
        if content_ref.name.is_none() && check.multi_check {
            let names = registry.borrow_mut().names_for_href(&check.system, &content_ref.href);
            match names {
                Some(names) if names.is_empty() => {
                    let result = make_result(rule, Verdict::Unknown, None, vec![NO_MULTI_CHECK_DEFINITIONS.to_string()]);
                    return fire_and_collect(registry, result);
                }
                Some(names) => return evaluate_multi_check(rule, check, content_ref, &bindings, names, registry),
                None => {
                    tracing::debug!(
                        rule_id = %rule.id.0,
                        href = %content_ref.href,
                        "multi-check requested but unsupported by this engine; falling back to single dispatch"
                    );
                }
            }
        }

        let mut imports = check.imports.clone();
        let outcome = registry.borrow_mut().evaluate(
            &check.system,
            rule.id.0.as_str(),
            content_ref.name.as_deref(),
            &content_ref.href,
            &bindings,
            &mut imports,
        );
        let verdict = outcome_to_verdict(outcome)?;
        if verdict != Verdict::NotChecked {
            let verdict = apply_negate(verdict, check.negate);
            let result = make_result(rule, verdict, content_ref.name.clone(), Vec::new());
            return fire_and_collect(registry, result);
        }
    }

    let result = make_result(rule, Verdict::NotChecked, None, vec![NO_CONTENT_REF_RESOLVED.to_string()]);
    fire_and_collect(registry, result)
}

fn evaluate_multi_check(
    rule: &Rule,
    check: &Check,
    content_ref: &crate::model::ContentRef,
    bindings: &[crate::binding::ValueBinding],
    names: Vec<String>,
    registry: &RefCell<EngineRegistry>,
) -> Result<Vec<RuleResult>> {
    let mut results = Vec::with_capacity(names.len());
    for (index, name) in names.into_iter().enumerate() {
        if index > 0 && !registry.borrow_mut().fire_start(rule.id.0.as_str()) {
            return Err(Error::ReporterAborted);
        }
        let mut imports = check.imports.clone();
        let outcome = registry.borrow_mut().evaluate(
            &check.system,
            rule.id.0.as_str(),
            Some(name.as_str()),
            &content_ref.href,
            bindings,
            &mut imports,
        );
        let verdict = apply_negate(outcome_to_verdict(outcome)?, check.negate);
        let result = make_result(rule, verdict, Some(name), Vec::new());
        results.extend(fire_and_collect(registry, result)?);
    }
    Ok(results)
}

fn apply_negate(verdict: Verdict, negate: bool) -> Verdict {
    if negate {
        crate::lattice::negate(verdict)
    } else {
        verdict
    }
}

fn outcome_to_verdict(outcome: Option<EvalOutcome>) -> Result<Verdict> {
    match outcome {
        Some(EvalOutcome::Verdict(v)) => Ok(v),
        Some(EvalOutcome::Fatal(msg)) => Err(Error::Engine(msg)),
        None => Ok(Verdict::NotChecked),
    }
}

fn fire_and_collect(registry: &RefCell<EngineRegistry>, result: RuleResult) -> Result<Vec<RuleResult>> {
    if !registry.borrow_mut().fire_output(&result) {
        return Err(Error::ReporterAborted);
    }
    Ok(vec![result])
}

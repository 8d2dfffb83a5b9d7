//! Check dispatcher (§4.6): picks the one check to evaluate for a rule, and folds
//! complex-check trees. Simple-check content-ref iteration and multi-check fan-out
//! live in [`crate::evaluate`], since both need to interleave with reporter firing.

use crate::lattice::{self, Verdict};
use crate::model::{Check, ComplexCheck, Profile, Rule};
use crate::registry::EngineRegistry;

/// The outcome of picking a check for a rule (§4.6 steps 1-3).
pub enum Picked<'a> {
    Complex(&'a ComplexCheck),
    Simple(&'a Check),
    None,
}

/// Choose which check to evaluate for `rule`.
pub fn pick<'a>(rule: &'a Rule, profile: Option<&Profile>, registry: &EngineRegistry) -> Picked<'a> {
    if let Some(first) = rule.complex_checks.first() {
        return Picked::Complex(first);
    }

    let selector = profile
        .and_then(|p| p.refine_rule_for(&rule.id))
        .and_then(|r| r.selector.as_deref());

    let candidates = candidate_checks(&rule.checks, selector);

    candidates
        .into_iter()
        .filter(|c| registry.has_evaluator(&c.system))
        .last()
        .map(Picked::Simple)
        .unwrap_or(Picked::None)
}

/// Gather simple-check candidates under an optional refine-rule selector. An absent
/// selector means no filtering at all; a selector that matches nothing falls back to
/// checks that declare no selector of their own (§4.6 step 2).
fn candidate_checks<'a>(checks: &'a [Check], selector: Option<&str>) -> Vec<&'a Check> {
    match selector {
        None => checks.iter().collect(),
        Some(sel) => {
            let filtered: Vec<&Check> = checks.iter().filter(|c| c.selector.as_deref() == Some(sel)).collect();
            if filtered.is_empty() {
                checks.iter().filter(|c| c.selector.is_none()).collect()
            } else {
                filtered
            }
        }
    }
}

/// Fold a complex-check tree: recurse into children, combine with the node's
/// operator, negate once per node (§4.1, §4.6).
pub fn evaluate_complex(node: &ComplexCheck, leaf: &mut impl FnMut(&Check) -> Verdict) -> Verdict {
    match node {
        ComplexCheck::Leaf(check) => {
            let verdict = leaf(check);
            if check.negate {
                lattice::negate(verdict)
            } else {
                verdict
            }
        }
        ComplexCheck::Combinator { op, negate, children } => {
            let folded = lattice::fold(*op, children.iter().map(|child| evaluate_complex(child, leaf)));
            if *negate {
                lattice::negate(folded)
            } else {
                folded
            }
        }
    }
}

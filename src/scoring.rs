//! Scoring models (§4.8): reduce a test result's rule-results into a single score
//! under one of four well-known scoring-system URIs.

use std::collections::HashMap;

use crate::lattice::Verdict;
use crate::model::{Benchmark, Item, Role};

pub const DEFAULT: &str = "urn:xccdf:scoring:default";
pub const FLAT: &str = "urn:xccdf:scoring:flat";
pub const FLAT_UNWEIGHTED: &str = "urn:xccdf:scoring:flat-unweighted";
pub const ABSOLUTE: &str = "urn:xccdf:scoring:absolute";

/// One rule-result's contribution to scoring: the only fields a scoring model needs.
#[derive(Debug, Clone, Copy)]
pub struct ScoredRule {
    pub weight: f64,
    pub role: Role,
    pub verdict: Verdict,
}

/// Score `results` under `system`. Returns `None` (`scoring-system-unknown`, §7) for
/// any URI other than the four well-known ones.
pub fn score(benchmark: &Benchmark, system: &str, results: &[ScoredRule]) -> Option<f64> {
    match system {
        DEFAULT => Some(score_default(benchmark, results)),
        FLAT => Some(score_flat(results, true)),
        FLAT_UNWEIGHTED => Some(score_flat(results, false)),
        ABSOLUTE => Some(score_absolute(results)),
        _ => None,
    }
}

fn contributes(rule: &ScoredRule) -> bool {
    rule.role != Role::Unscored && !rule.verdict.excluded_from_scoring()
}

fn contribution(rule: &ScoredRule) -> f64 {
    if rule.verdict.counts_as_pass() {
        1.0
    } else {
        0.0
    }
}

/// Flat: every scored rule contributes its own weight (or 1.0 when unweighted),
/// normalized against the sum of contributing weights, scaled to 100.
fn score_flat(results: &[ScoredRule], weighted: bool) -> f64 {
    let mut earned = 0.0;
    let mut possible = 0.0;
    for rule in results {
        if !contributes(rule) {
            continue;
        }
        let weight = if weighted { rule.weight } else { 1.0 };
        earned += weight * contribution(rule);
        possible += weight;
    }
    if possible == 0.0 {
        0.0
    } else {
        100.0 * earned / possible
    }
}

/// Absolute: every scored rule must pass; one failure zeroes the whole score.
fn score_absolute(results: &[ScoredRule]) -> f64 {
    let scored: Vec<&ScoredRule> = results.iter().filter(|r| contributes(r)).collect();
    if scored.is_empty() {
        return 100.0;
    }
    if scored.iter().all(|r| r.verdict.counts_as_pass()) {
        100.0
    } else {
        0.0
    }
}

/// Default: like flat-weighted, but weights are renormalized per group so that
/// sibling groups each contribute proportionally to their own declared weight
/// rather than to the raw count of rules they contain (§4.8).
fn score_default(benchmark: &Benchmark, results: &[ScoredRule]) -> f64 {
    fn walk(items: &[Item], rules_by_id: &HashMap<String, ScoredRule>) -> (f64, f64) {
        let mut earned = 0.0;
        let mut possible = 0.0;
        let mut group_weight_sum = 0.0;
        let mut group_contribs = Vec::new();

        for item in items {
            match item {
                Item::Group(g) => {
                    let (e, p) = walk(&g.children, rules_by_id);
                    if p > 0.0 {
                        group_weight_sum += g.weight;
                        group_contribs.push((g.weight, e / p));
                    }
                }
                Item::Rule(r) => {
                    if let Some(scored) = rules_by_id.get(r.id.0.as_str()) {
                        if contributes(scored) {
                            earned += scored.weight * contribution(scored);
                            possible += scored.weight;
                        }
                    }
                }
                Item::Value(_) => {}
            }
        }

        if group_weight_sum > 0.0 {
            let group_fraction: f64 = group_contribs.iter().map(|(w, frac)| w / group_weight_sum * frac).sum();
            earned += group_fraction * group_weight_sum;
            possible += group_weight_sum;
        }

        (earned, possible)
    }

    // `ScoredRule` doesn't carry a rule id; callers supply one result per rule in
    // benchmark order, so ids are recovered positionally here.
    let ordered_ids = collect_rule_ids(&benchmark.children);
    let rules_by_id: HashMap<String, ScoredRule> = ordered_ids
        .into_iter()
        .zip(results.iter().copied())
        .collect();

    let (earned, possible) = walk(&benchmark.children, &rules_by_id);
    if possible == 0.0 {
        0.0
    } else {
        100.0 * earned / possible
    }
}

fn collect_rule_ids(items: &[Item]) -> Vec<String> {
    let mut ids = Vec::new();
    for item in items {
        match item {
            Item::Group(g) => ids.extend(collect_rule_ids(&g.children)),
            Item::Rule(r) => ids.push(r.id.0.clone()),
            Item::Value(_) => {}
        }
    }
    ids
}
